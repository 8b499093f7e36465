//! Standard deviation band processor
//!
//! Owns the `std_deviation_bucket` + `band` combination that the generic
//! sibling processor skips. Each split becomes two rows: the lower bound,
//! then the upper bound filled down to the lower one.

use async_trait::async_trait;

use super::{ProcessorContext, ResponseProcessor, StageOutcome};
use crate::config::{MetricCombination, SiblingRules};
use crate::error::Result;
use crate::response::AggregationResponse;
use crate::series::{last_metric, Metric};
use crate::sibling::bucket_sibling_value;
use crate::splits::{get_splits, Split};
use crate::types::{DataPoint, ResultRow, ResultRows};

const LOWER: &str = "lower";
const UPPER: &str = "upper";

/// Upper and lower band rows for standard deviation sibling metrics
#[derive(Debug, Clone)]
pub struct StdDeviationSiblingBands {
    rules: SiblingRules,
    combination: MetricCombination,
}

impl StdDeviationSiblingBands {
    /// Create the stage with the given matching rules
    pub fn new(rules: SiblingRules) -> Self {
        Self {
            rules,
            combination: MetricCombination::std_deviation_band(),
        }
    }

    fn bound_data(&self, split: &Split, metric: &Metric, mode: &str) -> Vec<DataPoint> {
        let bound = metric.clone().with_mode(mode);
        split
            .timeseries
            .buckets
            .iter()
            .map(|bucket| {
                DataPoint::new(
                    bucket.key.clone(),
                    bucket_sibling_value(split, bucket, &bound, &self.rules),
                )
            })
            .collect()
    }
}

impl Default for StdDeviationSiblingBands {
    fn default() -> Self {
        Self::new(SiblingRules::default())
    }
}

#[async_trait]
impl ResponseProcessor for StdDeviationSiblingBands {
    fn name(&self) -> &'static str {
        "std_deviation_sibling_bands"
    }

    async fn process(&self, ctx: &ProcessorContext<'_>, results: &mut ResultRows) -> Result<StageOutcome> {
        let Some(metric) = last_metric(ctx.series).filter(|m| self.combination.matches(m)) else {
            return Ok(StageOutcome::Passthrough);
        };

        let response = AggregationResponse::from_bucket(ctx.bucket.clone());
        let splits = get_splits(&response, ctx.series, ctx.meta, ctx.fields, &self.rules).await?;

        for split in &splits {
            let lower_id = format!("{}:{}", split.id, LOWER);
            results.push(
                ResultRow::new(
                    lower_id.clone(),
                    split.label.clone(),
                    self.bound_data(split, metric, LOWER),
                )
                .with_color(split.color.clone()),
            );
            results.push(
                ResultRow::new(
                    format!("{}:{}", split.id, UPPER),
                    split.label.clone(),
                    self.bound_data(split, metric, UPPER),
                )
                .with_color(split.color.clone())
                .with_fill_between(lower_id),
            );
        }

        Ok(StageOutcome::Appended(splits.len() * 2))
    }
}
