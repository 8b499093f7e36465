//! Response processors
//!
//! A response processor turns one series' aggregation response into result
//! rows. Processors are chained into a [`ResponsePipeline`]:
//!
//! ```text
//!   ResultRows (empty)
//!        │
//!        ▼
//! ┌──────────────────────────────┐
//! │ std_deviation_sibling_bands  │  band rows for std deviation siblings
//! └──────────────────────────────┘
//!        │
//!        ▼
//! ┌──────────────────────────────┐
//! │ std_sibling                  │  one row per split for other siblings
//! └──────────────────────────────┘
//!        │
//!        ▼
//!   ResultRows
//! ```
//!
//! Each stage either passes through or appends rows, and every stage runs
//! exactly once per pass, in order. A stage is awaited to completion before
//! the next one starts, so later stages always see the rows of earlier ones.
//! The first error aborts the pass.

pub mod std_deviation_bands;
pub mod std_sibling;

pub use std_deviation_bands::StdDeviationSiblingBands;
pub use std_sibling::StdSibling;

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::time::Instant;
use tracing::{debug, trace};

use crate::config::{PipelineConfig, SiblingRules, StageKind};
use crate::error::Result;
use crate::fields::FieldExtractor;
use crate::series::{SeriesConfig, SeriesMeta};
use crate::types::ResultRows;

/// Inputs shared by every stage of one pipeline pass
///
/// All inputs are read-only for the duration of the pass.
#[derive(Clone, Copy)]
pub struct ProcessorContext<'a> {
    /// Aggregation sub-tree holding the series aggregation
    pub bucket: &'a Map<String, Value>,

    /// Series being rendered
    pub series: &'a SeriesConfig,

    /// Request metadata
    pub meta: &'a SeriesMeta,

    /// Field extractor used for labels
    pub fields: &'a dyn FieldExtractor,
}

impl<'a> ProcessorContext<'a> {
    /// Create a context
    pub fn new(
        bucket: &'a Map<String, Value>,
        series: &'a SeriesConfig,
        meta: &'a SeriesMeta,
        fields: &'a dyn FieldExtractor,
    ) -> Self {
        Self {
            bucket,
            series,
            meta,
            fields,
        }
    }
}

/// What a stage did with the result rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    /// The stage does not handle this series; rows are unchanged
    Passthrough,
    /// The stage appended this many rows
    Appended(usize),
}

/// One link of the response pipeline
#[async_trait]
pub trait ResponseProcessor: Send + Sync {
    /// Stage name for logging
    fn name(&self) -> &'static str;

    /// Process the series, appending rows when the stage applies
    async fn process(&self, ctx: &ProcessorContext<'_>, results: &mut ResultRows) -> Result<StageOutcome>;
}

/// Ordered list of stages driven one after the other
#[derive(Default)]
pub struct ResponsePipeline {
    stages: Vec<Box<dyn ResponseProcessor>>,
}

impl ResponsePipeline {
    /// Create an empty pipeline
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the stages named in the configuration, in order
    pub fn from_config(config: &PipelineConfig) -> Self {
        config
            .pipeline
            .stages
            .iter()
            .fold(Self::new(), |pipeline, kind| {
                pipeline.with_boxed_stage(build_stage(*kind, &config.sibling))
            })
    }

    /// Append a stage
    pub fn with_stage<P>(self, stage: P) -> Self
    where
        P: ResponseProcessor + 'static,
    {
        self.with_boxed_stage(Box::new(stage))
    }

    /// Append a boxed stage
    pub fn with_boxed_stage(mut self, stage: Box<dyn ResponseProcessor>) -> Self {
        self.stages.push(stage);
        self
    }

    /// Stage names in invocation order
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Number of stages
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Check if the pipeline has no stages
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run every stage once, starting from `results`
    pub async fn run(&self, ctx: &ProcessorContext<'_>, mut results: ResultRows) -> Result<ResultRows> {
        let start = Instant::now();

        for stage in &self.stages {
            let outcome = stage.process(ctx, &mut results).await.map_err(|e| {
                debug!(
                    stage = stage.name(),
                    series = %ctx.series.id,
                    error = %e,
                    "Stage failed, aborting pipeline pass"
                );
                e
            })?;

            trace!(
                stage = stage.name(),
                series = %ctx.series.id,
                outcome = ?outcome,
                rows = results.len(),
                "Stage complete"
            );
        }

        debug!(
            series = %ctx.series.id,
            stages = self.stages.len(),
            rows = results.len(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "Pipeline pass complete"
        );
        Ok(results)
    }
}

impl std::fmt::Debug for ResponsePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponsePipeline")
            .field("stages", &self.stage_names())
            .finish()
    }
}

fn build_stage(kind: StageKind, rules: &SiblingRules) -> Box<dyn ResponseProcessor> {
    match kind {
        StageKind::StdDeviationSiblingBands => Box::new(StdDeviationSiblingBands::new(rules.clone())),
        StageKind::StdSibling => Box::new(StdSibling::new(rules.clone())),
    }
}
