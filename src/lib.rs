//! Kuba TSVB - Response post-processing for time-series aggregations
//!
//! This library turns the aggregation response of one time series into the
//! rows a chart or table renders:
//! - Typed validation of the untyped aggregation tree at the boundary
//! - Split discovery (terms, filters, unsplit) in deterministic order
//! - Sibling pipeline metric extraction with explicit absent values
//! - A linear pipeline of response processors driven in order
//!
//! # Example
//!
//! ```rust,ignore
//! use kuba_tsvb::{PipelineConfig, ProcessorContext, ResponsePipeline, ResultRows};
//! use kuba_tsvb::fields::NoFields;
//!
//! let pipeline = ResponsePipeline::from_config(&PipelineConfig::default());
//! let ctx = ProcessorContext::new(&bucket, &series, &meta, &NoFields);
//! let rows = pipeline.run(&ctx, ResultRows::new()).await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod fields;
pub mod response;
pub mod series;
pub mod sibling;
pub mod splits;
pub mod types;

/// Configuration management with TOML support
pub mod config;

/// Response processors and the pipeline driving them
pub mod processors;

/// Tracing subscriber setup
pub mod telemetry;

// Re-export main types
pub use config::{PipelineConfig, SiblingRules, StageKind};
pub use error::{Error, Result};
pub use processors::{ProcessorContext, ResponsePipeline, ResponseProcessor, StageOutcome};
pub use series::{Metric, SeriesConfig, SeriesMeta};
pub use types::{BucketKey, DataPoint, ResultRow, ResultRows};
