//! Configuration management for the response pipeline
//!
//! Provides TOML file support, environment variable overrides and sensible
//! defaults. The sibling metric rules live here as data so the processors can
//! evaluate them as pure predicates instead of hard-coding type strings.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use crate::error::{Error, Result, ValidationError};
use crate::series::Metric;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct PipelineConfig {
    /// Sibling metric matching rules
    #[serde(default)]
    pub sibling: SiblingRules,

    /// Stage ordering
    #[serde(default)]
    pub pipeline: StageConfig,

    /// Logging
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// A metric type and mode pair
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MetricCombination {
    /// Metric type
    pub metric_type: String,

    /// Metric mode; `None` matches any mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

impl MetricCombination {
    /// Create a combination
    pub fn new(metric_type: impl Into<String>, mode: Option<&str>) -> Self {
        Self {
            metric_type: metric_type.into(),
            mode: mode.map(str::to_string),
        }
    }

    /// Standard deviation sibling metric rendered as a band
    pub fn std_deviation_band() -> Self {
        Self::new("std_deviation_bucket", Some("band"))
    }

    /// Check whether `metric` is this combination
    pub fn matches(&self, metric: &Metric) -> bool {
        metric.metric_type == self.metric_type
            && self
                .mode
                .as_deref()
                .map_or(true, |mode| metric.mode() == Some(mode))
    }

    /// Check whether every metric matching `other` also matches `self`
    pub fn covers(&self, other: &MetricCombination) -> bool {
        self.metric_type == other.metric_type
            && (self.mode.is_none() || self.mode == other.mode)
    }
}

/// Rules deciding which metrics the sibling processor renders
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SiblingRules {
    /// Type suffix of sibling pipeline aggregations
    #[serde(default = "default_suffix")]
    pub suffix: String,

    /// Sibling combinations rendered by a more specific stage
    #[serde(default = "default_excluded")]
    pub excluded: Vec<MetricCombination>,
}

impl SiblingRules {
    /// Check whether `metric` is a sibling pipeline aggregation
    pub fn is_sibling_metric(&self, metric: &Metric) -> bool {
        is_sibling_type(&metric.metric_type, &self.suffix)
    }

    /// Check whether `metric` is a combination another stage owns
    pub fn is_excluded(&self, metric: &Metric) -> bool {
        self.excluded.iter().any(|c| c.matches(metric))
    }

    /// Metric type with the sibling suffix removed
    pub fn base_type<'a>(&self, metric_type: &'a str) -> &'a str {
        metric_type.strip_suffix(self.suffix.as_str()).unwrap_or(metric_type)
    }
}

impl Default for SiblingRules {
    fn default() -> Self {
        Self {
            suffix: default_suffix(),
            excluded: default_excluded(),
        }
    }
}

/// Check whether `metric_type` ends in the sibling `suffix`
///
/// The suffix alone (e.g. `_bucket`) is not a metric type.
pub fn is_sibling_type(metric_type: &str, suffix: &str) -> bool {
    !suffix.is_empty() && metric_type.len() > suffix.len() && metric_type.ends_with(suffix)
}

/// Stages a pipeline can be built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// Upper/lower band rows for standard deviation sibling metrics
    StdDeviationSiblingBands,
    /// One row per split for sibling metrics
    StdSibling,
}

impl StageKind {
    /// Stage name as used in configuration
    pub fn as_str(&self) -> &'static str {
        match self {
            StageKind::StdDeviationSiblingBands => "std_deviation_sibling_bands",
            StageKind::StdSibling => "std_sibling",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StageKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "std_deviation_sibling_bands" => Ok(StageKind::StdDeviationSiblingBands),
            "std_sibling" => Ok(StageKind::StdSibling),
            other => Err(ValidationError::InvalidFormat {
                field: "pipeline.stages".to_string(),
                message: format!("unknown stage '{}'", other),
            }),
        }
    }
}

/// Stage ordering configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StageConfig {
    /// Stages in invocation order
    #[serde(default = "default_stages")]
    pub stages: Vec<StageKind>,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            stages: default_stages(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Enable structured (JSON-like key=value) logging targets
    #[serde(default = "default_true")]
    pub structured: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            structured: true,
        }
    }
}

// Default value functions
fn default_suffix() -> String { "_bucket".to_string() }
fn default_excluded() -> Vec<MetricCombination> { vec![MetricCombination::std_deviation_band()] }
fn default_stages() -> Vec<StageKind> { vec![StageKind::StdDeviationSiblingBands, StageKind::StdSibling] }
fn default_log_level() -> String { "info".to_string() }
fn default_true() -> bool { true }

impl PipelineConfig {
    /// Load configuration from TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        toml::from_str(&contents).map_err(|e| {
            Error::Configuration(format!("Failed to parse config file {}: {}", path.display(), e))
        })
    }

    /// Load configuration with environment variable overrides
    pub fn from_file_with_env(path: impl AsRef<Path>) -> Result<Self> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load from environment variables only
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(suffix) = std::env::var("TSVB_SIBLING_SUFFIX") {
            self.sibling.suffix = suffix;
        }

        // Comma separated stage names
        if let Ok(stages) = std::env::var("TSVB_STAGES") {
            self.pipeline.stages = stages
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .map(str::parse::<StageKind>)
                .collect::<std::result::Result<Vec<_>, _>>()?;
        }

        if let Ok(log_level) = std::env::var("RUST_LOG") {
            self.logging.level = log_level;
        }

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.sibling.suffix.is_empty() {
            return Err(ValidationError::MissingField("sibling.suffix".to_string()).into());
        }

        for combination in &self.sibling.excluded {
            if !is_sibling_type(&combination.metric_type, &self.sibling.suffix) {
                return Err(ValidationError::InvalidFormat {
                    field: "sibling.excluded".to_string(),
                    message: format!(
                        "'{}' is not a sibling metric type (suffix '{}')",
                        combination.metric_type, self.sibling.suffix
                    ),
                }
                .into());
            }
        }

        if self.pipeline.stages.is_empty() {
            return Err(ValidationError::MissingField("pipeline.stages".to_string()).into());
        }

        // The band stage renders this combination; std_sibling must skip it
        let band = MetricCombination::std_deviation_band();
        if self.pipeline.stages.contains(&StageKind::StdDeviationSiblingBands)
            && !self.sibling.excluded.iter().any(|c| c.covers(&band))
        {
            return Err(ValidationError::InvalidFormat {
                field: "sibling.excluded".to_string(),
                message: format!(
                    "stage '{}' requires '{}' with mode 'band' to be excluded",
                    StageKind::StdDeviationSiblingBands,
                    band.metric_type
                ),
            }
            .into());
        }

        let mut seen = HashSet::new();
        for stage in &self.pipeline.stages {
            if !seen.insert(stage) {
                return Err(ValidationError::Duplicate {
                    field: "pipeline.stages".to_string(),
                    value: stage.to_string(),
                }
                .into());
            }
        }

        Ok(())
    }

    /// Save configuration to TOML file
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Configuration(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, contents)?;
        Ok(())
    }
}
