//! Error types for response post-processing

use thiserror::Error;

/// Main error type for the crate
#[derive(Error, Debug)]
pub enum Error {
    /// The aggregation response does not have the shape the series config expects
    #[error("Malformed response: {0}")]
    MalformedResponse(#[from] ResponseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The caller-supplied field extractor failed
    #[error("Field extraction failed: {0}")]
    FieldExtraction(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Aggregation response shape errors
///
/// These indicate an upstream contract violation (the request that produced
/// the response did not match the series config) and are fatal for the
/// current pipeline pass.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResponseError {
    /// A required aggregation node is absent
    #[error("missing aggregation node at `{path}`")]
    MissingNode {
        /// Dotted path of the absent node
        path: String,
    },

    /// A node is present but has the wrong type
    #[error("expected {expected} at `{path}`")]
    UnexpectedShape {
        /// Dotted path of the offending node
        path: String,
        /// Human readable description of the expected shape
        expected: &'static str,
    },
}

impl ResponseError {
    /// Create a missing node error
    pub fn missing(path: impl Into<String>) -> Self {
        ResponseError::MissingNode { path: path.into() }
    }

    /// Create an unexpected shape error
    pub fn shape(path: impl Into<String>, expected: &'static str) -> Self {
        ResponseError::UnexpectedShape {
            path: path.into(),
            expected,
        }
    }

    /// Path of the node the error refers to
    pub fn path(&self) -> &str {
        match self {
            ResponseError::MissingNode { path } => path,
            ResponseError::UnexpectedShape { path, .. } => path,
        }
    }
}

/// Validation errors
///
/// Error type for configuration validation
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Required field is missing or empty
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// Invalid format
    #[error("Invalid format for {field}: {message}")]
    InvalidFormat {
        /// Field name being validated
        field: String,
        /// Description of the format error
        message: String,
    },

    /// The same entry appears more than once
    #[error("Duplicate entry in {field}: {value}")]
    Duplicate {
        /// Field name being validated
        field: String,
        /// The repeated value
        value: String,
    },
}

impl From<ValidationError> for Error {
    fn from(e: ValidationError) -> Self {
        Error::Configuration(e.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
