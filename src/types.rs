//! Core data types produced by the response processors
//!
//! # Key Types
//!
//! - **`BucketKey`**: The key of one aggregation bucket (timestamp, term, ...)
//! - **`DataPoint`**: A `[key, value]` pair in an output series
//! - **`ResultRow`**: One output series appended by a processor
//! - **`ResultRows`**: The append-only accumulator threaded through a pipeline pass
//!
//! # Example
//!
//! ```rust
//! use kuba_tsvb::types::{BucketKey, DataPoint, ResultRow, ResultRows};
//!
//! let mut rows = ResultRows::new();
//! rows.push(ResultRow::new(
//!     "s1",
//!     "Overall Average of bytes",
//!     vec![DataPoint::new(BucketKey::Int(1000), Some(42.5))],
//! ));
//! assert_eq!(rows.len(), 1);
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Key of an aggregation bucket
///
/// Date histogram buckets carry integer epoch-millisecond keys, terms buckets
/// carry string, numeric or boolean keys depending on the field type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BucketKey {
    /// Integer key (timestamps, integer terms)
    Int(i64),
    /// Floating point key (numeric histogram/terms)
    Float(f64),
    /// Boolean terms key
    Bool(bool),
    /// Keyword terms key
    Str(String),
}

impl BucketKey {
    /// Read a bucket key from a raw response value
    ///
    /// Returns `None` for null, arrays and objects, which are never valid keys.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n
                .as_i64()
                .map(BucketKey::Int)
                .or_else(|| n.as_f64().map(BucketKey::Float)),
            Value::String(s) => Some(BucketKey::Str(s.clone())),
            Value::Bool(b) => Some(BucketKey::Bool(*b)),
            _ => None,
        }
    }

    /// Key as an integer timestamp, when it is one
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            BucketKey::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BucketKey::Int(v) => write!(f, "{}", v),
            BucketKey::Float(v) => write!(f, "{}", v),
            BucketKey::Bool(v) => write!(f, "{}", v),
            BucketKey::Str(v) => write!(f, "{}", v),
        }
    }
}

impl From<i64> for BucketKey {
    fn from(v: i64) -> Self {
        BucketKey::Int(v)
    }
}

impl From<&str> for BucketKey {
    fn from(v: &str) -> Self {
        BucketKey::Str(v.to_string())
    }
}

/// One `[key, value]` entry of an output series
///
/// A `None` value is the explicit absent-value marker: the bucket exists but
/// the metric has no value for it. It serializes as `null` so positions stay
/// aligned with the time buckets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint(pub BucketKey, pub Option<f64>);

impl DataPoint {
    /// Create a new data point
    pub fn new(key: BucketKey, value: Option<f64>) -> Self {
        Self(key, value)
    }

    /// Bucket key
    #[inline]
    pub fn key(&self) -> &BucketKey {
        &self.0
    }

    /// Value, `None` when absent
    #[inline]
    pub fn value(&self) -> Option<f64> {
        self.1
    }
}

/// One output series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    /// Split identifier (`<series id>` or `<series id>:<split key>`)
    pub id: String,

    /// Display label
    pub label: String,

    /// One entry per time bucket, in bucket order
    pub data: Vec<DataPoint>,

    /// Series colour, when the split carries one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    /// Id of the row this row's area is filled against (band rendering)
    #[serde(default, rename = "fillBetween", skip_serializing_if = "Option::is_none")]
    pub fill_between: Option<String>,
}

impl ResultRow {
    /// Create a row with id, label and data
    pub fn new(id: impl Into<String>, label: impl Into<String>, data: Vec<DataPoint>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            data,
            color: None,
            fill_between: None,
        }
    }

    /// Set the row colour
    pub fn with_color(mut self, color: Option<String>) -> Self {
        self.color = color;
        self
    }

    /// Fill this row's area against another row
    pub fn with_fill_between(mut self, id: impl Into<String>) -> Self {
        self.fill_between = Some(id.into());
        self
    }
}

/// Append-only list of result rows for one pipeline pass
///
/// Processors can only add rows; the order of the list is the order in which
/// processors appended them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultRows(Vec<ResultRow>);

impl ResultRows {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one row
    pub fn push(&mut self, row: ResultRow) {
        self.0.push(row);
    }

    /// Append rows in iteration order
    pub fn extend<I>(&mut self, rows: I)
    where
        I: IntoIterator<Item = ResultRow>,
    {
        self.0.extend(rows);
    }

    /// Number of rows
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if no rows were appended
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate rows in append order
    pub fn iter(&self) -> std::slice::Iter<'_, ResultRow> {
        self.0.iter()
    }

    /// Borrow the rows as a slice
    pub fn as_slice(&self) -> &[ResultRow] {
        &self.0
    }

    /// Consume the accumulator
    pub fn into_inner(self) -> Vec<ResultRow> {
        self.0
    }
}

impl From<Vec<ResultRow>> for ResultRows {
    fn from(rows: Vec<ResultRow>) -> Self {
        Self(rows)
    }
}

impl<'a> IntoIterator for &'a ResultRows {
    type Item = &'a ResultRow;
    type IntoIter = std::slice::Iter<'a, ResultRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
