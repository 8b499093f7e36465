//! Aggregation response boundary types
//!
//! The search engine returns an untyped tree of aggregation nodes. This module
//! validates the parts of that tree the processors depend on and exposes them
//! as typed views:
//!
//! - [`AggregationResponse`]: the `aggregations` mapping of one response
//! - [`Bucket`]: one keyed slot of a bucket aggregation
//! - [`Timeseries`]: the ordered date histogram buckets of a split
//!
//! Everything the processors only read opportunistically (metric values) is
//! looked up with [`lookup_path`], which reports absence as `None`.

mod bucket;

pub use bucket::{Bucket, Timeseries};

use serde_json::{Map, Value};

use crate::error::ResponseError;

/// Name of the top-level node holding aggregation results
pub const AGGREGATIONS: &str = "aggregations";

/// The `aggregations` tree of one search response
///
/// Keys keep response order so split discovery is deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregationResponse {
    aggregations: Map<String, Value>,
}

impl AggregationResponse {
    /// Validate a full search response (`{ "aggregations": { ... } }`)
    pub fn from_value(value: Value) -> Result<Self, ResponseError> {
        let Value::Object(mut root) = value else {
            return Err(ResponseError::shape("", "an object"));
        };

        match root.remove(AGGREGATIONS) {
            Some(Value::Object(aggregations)) => Ok(Self { aggregations }),
            Some(_) => Err(ResponseError::shape(AGGREGATIONS, "an object")),
            None => Err(ResponseError::missing(AGGREGATIONS)),
        }
    }

    /// Wrap a single aggregation node as if it were a whole response
    ///
    /// Used when a processor is handed one bucket of a larger aggregation and
    /// needs to run split discovery over the bucket's children.
    pub fn from_bucket(bucket: Map<String, Value>) -> Self {
        Self {
            aggregations: bucket,
        }
    }

    /// Top-level aggregation node by id
    pub fn aggregation(&self, id: &str) -> Option<&Value> {
        self.aggregations.get(id)
    }

    /// All top-level aggregation nodes in response order
    pub fn aggregations(&self) -> &Map<String, Value> {
        &self.aggregations
    }
}

/// Follow a path of object keys below `node`
///
/// Returns `None` as soon as a segment is absent or the current node is not an
/// object. Never fails: partial responses are expected (for example buckets
/// with no matching documents omit their metric values).
pub fn lookup_path<'a>(node: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter()
        .try_fold(node, |current, segment| current.as_object()?.get(*segment))
}

/// Same as [`lookup_path`] starting from an object
pub fn lookup_in<'a>(node: &'a Map<String, Value>, path: &[&str]) -> Option<&'a Value> {
    let (first, rest) = path.split_first()?;
    lookup_path(node.get(*first)?, rest)
}

/// Join path segments the way error messages report them
pub(crate) fn dotted(segments: &[&str]) -> String {
    segments.join(".")
}
