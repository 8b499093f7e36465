//! Typed views over bucket aggregation nodes

use serde_json::{Map, Value};

use super::{dotted, lookup_in};
use crate::error::ResponseError;
use crate::types::BucketKey;

/// One slot of a bucket aggregation (date histogram, terms, filters)
///
/// Keeps the raw node so metric sub-aggregations can be looked up lazily.
#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    /// Bucket key (epoch millis for date histograms)
    pub key: BucketKey,

    /// Formatted key, when the engine provides one
    pub key_as_string: Option<String>,

    /// Number of documents in the bucket
    pub doc_count: Option<u64>,

    node: Map<String, Value>,
}

impl Bucket {
    /// Parse a bucket node; `path` is used for error reporting only
    pub fn from_node(node: &Value, path: &str) -> Result<Self, ResponseError> {
        let object = node
            .as_object()
            .ok_or_else(|| ResponseError::shape(path, "a bucket object"))?;
        let key = object
            .get("key")
            .ok_or_else(|| ResponseError::missing(format!("{}.key", path)))
            .and_then(|key| {
                BucketKey::from_value(key)
                    .ok_or_else(|| ResponseError::shape(format!("{}.key", path), "a scalar key"))
            })?;

        Ok(Self::with_key(key, object.clone()))
    }

    /// Build a bucket with an explicit key (keyed `filters` buckets have none)
    pub fn with_key(key: BucketKey, node: Map<String, Value>) -> Self {
        let key_as_string = node
            .get("key_as_string")
            .and_then(Value::as_str)
            .map(str::to_string);
        let doc_count = node.get("doc_count").and_then(Value::as_u64);

        Self {
            key,
            key_as_string,
            doc_count,
            node,
        }
    }

    /// Child node by aggregation id
    pub fn child(&self, id: &str) -> Option<&Value> {
        self.node.get(id)
    }

    /// Nested lookup below this bucket
    pub fn lookup(&self, path: &[&str]) -> Option<&Value> {
        lookup_in(&self.node, path)
    }

    /// The raw bucket node
    pub fn node(&self) -> &Map<String, Value> {
        &self.node
    }
}

/// Ordered date histogram buckets of one split
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeseries {
    /// Buckets in response (time) order
    pub buckets: Vec<Bucket>,
}

impl Timeseries {
    /// Parse the `timeseries` child of a split node
    ///
    /// `parent_path` is the dotted path of the split node. A missing `timeseries`
    /// node or a `buckets` entry that is not an array is a malformed response.
    pub fn from_parent(parent: &Map<String, Value>, parent_path: &str) -> Result<Self, ResponseError> {
        let path = dotted(&[parent_path, "timeseries"]);
        let node = parent
            .get("timeseries")
            .ok_or_else(|| ResponseError::missing(path.clone()))?;
        Self::from_node(node, &path)
    }

    /// Parse a date histogram node (`{ "buckets": [...] }`)
    pub fn from_node(node: &Value, path: &str) -> Result<Self, ResponseError> {
        let buckets_path = dotted(&[path, "buckets"]);
        let raw = node
            .as_object()
            .ok_or_else(|| ResponseError::shape(path, "an object"))?
            .get("buckets")
            .ok_or_else(|| ResponseError::missing(buckets_path.clone()))?
            .as_array()
            .ok_or_else(|| ResponseError::shape(buckets_path.clone(), "an array"))?;

        let buckets = raw
            .iter()
            .enumerate()
            .map(|(i, b)| Bucket::from_node(b, &format!("{}[{}]", buckets_path, i)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { buckets })
    }

    /// Number of buckets
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Check if there are no buckets
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bucket_from_node() {
        let node = json!({"key": 1000, "key_as_string": "2024-01-01", "doc_count": 3, "m1": {"value": 2.0}});
        let bucket = Bucket::from_node(&node, "b").unwrap();

        assert_eq!(bucket.key, BucketKey::Int(1000));
        assert_eq!(bucket.key_as_string.as_deref(), Some("2024-01-01"));
        assert_eq!(bucket.doc_count, Some(3));
        assert_eq!(bucket.lookup(&["m1", "value"]), Some(&json!(2.0)));
        assert!(bucket.child("m2").is_none());
    }

    #[test]
    fn test_bucket_without_key_is_malformed() {
        let err = Bucket::from_node(&json!({"doc_count": 1}), "ts.buckets[0]").unwrap_err();
        assert_eq!(err, ResponseError::missing("ts.buckets[0].key"));

        let err = Bucket::from_node(&json!({"key": null}), "ts.buckets[0]").unwrap_err();
        assert!(matches!(err, ResponseError::UnexpectedShape { .. }));

        let err = Bucket::from_node(&json!([1, 2]), "ts.buckets[0]").unwrap_err();
        assert!(matches!(err, ResponseError::UnexpectedShape { .. }));
    }

    #[test]
    fn test_timeseries_preserves_order() {
        let parent = json!({"timeseries": {"buckets": [{"key": 3}, {"key": 1}, {"key": 2}]}});
        let ts = Timeseries::from_parent(parent.as_object().unwrap(), "aggregations.s1").unwrap();
        let keys: Vec<i64> = ts.buckets.iter().filter_map(|b| b.key.as_i64()).collect();
        assert_eq!(keys, vec![3, 1, 2]);
        assert_eq!(ts.len(), 3);
    }

    #[test]
    fn test_timeseries_missing_or_malformed() {
        let parent = json!({"other": {}});
        let err = Timeseries::from_parent(parent.as_object().unwrap(), "aggregations.s1").unwrap_err();
        assert_eq!(err, ResponseError::missing("aggregations.s1.timeseries"));

        let parent = json!({"timeseries": {"buckets": {"a": {}}}});
        let err = Timeseries::from_parent(parent.as_object().unwrap(), "aggregations.s1").unwrap_err();
        assert_eq!(
            err,
            ResponseError::shape("aggregations.s1.timeseries.buckets", "an array")
        );
    }

    #[test]
    fn test_timeseries_empty_buckets() {
        let ts = Timeseries::from_node(&json!({"buckets": []}), "ts").unwrap();
        assert!(ts.is_empty());
    }
}
