use crate::error::{json_type, Result, StoreError};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A persistent string-keyed map of JSON values.
///
/// Every version is immutable. [`merge`](ImmutableMap::merge) returns a new
/// version and leaves the receiver untouched; unchanged values are shared
/// between versions, only the key table is copied.
///
/// # Cost
///
/// Values sit behind `Arc` and are never cloned by a merge, but the key
/// table is a plain `BTreeMap` that each non-empty merge copies. A merge
/// therefore costs O(n) in the number of top-level keys plus O(k log n) for
/// the k incoming keys. Store state is expected to stay shallow and small;
/// an empty diff is free.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use unicycle::ImmutableMap;
///
/// let before = ImmutableMap::new();
/// let after = before.merge(json!({ "count": 1 })).unwrap();
///
/// assert_eq!(after.get("count"), Some(&json!(1)));
/// assert!(before.get("count").is_none());
/// ```
#[derive(Clone, Default)]
pub struct ImmutableMap {
    entries: Arc<BTreeMap<String, Arc<Value>>>,
}

impl ImmutableMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty map. Same as [`new`](ImmutableMap::new).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Get the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key).map(|value| value.as_ref())
    }

    /// Check whether `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of top-level keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the map has no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate keys in lexicographic order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Iterate entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_ref()))
    }

    /// Shallow-merge a JSON object into a new version of this map.
    ///
    /// Keys in `diff` overwrite keys in `self`; nested objects are replaced
    /// wholesale rather than merged. Fails with [`StoreError::InvalidDiff`]
    /// when `diff` is not an object.
    ///
    /// Copies the key table, see [Cost](ImmutableMap#cost).
    pub fn merge(&self, diff: impl Into<Value>) -> Result<Self> {
        match diff.into() {
            Value::Object(fields) => {
                if fields.is_empty() {
                    return Ok(self.clone());
                }
                let mut entries = BTreeMap::clone(&self.entries);
                for (key, value) in fields {
                    entries.insert(key, Arc::new(value));
                }
                Ok(Self {
                    entries: Arc::new(entries),
                })
            }
            other => Err(StoreError::InvalidDiff {
                found: json_type(&other),
            }),
        }
    }

    /// Shallow-merge another map into a new version of this map.
    pub fn merge_map(&self, diff: &ImmutableMap) -> Self {
        if diff.is_empty() {
            return self.clone();
        }
        let mut entries = BTreeMap::clone(&self.entries);
        for (key, value) in diff.entries.iter() {
            entries.insert(key.clone(), Arc::clone(value));
        }
        Self {
            entries: Arc::new(entries),
        }
    }

    /// Copy the map out as a JSON object.
    pub fn to_value(&self) -> Value {
        Value::Object(
            self.iter()
                .map(|(key, value)| (key.to_string(), value.clone()))
                .collect(),
        )
    }

    /// Check whether two versions share the same key table.
    pub fn ptr_eq(&self, other: &ImmutableMap) -> bool {
        Arc::ptr_eq(&self.entries, &other.entries)
    }
}

impl PartialEq for ImmutableMap {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.entries == other.entries
    }
}

impl std::fmt::Debug for ImmutableMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl Serialize for ImmutableMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl From<Map<String, Value>> for ImmutableMap {
    fn from(fields: Map<String, Value>) -> Self {
        Self {
            entries: Arc::new(
                fields
                    .into_iter()
                    .map(|(key, value)| (key, Arc::new(value)))
                    .collect(),
            ),
        }
    }
}

impl TryFrom<Value> for ImmutableMap {
    type Error = StoreError;

    fn try_from(value: Value) -> Result<Self> {
        ImmutableMap::new().merge(value)
    }
}
