//! Canonical query keys.
//!
//! A key is an ordered list of segments. Each segment is either a primitive
//! (null, bool, number, string) or a flat record whose values are primitives.
//! Records are canonicalised with their properties sorted, so two keys built
//! from the same data in a different property order are equal.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::QueryError;

#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "Vec<Value>", into = "Vec<Value>")]
pub struct QueryKey {
    segments: Vec<Value>,
    parts: Vec<String>,
    canonical: String,
}

impl QueryKey {
    /// Single-segment key, e.g. `["events"]`.
    pub fn root(name: &str) -> Self {
        let segment = Value::String(name.to_string());
        let part = canonical_segment(&segment);
        Self {
            canonical: format!("[{}]", part),
            segments: vec![segment],
            parts: vec![part],
        }
    }

    pub fn from_segments(segments: Vec<Value>) -> Result<Self, QueryError> {
        let segments = segments
            .into_iter()
            .enumerate()
            .map(|(index, segment)| normalize_segment(index, segment))
            .collect::<Result<Vec<_>, _>>()?;
        let parts: Vec<String> = segments.iter().map(canonical_segment).collect();
        Ok(Self {
            canonical: format!("[{}]", parts.join(",")),
            segments,
            parts,
        })
    }

    /// Append one segment, serialising it first.
    pub fn join<S: Serialize>(&self, segment: S) -> Result<Self, QueryError> {
        let value = serde_json::to_value(segment).map_err(|e| {
            QueryError::Encoding(format!(
                "segment {} is not serializable: {}",
                self.segments.len(),
                e
            ))
        })?;
        let mut segments = self.segments.clone();
        segments.push(value);
        Self::from_segments(segments)
    }

    pub fn segments(&self) -> &[Value] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Canonical serialised form, identical for structurally equal keys.
    pub fn as_str(&self) -> &str {
        &self.canonical
    }

    /// True when `self` is an equal or strict prefix of `other`.
    pub fn covers(&self, other: &QueryKey) -> bool {
        self.parts.len() <= other.parts.len()
            && self.parts.iter().zip(&other.parts).all(|(a, b)| a == b)
    }
}

fn normalize_segment(index: usize, segment: Value) -> Result<Value, QueryError> {
    match segment {
        Value::Array(_) => Err(QueryError::Encoding(format!(
            "segment {} is an array; only primitives and flat records are allowed",
            index
        ))),
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            for (name, value) in &entries {
                if value.is_array() || value.is_object() {
                    return Err(QueryError::Encoding(format!(
                        "property `{}` of segment {} is not a primitive",
                        name, index
                    )));
                }
            }
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Ok(Value::Object(entries.into_iter().collect::<Map<_, _>>()))
        }
        primitive => Ok(primitive),
    }
}

/// Serialise one segment with record properties in sorted order, independent
/// of how the underlying map orders its entries.
fn canonical_segment(segment: &Value) -> String {
    match segment {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let body: Vec<String> = entries
                .into_iter()
                .map(|(name, value)| format!("{}:{}", Value::String(name.clone()), value))
                .collect();
            format!("{{{}}}", body.join(","))
        }
        other => other.to_string(),
    }
}

impl TryFrom<Vec<Value>> for QueryKey {
    type Error = QueryError;

    fn try_from(segments: Vec<Value>) -> Result<Self, Self::Error> {
        Self::from_segments(segments)
    }
}

impl From<QueryKey> for Vec<Value> {
    fn from(key: QueryKey) -> Self {
        key.segments
    }
}

impl PartialEq for QueryKey {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for QueryKey {}

impl Hash for QueryKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}

impl fmt::Debug for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QueryKey({})", self.canonical)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_order_does_not_matter() {
        let mut first = Map::new();
        first.insert("searchTerm".into(), json!("camp"));
        first.insert("max".into(), json!(3));
        let mut second = Map::new();
        second.insert("max".into(), json!(3));
        second.insert("searchTerm".into(), json!("camp"));

        let a = QueryKey::from_segments(vec![json!("events"), Value::Object(first)]).unwrap();
        let b = QueryKey::from_segments(vec![json!("events"), Value::Object(second)]).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), r#"["events",{"max":3,"searchTerm":"camp"}]"#);
    }

    #[test]
    fn test_root_matches_from_segments() {
        let root = QueryKey::root("events");
        let built = QueryKey::from_segments(vec![json!("events")]).unwrap();
        assert_eq!(root, built);
        assert_eq!(root.to_string(), r#"["events"]"#);
    }

    #[test]
    fn test_string_and_number_ids_differ() {
        let events = QueryKey::root("events");
        assert_ne!(events.join("1").unwrap(), events.join(1).unwrap());
    }

    #[test]
    fn test_covers_prefix() {
        let events = QueryKey::root("events");
        let detail = events.join("e1").unwrap();
        let list = events.join(json!({ "max": 3 })).unwrap();
        let images = QueryKey::root("events-images");

        assert!(events.covers(&events));
        assert!(events.covers(&detail));
        assert!(events.covers(&list));
        assert!(!detail.covers(&events));
        assert!(!events.covers(&images));
    }

    #[test]
    fn test_nested_segments_are_rejected() {
        let events = QueryKey::root("events");
        assert!(matches!(
            events.join(json!([1, 2])),
            Err(QueryError::Encoding(_))
        ));
        assert!(matches!(
            events.join(json!({ "filter": { "max": 3 } })),
            Err(QueryError::Encoding(_))
        ));
    }

    #[test]
    fn test_serde_round_trip_keeps_identity() {
        let key = QueryKey::root("events").join(json!({ "b": 1, "a": null })).unwrap();
        let text = serde_json::to_string(&key).unwrap();
        let back: QueryKey = serde_json::from_str(&text).unwrap();
        assert_eq!(key, back);
    }
}
