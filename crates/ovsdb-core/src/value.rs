//! The OVSDB value model
//!
//! A [`Value`] is either a scalar atom or one of the tagged wire forms
//! (`uuid`, `named-uuid`, `set`, `map`). Decoding peeks at the raw JSON
//! token and dispatches on its shape; anything outside the grammar of
//! RFC 7047 §5.1 is rejected rather than kept as loose JSON.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value as Json;
use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::map::Map;
use crate::set::Set;
use crate::types::{Id, NamedUuid, Uuid};

/// A row: column name to value
pub type Row = BTreeMap<Id, Value>;

/// A column value as it appears on the wire
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Integer(i64),
    Real(f64),
    Boolean(bool),
    Uuid(Uuid),
    NamedUuid(NamedUuid),
    Set(Set),
    Map(Map),
}

/// Encode a row as a JSON object of column name to wire value
pub fn row_to_json(row: &Row) -> Json {
    Json::Object(
        row.iter()
            .map(|(column, value)| (column.to_string(), value.to_json()))
            .collect(),
    )
}

/// Tag of a 2-element tagged array such as `["set", [...]]`
pub(crate) fn wire_tag(value: &Json) -> Option<&str> {
    match value.as_array().map(Vec::as_slice) {
        Some([Json::String(tag), _]) => Some(tag.as_str()),
        _ => None,
    }
}

impl Value {
    /// Decode a wire value
    pub fn from_json(value: &Json) -> Result<Self> {
        match value {
            Json::String(s) => Ok(Value::String(s.clone())),
            Json::Bool(b) => Ok(Value::Boolean(*b)),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Ok(Value::Integer(i)),
                None => n
                    .as_f64()
                    .map(Value::Real)
                    .ok_or_else(|| Error::malformed(format!("unrepresentable number {}", n))),
            },
            Json::Array(_) => match wire_tag(value) {
                Some("uuid") => Uuid::from_json(value).map(Value::Uuid),
                Some("named-uuid") => NamedUuid::from_json(value).map(Value::NamedUuid),
                Some("set") => Set::from_json(value).map(Value::Set),
                Some("map") => Map::from_json(value).map(Value::Map),
                _ => Err(Error::malformed(format!("untagged array {}", value))),
            },
            Json::Null | Json::Object(_) => {
                Err(Error::malformed(format!("not an OVSDB value: {}", value)))
            }
        }
    }

    /// Encode to wire form
    pub fn to_json(&self) -> Json {
        match self {
            Value::String(s) => Json::String(s.clone()),
            Value::Integer(i) => Json::from(*i),
            Value::Real(r) => Json::from(*r),
            Value::Boolean(b) => Json::Bool(*b),
            Value::Uuid(u) => u.to_json(),
            Value::NamedUuid(n) => n.to_json(),
            Value::Set(s) => s.to_json(),
            Value::Map(m) => m.to_json(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Real(r) => Some(*r),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_uuid(&self) -> Option<&Uuid> {
        match self {
            Value::Uuid(u) => Some(u),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// View this value as a set.
    ///
    /// A set column holding exactly one element arrives as the bare atom,
    /// so any non-set value is returned as a 1-element set.
    pub fn to_set(&self) -> Set {
        match self {
            Value::Set(s) => s.clone(),
            other => Set::new(vec![other.clone()]),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = Json::deserialize(deserializer)?;
        Value::from_json(&raw).map_err(de::Error::custom)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(r: f64) -> Self {
        Value::Real(r)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<Uuid> for Value {
    fn from(u: Uuid) -> Self {
        Value::Uuid(u)
    }
}

impl From<NamedUuid> for Value {
    fn from(n: NamedUuid) -> Self {
        Value::NamedUuid(n)
    }
}

impl From<Set> for Value {
    fn from(s: Set) -> Self {
        Value::Set(s)
    }
}

impl From<Map> for Value {
    fn from(m: Map) -> Self {
        Value::Map(m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_dispatch() {
        assert_eq!(Value::from_json(&json!("a")).unwrap(), Value::from("a"));
        assert_eq!(Value::from_json(&json!(7)).unwrap(), Value::Integer(7));
        assert_eq!(Value::from_json(&json!(0.5)).unwrap(), Value::Real(0.5));
        assert_eq!(Value::from_json(&json!(true)).unwrap(), Value::Boolean(true));
    }

    #[test]
    fn test_tagged_dispatch() {
        let uuid = json!(["uuid", "550e8400-e29b-41d4-a716-446655440000"]);
        assert!(matches!(Value::from_json(&uuid).unwrap(), Value::Uuid(_)));

        let named = json!(["named-uuid", "row1"]);
        assert!(matches!(Value::from_json(&named).unwrap(), Value::NamedUuid(_)));

        let set = json!(["set", [1, 2]]);
        assert!(matches!(Value::from_json(&set).unwrap(), Value::Set(_)));

        let map = json!(["map", [["k", "v"]]]);
        assert!(matches!(Value::from_json(&map).unwrap(), Value::Map(_)));
    }

    #[test]
    fn test_rejects_loose_json() {
        assert!(Value::from_json(&json!(null)).is_err());
        assert!(Value::from_json(&json!({"a": 1})).is_err());
        assert!(Value::from_json(&json!(["bogus", 1])).is_err());
        assert!(Value::from_json(&json!([1, 2, 3])).is_err());
    }

    #[test]
    fn test_row_decode() {
        let row: Row = serde_json::from_value(json!({
            "name": "br0",
            "ports": ["set", [["uuid", "550e8400-e29b-41d4-a716-446655440000"]]],
            "external_ids": ["map", []]
        }))
        .unwrap();
        assert_eq!(row[&Id::new("name").unwrap()], Value::from("br0"));
        assert_eq!(row[&Id::new("ports").unwrap()].to_set().len(), 1);
    }

    #[test]
    fn test_to_set_of_scalar() {
        let set = Value::from("only").to_set();
        assert_eq!(set.values(), &[Value::from("only")]);
    }
}
