//! OVSDB sets
//!
//! RFC 7047 §5.1: a set is either a single `<atom>`, representing a set
//! with exactly one element, or `["set", [<atom>...]]`.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Value as Json};

use crate::error::{Error, Result};
use crate::value::{wire_tag, Value};

const SET_MAGIC: &str = "set";

/// An ordered OVSDB set
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Set(Vec<Value>);

impl Set {
    pub fn new(values: Vec<Value>) -> Self {
        Set(values)
    }

    pub fn values(&self) -> &[Value] {
        &self.0
    }

    pub fn into_values(self) -> Vec<Value> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.0.iter()
    }

    /// Decode either a bare atom or the tagged `["set", [...]]` form
    pub fn from_json(value: &Json) -> Result<Self> {
        let Some(items) = value.as_array() else {
            return Value::from_json(value)
                .map(|v| Set(vec![v]))
                .map_err(|_| Error::NotSet);
        };
        match wire_tag(value) {
            // a uuid atom is itself an array
            Some("uuid") | Some("named-uuid") => Ok(Set(vec![Value::from_json(value)?])),
            Some(SET_MAGIC) => {
                let elements = items[1].as_array().ok_or(Error::NotSet)?;
                let values = elements
                    .iter()
                    .map(|v| Value::from_json(v).map_err(|_| Error::NotSet))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Set(values))
            }
            _ => Err(Error::NotSet),
        }
    }

    /// Encode, collapsing a 1-element set to its bare atom
    pub fn to_json(&self) -> Json {
        match self.0.as_slice() {
            [single] => single.to_json(),
            values => json!([SET_MAGIC, values.iter().map(Value::to_json).collect::<Vec<_>>()]),
        }
    }
}

impl<V: Into<Value>> FromIterator<V> for Set {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        Set(iter.into_iter().map(Into::into).collect())
    }
}

impl Serialize for Set {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Set {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = Json::deserialize(deserializer)?;
        Set::from_json(&raw).map_err(de::Error::custom)
    }
}

/// A set whose elements are all strings
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StringSet(Vec<String>);

impl StringSet {
    pub fn new(values: Vec<String>) -> Self {
        StringSet(values)
    }

    pub fn values(&self) -> &[String] {
        &self.0
    }

    pub fn into_values(self) -> Vec<String> {
        self.0
    }

    pub fn from_json(value: &Json) -> Result<Self> {
        match value {
            Json::String(s) => Ok(StringSet(vec![s.clone()])),
            Json::Array(items) => {
                if wire_tag(value) != Some(SET_MAGIC) {
                    return Err(Error::NotSet);
                }
                let elements = items[1].as_array().ok_or(Error::NotSet)?;
                let values = elements
                    .iter()
                    .map(|e| e.as_str().map(str::to_string).ok_or(Error::NotStringSet))
                    .collect::<Result<Vec<_>>>()?;
                Ok(StringSet(values))
            }
            _ => Err(Error::NotStringSet),
        }
    }

    pub fn to_json(&self) -> Json {
        match self.0.as_slice() {
            [single] => Json::String(single.clone()),
            values => json!([SET_MAGIC, values]),
        }
    }
}

impl From<StringSet> for Set {
    fn from(set: StringSet) -> Self {
        set.0.into_iter().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for StringSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        StringSet(iter.into_iter().map(Into::into).collect())
    }
}

impl Serialize for StringSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for StringSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = Json::deserialize(deserializer)?;
        StringSet::from_json(&raw).map_err(de::Error::custom)
    }
}
