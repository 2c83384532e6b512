//! OVSDB maps
//!
//! RFC 7047 §5.1: `["map", [[<key>, <value>]...]]`. Unlike a set, a map
//! is always tagged, even with a single pair.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Value as Json};

use crate::error::{Error, Result};
use crate::value::{wire_tag, Value};

const MAP_MAGIC: &str = "map";

/// An ordered sequence of key/value pairs
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Map(Vec<(Value, Value)>);

impl Map {
    pub fn new(pairs: Vec<(Value, Value)>) -> Self {
        Map(pairs)
    }

    pub fn pairs(&self) -> &[(Value, Value)] {
        &self.0
    }

    pub fn into_pairs(self) -> Vec<(Value, Value)> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First value stored under `key`
    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn insert(&mut self, key: impl Into<Value>, value: impl Into<Value>) {
        self.0.push((key.into(), value.into()));
    }

    pub fn from_json(value: &Json) -> Result<Self> {
        if wire_tag(value) != Some(MAP_MAGIC) {
            return Err(Error::NotMap);
        }
        let pairs = value[1].as_array().ok_or(Error::NotMap)?;
        let mut out = Vec::with_capacity(pairs.len());
        for pair in pairs {
            match pair.as_array().map(Vec::as_slice) {
                Some([k, v]) => {
                    let key = Value::from_json(k).map_err(|_| Error::NotMap)?;
                    let value = Value::from_json(v).map_err(|_| Error::NotMap)?;
                    out.push((key, value));
                }
                _ => return Err(Error::NotMap),
            }
        }
        Ok(Map(out))
    }

    pub fn to_json(&self) -> Json {
        let pairs: Vec<Json> = self
            .0
            .iter()
            .map(|(k, v)| json!([k.to_json(), v.to_json()]))
            .collect();
        json!([MAP_MAGIC, pairs])
    }
}

impl<K: Into<Value>, V: Into<Value>> FromIterator<(K, V)> for Map {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Map(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl Serialize for Map {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Map {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = Json::deserialize(deserializer)?;
        Map::from_json(&raw).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_marshal() {
        let cases = [
            (Map::default(), r#"["map",[]]"#),
            (Map::from_iter([("k", "v")]), r#"["map",[["k","v"]]]"#),
            (
                Map::from_iter([("a", 1i64), ("b", 2)]),
                r#"["map",[["a",1],["b",2]]]"#,
            ),
        ];
        for (map, expected) in cases {
            assert_eq!(serde_json::to_string(&map).unwrap(), expected);
        }
    }

    #[test]
    fn test_map_unmarshal() {
        let map: Map = serde_json::from_str(r#"["map",[["k1","v1"],["k2","v2"]]]"#).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(&Value::from("k2")), Some(&Value::from("v2")));
        assert_eq!(map.pairs()[0].0, Value::from("k1"));
    }

    #[test]
    fn test_not_a_map() {
        let cases = [
            json!("k"),
            json!([]),
            json!(["set", []]),
            json!(["map", "x"]),
            json!(["map", [["k"]]]),
            json!(["map", [["k", "v"], "x"]]),
            json!(["map", [["k", "v", "w"]]]),
            json!(["map", [["k", {}]]]),
            json!(["map", [[null, "v"]]]),
        ];
        for case in cases {
            assert!(
                matches!(Map::from_json(&case), Err(Error::NotMap)),
                "decoding {}",
                case
            );
        }
    }
}
