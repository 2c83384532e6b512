//! Database schema and the column type grammar (RFC 7047 §3.2)
//!
//! Column and base types are tagged unions on the wire: a bare string is
//! an `<atomic-type>`, anything else is decoded as the JSON object form.
//! The branch is chosen by peeking at the token; once chosen, a shape
//! mismatch is reported by the object decoder instead of being coerced.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value as Json;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::set::Set;
use crate::types::{Id, Version};

/// The schema of an OVSDB database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSchema {
    /// Identifies the database as a whole
    pub name: Id,
    /// Version of the database schema
    pub version: Version,
    /// Optional implementation-defined checksum
    #[serde(rename = "cksum", default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    pub tables: BTreeMap<Id, TableSchema>,
}

impl DatabaseSchema {
    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.get(name)
    }
}

/// Columns whose values, taken together within a row, are unique in the table
pub type ColumnSet = Vec<Id>;

/// The schema of a table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    pub columns: BTreeMap<Id, ColumnSchema>,
    /// Maximum number of rows the table may hold
    #[serde(rename = "maxRows", default, skip_serializing_if = "Option::is_none")]
    pub max_rows: Option<u64>,
    /// Rows of a root table are not garbage collected when unreferenced
    #[serde(rename = "isRoot", default)]
    pub is_root: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indexes: Vec<ColumnSet>,
}

impl TableSchema {
    pub fn column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.get(name)
    }
}

fn default_mutable() -> bool {
    true
}

fn is_true(b: &bool) -> bool {
    *b
}

/// The schema of a column
///
/// An omitted `mutable` member decodes as `true`; values built in code
/// take whatever the caller sets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSchema {
    #[serde(rename = "type")]
    pub column_type: AtomicOrJsonColumnType,
    /// Values are not guaranteed to be durable
    #[serde(default)]
    pub ephemeral: bool,
    /// If false, values may not change after the row is inserted
    #[serde(default = "default_mutable", skip_serializing_if = "is_true")]
    pub mutable: bool,
}

/// One of the scalar types of RFC 7047
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AtomicType {
    Integer,
    Real,
    Boolean,
    String,
    Uuid,
}

impl AtomicType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AtomicType::Integer => "integer",
            AtomicType::Real => "real",
            AtomicType::Boolean => "boolean",
            AtomicType::String => "string",
            AtomicType::Uuid => "uuid",
        }
    }
}

impl FromStr for AtomicType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "integer" => Ok(AtomicType::Integer),
            "real" => Ok(AtomicType::Real),
            "boolean" => Ok(AtomicType::Boolean),
            "string" => Ok(AtomicType::String),
            "uuid" => Ok(AtomicType::Uuid),
            other => Err(Error::UnknownAtomicType(other.to_string())),
        }
    }
}

impl fmt::Display for AtomicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for AtomicType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AtomicType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// The type of a column: an atomic type name or a full type object
#[derive(Debug, Clone, PartialEq)]
pub enum AtomicOrJsonColumnType {
    Atomic(AtomicType),
    Json(JsonColumnType),
}

impl AtomicOrJsonColumnType {
    pub fn from_json(value: &Json) -> Result<Self> {
        match value {
            Json::String(s) => s.parse().map(AtomicOrJsonColumnType::Atomic),
            other => Ok(AtomicOrJsonColumnType::Json(JsonColumnType::deserialize(other)?)),
        }
    }

    pub fn is_atomic(&self) -> bool {
        matches!(self, AtomicOrJsonColumnType::Atomic(_))
    }

    /// Type of the key (or of the sole value for non-map columns)
    pub fn key_type(&self) -> AtomicType {
        match self {
            AtomicOrJsonColumnType::Atomic(t) => *t,
            AtomicOrJsonColumnType::Json(json) => json.key.atomic_type(),
        }
    }
}

impl Serialize for AtomicOrJsonColumnType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            AtomicOrJsonColumnType::Atomic(t) => t.serialize(serializer),
            AtomicOrJsonColumnType::Json(json) => json.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for AtomicOrJsonColumnType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = Json::deserialize(deserializer)?;
        AtomicOrJsonColumnType::from_json(&raw).map_err(de::Error::custom)
    }
}

/// The object form of a column type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonColumnType {
    pub key: AtomicOrJsonBaseType,
    /// Present for map columns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<AtomicOrJsonBaseType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<IntOrString>,
}

impl JsonColumnType {
    /// Minimum number of elements, 1 when omitted
    pub fn min(&self) -> u64 {
        self.min.unwrap_or(1)
    }

    /// Maximum number of elements, `None` for "unlimited"; 1 when omitted
    pub fn max(&self) -> Option<u64> {
        match &self.max {
            None => Some(1),
            Some(IntOrString::Int(n)) => u64::try_from(*n).ok(),
            Some(IntOrString::Str(_)) => None,
        }
    }

    pub fn is_map(&self) -> bool {
        self.value.is_some()
    }

    /// A column holding a set rather than exactly one value
    pub fn is_set(&self) -> bool {
        !self.is_map() && (self.min() != 1 || self.max() != Some(1))
    }
}

/// A value that is either an integer or a keyword, e.g. the `max`
/// cardinality which may be `"unlimited"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntOrString {
    Int(i64),
    Str(String),
}

impl IntOrString {
    pub fn from_json(value: &Json) -> Result<Self> {
        match value {
            Json::String(s) => Ok(IntOrString::Str(s.clone())),
            other => Ok(IntOrString::Int(i64::deserialize(other)?)),
        }
    }

    pub fn is_unlimited(&self) -> bool {
        matches!(self, IntOrString::Str(s) if s == "unlimited")
    }
}

impl Serialize for IntOrString {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            IntOrString::Int(n) => serializer.serialize_i64(*n),
            IntOrString::Str(s) => serializer.serialize_str(s),
        }
    }
}

impl<'de> Deserialize<'de> for IntOrString {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = Json::deserialize(deserializer)?;
        IntOrString::from_json(&raw).map_err(de::Error::custom)
    }
}

/// The type of a key or value: an atomic type name or a constrained base type
#[derive(Debug, Clone, PartialEq)]
pub enum AtomicOrJsonBaseType {
    Atomic(AtomicType),
    Json(JsonBaseType),
}

impl AtomicOrJsonBaseType {
    pub fn from_json(value: &Json) -> Result<Self> {
        match value {
            Json::String(s) => s.parse().map(AtomicOrJsonBaseType::Atomic),
            other => Ok(AtomicOrJsonBaseType::Json(JsonBaseType::deserialize(other)?)),
        }
    }

    pub fn atomic_type(&self) -> AtomicType {
        match self {
            AtomicOrJsonBaseType::Atomic(t) => *t,
            AtomicOrJsonBaseType::Json(json) => json.base_type,
        }
    }
}

impl Serialize for AtomicOrJsonBaseType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            AtomicOrJsonBaseType::Atomic(t) => t.serialize(serializer),
            AtomicOrJsonBaseType::Json(json) => json.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for AtomicOrJsonBaseType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = Json::deserialize(deserializer)?;
        AtomicOrJsonBaseType::from_json(&raw).map_err(de::Error::custom)
    }
}

/// Strength of a reference to another table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefType {
    Strong,
    Weak,
}

/// The object form of a base type, with its constraints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonBaseType {
    #[serde(rename = "type")]
    pub base_type: AtomicType,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enumeration: Option<Set>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_integer: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_integer: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_real: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_real: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_table: Option<Id>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_type: Option<RefType>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bridge_schema() -> Json {
        json!({
            "name": "Open_vSwitch",
            "version": "8.3.0",
            "cksum": "3781850481 26690",
            "tables": {
                "Bridge": {
                    "columns": {
                        "name": {"type": "string", "mutable": false},
                        "datapath_id": {"type": {"key": "string", "min": 0, "max": 1}, "ephemeral": true},
                        "ports": {
                            "type": {
                                "key": {"type": "uuid", "refTable": "Port"},
                                "min": 0,
                                "max": "unlimited"
                            }
                        },
                        "fail_mode": {
                            "type": {
                                "key": {"type": "string", "enum": ["set", ["standalone", "secure"]]},
                                "min": 0,
                                "max": 1
                            }
                        },
                        "other_config": {
                            "type": {"key": "string", "value": "string", "min": 0, "max": "unlimited"}
                        }
                    },
                    "indexes": [["name"]]
                },
                "Open_vSwitch": {
                    "columns": {
                        "bridges": {
                            "type": {
                                "key": {"type": "uuid", "refTable": "Bridge", "refType": "strong"},
                                "min": 0,
                                "max": "unlimited"
                            }
                        }
                    },
                    "isRoot": true,
                    "maxRows": 1
                }
            }
        })
    }

    #[test]
    fn test_database_schema_decode() {
        let schema: DatabaseSchema = serde_json::from_value(bridge_schema()).unwrap();
        assert_eq!(schema.name.as_str(), "Open_vSwitch");
        assert_eq!(schema.version.parts(), (8, 3, 0));
        assert_eq!(schema.checksum.as_deref(), Some("3781850481 26690"));

        let root = schema.table("Open_vSwitch").unwrap();
        assert!(root.is_root);
        assert_eq!(root.max_rows, Some(1));

        let bridge = schema.table("Bridge").unwrap();
        assert!(!bridge.is_root);
        assert_eq!(bridge.indexes, vec![vec![Id::new("name").unwrap()]]);
    }

    #[test]
    fn test_mutable_defaults_to_true_on_decode() {
        let schema: DatabaseSchema = serde_json::from_value(bridge_schema()).unwrap();
        let bridge = schema.table("Bridge").unwrap();
        assert!(!bridge.column("name").unwrap().mutable);
        assert!(bridge.column("ports").unwrap().mutable);
        assert!(bridge.column("datapath_id").unwrap().ephemeral);
        assert!(!bridge.column("ports").unwrap().ephemeral);
    }

    #[test]
    fn test_column_type_branches() {
        let schema: DatabaseSchema = serde_json::from_value(bridge_schema()).unwrap();
        let bridge = schema.table("Bridge").unwrap();

        let name = &bridge.column("name").unwrap().column_type;
        assert_eq!(name, &AtomicOrJsonColumnType::Atomic(AtomicType::String));

        let AtomicOrJsonColumnType::Json(ports) = &bridge.column("ports").unwrap().column_type
        else {
            panic!("ports should use the object form");
        };
        assert_eq!(ports.min(), 0);
        assert_eq!(ports.max(), None);
        assert!(ports.max.as_ref().unwrap().is_unlimited());
        assert!(ports.is_set());
        let AtomicOrJsonBaseType::Json(key) = &ports.key else {
            panic!("ports key should use the object form");
        };
        assert_eq!(key.base_type, AtomicType::Uuid);
        assert_eq!(key.ref_table.as_ref().map(Id::as_str), Some("Port"));

        let AtomicOrJsonColumnType::Json(other) =
            &bridge.column("other_config").unwrap().column_type
        else {
            panic!("other_config should use the object form");
        };
        assert!(other.is_map());
        assert_eq!(other.value.as_ref().unwrap().atomic_type(), AtomicType::String);
    }

    #[test]
    fn test_enum_uses_set() {
        let schema: DatabaseSchema = serde_json::from_value(bridge_schema()).unwrap();
        let column = schema.table("Bridge").unwrap().column("fail_mode").unwrap();
        let AtomicOrJsonColumnType::Json(json) = &column.column_type else {
            panic!("fail_mode should use the object form");
        };
        let AtomicOrJsonBaseType::Json(key) = &json.key else {
            panic!("fail_mode key should use the object form");
        };
        assert_eq!(key.enumeration.as_ref().unwrap().len(), 2);
    }

    #[test]
    fn test_int_or_string() {
        assert_eq!(IntOrString::from_json(&json!(5)).unwrap(), IntOrString::Int(5));
        assert!(IntOrString::from_json(&json!("unlimited")).unwrap().is_unlimited());
        assert!(IntOrString::from_json(&json!([1])).is_err());
    }

    #[test]
    fn test_committed_branch_is_not_coerced() {
        assert!(AtomicOrJsonColumnType::from_json(&json!(7)).is_err());
        assert!(AtomicOrJsonColumnType::from_json(&json!({"min": 0})).is_err());
        assert!(matches!(
            AtomicOrJsonColumnType::from_json(&json!("bytes")),
            Err(Error::UnknownAtomicType(_))
        ));
        assert!(AtomicOrJsonBaseType::from_json(&json!({"type": 3})).is_err());
    }

    #[test]
    fn test_constructed_column_keeps_mutable() {
        let column = ColumnSchema {
            column_type: AtomicOrJsonColumnType::Atomic(AtomicType::Integer),
            ephemeral: false,
            mutable: false,
        };
        let encoded = serde_json::to_value(&column).unwrap();
        assert_eq!(encoded, json!({"type": "integer", "ephemeral": false, "mutable": false}));
    }
}
