//! Identifiers, versions, UUIDs and remote errors

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Value as Json};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

const UUID_MAGIC: &str = "uuid";
const NAMED_UUID_MAGIC: &str = "named-uuid";
const UUID_LEN: usize = 36;

/// An OVSDB `<id>`: a string matching `[a-zA-Z_][a-zA-Z0-9_]*`.
///
/// Ids starting with `_` are reserved to the server (`_uuid`, `_version`)
/// but are still valid when they appear in rows or column lists.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Id(String);

impl Id {
    /// Validate and wrap an identifier
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if is_identifier(&id) {
            Ok(Id(id))
        } else {
            Err(Error::InvalidIdentifier(id))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl TryFrom<String> for Id {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Id::new(value)
    }
}

impl TryFrom<&str> for Id {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        Id::new(value)
    }
}

impl FromStr for Id {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Id::new(s)
    }
}

impl From<Id> for String {
    fn from(id: Id) -> Self {
        id.0
    }
}

impl Borrow<str> for Id {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Id {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A schema version of the form `<major>.<minor>.<patch>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version(String);

impl Version {
    pub fn new(version: impl Into<String>) -> Result<Self> {
        let version = version.into();
        let parts: Vec<&str> = version.split('.').collect();
        let valid = parts.len() == 3
            && parts
                .iter()
                .all(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()));
        if valid {
            Ok(Version(version))
        } else {
            Err(Error::InvalidVersion(version))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric (major, minor, patch) triple
    pub fn parts(&self) -> (u64, u64, u64) {
        let mut it = self.0.split('.').map(|p| p.parse::<u64>().unwrap_or(u64::MAX));
        (
            it.next().unwrap_or_default(),
            it.next().unwrap_or_default(),
            it.next().unwrap_or_default(),
        )
    }
}

impl TryFrom<String> for Version {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Version::new(value)
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A row UUID, on the wire `["uuid", "<36 chars>"]`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Uuid(String);

impl Uuid {
    /// Wrap a 36-character UUID string
    pub fn new(uuid: impl Into<String>) -> Result<Self> {
        let uuid = uuid.into();
        if uuid.len() != UUID_LEN {
            return Err(Error::NotUuid);
        }
        Ok(Uuid(uuid))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse into a `uuid::Uuid`
    pub fn to_uuid(&self) -> Result<uuid::Uuid> {
        uuid::Uuid::parse_str(&self.0).map_err(|_| Error::NotUuid)
    }

    pub fn from_json(value: &Json) -> Result<Self> {
        match tagged_string(value, UUID_MAGIC) {
            Some(s) => Uuid::new(s),
            None => Err(Error::NotUuid),
        }
    }

    pub fn to_json(&self) -> Json {
        json!([UUID_MAGIC, self.0])
    }
}

impl From<uuid::Uuid> for Uuid {
    fn from(uuid: uuid::Uuid) -> Self {
        Uuid(uuid.hyphenated().to_string())
    }
}

impl fmt::Display for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Uuid {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        (UUID_MAGIC, &self.0).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Uuid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = Json::deserialize(deserializer)?;
        Uuid::from_json(&raw).map_err(de::Error::custom)
    }
}

/// A forward reference to a row inserted earlier in the same transaction,
/// on the wire `["named-uuid", "<uuid-name>"]`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NamedUuid(String);

impl NamedUuid {
    pub fn new(name: impl Into<String>) -> Self {
        NamedUuid(name.into())
    }

    /// A fresh name usable as an insert's `uuid-name`
    pub fn generate() -> Self {
        NamedUuid(format!("row{}", uuid::Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn from_json(value: &Json) -> Result<Self> {
        match tagged_string(value, NAMED_UUID_MAGIC) {
            Some(s) => Ok(NamedUuid(s.to_string())),
            None => Err(Error::NotNamedUuid),
        }
    }

    pub fn to_json(&self) -> Json {
        json!([NAMED_UUID_MAGIC, self.0])
    }
}

impl fmt::Display for NamedUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for NamedUuid {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        (NAMED_UUID_MAGIC, &self.0).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for NamedUuid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = Json::deserialize(deserializer)?;
        NamedUuid::from_json(&raw).map_err(de::Error::custom)
    }
}

/// Second element of a `[magic, "<string>"]` pair
fn tagged_string<'a>(value: &'a Json, magic: &str) -> Option<&'a str> {
    match value.as_array().map(Vec::as_slice) {
        Some([Json::String(tag), Json::String(s)]) if tag == magic => Some(s.as_str()),
        _ => None,
    }
}

/// An error reported by the server for one operation of a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteError {
    /// Short string that broadly indicates the class of the error
    pub error: String,
    /// Human readable detail, if the server supplied one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl RemoteError {
    pub fn new(error: impl Into<String>, details: Option<String>) -> Self {
        Self {
            error: error.into(),
            details,
        }
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.details {
            Some(details) => write!(f, "{}({})", self.error, details),
            None => f.write_str(&self.error),
        }
    }
}

impl std::error::Error for RemoteError {}

#[cfg(test)]
mod tests {
    use super::*;

    const UUID: &str = "550e8400-e29b-41d4-a716-446655440000";

    #[test]
    fn test_id_validation() {
        assert!(Id::new("Open_vSwitch").is_ok());
        assert!(Id::new("_uuid").is_ok());
        assert!(Id::new("").is_err());
        assert!(Id::new("1table").is_err());
        assert!(Id::new("bad-name").is_err());
        assert!(serde_json::from_str::<Id>("\"has space\"").is_err());
    }

    #[test]
    fn test_version_validation() {
        let v = Version::new("7.16.1").unwrap();
        assert_eq!(v.parts(), (7, 16, 1));
        assert!(Version::new("7.16").is_err());
        assert!(Version::new("7.x.1").is_err());
        assert!(Version::new("1..2").is_err());
    }

    #[test]
    fn test_uuid_marshal() {
        let uuid = Uuid::new(UUID).unwrap();
        assert_eq!(
            serde_json::to_string(&uuid).unwrap(),
            format!(r#"["uuid","{}"]"#, UUID)
        );
    }

    #[test]
    fn test_uuid_unmarshal() {
        let cases = [
            ("[]", false),
            (r#"["not uuid"]"#, false),
            (r#"["uuid","invalid length"]"#, false),
            (r#"["uuid",1]"#, false),
            (r#"["named-uuid","012345678901234567890123456789012345"]"#, false),
            (r#"["uuid","012345678901234567890123456789012345","extra"]"#, false),
            (r#"["uuid","012345678901234567890123456789012345"]"#, true),
        ];
        for (input, ok) in cases {
            let result = serde_json::from_str::<Uuid>(input);
            assert_eq!(result.is_ok(), ok, "decoding {}", input);
        }
    }

    #[test]
    fn test_uuid_from_uuid_crate() {
        let generated = uuid::Uuid::new_v4();
        let uuid = Uuid::from(generated);
        assert_eq!(uuid.as_str().len(), 36);
        assert_eq!(uuid.to_uuid().unwrap(), generated);
    }

    #[test]
    fn test_named_uuid_marshal() {
        let named = NamedUuid::new("uuid");
        assert_eq!(serde_json::to_string(&named).unwrap(), r#"["named-uuid","uuid"]"#);
    }

    #[test]
    fn test_named_uuid_unmarshal() {
        let cases = [
            ("[]", false),
            (r#"["not named-uuid"]"#, false),
            (r#"["invalid magic","uuid"]"#, false),
            (r#"["named-uuid",1]"#, false),
            (r#"["named-uuid","uuid"]"#, true),
        ];
        for (input, ok) in cases {
            let result = serde_json::from_str::<NamedUuid>(input);
            assert_eq!(result.is_ok(), ok, "decoding {}", input);
        }
    }

    #[test]
    fn test_generated_named_uuid_is_identifier() {
        let named = NamedUuid::generate();
        assert!(Id::new(named.as_str()).is_ok());
        assert_ne!(named, NamedUuid::generate());
    }

    #[test]
    fn test_remote_error_display() {
        let err = RemoteError::new("constraint violation", Some("duplicate name".into()));
        assert_eq!(err.to_string(), "constraint violation(duplicate name)");
        let err: RemoteError = serde_json::from_str(r#"{"error":"timed out"}"#).unwrap();
        assert_eq!(err.details, None);
        assert_eq!(err.to_string(), "timed out");
    }
}
