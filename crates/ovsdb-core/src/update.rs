//! Monitor requests and table update notifications (RFC 7047 §4.1.5, §4.1.6)

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

use crate::types::{Id, Uuid};
use crate::value::Row;

fn default_true() -> bool {
    true
}

/// Which classes of change a monitor reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorSelect {
    #[serde(default = "default_true")]
    pub initial: bool,
    #[serde(default = "default_true")]
    pub insert: bool,
    #[serde(default = "default_true")]
    pub delete: bool,
    #[serde(default = "default_true")]
    pub modify: bool,
}

impl MonitorSelect {
    /// Report the initial contents and every change
    pub fn all() -> Self {
        Self {
            initial: true,
            insert: true,
            delete: true,
            modify: true,
        }
    }

    /// Report changes only, without the initial contents
    pub fn changes_only() -> Self {
        Self {
            initial: false,
            ..Self::all()
        }
    }
}

impl Default for MonitorSelect {
    fn default() -> Self {
        Self::all()
    }
}

/// What to monitor in one table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorRequest {
    /// Columns to monitor; every column except `_uuid` when empty
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<Id>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select: Option<MonitorSelect>,
}

impl MonitorRequest {
    pub fn columns(columns: Vec<Id>) -> Self {
        Self {
            columns,
            select: None,
        }
    }

    pub fn with_select(mut self, select: MonitorSelect) -> Self {
        self.select = Some(select);
        self
    }
}

/// Table name to the monitor request for that table
pub type MonitorRequests = BTreeMap<Id, MonitorRequest>;

/// Table name to the changes in that table
pub type TableUpdates = BTreeMap<Id, TableUpdate>;

/// Row UUID to the change of that row.
///
/// The UUIDs are plain JSON object keys here, not `["uuid", ...]` pairs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableUpdate(BTreeMap<Uuid, RowUpdate>);

impl TableUpdate {
    pub fn new(rows: BTreeMap<Uuid, RowUpdate>) -> Self {
        TableUpdate(rows)
    }

    pub fn rows(&self) -> &BTreeMap<Uuid, RowUpdate> {
        &self.0
    }

    pub fn get(&self, uuid: &Uuid) -> Option<&RowUpdate> {
        self.0.get(uuid)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Uuid, &RowUpdate)> {
        self.0.iter()
    }
}

impl Serialize for TableUpdate {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(uuid, update)| (uuid.as_str(), update)))
    }
}

impl<'de> Deserialize<'de> for TableUpdate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = BTreeMap::<String, RowUpdate>::deserialize(deserializer)?;
        let mut rows = BTreeMap::new();
        for (uuid, update) in raw {
            let uuid = Uuid::new(uuid).map_err(<D::Error as de::Error>::custom)?;
            rows.insert(uuid, update);
        }
        Ok(TableUpdate(rows))
    }
}

/// Kind of change a [`RowUpdate`] describes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowChange {
    /// New row (either initial contents or an insert)
    Insert,
    Delete,
    Modify,
}

/// Old and new contents of a changed row.
///
/// `old` is present for deletes and modifications, `new` for initial rows,
/// inserts and modifications.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old: Option<Row>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new: Option<Row>,
}

impl RowUpdate {
    pub fn change(&self) -> Option<RowChange> {
        match (&self.old, &self.new) {
            (None, Some(_)) => Some(RowChange::Insert),
            (Some(_), None) => Some(RowChange::Delete),
            (Some(_), Some(_)) => Some(RowChange::Modify),
            (None, None) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use serde_json::json;

    const UUID: &str = "550e8400-e29b-41d4-a716-446655440000";

    #[test]
    fn test_table_updates_decode() {
        let updates: TableUpdates = serde_json::from_value(json!({
            "Bridge": {
                UUID: {
                    "old": {"name": "br0"},
                    "new": {"name": "br1"}
                }
            }
        }))
        .unwrap();

        let bridge = &updates["Bridge"];
        let row = bridge.get(&Uuid::new(UUID).unwrap()).unwrap();
        assert_eq!(row.change(), Some(RowChange::Modify));
        assert_eq!(row.new.as_ref().unwrap()["name"], Value::from("br1"));
    }

    #[test]
    fn test_row_change_kinds() {
        let insert = RowUpdate {
            new: Some(Row::new()),
            ..Default::default()
        };
        let delete = RowUpdate {
            old: Some(Row::new()),
            ..Default::default()
        };
        assert_eq!(insert.change(), Some(RowChange::Insert));
        assert_eq!(delete.change(), Some(RowChange::Delete));
        assert_eq!(RowUpdate::default().change(), None);
    }

    #[test]
    fn test_row_uuid_keys_must_be_uuids() {
        let result = serde_json::from_value::<TableUpdates>(json!({
            "Bridge": {"short": {"new": {}}}
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_monitor_request_encode() {
        let mut requests = MonitorRequests::new();
        requests.insert(
            Id::new("Bridge").unwrap(),
            MonitorRequest::columns(vec![Id::new("name").unwrap()])
                .with_select(MonitorSelect::changes_only()),
        );
        requests.insert(Id::new("Port").unwrap(), MonitorRequest::default());

        assert_eq!(
            serde_json::to_string(&requests).unwrap(),
            r#"{"Bridge":{"columns":["name"],"select":{"initial":false,"insert":true,"delete":true,"modify":true}},"Port":{}}"#
        );
    }

    #[test]
    fn test_monitor_select_defaults() {
        let select: MonitorSelect = serde_json::from_str(r#"{"initial":false}"#).unwrap();
        assert_eq!(select, MonitorSelect::changes_only());
    }
}
