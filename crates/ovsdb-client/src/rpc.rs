//! The OVSDB methods (RFC 7047 §4.1) as typed calls on a [`Session`]

use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError};
use tracing::debug;

use ovsdb_core::{
    DatabaseSchema, Id, MonitorRequests, Operation, Result, TableUpdates, TransactResult,
};

use crate::session::Session;

#[derive(Debug, Deserialize)]
struct LockReply {
    locked: bool,
}

impl Session {
    /// Names of the databases the server holds
    pub async fn list_dbs(&self) -> Result<Vec<Id>> {
        self.call_typed("list_dbs", json!([])).await
    }

    /// Fetch the schema of `db` and cache it on the session
    pub async fn get_schema(&self, db: &str) -> Result<Arc<DatabaseSchema>> {
        let schema: DatabaseSchema = self.call_typed("get_schema", json!([db])).await?;
        let schema = Arc::new(schema);
        debug!("Cached schema {} version {}", db, schema.version);
        self.shared()
            .schemas
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(db.to_string(), Arc::clone(&schema));
        Ok(schema)
    }

    /// The schema last fetched for `db`, without contacting the server
    pub fn cached_schema(&self, db: &str) -> Option<Arc<DatabaseSchema>> {
        self.shared()
            .schemas
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(db)
            .cloned()
    }

    /// Every cached schema, keyed by database name
    pub fn cached_schemas(&self) -> HashMap<String, Arc<DatabaseSchema>> {
        self.shared()
            .schemas
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Run `operations` as one transaction on `db`.
    ///
    /// Every operation is encoded before anything is sent, so an invalid
    /// operation fails the whole call without contacting the server.
    /// Operations the server rejected are reported in the returned
    /// [`TransactResult`], not as an `Err`.
    pub async fn transact(&self, db: &str, operations: &[Operation]) -> Result<TransactResult> {
        if operations.is_empty() {
            return Ok(TransactResult::default());
        }

        let mut params = Vec::with_capacity(operations.len() + 1);
        params.push(Value::String(db.to_string()));
        for operation in operations {
            params.push(operation.to_json()?);
        }

        let reply = self.call("transact", Value::Array(params)).await?;
        TransactResult::from_reply(&reply, operations.len())
    }

    /// Start monitoring `db`.
    ///
    /// Returns the initial contents; later changes arrive as `update`
    /// notifications carrying `value`.
    pub async fn monitor(&self, db: &str, value: Value, requests: &MonitorRequests) -> Result<TableUpdates> {
        let requests = serde_json::to_value(requests)?;
        self.call_typed("monitor", json!([db, value, requests])).await
    }

    /// Stop the monitor started with `value`
    pub async fn monitor_cancel(&self, value: Value) -> Result<()> {
        self.call("monitor_cancel", json!([value])).await?;
        Ok(())
    }

    /// Request the lock `id`. Returns true if it was granted right away;
    /// otherwise a `locked` notification follows once it is.
    pub async fn lock(&self, id: &Id) -> Result<bool> {
        let reply: LockReply = self.call_typed("lock", json!([id])).await?;
        Ok(reply.locked)
    }

    /// Take the lock `id` from its current owner, who is sent `stolen`
    pub async fn steal(&self, id: &Id) -> Result<()> {
        self.call("steal", json!([id])).await?;
        Ok(())
    }

    /// Release the lock `id`
    pub async fn unlock(&self, id: &Id) -> Result<()> {
        self.call("unlock", json!([id])).await?;
        Ok(())
    }

    /// Ask the server to echo `args` back
    pub async fn echo(&self, args: Value) -> Result<Value> {
        self.call("echo", args).await
    }
}
