//! ovsdb-client: asynchronous OVSDB (RFC 7047) JSON-RPC client
//!
//! This crate provides:
//! - JSON-RPC 1.0 framing over TCP and Unix sockets
//! - `Session`: concurrent calls over one connection, with a dispatch task
//!   answering `echo` and routing `update`/`locked`/`stolen` notifications
//! - Typed wrappers for every OVSDB method (transact, monitor, locks, ...)
//!
//! The value model, schema and operation types live in `ovsdb-core` and
//! are re-exported as `ovsdb_client::core`.

pub mod codec;
pub mod config;
pub mod notification;
pub mod protocol;
pub mod registry;
mod rpc;
pub mod session;

pub use ovsdb_core as core;

pub use config::{Address, ClientConfig};
pub use notification::{HandlerFns, NoopHandler, Notification, NotificationHandler};
pub use registry::{ConnectionId, SessionRegistry};
pub use session::{Session, SessionState};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::config::{Address, ClientConfig};
    pub use super::notification::{HandlerFns, NotificationHandler};
    pub use super::registry::SessionRegistry;
    pub use super::session::{Session, SessionState};
    pub use ovsdb_core::{
        Condition, Error, Function, Id, InsertOperation, MonitorRequest, MonitorRequests,
        MutateOperation, Mutation, Mutator, Operation, Result, Row, SelectOperation, TableUpdates,
        TransactResult, UpdateOperation, Value,
    };
}
