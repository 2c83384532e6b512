//! Protocol core for OVSDB (RFC 7047) clients
//!
//! # Modules
//!
//! - `error`: Error types and Result alias
//! - `types`: Identifiers, versions, UUIDs and remote operation errors
//! - `value`: The recursive wire value model (atoms, sets, maps, rows)
//! - `set` / `map`: Tagged-array codecs for OVSDB sets and maps
//! - `schema`: Database schema and the column type grammar
//! - `operation`: Transaction operations, conditions and mutations
//! - `result`: Decoding of `transact` replies
//! - `update`: Monitor requests and table update notifications

pub mod error;
pub mod map;
pub mod operation;
pub mod result;
pub mod schema;
pub mod set;
pub mod types;
pub mod update;
pub mod value;

// Re-exports
pub use error::{Error, Result};
pub use map::Map;
pub use operation::{
    AbortOperation, AssertOperation, CommentOperation, CommitOperation, Condition,
    DeleteOperation, Function, InsertOperation, MutateOperation, Mutation, Mutator, Operation,
    OperationKind, SelectOperation, UpdateOperation, WaitOperation, WaitUntil,
};
pub use result::{CountResult, InsertResult, OperationResult, ResultErrors, SelectResult, TransactResult};
pub use schema::{
    AtomicOrJsonBaseType, AtomicOrJsonColumnType, AtomicType, ColumnSchema, ColumnSet,
    DatabaseSchema, IntOrString, JsonBaseType, JsonColumnType, RefType, TableSchema,
};
pub use set::{Set, StringSet};
pub use types::{Id, NamedUuid, RemoteError, Uuid, Version};
pub use update::{
    MonitorRequest, MonitorRequests, MonitorSelect, RowChange, RowUpdate, TableUpdate,
    TableUpdates,
};
pub use value::{Row, Value};
