//! Transaction operations (RFC 7047 §5.2)
//!
//! Encoding an operation doubles as validation: a missing required field
//! or an unknown condition function / mutator fails the whole encode, so
//! nothing reaches the wire. Object members are emitted in protocol order
//! (`op`, `table`, then the operation's body, then optional trailers).

use serde::{de, ser, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Map as JsonMap, Value as Json};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::types::Id;
use crate::value::{row_to_json, Row, Value};

/// The kind of an operation, its `"op"` member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Insert,
    Select,
    Update,
    Mutate,
    Delete,
    Wait,
    Commit,
    Abort,
    Comment,
    Assert,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Insert => "insert",
            OperationKind::Select => "select",
            OperationKind::Update => "update",
            OperationKind::Mutate => "mutate",
            OperationKind::Delete => "delete",
            OperationKind::Wait => "wait",
            OperationKind::Commit => "commit",
            OperationKind::Abort => "abort",
            OperationKind::Comment => "comment",
            OperationKind::Assert => "assert",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A condition function: `<`, `<=`, `==`, `!=`, `>=`, `>`, `includes`, `excludes`
///
/// Tokens outside that set are kept as [`Function::Unknown`] and rejected
/// when the condition is encoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Function {
    Lt,
    Le,
    Eq,
    Ne,
    Ge,
    Gt,
    Includes,
    Excludes,
    Unknown(String),
}

impl Function {
    pub fn as_str(&self) -> &str {
        match self {
            Function::Lt => "<",
            Function::Le => "<=",
            Function::Eq => "==",
            Function::Ne => "!=",
            Function::Ge => ">=",
            Function::Gt => ">",
            Function::Includes => "includes",
            Function::Excludes => "excludes",
            Function::Unknown(s) => s.as_str(),
        }
    }

    pub fn is_valid(&self) -> bool {
        !matches!(self, Function::Unknown(_))
    }
}

impl FromStr for Function {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "<" => Function::Lt,
            "<=" => Function::Le,
            "==" => Function::Eq,
            "!=" => Function::Ne,
            ">=" => Function::Ge,
            ">" => Function::Gt,
            "includes" => Function::Includes,
            "excludes" => Function::Excludes,
            other => Function::Unknown(other.to_string()),
        })
    }
}

impl From<&str> for Function {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(f) => f,
            Err(never) => match never {},
        }
    }
}

/// A mutator: `+=`, `-=`, `*=`, `/=`, `%=`, `insert`, `delete`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Mutator {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Insert,
    Delete,
    Unknown(String),
}

impl Mutator {
    pub fn as_str(&self) -> &str {
        match self {
            Mutator::Add => "+=",
            Mutator::Sub => "-=",
            Mutator::Mul => "*=",
            Mutator::Div => "/=",
            Mutator::Mod => "%=",
            Mutator::Insert => "insert",
            Mutator::Delete => "delete",
            Mutator::Unknown(s) => s.as_str(),
        }
    }

    pub fn is_valid(&self) -> bool {
        !matches!(self, Mutator::Unknown(_))
    }
}

impl FromStr for Mutator {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "+=" => Mutator::Add,
            "-=" => Mutator::Sub,
            "*=" => Mutator::Mul,
            "/=" => Mutator::Div,
            "%=" => Mutator::Mod,
            "insert" => Mutator::Insert,
            "delete" => Mutator::Delete,
            other => Mutator::Unknown(other.to_string()),
        })
    }
}

impl From<&str> for Mutator {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(m) => m,
            Err(never) => match never {},
        }
    }
}

/// Split a `[<column>, <token>, <value>]` triple
fn triple(value: &Json) -> Result<(Id, &str, Value)> {
    match value.as_array().map(Vec::as_slice) {
        Some([Json::String(column), Json::String(token), v]) => {
            Ok((Id::new(column.as_str())?, token.as_str(), Value::from_json(v)?))
        }
        _ => Err(Error::malformed(format!("expected [column, token, value], got {}", value))),
    }
}

/// A test on a column value: `[<column>, <function>, <value>]`
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub column: Id,
    pub function: Function,
    pub value: Value,
}

impl Condition {
    pub fn new(column: Id, function: impl Into<Function>, value: impl Into<Value>) -> Self {
        Self {
            column,
            function: function.into(),
            value: value.into(),
        }
    }

    pub fn to_json(&self) -> Result<Json> {
        if !self.function.is_valid() {
            return Err(Error::InvalidCondition(self.function.as_str().to_string()));
        }
        Ok(json!([self.column.as_str(), self.function.as_str(), self.value.to_json()]))
    }

    pub fn from_json(value: &Json) -> Result<Self> {
        let (column, token, value) = triple(value)?;
        Ok(Self::new(column, token, value))
    }
}

impl Serialize for Condition {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().map_err(<S::Error as ser::Error>::custom)?.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Condition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = Json::deserialize(deserializer)?;
        Condition::from_json(&raw).map_err(de::Error::custom)
    }
}

/// A change to a column value: `[<column>, <mutator>, <value>]`
#[derive(Debug, Clone, PartialEq)]
pub struct Mutation {
    pub column: Id,
    pub mutator: Mutator,
    pub value: Value,
}

impl Mutation {
    pub fn new(column: Id, mutator: impl Into<Mutator>, value: impl Into<Value>) -> Self {
        Self {
            column,
            mutator: mutator.into(),
            value: value.into(),
        }
    }

    pub fn to_json(&self) -> Result<Json> {
        if !self.mutator.is_valid() {
            return Err(Error::InvalidMutation(self.mutator.as_str().to_string()));
        }
        Ok(json!([self.column.as_str(), self.mutator.as_str(), self.value.to_json()]))
    }

    pub fn from_json(value: &Json) -> Result<Self> {
        let (column, token, value) = triple(value)?;
        Ok(Self::new(column, token, value))
    }
}

impl Serialize for Mutation {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().map_err(<S::Error as ser::Error>::custom)?.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Mutation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = Json::deserialize(deserializer)?;
        Mutation::from_json(&raw).map_err(de::Error::custom)
    }
}

// ============================================================================
// Encoding helpers
// ============================================================================

fn begin(kind: OperationKind) -> JsonMap<String, Json> {
    let mut obj = JsonMap::new();
    obj.insert("op".into(), json!(kind.as_str()));
    obj
}

fn require_table(kind: OperationKind, table: &Option<Id>) -> Result<Json> {
    table
        .as_ref()
        .map(|t| json!(t.as_str()))
        .ok_or_else(|| Error::missing(kind.as_str(), "table"))
}

fn require_where(kind: OperationKind, conditions: &[Condition]) -> Result<Json> {
    if conditions.is_empty() {
        return Err(Error::missing(kind.as_str(), "where"));
    }
    conditions
        .iter()
        .map(Condition::to_json)
        .collect::<Result<Vec<_>>>()
        .map(Json::Array)
}

fn columns_json(columns: &[Id]) -> Json {
    Json::Array(columns.iter().map(|c| json!(c.as_str())).collect())
}

// ============================================================================
// Operations
// ============================================================================

/// Insert `row` into `table`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InsertOperation {
    pub table: Option<Id>,
    /// Required, but may be empty
    pub row: Option<Row>,
    /// Name by which later operations can refer to the new row
    pub uuid_name: Option<Id>,
}

impl InsertOperation {
    const KIND: OperationKind = OperationKind::Insert;

    pub fn new(table: Id, row: Row) -> Self {
        Self {
            table: Some(table),
            row: Some(row),
            uuid_name: None,
        }
    }

    pub fn with_uuid_name(mut self, name: Id) -> Self {
        self.uuid_name = Some(name);
        self
    }

    pub fn op(&self) -> OperationKind {
        Self::KIND
    }

    pub fn to_json(&self) -> Result<Json> {
        let table = require_table(Self::KIND, &self.table)?;
        let row = self
            .row
            .as_ref()
            .ok_or_else(|| Error::missing(Self::KIND.as_str(), "row"))?;

        let mut obj = begin(Self::KIND);
        obj.insert("table".into(), table);
        obj.insert("row".into(), row_to_json(row));
        if let Some(name) = &self.uuid_name {
            obj.insert("uuid-name".into(), json!(name.as_str()));
        }
        Ok(Json::Object(obj))
    }
}

/// Select rows of `table` matching every condition
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectOperation {
    pub table: Option<Id>,
    pub conditions: Vec<Condition>,
    /// Columns to return; all columns when empty
    pub columns: Vec<Id>,
}

impl SelectOperation {
    const KIND: OperationKind = OperationKind::Select;

    pub fn new(table: Id, conditions: Vec<Condition>) -> Self {
        Self {
            table: Some(table),
            conditions,
            columns: Vec::new(),
        }
    }

    pub fn with_columns(mut self, columns: Vec<Id>) -> Self {
        self.columns = columns;
        self
    }

    pub fn op(&self) -> OperationKind {
        Self::KIND
    }

    pub fn to_json(&self) -> Result<Json> {
        let table = require_table(Self::KIND, &self.table)?;
        let conditions = require_where(Self::KIND, &self.conditions)?;

        let mut obj = begin(Self::KIND);
        obj.insert("table".into(), table);
        obj.insert("where".into(), conditions);
        if !self.columns.is_empty() {
            obj.insert("columns".into(), columns_json(&self.columns));
        }
        Ok(Json::Object(obj))
    }
}

/// Update matching rows of `table` with the columns of `row`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateOperation {
    pub table: Option<Id>,
    pub conditions: Vec<Condition>,
    pub row: Row,
}

impl UpdateOperation {
    const KIND: OperationKind = OperationKind::Update;

    pub fn new(table: Id, conditions: Vec<Condition>, row: Row) -> Self {
        Self {
            table: Some(table),
            conditions,
            row,
        }
    }

    pub fn op(&self) -> OperationKind {
        Self::KIND
    }

    pub fn to_json(&self) -> Result<Json> {
        let table = require_table(Self::KIND, &self.table)?;
        let conditions = require_where(Self::KIND, &self.conditions)?;
        if self.row.is_empty() {
            return Err(Error::missing(Self::KIND.as_str(), "row"));
        }

        let mut obj = begin(Self::KIND);
        obj.insert("table".into(), table);
        obj.insert("where".into(), conditions);
        obj.insert("row".into(), row_to_json(&self.row));
        Ok(Json::Object(obj))
    }
}

/// Apply mutations to matching rows of `table`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MutateOperation {
    pub table: Option<Id>,
    pub conditions: Vec<Condition>,
    pub mutations: Vec<Mutation>,
}

impl MutateOperation {
    const KIND: OperationKind = OperationKind::Mutate;

    pub fn new(table: Id, conditions: Vec<Condition>, mutations: Vec<Mutation>) -> Self {
        Self {
            table: Some(table),
            conditions,
            mutations,
        }
    }

    pub fn op(&self) -> OperationKind {
        Self::KIND
    }

    pub fn to_json(&self) -> Result<Json> {
        let table = require_table(Self::KIND, &self.table)?;
        let conditions = require_where(Self::KIND, &self.conditions)?;
        if self.mutations.is_empty() {
            return Err(Error::missing(Self::KIND.as_str(), "mutations"));
        }
        let mutations = self
            .mutations
            .iter()
            .map(Mutation::to_json)
            .collect::<Result<Vec<_>>>()?;

        let mut obj = begin(Self::KIND);
        obj.insert("table".into(), table);
        obj.insert("where".into(), conditions);
        obj.insert("mutations".into(), Json::Array(mutations));
        Ok(Json::Object(obj))
    }
}

/// Delete matching rows of `table`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeleteOperation {
    pub table: Option<Id>,
    pub conditions: Vec<Condition>,
}

impl DeleteOperation {
    const KIND: OperationKind = OperationKind::Delete;

    pub fn new(table: Id, conditions: Vec<Condition>) -> Self {
        Self {
            table: Some(table),
            conditions,
        }
    }

    pub fn op(&self) -> OperationKind {
        Self::KIND
    }

    pub fn to_json(&self) -> Result<Json> {
        let table = require_table(Self::KIND, &self.table)?;
        let conditions = require_where(Self::KIND, &self.conditions)?;

        let mut obj = begin(Self::KIND);
        obj.insert("table".into(), table);
        obj.insert("where".into(), conditions);
        Ok(Json::Object(obj))
    }
}

/// The comparison a wait operation waits for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitUntil {
    #[default]
    Equal,
    NotEqual,
}

impl WaitUntil {
    pub fn as_str(&self) -> &'static str {
        match self {
            WaitUntil::Equal => "==",
            WaitUntil::NotEqual => "!=",
        }
    }
}

/// Wait until the selected columns of matching rows equal (or stop
/// equaling) `rows`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WaitOperation {
    pub table: Option<Id>,
    pub conditions: Vec<Condition>,
    pub columns: Vec<Id>,
    pub until: WaitUntil,
    pub rows: Vec<Row>,
    /// Milliseconds to wait before failing with "timed out"
    pub timeout: Option<u64>,
}

impl WaitOperation {
    const KIND: OperationKind = OperationKind::Wait;

    pub fn op(&self) -> OperationKind {
        Self::KIND
    }

    pub fn to_json(&self) -> Result<Json> {
        let table = require_table(Self::KIND, &self.table)?;
        let conditions = require_where(Self::KIND, &self.conditions)?;
        if self.columns.is_empty() {
            return Err(Error::missing(Self::KIND.as_str(), "columns"));
        }

        let mut obj = begin(Self::KIND);
        obj.insert("table".into(), table);
        obj.insert("where".into(), conditions);
        obj.insert("columns".into(), columns_json(&self.columns));
        obj.insert("until".into(), json!(self.until.as_str()));
        obj.insert(
            "rows".into(),
            Json::Array(self.rows.iter().map(row_to_json).collect()),
        );
        if let Some(timeout) = self.timeout {
            obj.insert("timeout".into(), json!(timeout));
        }
        Ok(Json::Object(obj))
    }
}

/// Commit the transaction, optionally waiting for it to be durable
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommitOperation {
    pub durable: bool,
}

impl CommitOperation {
    const KIND: OperationKind = OperationKind::Commit;

    pub fn op(&self) -> OperationKind {
        Self::KIND
    }

    pub fn to_json(&self) -> Result<Json> {
        let mut obj = begin(Self::KIND);
        obj.insert("durable".into(), json!(self.durable));
        Ok(Json::Object(obj))
    }
}

/// Abort the transaction
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AbortOperation;

impl AbortOperation {
    const KIND: OperationKind = OperationKind::Abort;

    pub fn op(&self) -> OperationKind {
        Self::KIND
    }

    pub fn to_json(&self) -> Result<Json> {
        Ok(Json::Object(begin(Self::KIND)))
    }
}

/// Attach a comment to the transaction in the database log
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommentOperation {
    pub comment: String,
}

impl CommentOperation {
    const KIND: OperationKind = OperationKind::Comment;

    pub fn op(&self) -> OperationKind {
        Self::KIND
    }

    pub fn to_json(&self) -> Result<Json> {
        if self.comment.is_empty() {
            return Err(Error::missing(Self::KIND.as_str(), "comment"));
        }
        let mut obj = begin(Self::KIND);
        obj.insert("comment".into(), json!(self.comment));
        Ok(Json::Object(obj))
    }
}

/// Fail the transaction unless this session owns `lock`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssertOperation {
    pub lock: Option<Id>,
}

impl AssertOperation {
    const KIND: OperationKind = OperationKind::Assert;

    pub fn op(&self) -> OperationKind {
        Self::KIND
    }

    pub fn to_json(&self) -> Result<Json> {
        let lock = self
            .lock
            .as_ref()
            .ok_or_else(|| Error::missing(Self::KIND.as_str(), "lock"))?;
        let mut obj = begin(Self::KIND);
        obj.insert("lock".into(), json!(lock.as_str()));
        Ok(Json::Object(obj))
    }
}

/// One operation of a transaction
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Insert(InsertOperation),
    Select(SelectOperation),
    Update(UpdateOperation),
    Mutate(MutateOperation),
    Delete(DeleteOperation),
    Wait(WaitOperation),
    Commit(CommitOperation),
    Abort(AbortOperation),
    Comment(CommentOperation),
    Assert(AssertOperation),
}

impl Operation {
    pub fn op(&self) -> OperationKind {
        match self {
            Operation::Insert(o) => o.op(),
            Operation::Select(o) => o.op(),
            Operation::Update(o) => o.op(),
            Operation::Mutate(o) => o.op(),
            Operation::Delete(o) => o.op(),
            Operation::Wait(o) => o.op(),
            Operation::Commit(o) => o.op(),
            Operation::Abort(o) => o.op(),
            Operation::Comment(o) => o.op(),
            Operation::Assert(o) => o.op(),
        }
    }

    /// Validate and encode to wire form
    pub fn to_json(&self) -> Result<Json> {
        match self {
            Operation::Insert(o) => o.to_json(),
            Operation::Select(o) => o.to_json(),
            Operation::Update(o) => o.to_json(),
            Operation::Mutate(o) => o.to_json(),
            Operation::Delete(o) => o.to_json(),
            Operation::Wait(o) => o.to_json(),
            Operation::Commit(o) => o.to_json(),
            Operation::Abort(o) => o.to_json(),
            Operation::Comment(o) => o.to_json(),
            Operation::Assert(o) => o.to_json(),
        }
    }
}

impl Serialize for Operation {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().map_err(<S::Error as ser::Error>::custom)?.serialize(serializer)
    }
}

macro_rules! impl_from_operation {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Operation {
                fn from(op: $ty) -> Self {
                    Operation::$variant(op)
                }
            }
        )*
    };
}

impl_from_operation! {
    Insert => InsertOperation,
    Select => SelectOperation,
    Update => UpdateOperation,
    Mutate => MutateOperation,
    Delete => DeleteOperation,
    Wait => WaitOperation,
    Commit => CommitOperation,
    Abort => AbortOperation,
    Comment => CommentOperation,
    Assert => AssertOperation,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> Id {
        Id::new(s).unwrap()
    }

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs.iter().map(|(k, v)| (id(k), v.clone())).collect()
    }

    fn encode(op: impl Into<Operation>) -> Result<String> {
        let op = op.into();
        Ok(serde_json::to_string(&op.to_json()?)?)
    }

    fn eq_condition() -> Condition {
        Condition::new(id("TestColumn"), "==", "TestValue")
    }

    #[test]
    fn test_insert_operation() {
        assert_eq!(InsertOperation::default().op(), OperationKind::Insert);

        let test_row = row(&[("TestColumn", Value::from("TestValue"))]);
        let failing = [
            InsertOperation::default(),
            InsertOperation {
                row: Some(test_row.clone()),
                ..Default::default()
            },
            InsertOperation {
                table: Some(id("TestTable")),
                ..Default::default()
            },
        ];
        for op in failing {
            let err = encode(op).unwrap_err();
            assert!(err.is_validation());
        }

        assert_eq!(
            encode(InsertOperation::new(id("TestTable"), test_row.clone())).unwrap(),
            r#"{"op":"insert","table":"TestTable","row":{"TestColumn":"TestValue"}}"#
        );
        assert_eq!(
            encode(
                InsertOperation::new(id("TestTable"), test_row)
                    .with_uuid_name(id("TestUUIDName"))
            )
            .unwrap(),
            r#"{"op":"insert","table":"TestTable","row":{"TestColumn":"TestValue"},"uuid-name":"TestUUIDName"}"#
        );
    }

    #[test]
    fn test_insert_allows_empty_row() {
        assert_eq!(
            encode(InsertOperation::new(id("T"), Row::new())).unwrap(),
            r#"{"op":"insert","table":"T","row":{}}"#
        );
    }

    #[test]
    fn test_select_operation() {
        assert!(encode(SelectOperation::default()).is_err());
        assert!(encode(SelectOperation::new(id("T"), vec![])).is_err());

        let select = SelectOperation::new(id("T"), vec![Condition::new(id("c"), "==", "v")]);
        assert_eq!(
            encode(select.clone()).unwrap(),
            r#"{"op":"select","table":"T","where":[["c","==","v"]]}"#
        );
        assert_eq!(
            encode(select.with_columns(vec![id("c")])).unwrap(),
            r#"{"op":"select","table":"T","where":[["c","==","v"]],"columns":["c"]}"#
        );
    }

    #[test]
    fn test_update_operation() {
        let conditions = vec![eq_condition()];
        assert!(encode(UpdateOperation::new(id("T"), conditions.clone(), Row::new())).is_err());
        assert!(encode(UpdateOperation::new(
            id("T"),
            vec![],
            row(&[("c", Value::from(1))])
        ))
        .is_err());
        assert_eq!(
            encode(UpdateOperation::new(id("T"), conditions, row(&[("c", Value::from(1))])))
                .unwrap(),
            r#"{"op":"update","table":"T","where":[["TestColumn","==","TestValue"]],"row":{"c":1}}"#
        );
    }

    #[test]
    fn test_mutate_operation() {
        assert_eq!(MutateOperation::default().op(), OperationKind::Mutate);

        assert!(encode(MutateOperation::default()).is_err());
        assert!(encode(MutateOperation {
            table: Some(id("TestTable")),
            ..Default::default()
        })
        .is_err());

        let empty_mutations = MutateOperation::new(id("TestTable"), vec![eq_condition()], vec![]);
        assert!(matches!(
            encode(empty_mutations),
            Err(Error::MissingField { field: "mutations", .. })
        ));

        let valid = MutateOperation::new(
            id("TestTable"),
            vec![eq_condition()],
            vec![Mutation::new(id("TestColumn"), "+=", 1)],
        );
        assert_eq!(
            encode(valid).unwrap(),
            r#"{"op":"mutate","table":"TestTable","where":[["TestColumn","==","TestValue"]],"mutations":[["TestColumn","+=",1]]}"#
        );
    }

    #[test]
    fn test_invalid_condition_and_mutation() {
        let bad_condition = MutateOperation::new(
            id("TestTable"),
            vec![Condition::new(id("TestColumn"), "invalid function", "TestValue")],
            vec![Mutation::new(id("TestColumn"), "+=", 1)],
        );
        match encode(bad_condition) {
            Err(Error::InvalidCondition(name)) => assert_eq!(name, "invalid function"),
            other => panic!("expected invalid condition, got {:?}", other),
        }

        let bad_mutation = MutateOperation::new(
            id("TestTable"),
            vec![eq_condition()],
            vec![Mutation::new(id("TestColumn"), "invalid", 1)],
        );
        match encode(bad_mutation) {
            Err(Error::InvalidMutation(name)) => assert_eq!(name, "invalid"),
            other => panic!("expected invalid mutation, got {:?}", other),
        }

        let bad_select =
            SelectOperation::new(id("T"), vec![Condition::new(id("c"), "~=", "v")]);
        assert!(matches!(encode(bad_select), Err(Error::InvalidCondition(_))));
    }

    #[test]
    fn test_serialize_fails_without_output() {
        let op: Operation = MutateOperation::default().into();
        assert!(serde_json::to_string(&op).is_err());
        assert!(serde_json::to_vec(&vec![op]).is_err());
    }

    #[test]
    fn test_condition_and_mutation_decode() {
        let condition: Condition = serde_json::from_str(r#"["name","includes",["set",["a","b"]]]"#).unwrap();
        assert_eq!(condition.function, Function::Includes);
        assert!(matches!(condition.value, Value::Set(_)));

        let mutation: Mutation = serde_json::from_str(r#"["n","%=",3]"#).unwrap();
        assert_eq!(mutation.mutator, Mutator::Mod);

        let unknown: Mutation = serde_json::from_str(r#"["n","^=",3]"#).unwrap();
        assert_eq!(unknown.mutator, Mutator::Unknown("^=".into()));
        assert!(unknown.to_json().is_err());

        assert!(serde_json::from_str::<Condition>(r#"["n","=="]"#).is_err());
    }

    #[test]
    fn test_remaining_operations() {
        assert_eq!(
            encode(DeleteOperation::new(id("T"), vec![Condition::new(id("c"), "!=", 0)])).unwrap(),
            r#"{"op":"delete","table":"T","where":[["c","!=",0]]}"#
        );
        assert!(encode(DeleteOperation::new(id("T"), vec![])).is_err());

        let wait = WaitOperation {
            table: Some(id("T")),
            conditions: vec![Condition::new(id("c"), "==", "v")],
            columns: vec![id("c")],
            until: WaitUntil::NotEqual,
            rows: vec![row(&[("c", Value::from("v"))])],
            timeout: Some(100),
        };
        assert_eq!(
            encode(wait.clone()).unwrap(),
            r#"{"op":"wait","table":"T","where":[["c","==","v"]],"columns":["c"],"until":"!=","rows":[{"c":"v"}],"timeout":100}"#
        );
        assert!(encode(WaitOperation {
            columns: vec![],
            ..wait
        })
        .is_err());

        assert_eq!(
            encode(CommitOperation { durable: true }).unwrap(),
            r#"{"op":"commit","durable":true}"#
        );
        assert_eq!(encode(AbortOperation).unwrap(), r#"{"op":"abort"}"#);
        assert_eq!(
            encode(CommentOperation {
                comment: "added br0".into()
            })
            .unwrap(),
            r#"{"op":"comment","comment":"added br0"}"#
        );
        assert!(encode(CommentOperation::default()).is_err());
        assert_eq!(
            encode(AssertOperation {
                lock: Some(id("my_lock"))
            })
            .unwrap(),
            r#"{"op":"assert","lock":"my_lock"}"#
        );
        assert!(encode(AssertOperation::default()).is_err());
    }

    #[test]
    fn test_operation_kind() {
        let op: Operation = AbortOperation.into();
        assert_eq!(op.op(), OperationKind::Abort);
        assert_eq!(op.op().to_string(), "abort");
    }
}
