//! Decoding of `transact` replies (RFC 7047 §4.1.3)
//!
//! The reply holds one element per submitted operation. A `null` element
//! marks an operation the server never attempted because an earlier one
//! failed; an object with an `error` member is a failure; anything else is
//! the operation's own result, left opaque until the caller asks for a
//! typed view.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value as Json;
use std::fmt;

use crate::error::{Error, Result};
use crate::types::{RemoteError, Uuid};
use crate::value::Row;

/// Outcome of one operation of a transaction
#[derive(Debug, Clone, PartialEq)]
pub enum OperationResult {
    /// Raw result payload; its shape depends on the operation
    Success(Json),
    Error(RemoteError),
    /// Skipped because a previous operation failed
    NotAttempted,
}

impl OperationResult {
    fn from_json(element: &Json) -> Result<Self> {
        match element {
            Json::Null => Ok(OperationResult::NotAttempted),
            Json::Object(obj) if obj.contains_key("error") => RemoteError::deserialize(element)
                .map(OperationResult::Error)
                .map_err(|e| Error::protocol(format!("malformed operation error {}: {}", element, e))),
            other => Ok(OperationResult::Success(other.clone())),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, OperationResult::Success(_))
    }

    pub fn as_error(&self) -> Option<&RemoteError> {
        match self {
            OperationResult::Error(e) => Some(e),
            _ => None,
        }
    }

    /// Decode a successful payload, e.g. as [`InsertResult`] or [`SelectResult`].
    /// Returns `None` for failed or skipped operations.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        match self {
            OperationResult::Success(payload) => Ok(Some(T::deserialize(payload)?)),
            _ => Ok(None),
        }
    }
}

/// Result of an insert: the UUID of the new row
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InsertResult {
    pub uuid: Uuid,
}

/// Result of a select
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SelectResult {
    pub rows: Vec<Row>,
}

/// Result of an update, mutate or delete: number of rows touched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CountResult {
    pub count: u64,
}

/// The remote errors of one transaction, usable as a single error
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultErrors(Vec<RemoteError>);

impl ResultErrors {
    pub fn errors(&self) -> &[RemoteError] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    fn push(&mut self, err: RemoteError) {
        self.0.push(err);
    }
}

impl fmt::Display for ResultErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        f.write_str(&messages.join(", "))
    }
}

impl std::error::Error for ResultErrors {}

/// Per-operation results of a transaction plus the errors among them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactResult {
    pub results: Vec<OperationResult>,
    pub errors: ResultErrors,
}

impl TransactResult {
    /// Decode a reply to a transaction of `operations` operations.
    ///
    /// A reply one element longer than the transaction is accepted only when
    /// that trailing element is an error (a failure after every operation
    /// succeeded, such as a commit timeout); it is reported in `errors` only.
    pub fn from_reply(reply: &Json, operations: usize) -> Result<Self> {
        let elements = reply
            .as_array()
            .ok_or_else(|| Error::protocol(format!("transact reply is not an array: {}", reply)))?;

        let mut result = TransactResult::default();
        for element in elements.iter().take(operations) {
            let decoded = OperationResult::from_json(element)?;
            if let OperationResult::Error(err) = &decoded {
                result.errors.push(err.clone());
            }
            result.results.push(decoded);
        }

        match elements.len() {
            n if n == operations => Ok(result),
            n if n == operations + 1 => match OperationResult::from_json(&elements[operations])? {
                OperationResult::Error(err) => {
                    result.errors.push(err);
                    Ok(result)
                }
                _ => Err(Error::protocol(format!(
                    "transact reply has {} elements for {} operations",
                    n, operations
                ))),
            },
            n => Err(Error::protocol(format!(
                "transact reply has {} elements for {} operations",
                n, operations
            ))),
        }
    }

    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// The composite error, if any operation failed
    pub fn error(&self) -> Option<&ResultErrors> {
        if self.errors.is_empty() {
            None
        } else {
            Some(&self.errors)
        }
    }

    /// Successful payloads in operation order, or the composite error
    pub fn into_payloads(self) -> std::result::Result<Vec<Json>, ResultErrors> {
        if !self.errors.is_empty() {
            return Err(self.errors);
        }
        Ok(self
            .results
            .into_iter()
            .filter_map(|r| match r {
                OperationResult::Success(payload) => Some(payload),
                _ => None,
            })
            .collect())
    }
}
