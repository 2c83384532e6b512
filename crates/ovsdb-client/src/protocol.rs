//! JSON-RPC 1.0 message types as used by OVSDB (RFC 7047 §4)
//!
//! OVSDB peers exchange requests `{"method", "params", "id"}`, responses
//! `{"result", "error", "id"}` and notifications, which are requests whose
//! `id` is `null`. Both sides may send requests.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use ovsdb_core::{Error, Result};

/// A request or notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub method: String,
    #[serde(default)]
    pub params: Value,
    #[serde(default)]
    pub id: Value,
}

impl Request {
    /// Create a request expecting a response
    pub fn new(method: impl Into<String>, params: Value, id: u64) -> Self {
        Self {
            method: method.into(),
            params,
            id: Value::from(id),
        }
    }

    /// Create a notification (no response expected)
    pub fn notification(method: impl Into<String>, params: Value) -> Self {
        Self {
            method: method.into(),
            params,
            id: Value::Null,
        }
    }

    pub fn is_notification(&self) -> bool {
        self.id.is_null()
    }
}

/// A response; exactly one of `result` and `error` is non-null
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub result: Value,
    #[serde(default)]
    pub error: Value,
    pub id: Value,
}

impl Response {
    /// Create a success response
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            result,
            error: Value::Null,
            id,
        }
    }

    /// Create an error response
    pub fn error(id: Value, error: impl Into<String>) -> Self {
        Self {
            result: Value::Null,
            error: Value::String(error.into()),
            id,
        }
    }

    /// The result, or the error as [`Error::Rpc`]
    pub fn into_result(self) -> Result<Value> {
        if self.error.is_null() {
            Ok(self.result)
        } else {
            Err(Error::Rpc(self.error))
        }
    }
}

/// An inbound message, classified
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Request(Request),
    Response(Response),
}

/// Classify a decoded JSON text as a request or a response
pub fn parse_message(value: Value) -> Result<Message> {
    let Some(obj) = value.as_object() else {
        return Err(Error::protocol(format!("message is not an object: {}", value)));
    };
    if obj.contains_key("method") {
        Request::deserialize(&value)
            .map(Message::Request)
            .map_err(|e| Error::protocol(format!("invalid request: {}", e)))
    } else if obj.contains_key("result") || obj.contains_key("error") {
        Response::deserialize(&value)
            .map(Message::Response)
            .map_err(|e| Error::protocol(format!("invalid response: {}", e)))
    } else {
        Err(Error::protocol(format!("unrecognized message: {}", value)))
    }
}
