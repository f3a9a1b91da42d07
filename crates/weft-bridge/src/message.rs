//! Wire protocol for host/webview messages.
//!
//! Messages travel as JSON text. A message carrying a `correlationId` expects
//! exactly one reply with the same id; without one it is fire-and-forget.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use smol_str::SmolStr;

/// Envelope for everything sent over a transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Messenger channel name. Endpoints ignore messages for other channels.
    pub channel: SmolStr,
    pub payload: Payload,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Payload {
    /// Invoke a method on the other side's local interface.
    Call {
        method: SmolStr,
        #[serde(default)]
        args: Value,
    },
    /// Result of a correlated call.
    Reply(Outcome),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Outcome {
    Ok(Value),
    Err(RemoteError),
}

impl From<Result<Value, RemoteError>> for Outcome {
    fn from(result: Result<Value, RemoteError>) -> Self {
        match result {
            Ok(value) => Self::Ok(value),
            Err(e) => Self::Err(e),
        }
    }
}

/// Error description carried in a reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct RemoteError {
    /// Stable error kind, e.g. `UnknownCommand`.
    pub kind: SmolStr,
    pub message: String,
}

impl RemoteError {
    pub fn new(kind: impl Into<SmolStr>, message: impl ToString) -> Self {
        Self {
            kind: kind.into(),
            message: message.to_string(),
        }
    }

    pub fn unknown_method(method: &str) -> Self {
        Self::new("UnknownRemoteMethod", format!("no local handler for {method}"))
    }

    pub fn invalid_arguments(method: &str, err: impl ToString) -> Self {
        Self::new(
            "InvalidArguments",
            format!("{method}: {}", err.to_string()),
        )
    }

    pub fn is_unknown_method(&self) -> bool {
        self.kind == "UnknownRemoteMethod"
    }
}

impl Message {
    pub fn call(channel: &SmolStr, method: &str, args: Value, correlation_id: Option<u64>) -> Self {
        Self {
            channel: channel.clone(),
            payload: Payload::Call {
                method: SmolStr::new(method),
                args,
            },
            correlation_id,
        }
    }

    pub fn reply(channel: &SmolStr, correlation_id: u64, outcome: Outcome) -> Self {
        Self {
            channel: channel.clone(),
            payload: Payload::Reply(outcome),
            correlation_id: Some(correlation_id),
        }
    }

    /// Serialize message to JSON text for wire transmission.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize message from JSON text.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
