//! Messages exchanged between the requester and the remote context.

use super::{MethodPolicies, RequestId};
use alloy_primitives::ChainId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// JSON-RPC error object carried by `rpc-error` messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcError {
    /// The error code.
    pub code: i32,
    /// A short description of the error.
    pub message: String,
    /// Additional information about the error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    /// Creates an error without data.
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self { code, message: message.into(), data: None }
    }

    /// Attaches `data` to the error.
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

impl std::error::Error for RpcError {}

/// The handshake announced by the dialog side once it is able to receive requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadyPayload {
    /// The chain the wallet is currently on.
    pub chain_id: ChainId,
    /// The fee token the wallet pays fees with, if any.
    #[serde(default)]
    pub fee_token: Option<String>,
    /// The method policies in effect, so the opener can tell which methods it may resolve
    /// without opening a dialog.
    #[serde(default = "MethodPolicies::empty")]
    pub method_policies: MethodPolicies,
}

/// A message on a messenger channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Message {
    /// A request from the requester.
    RpcRequest {
        /// The request id. Generated on receipt if absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<RequestId>,
        /// The method.
        #[serde(default)]
        method: String,
        /// The method parameters.
        #[serde(default)]
        params: Value,
    },
    /// A successful reply.
    RpcResponse {
        /// Id of the request this replies to.
        id: RequestId,
        /// The result.
        result: Value,
    },
    /// A failed reply.
    RpcError {
        /// Id of the request this replies to.
        id: RequestId,
        /// The error.
        error: RpcError,
    },
    /// The dialog handshake.
    Ready(ReadyPayload),
}

impl Message {
    /// Creates a request message.
    pub fn request(id: impl Into<RequestId>, method: impl Into<String>, params: Value) -> Self {
        Self::RpcRequest { id: Some(id.into()), method: method.into(), params }
    }

    /// Creates a reply for `id` out of a handler outcome.
    pub fn reply(id: RequestId, outcome: Result<Value, RpcError>) -> Self {
        match outcome {
            Ok(result) => Self::RpcResponse { id, result },
            Err(error) => Self::RpcError { id, error },
        }
    }

    /// The kind of message, as it appears in the `type` field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RpcRequest { .. } => "rpc-request",
            Self::RpcResponse { .. } => "rpc-response",
            Self::RpcError { .. } => "rpc-error",
            Self::Ready(_) => "ready",
        }
    }
}
