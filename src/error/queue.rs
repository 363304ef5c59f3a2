use super::rpc_err;
use crate::types::RequestId;
use jsonrpsee::types::error::{INVALID_PARAMS_CODE, INVALID_REQUEST_CODE};
use thiserror::Error;

/// Errors related to the remote request queue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    /// No request with this id is awaiting a decision.
    #[error("unknown request {0}")]
    UnknownRequest(RequestId),
    /// A request with this id is already queued.
    #[error("duplicate request id {0}")]
    DuplicateRequest(RequestId),
}

impl QueueError {
    /// The JSON-RPC error code.
    pub fn code(&self) -> i32 {
        match self {
            Self::UnknownRequest(_) => INVALID_PARAMS_CODE,
            Self::DuplicateRequest(_) => INVALID_REQUEST_CODE,
        }
    }
}

impl From<QueueError> for jsonrpsee::types::error::ErrorObject<'static> {
    fn from(err: QueueError) -> Self {
        rpc_err(err.code(), err.to_string(), None)
    }
}
