use super::{internal_rpc, rpc_err};
use crate::types::RpcError;
use std::time::Duration;
use thiserror::Error;

/// Errors seen by the requester side of a messenger channel.
#[derive(Debug, Error)]
pub enum RequesterError {
    /// The dialog did not announce itself in time.
    #[error("dialog unavailable: no ready handshake within {0:?}")]
    DialogUnavailable(Duration),
    /// The request was answered with an error.
    #[error(transparent)]
    Rpc(#[from] RpcError),
    /// The requester is not attached to a channel.
    #[error("requester unavailable")]
    Unavailable,
}

impl From<RequesterError> for jsonrpsee::types::error::ErrorObject<'static> {
    fn from(err: RequesterError) -> Self {
        match err {
            RequesterError::Rpc(RpcError { code, message, data }) => rpc_err(code, message, data),
            RequesterError::DialogUnavailable(_) | RequesterError::Unavailable => {
                internal_rpc(err.to_string())
            }
        }
    }
}
