//! Remote error types.
use crate::types::RpcError;
use core::fmt;
use jsonrpsee::core::RpcResult;
use serde_json::Value;
use thiserror::Error;

mod policy;
pub use policy::PolicyError;

mod queue;
pub use queue::QueueError;

mod request;
pub use request::RequestError;

mod requester;
pub use requester::RequesterError;

mod storage;
pub use storage::StorageError;

/// EIP-1193 error code: the user rejected the request.
pub const USER_REJECTED_CODE: i32 = 4001;

/// EIP-1193 error code: the requested method and/or account has not been authorized.
pub const UNAUTHORIZED_CODE: i32 = 4100;

/// EIP-1193 error code: the provider does not support the requested method.
pub const UNSUPPORTED_METHOD_CODE: i32 = 4200;

/// The overarching error type of the mediation layer.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The request failed basic validation.
    #[error(transparent)]
    Request(#[from] RequestError),
    /// The request is not allowed under any mode, or a pre-condition failed.
    #[error(transparent)]
    Policy(#[from] PolicyError),
    /// A queue action was misused.
    #[error(transparent)]
    Queue(#[from] QueueError),
    /// Errors related to storage.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// The request was rejected by the user.
    #[error("user rejected the request")]
    UserRejected,
    /// The wallet failed to execute the request.
    #[error("wallet error: {0}")]
    Handler(RpcError),
    /// An internal error occurred.
    #[error(transparent)]
    InternalError(#[from] eyre::Error),
}

impl RemoteError {
    /// The error as delivered to a requester in an `rpc-error` message.
    pub fn to_rpc_error(&self) -> RpcError {
        match self {
            Self::Request(err) => RpcError::new(err.code(), err.to_string()),
            Self::Policy(err) => RpcError::new(err.code(), err.to_string()),
            Self::Queue(err) => RpcError::new(err.code(), err.to_string()),
            Self::UserRejected => user_rejected(),
            Self::Handler(err) => err.clone(),
            Self::Storage(_) | Self::InternalError(_) => {
                RpcError::new(jsonrpsee::types::error::INTERNAL_ERROR_CODE, "internal error")
            }
        }
    }
}

impl From<RemoteError> for jsonrpsee::types::error::ErrorObject<'static> {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::Storage(inner) => inner.into(),
            RemoteError::InternalError(_) => internal_rpc(err.to_string()),
            _ => {
                let RpcError { code, message, data } = err.to_rpc_error();
                rpc_err(code, message, data)
            }
        }
    }
}

/// The wire error for an explicit human rejection.
pub fn user_rejected() -> RpcError {
    RpcError::new(USER_REJECTED_CODE, "User rejected the request.")
}

/// A helper trait to provide an RPC error code.
pub trait ToRpcResult<Ok, Err>: Sized {
    /// Converts result to [`RpcResult`] by converting error variant to
    /// [`jsonrpsee::types::error::ErrorObject`]
    fn to_rpc_result(self) -> RpcResult<Ok>
    where
        Err: fmt::Display;
}

macro_rules! impl_error_helpers {
    ($err:ty) => {
        impl<Ok> ToRpcResult<Ok, $err> for Result<Ok, $err> {
            fn to_rpc_result(self) -> RpcResult<Ok> {
                self.map_err(|err| err.into())
            }
        }
    };
}

impl_error_helpers!(RemoteError);
impl_error_helpers!(QueueError);
impl_error_helpers!(StorageError);
impl_error_helpers!(RequesterError);

/// Constructs an internal JSON‑RPC error.
fn internal_rpc(msg: impl Into<String>) -> jsonrpsee::types::error::ErrorObject<'static> {
    rpc_err(jsonrpsee::types::error::INTERNAL_ERROR_CODE, msg, None)
}

/// Constructs a JSON‑RPC error with `code`, `message` and optional `data`.
fn rpc_err(
    code: i32,
    msg: impl Into<String>,
    data: Option<Value>,
) -> jsonrpsee::types::error::ErrorObject<'static> {
    jsonrpsee::types::error::ErrorObject::owned(code, msg.into(), data)
}
