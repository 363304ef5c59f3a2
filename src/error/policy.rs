use super::{UNAUTHORIZED_CODE, UNSUPPORTED_METHOD_CODE};
use crate::types::Origin;
use thiserror::Error;

/// Errors produced while deciding how a request may be executed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    /// No execution mode is permitted for the method from the requesting origin.
    #[error("{method} is not permitted from {origin}")]
    PolicyViolation {
        /// The requested method.
        method: String,
        /// The origin of the requester.
        origin: Origin,
    },
    /// The method requires an already connected account.
    #[error("{method} requires a connected account")]
    ConnectionRequired {
        /// The requested method.
        method: String,
    },
    /// The method requires the account to be up to date.
    #[error("{method} requires an up to date account")]
    AccountStale {
        /// The requested method.
        method: String,
    },
}

impl PolicyError {
    /// The JSON-RPC error code.
    pub fn code(&self) -> i32 {
        match self {
            Self::PolicyViolation { .. } => UNSUPPORTED_METHOD_CODE,
            Self::ConnectionRequired { .. } | Self::AccountStale { .. } => UNAUTHORIZED_CODE,
        }
    }
}
