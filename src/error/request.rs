use jsonrpsee::types::error::INVALID_REQUEST_CODE;
use thiserror::Error;

/// Errors related to the shape of incoming requests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// The request failed basic validation.
    #[error("malformed request: {0}")]
    Malformed(String),
}

impl RequestError {
    /// The JSON-RPC error code.
    pub fn code(&self) -> i32 {
        INVALID_REQUEST_CODE
    }
}
