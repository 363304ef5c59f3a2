use super::internal_rpc;

/// Errors returned by [`StorageApi`](crate::storage::StorageApi).
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A deserialization error occurred.
    #[error("a deserialization error occurred")]
    SerdeError(#[from] serde_json::Error),
    /// Reading or writing the backing file failed.
    #[error("storage io error")]
    Io(#[from] std::io::Error),
}

impl From<StorageError> for jsonrpsee::types::error::ErrorObject<'static> {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::SerdeError(..) | StorageError::Io(..) => {
                internal_rpc("an internal error occurred")
            }
        }
    }
}
