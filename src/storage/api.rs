//! Remote storage api.

use crate::error::StorageError;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Debug;

/// Type alias for `Result<T, StorageError>`
pub type Result<T> = core::result::Result<T, StorageError>;

/// Storage API.
///
/// A key-value store for the instance state. Values are JSON documents.
#[async_trait]
pub trait StorageApi: Debug + Send + Sync {
    /// Reads the value stored under `key`.
    async fn get_item(&self, key: &str) -> Result<Option<Value>>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set_item(&self, key: &str, value: Value) -> Result<()>;

    /// Removes the value stored under `key`. Absent keys are a no-op.
    async fn remove_item(&self, key: &str) -> Result<()>;
}
