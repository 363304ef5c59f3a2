//! Remote storage

mod api;
pub use api::StorageApi;
mod file;
mod memory;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::{path::PathBuf, sync::Arc};

/// Remote storage interface.
#[derive(Debug, Clone)]
pub struct RemoteStorage {
    inner: Arc<dyn StorageApi>,
}

impl RemoteStorage {
    /// Create [`RemoteStorage`] with a in-memory backend.
    pub fn in_memory() -> Self {
        Self { inner: Arc::new(memory::InMemoryStorage::default()) }
    }

    /// Create [`RemoteStorage`] persisting to a JSON file at `path`.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self { inner: Arc::new(file::FileStorage::new(path)) }
    }

    /// Create [`RemoteStorage`] with a custom backend.
    pub fn new(inner: Arc<dyn StorageApi>) -> Self {
        Self { inner }
    }

    /// Reads and decodes the value under `key`.
    pub async fn read<T: DeserializeOwned>(&self, key: &str) -> api::Result<Option<T>> {
        self.inner
            .get_item(key)
            .await?
            .map(serde_json::from_value)
            .transpose()
            .map_err(Into::into)
    }

    /// Encodes and writes `value` under `key`.
    pub async fn write<T: Serialize>(&self, key: &str, value: &T) -> api::Result<()> {
        self.inner.set_item(key, serde_json::to_value(value)?).await
    }
}

#[async_trait]
impl StorageApi for RemoteStorage {
    async fn get_item(&self, key: &str) -> api::Result<Option<Value>> {
        self.inner.get_item(key).await
    }

    async fn set_item(&self, key: &str, value: Value) -> api::Result<()> {
        self.inner.set_item(key, value).await
    }

    async fn remove_item(&self, key: &str) -> api::Result<()> {
        self.inner.remove_item(key).await
    }
}
