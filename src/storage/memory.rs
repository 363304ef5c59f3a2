//! Remote storage implementation in-memory.

use super::{StorageApi, api::Result};
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

/// [`StorageApi`] implementation in-memory.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    items: DashMap<String, Value>,
}

#[async_trait]
impl StorageApi for InMemoryStorage {
    async fn get_item(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.items.get(key).map(|item| item.value().clone()))
    }

    async fn set_item(&self, key: &str, value: Value) -> Result<()> {
        self.items.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        self.items.remove(key);
        Ok(())
    }
}
