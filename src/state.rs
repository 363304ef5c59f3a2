//! Persisted instance state.
//!
//! The state survives restarts, unlike the request queue which only lives in memory.

use crate::{error::StorageError, storage::RemoteStorage};
use alloy_primitives::{Address, ChainId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;

/// Instance state persisted under the storage key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct State {
    /// The chain the wallet is on.
    pub chain_id: ChainId,
    /// The fee token the wallet pays fees with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_token: Option<String>,
    /// Connected accounts, most recently connected first.
    #[serde(default)]
    pub accounts: Vec<Address>,
}

impl State {
    /// The active account, if any.
    pub fn account(&self) -> Option<Address> {
        self.accounts.first().copied()
    }

    /// Whether an account is connected.
    pub fn is_connected(&self) -> bool {
        !self.accounts.is_empty()
    }
}

/// Reads and writes the [`State`] in [`RemoteStorage`].
#[derive(Debug)]
pub struct StateStore {
    storage: RemoteStorage,
    key: String,
    /// State used until something was persisted.
    defaults: State,
    /// Serializes read-modify-write cycles.
    lock: Mutex<()>,
}

impl StateStore {
    /// Creates a store for the state under `key`.
    pub fn new(storage: RemoteStorage, key: impl Into<String>, defaults: State) -> Self {
        Self { storage, key: key.into(), defaults, lock: Mutex::new(()) }
    }

    /// The storage key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Loads the persisted state, or the defaults if nothing was persisted yet.
    pub async fn load(&self) -> Result<State, StorageError> {
        Ok(self.storage.read(&self.key).await?.unwrap_or_else(|| self.defaults.clone()))
    }

    /// Persists `state`.
    pub async fn save(&self, state: &State) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;
        self.storage.write(&self.key, state).await
    }

    /// Applies `f` to the persisted state and returns the new state.
    pub async fn update(&self, f: impl FnOnce(&mut State)) -> Result<State, StorageError> {
        let _guard = self.lock.lock().await;
        let mut state = self.load().await?;
        f(&mut state);
        self.storage.write(&self.key, &state).await?;
        Ok(state)
    }

    /// Records newly connected accounts, keeping previously connected ones after them.
    pub async fn record_accounts(&self, accounts: Vec<Address>) -> Result<State, StorageError> {
        debug!(?accounts, "Recording connected accounts.");
        self.update(|state| {
            let previous = std::mem::take(&mut state.accounts);
            state.accounts = accounts;
            for account in previous {
                if !state.accounts.contains(&account) {
                    state.accounts.push(account);
                }
            }
        })
        .await
    }
}

/// Extracts the accounts a connection method returned.
///
/// `eth_requestAccounts` returns a list of addresses, `wallet_connect` returns
/// `{ accounts: [{ address, .. }] }`. Any other method yields `None`.
pub fn connected_accounts(method: &str, result: &Value) -> Option<Vec<Address>> {
    let accounts = match method {
        "eth_requestAccounts" => serde_json::from_value(result.clone()).ok()?,
        "wallet_connect" => result
            .get("accounts")?
            .as_array()?
            .iter()
            .filter_map(|account| serde_json::from_value(account.get("address")?.clone()).ok())
            .collect(),
        _ => return None,
    };
    Some(accounts)
}
