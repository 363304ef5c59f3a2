//! The wallet core the mediation layer dispatches approved requests to.

use crate::types::RpcError;
use alloy_primitives::Address;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Debug;

mod upstream;
pub use upstream::UpstreamWallet;

/// EIP-1193 error code: the provider is disconnected from all chains.
pub const DISCONNECTED_CODE: i32 = 4900;

/// Executes wallet methods.
///
/// This is where side effects such as signing and submission happen. Failures carry the
/// wallet's own error object, which is passed to the requester unchanged.
#[async_trait]
pub trait WalletCore: Debug + Send + Sync {
    /// Executes `method` with `params`.
    async fn execute(&self, method: &str, params: &Value) -> Result<Value, RpcError>;

    /// Whether the on-chain state of `account` is up to date.
    async fn is_account_updated(&self, account: Address) -> Result<bool, RpcError>;
}

/// A [`WalletCore`] without a backing wallet. Every call fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineWallet;

#[async_trait]
impl WalletCore for OfflineWallet {
    async fn execute(&self, method: &str, _params: &Value) -> Result<Value, RpcError> {
        Err(RpcError::new(DISCONNECTED_CODE, format!("wallet is offline, cannot execute {method}")))
    }

    async fn is_account_updated(&self, _account: Address) -> Result<bool, RpcError> {
        Err(RpcError::new(DISCONNECTED_CODE, "wallet is offline"))
    }
}
