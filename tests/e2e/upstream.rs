//! A wallet core served over JSON-RPC, standing in for the real upstream.

use alloy_primitives::{Address, address};
use jsonrpsee::{
    core::{RpcResult, async_trait},
    proc_macros::rpc,
    server::{Server, ServerHandle},
    types::ErrorObject,
};
use serde_json::{Value, json};
use std::{
    net::{Ipv4Addr, SocketAddr},
    sync::{Arc, Mutex},
};

/// The account the upstream wallet connects.
pub const ACCOUNT: Address = address!("0x2222222222222222222222222222222222222222");

/// Error code returned for call bundles without calls.
pub const EMPTY_BUNDLE_CODE: i32 = -32000;

#[rpc(server)]
pub trait MockWallet {
    #[method(name = "eth_requestAccounts")]
    async fn request_accounts(&self) -> RpcResult<Vec<Address>>;

    #[method(name = "wallet_getAccountVersion")]
    async fn get_account_version(&self, request: Value) -> RpcResult<Value>;

    #[method(name = "wallet_getCapabilities")]
    async fn get_capabilities(&self, chains: Option<Value>) -> RpcResult<Value>;

    #[method(name = "wallet_sendCalls")]
    async fn send_calls(&self, request: Value) -> RpcResult<Value>;
}

/// Methods the upstream wallet was called with, in call order.
#[derive(Debug, Clone, Default)]
pub struct Calls(Arc<Mutex<Vec<(String, Value)>>>);

impl Calls {
    fn record(&self, method: &str, params: Value) {
        self.0.lock().unwrap().push((method.to_string(), params));
    }

    /// The recorded method names.
    pub fn methods(&self) -> Vec<String> {
        self.0.lock().unwrap().iter().map(|(method, _)| method.clone()).collect()
    }

    /// Params of the last call to `method`.
    pub fn last(&self, method: &str) -> Option<Value> {
        self.0.lock().unwrap().iter().rev().find(|(m, _)| m == method).map(|(_, p)| p.clone())
    }
}

#[derive(Debug, Clone)]
struct MockWalletImpl {
    calls: Calls,
}

#[async_trait]
impl MockWalletServer for MockWalletImpl {
    async fn request_accounts(&self) -> RpcResult<Vec<Address>> {
        self.calls.record("eth_requestAccounts", Value::Null);
        Ok(vec![ACCOUNT])
    }

    async fn get_account_version(&self, request: Value) -> RpcResult<Value> {
        self.calls.record("wallet_getAccountVersion", request);
        Ok(json!({ "current": "0.5.0", "latest": "0.5.0" }))
    }

    async fn get_capabilities(&self, chains: Option<Value>) -> RpcResult<Value> {
        self.calls.record("wallet_getCapabilities", chains.unwrap_or_default());
        Ok(json!({ "0x14a34": { "atomic": { "status": "supported" } } }))
    }

    async fn send_calls(&self, request: Value) -> RpcResult<Value> {
        self.calls.record("wallet_sendCalls", request.clone());
        if request["calls"].as_array().is_none_or(Vec::is_empty) {
            return Err(ErrorObject::owned(
                EMPTY_BUNDLE_CODE,
                "no calls to send",
                Some(json!("0xdeadbeef")),
            ));
        }
        Ok(json!({ "id": "0x01" }))
    }
}

/// A running upstream wallet.
#[derive(Debug)]
pub struct Upstream {
    pub local_addr: SocketAddr,
    pub server: ServerHandle,
    pub calls: Calls,
}

impl Upstream {
    /// Spawns the upstream wallet on a random port.
    pub async fn spawn() -> eyre::Result<Self> {
        let calls = Calls::default();
        let server = Server::builder().http_only().build((Ipv4Addr::LOCALHOST, 0)).await?;
        let local_addr = server.local_addr()?;
        let server = server.start(MockWalletImpl { calls: calls.clone() }.into_rpc());
        Ok(Self { local_addr, server, calls })
    }

    /// The url to the upstream wallet.
    pub fn url(&self) -> url::Url {
        format!("http://{}", self.local_addr).parse().expect("valid url")
    }
}
