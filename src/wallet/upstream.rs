use super::WalletCore;
use crate::{constants::CALLS_METHODS, types::RpcError};
use alloy_primitives::Address;
use async_trait::async_trait;
use jsonrpsee::{
    core::{ClientError, client::ClientT, traits::ToRpcParams},
    http_client::{HttpClient, HttpClientBuilder},
    types::error::INTERNAL_ERROR_CODE,
};
use serde::Deserialize;
use serde_json::{Value, json, value::RawValue};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Parameters forwarded verbatim.
struct RawParams<'a>(&'a Value);

impl ToRpcParams for RawParams<'_> {
    fn to_rpc_params(self) -> Result<Option<Box<RawValue>>, serde_json::Error> {
        if self.0.is_null() {
            return Ok(None);
        }
        serde_json::value::to_raw_value(self.0).map(Some)
    }
}

/// Response of `wallet_getAccountVersion`.
#[derive(Debug, Deserialize)]
struct AccountVersion {
    current: String,
    latest: String,
}

/// A [`WalletCore`] forwarding every method to a JSON-RPC endpoint.
#[derive(Debug, Clone)]
pub struct UpstreamWallet {
    client: HttpClient,
    url: Url,
    /// Merchant RPC attached to call requests that do not name one.
    merchant_rpc_url: Option<Url>,
}

impl UpstreamWallet {
    /// Creates a wallet forwarding to `url`.
    pub fn new(url: Url, timeout: Duration) -> eyre::Result<Self> {
        let client = HttpClientBuilder::default().request_timeout(timeout).build(url.as_str())?;
        Ok(Self { client, url, merchant_rpc_url: None })
    }

    /// Sets the merchant RPC that sponsors calls.
    pub fn with_merchant_rpc_url(mut self, merchant_rpc_url: Option<Url>) -> Self {
        self.merchant_rpc_url = merchant_rpc_url;
        self
    }

    /// The upstream endpoint.
    pub fn url(&self) -> &Url {
        &self.url
    }
}

/// Maps a client error to the error object delivered to the requester.
fn to_rpc_error(err: ClientError) -> RpcError {
    match err {
        ClientError::Call(object) => RpcError {
            code: object.code(),
            message: object.message().to_string(),
            data: object.data().and_then(|data| serde_json::from_str(data.get()).ok()),
        },
        err => {
            warn!(%err, "Upstream wallet request failed.");
            RpcError::new(INTERNAL_ERROR_CODE, err.to_string())
        }
    }
}

/// Sets `capabilities.merchantRpcUrl` on the first positional param unless it is already set.
fn with_merchant_rpc_url(params: &Value, merchant_rpc_url: &Url) -> Value {
    let mut params = params.clone();
    if let Some(capabilities) = params
        .as_array_mut()
        .and_then(|params| params.first_mut())
        .and_then(Value::as_object_mut)
        .map(|call| call.entry("capabilities").or_insert_with(|| json!({})))
        .and_then(Value::as_object_mut)
    {
        capabilities
            .entry("merchantRpcUrl")
            .or_insert_with(|| Value::String(merchant_rpc_url.to_string()));
    }
    params
}

#[async_trait]
impl WalletCore for UpstreamWallet {
    async fn execute(&self, method: &str, params: &Value) -> Result<Value, RpcError> {
        debug!(url = %self.url, method, "Forwarding request to upstream wallet.");
        if CALLS_METHODS.contains(&method)
            && let Some(merchant_rpc_url) = &self.merchant_rpc_url
        {
            let params = with_merchant_rpc_url(params, merchant_rpc_url);
            return self.client.request(method, RawParams(&params)).await.map_err(to_rpc_error);
        }
        self.client.request(method, RawParams(params)).await.map_err(to_rpc_error)
    }

    async fn is_account_updated(&self, account: Address) -> Result<bool, RpcError> {
        let version: AccountVersion = self
            .client
            .request("wallet_getAccountVersion", RawParams(&json!([{ "address": account }])))
            .await
            .map_err(to_rpc_error)?;
        Ok(version.current == version.latest)
    }
}
