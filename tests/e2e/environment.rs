//! Remote end-to-end test environment.

use super::Upstream;
use eyre::Context;
use jsonrpsee::{
    core::ClientError,
    http_client::{HttpClient, HttpClientBuilder},
};
use remote::{
    config::RemoteConfig,
    requester::Requester,
    rpc::{Channel, RemoteApiClient},
    spawn::{RemoteHandle, try_spawn},
    types::QueuedRequest,
};
use std::time::Duration;

/// How long to wait for requests to show up in the queue.
const QUEUE_TIMEOUT: Duration = Duration::from_secs(5);

pub struct Environment {
    pub upstream: Upstream,
    pub remote_endpoint: HttpClient,
    pub remote_handle: RemoteHandle,
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("upstream", &self.upstream.local_addr)
            .field("remote", &self.remote_handle.local_addr)
            .finish()
    }
}

impl Environment {
    /// Sets up a remote bridged to an in-process requester, with the default configuration.
    pub async fn setup() -> eyre::Result<Self> {
        Self::setup_with_config(RemoteConfig::default()).await
    }

    /// Sets up a remote with `config`, forwarding to a fresh upstream wallet.
    pub async fn setup_with_config(config: RemoteConfig) -> eyre::Result<Self> {
        let upstream = Upstream::spawn().await?;
        Self::setup_with_upstream(config, upstream).await
    }

    /// Sets up a remote with `config`, forwarding to `upstream`.
    pub async fn setup_with_upstream(
        config: RemoteConfig,
        upstream: Upstream,
    ) -> eyre::Result<Self> {
        let remote_handle =
            try_spawn(config.with_port(0).with_metrics_port(0).with_upstream(Some(upstream.url())))
                .await?;

        let remote_endpoint = HttpClientBuilder::default()
            .request_timeout(Duration::from_secs(10))
            .build(remote_handle.http_url())
            .wrap_err("Failed to build remote client")?;

        Ok(Self { upstream, remote_endpoint, remote_handle })
    }

    /// The in-process requester.
    pub fn requester(&self) -> eyre::Result<&Requester> {
        match &self.remote_handle.channel {
            Channel::Bridge(requester) => Ok(requester),
            Channel::Relay(_) => eyre::bail!("remote is relayed"),
        }
    }

    /// Waits until the queue holds `len` requests and returns them.
    pub async fn wait_for_pending(&self, len: usize) -> eyre::Result<Vec<QueuedRequest>> {
        tokio::time::timeout(QUEUE_TIMEOUT, async {
            loop {
                let pending = self.remote_endpoint.pending_requests().await?;
                if pending.len() == len {
                    return eyre::Ok(pending);
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .wrap_err_with(|| format!("queue never reached {len} requests"))?
    }

    /// Connects the upstream account by approving `eth_requestAccounts`.
    pub async fn connect(&self) -> eyre::Result<()> {
        let client = self.remote_endpoint.clone();
        let request = tokio::spawn(async move {
            client.send_request("eth_requestAccounts".into(), None).await
        });

        let pending = self.wait_for_pending(1).await?;
        self.remote_endpoint.respond(pending[0].id().clone()).await?;
        request.await??;
        Ok(())
    }

    /// Stops the remote and the upstream wallet.
    pub async fn cleanup(self) {
        let _ = self.remote_handle.server.stop();
        let _ = self.upstream.server.stop();
    }
}

/// The JSON-RPC error code of a failed call.
pub fn error_code<T: std::fmt::Debug>(result: Result<T, ClientError>) -> eyre::Result<i32> {
    match result {
        Err(ClientError::Call(object)) => Ok(object.code()),
        other => eyre::bail!("expected a call error, got {other:?}"),
    }
}
