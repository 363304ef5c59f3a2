//! Remote spawn utilities.
use crate::{
    cli::Args,
    config::RemoteConfig,
    constants::UPSTREAM_REQUEST_TIMEOUT,
    dialog::{AutoApprover, DialogRunner},
    messenger::{Messenger, RelayMessenger, bridge},
    metrics::{self, RpcMetricsService},
    remote::Remote,
    requester::{InlineSurface, Requester},
    rpc::{Channel, RemoteApiServer, RemoteRpc},
    storage::RemoteStorage,
    wallet::{OfflineWallet, UpstreamWallet, WalletCore},
};
use http::header;
use jsonrpsee::server::{
    RpcServiceBuilder, Server, ServerHandle, middleware::http::ProxyGetRequestLayer,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::{net::SocketAddr, path::Path, sync::Arc};
use tower::ServiceBuilder;
use tower_http::cors::{AllowMethods, AllowOrigin, CorsLayer};
use tracing::{info, warn};

/// Context returned once the remote service is launched.
#[derive(Debug, Clone)]
pub struct RemoteHandle {
    /// The socket address to which the server is bound.
    pub local_addr: SocketAddr,
    /// Handle to RPC server.
    pub server: ServerHandle,
    /// The remote side of the channel.
    pub remote: Remote,
    /// The requester facing end of the channel.
    pub channel: Channel,
    /// Storage of the remote side.
    pub storage: RemoteStorage,
    /// Metrics collector handle.
    pub metrics: PrometheusHandle,
}

impl RemoteHandle {
    /// Returns the url to the http server
    pub fn http_url(&self) -> String {
        format!("http://{}", self.local_addr)
    }
}

/// Attempts to spawn the remote service using CLI arguments and a configuration file.
pub async fn try_spawn_with_args<P: AsRef<Path>>(
    args: Args,
    config_path: P,
) -> eyre::Result<RemoteHandle> {
    let config = if !config_path.as_ref().exists() {
        let config = args.merge_remote_config(RemoteConfig::default());
        config.save_to_file(&config_path)?;
        config
    } else {
        // File exists: load and override with CLI values.
        args.merge_remote_config(RemoteConfig::load_from_file(&config_path)?)
    };

    try_spawn(config).await
}

/// Spawns the remote service using the provided [`RemoteConfig`].
pub async fn try_spawn(config: RemoteConfig) -> eyre::Result<RemoteHandle> {
    let metrics = metrics::setup_exporter((config.server.address, config.server.metrics_port))?;

    let storage = config.storage.open();
    match &config.storage.path {
        Some(path) => info!(path = %path.display(), "Using file storage."),
        None => info!("Using in-memory storage."),
    }

    let wallet: Arc<dyn WalletCore> = if let Some(upstream) = &config.upstream {
        info!(%upstream, "Forwarding approved requests upstream.");
        Arc::new(
            UpstreamWallet::new(upstream.clone(), UPSTREAM_REQUEST_TIMEOUT)?
                .with_merchant_rpc_url(config.merchant_rpc_url.clone()),
        )
    } else {
        warn!("No upstream wallet configured, every approved request will fail.");
        Arc::new(OfflineWallet)
    };

    let (messenger, channel): (Arc<dyn Messenger>, Channel) = match &config.relay_url {
        Some(url) => {
            info!(%url, "Tunnelling messages through relay.");
            let relay = Arc::new(RelayMessenger::new(url.clone()));
            (relay.clone(), Channel::Relay(relay))
        }
        None => {
            info!(requester = %config.requester_origin, "Bridging to in-process requester.");
            let (requester, remote) =
                bridge::pair(config.requester_origin.clone(), config.origin.clone());
            let requester = Requester::new(
                Arc::new(requester),
                config.requester_origin.clone(),
                Arc::new(InlineSurface),
            );
            (Arc::new(remote), Channel::Bridge(requester))
        }
    };

    let remote = Remote::new(&config, messenger, wallet, storage.clone());
    remote.listen();
    remote.ready().await?;

    if let Some(approve) = config.auto_approve {
        warn!(approve, "Answering every dialog request automatically.");
        DialogRunner::new(remote.clone(), Arc::new(AutoApprover(approve))).spawn();
    }

    let rpc = RemoteRpc::new(remote.clone(), channel.clone()).into_rpc();

    // http layers
    let cors = CorsLayer::new()
        .allow_methods(AllowMethods::any())
        .allow_origin(AllowOrigin::any())
        .allow_headers([header::CONTENT_TYPE]);

    // start server
    let server = Server::builder()
        .http_only()
        .set_http_middleware(
            ServiceBuilder::new()
                .layer(cors)
                .layer(ProxyGetRequestLayer::new("/health", "remote_health")?),
        )
        .set_rpc_middleware(RpcServiceBuilder::new().layer_fn(RpcMetricsService::new))
        .build((config.server.address, config.server.port))
        .await?;
    let addr = server.local_addr()?;
    info!(%addr, origin = %config.origin, "Started remote service");

    Ok(RemoteHandle {
        local_addr: addr,
        server: server.start(rpc),
        remote,
        channel,
        storage,
        metrics,
    })
}
