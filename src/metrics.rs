//! Remote metrics.

use futures_util::future::BoxFuture;
use jsonrpsee::{MethodResponse, server::middleware::rpc::RpcServiceT, types::Request};
use metrics::Counter;
use metrics_derive::Metrics;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::{
    net::SocketAddr,
    sync::{Mutex, PoisonError},
    time::Duration,
};

/// Metrics for policy resolution, labelled by method.
#[derive(Metrics, Clone)]
#[metrics(scope = "remote.resolver")]
pub struct ResolverMetrics {
    /// Requests resolved to headless mode.
    pub headless: Counter,
    /// Requests resolved to dialog mode.
    pub dialog: Counter,
    /// Requests that no mode permits.
    pub violations: Counter,
}

/// Metrics for the remote request queue.
#[derive(Metrics, Clone)]
#[metrics(scope = "remote.queue")]
pub struct QueueMetrics {
    /// Requests added to the queue.
    pub enqueued: Counter,
    /// Requests approved and executed.
    pub responded: Counter,
    /// Requests rejected by the user.
    pub rejected: Counter,
    /// Approved requests the wallet failed to execute.
    pub handler_errors: Counter,
    /// Requests dropped because their channel was torn down.
    pub cleared: Counter,
}

/// Metrics for an RPC method.
#[derive(Metrics, Clone)]
#[metrics(scope = "rpc.call")]
struct RpcMethodMetrics {
    /// The number of calls to the RPC method.
    count: Counter,
}

/// A [`jsonrpsee`] RPC middleware that records metrics for RPC methods.
#[derive(Debug, Clone)]
pub struct RpcMetricsService<S> {
    service: S,
}

impl<S> RpcMetricsService<S> {
    /// Create a new RPC middleware that records metrics for RPC methods.
    pub fn new(inner: S) -> Self {
        Self { service: inner }
    }
}

impl<'a, S> RpcServiceT<'a> for RpcMetricsService<S>
where
    S: RpcServiceT<'a> + Send + Sync + Clone + 'static,
{
    type Future = BoxFuture<'a, MethodResponse>;

    fn call(&self, req: Request<'a>) -> Self::Future {
        let service = self.service.clone();

        Box::pin(async move {
            let method = req.method_name().to_string();
            let rp = service.call(req).await;

            let metrics = RpcMethodMetrics::new_with_labels(&[
                ("method", method),
                ("code", rp.as_error_code().unwrap_or_default().to_string()),
            ]);
            metrics.count.increment(1);

            rp
        })
    }
}

/// Installs the global Prometheus recorder and serves it on `metrics_addr`.
///
/// Only the first call installs the recorder, later calls return its handle.
pub fn setup_exporter(metrics_addr: impl Into<SocketAddr>) -> eyre::Result<PrometheusHandle> {
    static HANDLE: Mutex<Option<PrometheusHandle>> = Mutex::new(None);

    let mut lock = HANDLE.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(handle) = &*lock {
        return Ok(handle.clone());
    }

    let addr: SocketAddr = metrics_addr.into();
    let (recorder, exporter) = PrometheusBuilder::new()
        .with_http_listener(addr)
        .upkeep_timeout(Duration::from_secs(5))
        .build()?;

    let handle = recorder.handle();
    metrics::set_global_recorder(recorder)
        .map_err(|_| eyre::eyre!("a metrics recorder is already installed"))?;
    tokio::spawn(exporter);

    tracing::info!(%addr, "Started metrics server");

    *lock = Some(handle.clone());
    Ok(handle)
}
