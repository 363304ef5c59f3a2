//! The remote instance.
//!
//! A [`Remote`] sits in the wallet's context and mediates every request arriving over its
//! [`Messenger`]: it resolves the request against the method policies, answers it headlessly or
//! queues it for a human decision, and replies over the same messenger.

use crate::{
    config::RemoteConfig,
    error::{QueueError, RemoteError, RequestError},
    metrics::QueueMetrics,
    messenger::{Inbound, Messenger, MessengerEvent},
    mode::{Deferred, Dialog, Headless, Mode, ModeKind, Outcome, Waiters},
    policy::{ExecutionContext, Resolver},
    queue::RemoteStore,
    state::{StateStore, connected_accounts},
    storage::RemoteStorage,
    types::{Message, MethodPolicies, Origin, ReadyPayload, Request, RequestId},
    wallet::WalletCore,
};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

/// The remote instance.
#[derive(Debug, Clone)]
pub struct Remote {
    inner: Arc<RemoteInner>,
}

#[derive(Debug)]
struct RemoteInner {
    /// The origin that owns the wallet.
    origin: Origin,
    messenger: Arc<dyn Messenger>,
    wallet: Arc<dyn WalletCore>,
    state: StateStore,
    resolver: Resolver,
    store: RemoteStore,
    waiters: Waiters,
}

impl Remote {
    /// Creates a new remote instance.
    ///
    /// The policy table is narrowed by the configured overrides and those the environment
    /// imposes before any request is resolved.
    pub fn new(
        config: &RemoteConfig,
        messenger: Arc<dyn Messenger>,
        wallet: Arc<dyn WalletCore>,
        storage: RemoteStorage,
    ) -> Self {
        let resolver = Resolver::new(config.method_policies.clone(), &config.overrides());
        let state = StateStore::new(storage, config.storage.key.clone(), config.default_state());

        Self {
            inner: Arc::new(RemoteInner {
                origin: config.origin.clone(),
                messenger,
                wallet,
                state,
                resolver,
                store: RemoteStore::new(),
                waiters: Waiters::default(),
            }),
        }
    }

    /// The origin that owns the wallet.
    pub fn origin(&self) -> &Origin {
        &self.inner.origin
    }

    /// The messenger requests arrive on.
    pub fn messenger(&self) -> &Arc<dyn Messenger> {
        &self.inner.messenger
    }

    /// The wallet core.
    pub fn wallet(&self) -> &Arc<dyn WalletCore> {
        &self.inner.wallet
    }

    /// The persisted instance state.
    pub fn state(&self) -> &StateStore {
        &self.inner.state
    }

    /// The request queue.
    pub fn store(&self) -> &RemoteStore {
        &self.inner.store
    }

    /// The method policies in effect, with all overrides applied.
    pub fn method_policies(&self) -> &MethodPolicies {
        self.inner.resolver.policies()
    }

    pub(crate) fn waiters(&self) -> &Waiters {
        &self.inner.waiters
    }

    fn mode(&self, kind: ModeKind) -> &'static dyn Mode {
        match kind {
            ModeKind::Headless => &Headless,
            ModeKind::Dialog => &Dialog,
        }
    }

    /// Handles a message received from the requester.
    ///
    /// Only `rpc-request` messages are accepted. A request that fails validation or resolution
    /// is answered with an `rpc-error` and never queued. A request reusing the id of a queued
    /// one is not answered.
    pub async fn handle(&self, inbound: Inbound) -> Result<Deferred, RemoteError> {
        let Inbound { origin, message } = inbound;
        let raw = serde_json::to_value(&message).map_err(eyre::Error::from)?;
        let kind = message.kind();
        let Message::RpcRequest { id, method, params } = message else {
            return Err(RequestError::Malformed(format!("unexpected {kind} message")).into());
        };
        let id = id.unwrap_or_else(RequestId::generate);

        let result = self.execute(id.clone(), method, params, origin, raw).await;
        match &result {
            Ok(_) => {}
            // The id belongs to the queued request, a reply would settle that one.
            Err(err @ RemoteError::Queue(QueueError::DuplicateRequest(_))) => {
                warn!(%id, %err, "Ignoring request reusing a queued id.");
            }
            Err(err) => {
                debug!(%id, %err, "Request failed.");
                self.messenger().send(Message::reply(id, Err(err.to_rpc_error())));
            }
        }
        result
    }

    async fn execute(
        &self,
        id: RequestId,
        method: String,
        params: serde_json::Value,
        origin: Origin,
        raw: serde_json::Value,
    ) -> Result<Deferred, RemoteError> {
        let request = Request::new(Some(id), method, params, origin, raw)?;
        let context = ExecutionContext::new(request.origin().clone(), self.origin().clone());
        let resolution = self.inner.resolver.resolve(request.method(), &context)?;

        trace!(
            id = %request.id(),
            method = request.method(),
            origin = %request.origin(),
            mode = ?resolution.mode,
            "Handling request."
        );
        self.mode(resolution.mode).execute(self, request, resolution).await
    }

    /// Bookkeeping after the wallet executed `request`.
    pub(crate) async fn on_executed(&self, request: &Request, outcome: &Outcome) {
        let Ok(result) = outcome else { return };
        let Some(accounts) = connected_accounts(request.method(), result) else { return };
        if let Err(err) = self.state().record_accounts(accounts).await {
            warn!(%err, method = request.method(), "Failed to record connected accounts.");
        }
    }

    /// Drops every queued request of a channel that went away.
    ///
    /// Nothing is sent since the peer is gone. The deferred outcomes of the dropped requests never
    /// settle.
    pub fn teardown(&self) {
        self.waiters().clear();
        let dropped = self.store().clear();
        if !dropped.is_empty() {
            QueueMetrics::default().cleared.increment(dropped.len() as u64);
            info!(dropped = dropped.len(), "Channel closed, dropped queued requests.");
        }
    }

    /// Announces readiness to the requester.
    ///
    /// Does nothing if the messenger does not support the handshake.
    pub async fn ready(&self) -> Result<(), RemoteError> {
        if self.messenger().as_bridge().is_none() {
            trace!("Messenger has no handshake, not announcing ready.");
            return Ok(());
        }

        let state = self.state().load().await?;
        let payload = ReadyPayload {
            chain_id: state.chain_id,
            fee_token: state.fee_token,
            method_policies: self.method_policies().clone(),
        };
        if let Some(bridge) = self.messenger().as_bridge() {
            bridge.ready(payload);
        }
        Ok(())
    }

    /// Spawns the loop handling inbound messages.
    ///
    /// Messages are handled one at a time in arrival order. The loop ends once the messenger is
    /// gone.
    pub fn listen(&self) -> JoinHandle<()> {
        let mut subscription = self.messenger().subscribe();
        let this = self.clone();
        tokio::spawn(async move {
            while let Some(event) = subscription.recv().await {
                match event {
                    MessengerEvent::Message(inbound) => {
                        if let Err(err) = this.handle(inbound).await {
                            trace!(%err, "Inbound message not handled.");
                        }
                    }
                    MessengerEvent::Closed => this.teardown(),
                }
            }
            debug!("Messenger gone, remote stopped listening.");
        })
    }
}
