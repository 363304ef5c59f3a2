//! The requester side of a messenger channel.
//!
//! A [`Requester`] lives in the context that opened the wallet. It sends requests, matches replies
//! to them and keeps the `ready` handshake, which tells it which methods the remote side answers
//! without showing a dialog.

use crate::{
    error::RequesterError,
    messenger::{Inbound, Messenger, MessengerEvent, Subscription},
    mode::{ModeKind, Outcome},
    policy::{ExecutionContext, Resolver},
    types::{Message, Origin, ReadyPayload, RequestId},
};
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::{
    fmt::Debug,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};
use tokio::{
    sync::{oneshot, watch},
    task::JoinHandle,
};
use tracing::{debug, trace};

/// The surface requests needing a human decision are shown on, e.g. a popup.
#[async_trait]
pub trait DialogSurface: Debug + Send + Sync {
    /// Makes the dialog visible before `method` is requested.
    async fn show(&self, method: &str);
}

/// A [`DialogSurface`] that is always visible.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineSurface;

#[async_trait]
impl DialogSurface for InlineSurface {
    async fn show(&self, _method: &str) {}
}

/// The requester.
#[derive(Debug, Clone)]
pub struct Requester {
    inner: Arc<RequesterInner>,
}

#[derive(Debug)]
struct RequesterInner {
    messenger: Arc<dyn Messenger>,
    /// Our own origin.
    origin: Origin,
    surface: Arc<dyn DialogSurface>,
    replies: Arc<Replies>,
    next_id: AtomicU64,
    reply_loop: JoinHandle<()>,
}

impl Drop for RequesterInner {
    fn drop(&mut self) {
        self.reply_loop.abort();
    }
}

/// State shared with the reply loop.
#[derive(Debug)]
struct Replies {
    pending: DashMap<RequestId, oneshot::Sender<Outcome>>,
    ready: watch::Sender<Option<ReadyPayload>>,
}

impl Replies {
    fn settle(&self, id: &RequestId, outcome: Outcome) {
        match self.pending.remove(id) {
            Some((_, tx)) => {
                let _ = tx.send(outcome);
            }
            None => trace!(%id, "Reply for unknown request."),
        }
    }

    async fn run(self: Arc<Self>, mut subscription: Subscription) {
        while let Some(event) = subscription.recv().await {
            match event {
                MessengerEvent::Message(Inbound { origin, message }) => match message {
                    Message::RpcResponse { id, result } => self.settle(&id, Ok(result)),
                    Message::RpcError { id, error } => self.settle(&id, Err(error)),
                    Message::Ready(payload) => {
                        debug!(peer = %origin, chain_id = payload.chain_id, "Remote is ready.");
                        self.ready.send_replace(Some(payload));
                    }
                    Message::RpcRequest { .. } => {
                        trace!(peer = %origin, "Ignoring request sent to the requester.")
                    }
                },
                MessengerEvent::Closed => {
                    debug!("Remote went away.");
                    self.ready.send_replace(None);
                }
            }
        }
    }
}

impl Requester {
    /// Creates a requester at `origin` talking over `messenger`.
    ///
    /// Must be called within a tokio runtime.
    pub fn new(
        messenger: Arc<dyn Messenger>,
        origin: Origin,
        surface: Arc<dyn DialogSurface>,
    ) -> Self {
        let replies =
            Arc::new(Replies { pending: DashMap::new(), ready: watch::channel(None).0 });
        let reply_loop = tokio::spawn(replies.clone().run(messenger.subscribe()));

        Self {
            inner: Arc::new(RequesterInner {
                messenger,
                origin,
                surface,
                replies,
                next_id: AtomicU64::new(1),
                reply_loop,
            }),
        }
    }

    /// Our own origin.
    pub fn origin(&self) -> &Origin {
        &self.inner.origin
    }

    /// The handshake, if the remote side announced itself.
    pub fn ready_payload(&self) -> Option<ReadyPayload> {
        self.inner.replies.ready.borrow().clone()
    }

    /// Waits up to `timeout` for the remote side to announce itself.
    pub async fn wait_ready(&self, timeout: Duration) -> Result<ReadyPayload, RequesterError> {
        let mut ready = self.inner.replies.ready.subscribe();
        match tokio::time::timeout(timeout, ready.wait_for(Option::is_some)).await {
            Ok(Ok(payload)) => payload.clone().ok_or(RequesterError::Unavailable),
            Ok(Err(_)) => Err(RequesterError::Unavailable),
            Err(_) => Err(RequesterError::DialogUnavailable(timeout)),
        }
    }

    /// Whether the remote side answers `method` from us without a dialog, according to its
    /// handshake. Always `false` before the handshake.
    pub fn headless_eligible(&self, method: &str) -> bool {
        let Some(payload) = self.ready_payload() else { return false };
        let Some(peer) = self.inner.messenger.peer_origin() else { return false };

        let context = ExecutionContext::new(self.inner.origin.clone(), peer.clone());
        Resolver::new(payload.method_policies, &[])
            .select(method, &context)
            .is_ok_and(|resolution| resolution.mode == ModeKind::Headless)
    }

    /// Sends a request and waits for its reply.
    ///
    /// Shows the dialog surface first unless the method is headless eligible. There is no
    /// timeout: requests awaiting a human decision may never be answered.
    pub async fn request(&self, method: &str, params: Value) -> Result<Value, RequesterError> {
        if !self.headless_eligible(method) {
            self.inner.surface.show(method).await;
        }

        let id = RequestId::from(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = oneshot::channel();
        self.inner.replies.pending.insert(id.clone(), tx);

        trace!(%id, method, "Sending request.");
        self.inner.messenger.send(Message::request(id, method, params));
        match rx.await {
            Ok(outcome) => outcome.map_err(Into::into),
            Err(_) => Err(RequesterError::Unavailable),
        }
    }
}
