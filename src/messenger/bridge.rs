//! A messenger between an opener and the context it opened.

use super::{Bridge, Inbound, Messenger, MessengerEvent, Subscribers, Subscription};
use crate::types::{Message, Origin, ReadyPayload};
use std::sync::Arc;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, trace, warn};

/// A message in flight between two contexts.
///
/// The source origin is stamped by the sending side of the channel and is never taken from the
/// message itself.
#[derive(Debug)]
struct Envelope {
    source: Origin,
    message: Message,
}

/// An execution context, e.g. a window, with its origin and inbox.
#[derive(Debug)]
pub struct Context {
    origin: Origin,
    inbox: mpsc::UnboundedReceiver<Envelope>,
}

impl Context {
    /// Creates a context for `origin` and the handle other contexts use to post to it.
    ///
    /// The inbox closes once every handle is dropped.
    pub fn new(origin: Origin) -> (Self, ContextHandle) {
        let (tx, inbox) = mpsc::unbounded_channel();
        (Self { origin: origin.clone(), inbox }, ContextHandle { origin, tx })
    }

    /// The origin of the context.
    pub fn origin(&self) -> &Origin {
        &self.origin
    }
}

/// A handle to post messages to a [`Context`].
#[derive(Debug, Clone)]
pub struct ContextHandle {
    origin: Origin,
    tx: mpsc::UnboundedSender<Envelope>,
}

impl ContextHandle {
    /// The origin of the target context.
    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// Whether the target context is gone.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// A [`Messenger`] between a [`Context`] and a peer context.
///
/// Inbound messages whose source is not the peer's origin are dropped. When the peer is gone,
/// subscribers observe [`MessengerEvent::Closed`] and sends are dropped.
#[derive(Debug)]
pub struct BridgeMessenger {
    origin: Origin,
    peer: ContextHandle,
    subscribers: Arc<Subscribers>,
    pump: JoinHandle<()>,
}

impl BridgeMessenger {
    /// Creates a messenger for `context` talking to `peer`.
    ///
    /// Must be called within a tokio runtime.
    pub fn new(context: Context, peer: ContextHandle) -> Self {
        let subscribers = Arc::new(Subscribers::default());
        let Context { origin, mut inbox } = context;

        let pump = tokio::spawn({
            let subscribers = subscribers.clone();
            let expected = peer.origin().clone();
            let origin = origin.clone();
            async move {
                while let Some(Envelope { source, message }) = inbox.recv().await {
                    if source != expected {
                        warn!(
                            %origin,
                            %source,
                            %expected,
                            kind = message.kind(),
                            "Dropping message from unexpected origin."
                        );
                        continue;
                    }
                    trace!(%origin, %source, kind = message.kind(), "Received message.");
                    let inbound = Inbound { origin: source, message };
                    subscribers.publish(MessengerEvent::Message(inbound));
                }
                debug!(%origin, "Peer context is gone.");
                subscribers.publish(MessengerEvent::Closed);
            }
        });

        Self { origin, peer, subscribers, pump }
    }

    /// The origin of this side of the bridge.
    pub fn origin(&self) -> &Origin {
        &self.origin
    }
}

impl Drop for BridgeMessenger {
    fn drop(&mut self) {
        self.pump.abort();
    }
}

impl Messenger for BridgeMessenger {
    fn send(&self, message: Message) {
        let kind = message.kind();
        if self.peer.tx.send(Envelope { source: self.origin.clone(), message }).is_err() {
            trace!(peer = %self.peer.origin, kind, "Dropping message, peer is gone.");
        }
    }

    fn subscribe(&self) -> Subscription {
        self.subscribers.subscribe()
    }

    fn peer_origin(&self) -> Option<&Origin> {
        Some(&self.peer.origin)
    }

    fn as_bridge(&self) -> Option<&dyn Bridge> {
        Some(self)
    }
}

impl Bridge for BridgeMessenger {
    fn ready(&self, payload: ReadyPayload) {
        debug!(peer = %self.peer.origin, chain_id = payload.chain_id, "Announcing ready.");
        self.send(Message::Ready(payload));
    }
}

/// Creates two linked messengers, one for a context at `a` and one for a context at `b`.
pub fn pair(a: Origin, b: Origin) -> (BridgeMessenger, BridgeMessenger) {
    let (context_a, handle_a) = Context::new(a);
    let (context_b, handle_b) = Context::new(b);
    (BridgeMessenger::new(context_a, handle_b), BridgeMessenger::new(context_b, handle_a))
}
