//! Message transports between the requester and the remote context.
//!
//! A [`Messenger`] is a fire-and-forget, in-order link between exactly two contexts. Inbound
//! messages are fanned out to every live [`Subscription`] together with the origin of the sender,
//! which the transport derives from the channel itself and never from message content.
//!
//! - [`NoopMessenger`] when there is no partner context.
//! - [`BridgeMessenger`] between an opener and the context it opened.
//! - [`RelayMessenger`] tunnelling messages through an HTTP endpoint, for automation.

use crate::types::{Message, Origin, ReadyPayload};
use std::{
    fmt::Debug,
    sync::{Arc, Mutex, PoisonError},
};
use tokio::sync::mpsc;
use tracing::{debug, warn};
use url::Url;

pub mod bridge;
pub use bridge::{BridgeMessenger, Context, ContextHandle};

mod noop;
pub use noop::NoopMessenger;

mod relay;
pub use relay::RelayMessenger;

/// A message received from the peer.
#[derive(Debug, Clone, PartialEq)]
pub struct Inbound {
    /// Origin of the sending context, as validated by the transport.
    pub origin: Origin,
    /// The message.
    pub message: Message,
}

/// Events observed by subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum MessengerEvent {
    /// A message arrived.
    Message(Inbound),
    /// The peer went away. No further messages will arrive.
    Closed,
}

/// A subscription to the inbound events of a messenger.
///
/// Events are buffered without bound until received.
#[derive(Debug)]
pub struct Subscription {
    rx: mpsc::UnboundedReceiver<MessengerEvent>,
}

impl Subscription {
    /// Receives the next event. Returns `None` once the messenger is gone.
    pub async fn recv(&mut self) -> Option<MessengerEvent> {
        self.rx.recv().await
    }
}

/// The live subscriptions of a messenger.
#[derive(Debug, Default)]
struct Subscribers {
    senders: Mutex<Vec<mpsc::UnboundedSender<MessengerEvent>>>,
}

impl Subscribers {
    fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        self.senders.lock().unwrap_or_else(PoisonError::into_inner).push(tx);
        Subscription { rx }
    }

    /// Hands `event` to every subscription, forgetting the ones that were dropped.
    fn publish(&self, event: MessengerEvent) {
        self.senders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|tx| tx.send(event.clone()).is_ok());
    }
}

/// A transport to a peer context.
pub trait Messenger: Debug + Send + Sync {
    /// Sends a message to the peer.
    ///
    /// Delivery is not guaranteed: messages to a peer that is gone are dropped silently.
    fn send(&self, message: Message);

    /// Subscribes to inbound events.
    fn subscribe(&self) -> Subscription;

    /// Origin of the peer, if known.
    fn peer_origin(&self) -> Option<&Origin>;

    /// Returns the messenger as a [`Bridge`] if it supports the ready handshake.
    fn as_bridge(&self) -> Option<&dyn Bridge> {
        None
    }
}

/// A messenger that can announce readiness to its peer.
pub trait Bridge: Messenger {
    /// Announces that this side is ready to receive requests.
    fn ready(&self, payload: ReadyPayload);
}

/// A browsing context and a handle to the context that opened it.
#[derive(Debug)]
pub struct Window {
    /// This context.
    pub context: Context,
    /// The opener, or parent if embedded.
    pub opener: ContextHandle,
}

/// Chooses the messenger for the current environment.
///
/// - No location: there is no partner context, use [`NoopMessenger`].
/// - A `relayUrl` query parameter: use [`RelayMessenger`] towards that URL.
/// - Otherwise bridge to the opener if there is one.
pub fn detect(location: Option<&Url>, window: Option<Window>) -> Arc<dyn Messenger> {
    let Some(location) = location else {
        debug!("No location, using noop messenger.");
        return Arc::new(NoopMessenger::default());
    };

    if let Some((_, relay_url)) = location.query_pairs().find(|(key, _)| key == "relayUrl") {
        match Url::parse(&relay_url) {
            Ok(relay_url) => {
                debug!(%relay_url, "Using relay messenger.");
                return Arc::new(RelayMessenger::new(relay_url));
            }
            Err(err) => warn!(%relay_url, %err, "Ignoring invalid relay url."),
        }
    }

    match window {
        Some(Window { context, opener }) => Arc::new(BridgeMessenger::new(context, opener)),
        None => Arc::new(NoopMessenger::default()),
    }
}
