use super::{Messenger, Subscribers, Subscription};
use crate::types::{Message, Origin};
use tracing::trace;

/// A messenger without a peer.
///
/// Sends are dropped and subscriptions never yield an event until the messenger is dropped.
#[derive(Debug, Default)]
pub struct NoopMessenger {
    subscribers: Subscribers,
}

impl Messenger for NoopMessenger {
    fn send(&self, message: Message) {
        trace!(kind = message.kind(), "Dropping message, no peer.");
    }

    fn subscribe(&self) -> Subscription {
        self.subscribers.subscribe()
    }

    fn peer_origin(&self) -> Option<&Origin> {
        None
    }
}
