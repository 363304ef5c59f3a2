use super::{Inbound, Messenger, MessengerEvent, Subscribers, Subscription};
use crate::types::{Message, Origin};
use reqwest::Client;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, trace, warn};
use url::Url;

/// A [`Messenger`] tunnelling messages through an HTTP relay endpoint.
///
/// Outbound messages are posted as JSON to the relay URL, one at a time in send order. Inbound
/// messages are handed over by whatever receives them from the relay through
/// [`RelayMessenger::inject`], and are attributed to the relay's origin.
///
/// There is no handshake over a relay.
#[derive(Debug)]
pub struct RelayMessenger {
    url: Url,
    origin: Origin,
    outbox: mpsc::UnboundedSender<Message>,
    subscribers: Subscribers,
    poster: JoinHandle<()>,
}

impl RelayMessenger {
    /// Creates a messenger posting to `url`.
    ///
    /// Must be called within a tokio runtime.
    pub fn new(url: Url) -> Self {
        Self::with_client(Client::new(), url)
    }

    /// Creates a messenger posting to `url` with the given HTTP client.
    pub fn with_client(client: Client, url: Url) -> Self {
        let (outbox, mut rx) = mpsc::unbounded_channel::<Message>();

        let poster = tokio::spawn({
            let url = url.clone();
            async move {
                while let Some(message) = rx.recv().await {
                    let kind = message.kind();
                    match client.post(url.clone()).json(&message).send().await {
                        Ok(response) if response.status().is_success() => {
                            trace!(%url, kind, "Posted message to relay.");
                        }
                        Ok(response) => {
                            warn!(%url, kind, status = %response.status(), "Relay refused message.")
                        }
                        Err(err) => warn!(%url, kind, %err, "Failed to post message to relay."),
                    }
                }
            }
        });

        Self {
            origin: Origin::from_url(&url),
            url,
            outbox,
            subscribers: Subscribers::default(),
            poster,
        }
    }

    /// The relay endpoint.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Delivers a message received from the relay to subscribers.
    pub fn inject(&self, message: Message) {
        trace!(url = %self.url, kind = message.kind(), "Received message from relay.");
        self.subscribers
            .publish(MessengerEvent::Message(Inbound { origin: self.origin.clone(), message }));
    }

    /// Signals subscribers that the relay went away.
    pub fn close(&self) {
        debug!(url = %self.url, "Relay closed.");
        self.subscribers.publish(MessengerEvent::Closed);
    }
}

impl Drop for RelayMessenger {
    fn drop(&mut self) {
        self.poster.abort();
    }
}

impl Messenger for RelayMessenger {
    fn send(&self, message: Message) {
        if self.outbox.send(message).is_err() {
            trace!(url = %self.url, "Dropping message, relay poster stopped.");
        }
    }

    fn subscribe(&self) -> Subscription {
        self.subscribers.subscribe()
    }

    fn peer_origin(&self) -> Option<&Origin> {
        Some(&self.origin)
    }
}
