//! The `remote_` namespace.
//!
//! Exposes the mediation layer to automation:
//!
//! - `remote_pendingRequests`, `remote_respond` and `remote_reject` operate the dialog queue.
//! - `remote_request` sends a request as the in-process requester, when bridged.
//! - `remote_deliver` and `remote_close` feed the relay messenger, when relayed.

use crate::{
    actions,
    error::ToRpcResult,
    messenger::RelayMessenger,
    remote::Remote,
    requester::Requester,
    types::{Message, QueuedRequest, RequestId},
};
use jsonrpsee::{
    core::{RpcResult, async_trait},
    proc_macros::rpc,
    types::{ErrorObject, error::METHOD_NOT_FOUND_CODE},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Health of the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Health {
    /// Always `ok` while the service answers.
    pub status: String,
    /// Version of the service.
    pub version: String,
    /// The transport the remote side listens on.
    pub transport: Transport,
    /// Number of queued requests.
    pub queued: usize,
}

/// The transport of a running remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Transport {
    /// An in-process bridge to a [`Requester`].
    Bridge,
    /// An HTTP relay.
    Relay,
}

/// The requester facing end of a running remote service.
#[derive(Debug, Clone)]
pub enum Channel {
    /// Bridged to an in-process requester.
    Bridge(Requester),
    /// Tunnelled through a relay.
    Relay(Arc<RelayMessenger>),
}

impl Channel {
    /// The transport of this channel.
    pub fn transport(&self) -> Transport {
        match self {
            Self::Bridge(_) => Transport::Bridge,
            Self::Relay(_) => Transport::Relay,
        }
    }
}

/// Remote control of the mediation layer.
#[rpc(server, client, namespace = "remote")]
pub trait RemoteApi {
    /// Checks the health of the service.
    #[method(name = "health")]
    async fn health(&self) -> RpcResult<Health>;

    /// Announces readiness to the requester again.
    #[method(name = "ready")]
    async fn ready(&self) -> RpcResult<()>;

    /// Lists the queued requests, oldest first.
    #[method(name = "pendingRequests")]
    async fn pending_requests(&self) -> RpcResult<Vec<QueuedRequest>>;

    /// Approves a queued request and returns the wallet's result.
    #[method(name = "respond")]
    async fn respond(&self, id: RequestId) -> RpcResult<Value>;

    /// Rejects a queued request.
    #[method(name = "reject")]
    async fn reject(&self, id: RequestId) -> RpcResult<()>;

    /// Sends a request as the in-process requester and waits for its reply.
    ///
    /// Requests needing a decision are answered once someone responds to or rejects them.
    #[method(name = "request")]
    async fn send_request(&self, method: String, params: Option<Value>) -> RpcResult<Value>;

    /// Hands a message received from the relay to the remote side.
    #[method(name = "deliver")]
    async fn deliver(&self, message: Message) -> RpcResult<()>;

    /// Signals that the relay went away.
    #[method(name = "close")]
    async fn close(&self) -> RpcResult<()>;
}

/// Implementation of the `remote_` namespace.
#[derive(Debug, Clone)]
pub struct RemoteRpc {
    remote: Remote,
    channel: Channel,
}

impl RemoteRpc {
    /// Creates the namespace for `remote` reachable over `channel`.
    pub fn new(remote: Remote, channel: Channel) -> Self {
        Self { remote, channel }
    }

    fn requester(&self) -> RpcResult<&Requester> {
        match &self.channel {
            Channel::Bridge(requester) => Ok(requester),
            Channel::Relay(_) => Err(unavailable("remote_request", Transport::Relay)),
        }
    }

    fn relay(&self, method: &str) -> RpcResult<&RelayMessenger> {
        match &self.channel {
            Channel::Relay(relay) => Ok(relay),
            Channel::Bridge(_) => Err(unavailable(method, Transport::Bridge)),
        }
    }
}

fn unavailable(method: &str, transport: Transport) -> ErrorObject<'static> {
    ErrorObject::owned(
        METHOD_NOT_FOUND_CODE,
        format!("{method} is not available over {transport:?}"),
        None::<()>,
    )
}

#[async_trait]
impl RemoteApiServer for RemoteRpc {
    async fn health(&self) -> RpcResult<Health> {
        Ok(Health {
            status: "ok".into(),
            version: env!("CARGO_PKG_VERSION").into(),
            transport: self.channel.transport(),
            queued: self.remote.store().len(),
        })
    }

    async fn ready(&self) -> RpcResult<()> {
        self.remote.ready().await.to_rpc_result()
    }

    async fn pending_requests(&self) -> RpcResult<Vec<QueuedRequest>> {
        Ok(self.remote.store().list())
    }

    async fn respond(&self, id: RequestId) -> RpcResult<Value> {
        debug!(%id, "Responding to request.");
        actions::respond(&self.remote, &id).await.to_rpc_result()
    }

    async fn reject(&self, id: RequestId) -> RpcResult<()> {
        debug!(%id, "Rejecting request.");
        actions::reject(&self.remote, &id).to_rpc_result()
    }

    async fn send_request(&self, method: String, params: Option<Value>) -> RpcResult<Value> {
        self.requester()?.request(&method, params.unwrap_or(Value::Null)).await.to_rpc_result()
    }

    async fn deliver(&self, message: Message) -> RpcResult<()> {
        self.relay("remote_deliver")?.inject(message);
        Ok(())
    }

    async fn close(&self) -> RpcResult<()> {
        self.relay("remote_close")?.close();
        Ok(())
    }
}
