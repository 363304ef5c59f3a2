//! Execution modes.
//!
//! A request is either answered right away without any UI ([`Headless`]) or queued for a human
//! decision ([`Dialog`]). Both hand back a [`Deferred`] that settles with the outcome delivered to
//! the requester.

use crate::{
    error::{PolicyError, QueueError, RemoteError},
    policy::Resolution,
    remote::Remote,
    types::{Message, Request, RequestId, RpcError},
};
use async_trait::async_trait;
use dashmap::{DashMap, mapref::entry::Entry};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Debug;
use tokio::sync::oneshot;
use tracing::{debug, trace};

/// The outcome of a request as delivered to the requester.
pub type Outcome = Result<Value, RpcError>;

/// The kinds of execution modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ModeKind {
    /// Answered without UI.
    Headless,
    /// Answered after a human decision.
    Dialog,
}

/// The eventual outcome of a request.
///
/// For dialog requests it settles once the request is responded to or rejected, which may never
/// happen. Callers that cannot wait forever must bound the wait themselves.
#[derive(Debug)]
pub struct Deferred {
    id: RequestId,
    rx: oneshot::Receiver<Outcome>,
}

impl Deferred {
    fn new(id: RequestId) -> (oneshot::Sender<Outcome>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { id, rx })
    }

    /// A deferred that is already settled.
    pub fn ready(id: RequestId, outcome: Outcome) -> Self {
        let (tx, deferred) = Self::new(id);
        let _ = tx.send(outcome);
        deferred
    }

    /// The id of the request.
    pub fn id(&self) -> &RequestId {
        &self.id
    }

    /// Returns the outcome if the request already settled.
    pub fn try_settled(&mut self) -> Option<Outcome> {
        self.rx.try_recv().ok()
    }

    /// Waits for the outcome.
    ///
    /// Never resolves if the request is abandoned, e.g. because its channel was torn down.
    pub async fn settled(self) -> Outcome {
        match self.rx.await {
            Ok(outcome) => outcome,
            Err(_) => std::future::pending().await,
        }
    }
}

/// Pending dialog requests awaiting their outcome.
#[derive(Debug, Default)]
pub(crate) struct Waiters {
    waiters: DashMap<RequestId, oneshot::Sender<Outcome>>,
}

impl Waiters {
    /// Registers a waiter for `id`.
    fn register(&self, id: RequestId) -> Result<Deferred, QueueError> {
        match self.waiters.entry(id.clone()) {
            Entry::Occupied(_) => Err(QueueError::DuplicateRequest(id)),
            Entry::Vacant(entry) => {
                let (tx, deferred) = Deferred::new(id);
                entry.insert(tx);
                Ok(deferred)
            }
        }
    }

    /// Settles the waiter for `id`, if any.
    pub(crate) fn settle(&self, id: &RequestId, outcome: Outcome) {
        if let Some((_, tx)) = self.waiters.remove(id) {
            let _ = tx.send(outcome);
        }
    }

    /// Drops the waiter for `id` without settling it.
    fn discard(&self, id: &RequestId) {
        self.waiters.remove(id);
    }

    /// Drops every waiter without settling it.
    pub(crate) fn clear(&self) {
        self.waiters.clear();
    }
}

/// A strategy for executing a request.
#[async_trait]
pub trait Mode: Debug + Send + Sync {
    /// The kind of mode.
    fn kind(&self) -> ModeKind;

    /// Executes `request` under `resolution`.
    ///
    /// Errors are returned before anything was delivered to the requester.
    async fn execute(
        &self,
        remote: &Remote,
        request: Request,
        resolution: Resolution,
    ) -> Result<Deferred, RemoteError>;
}

/// Runs the wallet handler right away.
#[derive(Debug, Default, Clone, Copy)]
pub struct Headless;

impl Headless {
    /// Fails if a pre-condition of `resolution` does not hold.
    async fn check(
        &self,
        remote: &Remote,
        request: &Request,
        resolution: Resolution,
    ) -> Result<(), RemoteError> {
        if !resolution.require_connection && !resolution.require_updated_account {
            return Ok(());
        }

        let state = remote.state().load().await?;
        if resolution.require_connection && !state.is_connected() {
            return Err(PolicyError::ConnectionRequired { method: request.method().into() }.into());
        }
        if resolution.require_updated_account
            && let Some(account) = state.account()
            && !remote.wallet().is_account_updated(account).await.map_err(RemoteError::Handler)?
        {
            return Err(PolicyError::AccountStale { method: request.method().into() }.into());
        }
        Ok(())
    }
}

#[async_trait]
impl Mode for Headless {
    fn kind(&self) -> ModeKind {
        ModeKind::Headless
    }

    async fn execute(
        &self,
        remote: &Remote,
        request: Request,
        resolution: Resolution,
    ) -> Result<Deferred, RemoteError> {
        self.check(remote, &request, resolution).await?;

        trace!(id = %request.id(), method = request.method(), "Executing headless request.");
        let outcome = remote.wallet().execute(request.method(), request.params()).await;
        remote.on_executed(&request, &outcome).await;
        remote.messenger().send(Message::reply(request.id().clone(), outcome.clone()));

        Ok(Deferred::ready(request.id().clone(), outcome))
    }
}

/// Queues the request for a human decision.
///
/// The wallet handler only runs once the request is responded to.
#[derive(Debug, Default, Clone, Copy)]
pub struct Dialog;

#[async_trait]
impl Mode for Dialog {
    fn kind(&self) -> ModeKind {
        ModeKind::Dialog
    }

    async fn execute(
        &self,
        remote: &Remote,
        request: Request,
        _resolution: Resolution,
    ) -> Result<Deferred, RemoteError> {
        let id = request.id().clone();
        let deferred = remote.waiters().register(id.clone())?;
        if let Err(err) = remote.store().enqueue(request) {
            remote.waiters().discard(&id);
            return Err(err.into());
        }

        debug!(%id, "Awaiting decision.");
        Ok(deferred)
    }
}
