//! The remote request queue.
//!
//! The queue is held as an immutable [`RemoteState`] snapshot inside a [`watch`] channel. Every
//! mutation replaces the whole snapshot while holding the channel's write lock, so readers never
//! observe a half-applied transition and a concurrent enqueue and remove cannot interleave.

use crate::{
    error::QueueError,
    metrics::QueueMetrics,
    types::{QueuedRequest, Request, RequestId, RequestStatus},
};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// The requests awaiting a decision, in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RemoteState {
    /// The queued requests.
    pub requests: Vec<QueuedRequest>,
}

impl RemoteState {
    /// The oldest request, which is the one the dialog renders.
    pub fn head(&self) -> Option<&QueuedRequest> {
        self.requests.first()
    }

    /// Looks up a request by id.
    pub fn get(&self, id: &RequestId) -> Option<&QueuedRequest> {
        self.requests.iter().find(|queued| queued.id() == id)
    }

    fn position(&self, id: &RequestId) -> Option<usize> {
        self.requests.iter().position(|queued| queued.id() == id)
    }
}

/// Single owner of the [`RemoteState`].
#[derive(Debug, Clone)]
pub struct RemoteStore {
    state: Arc<watch::Sender<Arc<RemoteState>>>,
}

impl Default for RemoteStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        let (state, _) = watch::channel(Arc::new(RemoteState::default()));
        Self { state: Arc::new(state) }
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Arc<RemoteState> {
        self.state.borrow().clone()
    }

    /// All queued requests, in arrival order.
    pub fn list(&self) -> Vec<QueuedRequest> {
        self.snapshot().requests.clone()
    }

    /// The head of the queue.
    pub fn peek(&self) -> Option<QueuedRequest> {
        self.snapshot().head().cloned()
    }

    /// Number of queued requests.
    pub fn len(&self) -> usize {
        self.state.borrow().requests.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Subscribes to snapshot changes.
    pub fn subscribe(&self) -> watch::Receiver<Arc<RemoteState>> {
        self.state.subscribe()
    }

    /// Applies `transition` to the current snapshot atomically.
    ///
    /// The transition returns the next state, or `None` to leave the state untouched. Subscribers
    /// are only notified if a new state was installed.
    fn transition<T>(
        &self,
        transition: impl FnOnce(&RemoteState) -> Result<(Option<RemoteState>, T), QueueError>,
    ) -> Result<T, QueueError> {
        let mut outcome = None;
        self.state.send_if_modified(|state| match transition(state) {
            Ok((next, value)) => {
                let modified = next.is_some();
                if let Some(next) = next {
                    *state = Arc::new(next);
                }
                outcome = Some(Ok(value));
                modified
            }
            Err(err) => {
                outcome = Some(Err(err));
                false
            }
        });
        outcome.expect("transition always runs")
    }

    /// Appends a request.
    ///
    /// Fails with [`QueueError::DuplicateRequest`] if a request with the same id is queued.
    pub fn enqueue(&self, request: Request) -> Result<(), QueueError> {
        let id = request.id().clone();
        self.transition(|state| {
            if state.get(request.id()).is_some() {
                return Err(QueueError::DuplicateRequest(request.id().clone()));
            }
            let mut next = state.clone();
            next.requests.push(QueuedRequest::pending(request));
            Ok((Some(next), ()))
        })?;

        QueueMetrics::default().enqueued.increment(1);
        debug!(%id, "Enqueued request.");
        Ok(())
    }

    /// Marks a pending request as being responded to and returns it.
    ///
    /// Fails with [`QueueError::UnknownRequest`] if no request with this id awaits a decision.
    pub(crate) fn claim(&self, id: &RequestId) -> Result<QueuedRequest, QueueError> {
        self.transition(|state| {
            let index = state
                .position(id)
                .filter(|index| state.requests[*index].status == RequestStatus::Pending)
                .ok_or_else(|| QueueError::UnknownRequest(id.clone()))?;
            let mut next = state.clone();
            next.requests[index].status = RequestStatus::Responding;
            let claimed = next.requests[index].clone();
            Ok((Some(next), claimed))
        })
    }

    /// Removes the request with this id, returning it. Absent ids are a no-op.
    pub fn remove(&self, id: &RequestId) -> Option<QueuedRequest> {
        self.transition(|state| {
            let Some(index) = state.position(id) else { return Ok((None, None)) };
            let mut next = state.clone();
            let removed = next.requests.remove(index);
            Ok((Some(next), Some(removed)))
        })
        .ok()
        .flatten()
    }

    /// Removes a request that still awaits a decision.
    pub(crate) fn remove_pending(&self, id: &RequestId) -> Result<QueuedRequest, QueueError> {
        self.transition(|state| {
            let index = state
                .position(id)
                .filter(|index| state.requests[*index].status == RequestStatus::Pending)
                .ok_or_else(|| QueueError::UnknownRequest(id.clone()))?;
            let mut next = state.clone();
            let removed = next.requests.remove(index);
            Ok((Some(next), removed))
        })
    }

    /// Removes every queued request, returning them.
    pub fn clear(&self) -> Vec<QueuedRequest> {
        self.transition(|state| {
            if state.requests.is_empty() {
                return Ok((None, Vec::new()));
            }
            Ok((Some(RemoteState::default()), state.requests.clone()))
        })
        .unwrap_or_default()
    }
}
