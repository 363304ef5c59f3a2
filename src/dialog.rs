//! The approval dialog.
//!
//! The [`DialogRunner`] works through the request queue head first, one request at a time. For
//! each request it builds the [`Prompt`] an approval screen renders, asks an [`Approver`] for the
//! decision and then responds or rejects.

use crate::{
    actions::{reject, respond},
    error::{QueueError, RemoteError, RequestError},
    remote::Remote,
    types::{QueuedRequest, Request, RequestStatus, SendCallsParams},
};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// What an approval screen shows for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
    /// A call bundle.
    SendCalls(SendCallsParams),
    /// Any other method, shown by name.
    Generic {
        /// The requested method.
        method: String,
    },
}

impl Prompt {
    /// Builds the prompt for `request`.
    ///
    /// Fails if the parameters of a method with a dedicated screen do not decode.
    pub fn for_request(request: &Request) -> Result<Self, RequestError> {
        match request.method() {
            "wallet_sendCalls" => Ok(Self::SendCalls(request.decode_params()?)),
            method => Ok(Self::Generic { method: method.to_string() }),
        }
    }
}

/// Decides on queued requests, e.g. by asking a human.
#[async_trait]
pub trait Approver: Debug + Send + Sync {
    /// Whether `request` is approved.
    async fn approve(&self, request: &QueuedRequest, prompt: &Prompt) -> bool;
}

/// An [`Approver`] with a fixed answer.
#[derive(Debug, Clone, Copy)]
pub struct AutoApprover(pub bool);

#[async_trait]
impl Approver for AutoApprover {
    async fn approve(&self, _request: &QueuedRequest, _prompt: &Prompt) -> bool {
        self.0
    }
}

/// Drives an [`Approver`] over the request queue.
#[derive(Debug, Clone)]
pub struct DialogRunner {
    remote: Remote,
    approver: Arc<dyn Approver>,
}

impl DialogRunner {
    /// Creates a new runner.
    pub fn new(remote: Remote, approver: Arc<dyn Approver>) -> Self {
        Self { remote, approver }
    }

    /// Decides on the head of the queue if it awaits a decision.
    ///
    /// Returns `false` if there was nothing to decide on.
    pub async fn step(&self) -> bool {
        let Some(head) = self.remote.store().peek() else { return false };
        if head.status != RequestStatus::Pending {
            return false;
        }

        let id = head.id().clone();
        let approved = match Prompt::for_request(&head.request) {
            Ok(prompt) => {
                if let Prompt::SendCalls(params) = &prompt {
                    info!(
                        %id,
                        calls = params.calls.len(),
                        value = %params.total_value(),
                        fee_token = ?params.fee_token(),
                        "Approval requested for call bundle."
                    );
                }
                self.approver.approve(&head, &prompt).await
            }
            Err(err) => {
                warn!(%id, %err, "Cannot render request, rejecting.");
                false
            }
        };

        let result = if approved {
            respond(&self.remote, &id).await.map(drop)
        } else {
            reject(&self.remote, &id)
        };
        match result {
            Ok(()) => debug!(%id, approved, "Decided on request."),
            // Decided elsewhere in the meantime.
            Err(RemoteError::Queue(QueueError::UnknownRequest(_))) => {
                debug!(%id, "Request already decided.")
            }
            Err(err) => debug!(%id, %err, "Approved request failed."),
        }
        true
    }

    /// Spawns the runner. It runs until aborted.
    pub fn spawn(self) -> JoinHandle<()> {
        let mut changes = self.remote.store().subscribe();
        tokio::spawn(async move {
            loop {
                while self.step().await {}
                if changes
                    .wait_for(|state| {
                        state.head().is_some_and(|head| head.status == RequestStatus::Pending)
                    })
                    .await
                    .is_err()
                {
                    break;
                }
            }
        })
    }
}
