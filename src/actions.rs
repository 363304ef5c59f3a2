//! Decisions on queued requests.
//!
//! Both actions are terminal: once a request was responded to or rejected, any further action on
//! its id fails with [`QueueError::UnknownRequest`](crate::error::QueueError::UnknownRequest).

use crate::{
    error::RemoteError,
    metrics::QueueMetrics,
    remote::Remote,
    types::{Message, RequestId},
};
use serde_json::Value;
use tracing::{debug, info};

/// Approves the queued request `id`.
///
/// Runs the wallet handler, removes the request from the queue and replies to the requester with
/// the outcome. The request is removed even if the handler fails, in which case the handler's
/// error is both replied and returned.
pub async fn respond(remote: &Remote, id: &RequestId) -> Result<Value, RemoteError> {
    let request = remote.store().claim(id)?.request;

    debug!(%id, method = request.method(), "Executing approved request.");
    let outcome = remote.wallet().execute(request.method(), request.params()).await;
    remote.store().remove(id);
    remote.on_executed(&request, &outcome).await;

    let metrics = QueueMetrics::default();
    match &outcome {
        Ok(_) => metrics.responded.increment(1),
        Err(err) => {
            metrics.handler_errors.increment(1);
            info!(%id, method = request.method(), %err, "Approved request failed.");
        }
    }

    remote.waiters().settle(id, outcome.clone());
    remote.messenger().send(Message::reply(id.clone(), outcome.clone()));
    outcome.map_err(RemoteError::Handler)
}

/// Rejects the queued request `id` without running the wallet handler.
///
/// The requester receives a `user-rejected` error.
pub fn reject(remote: &Remote, id: &RequestId) -> Result<(), RemoteError> {
    let queued = remote.store().remove_pending(id)?;
    QueueMetrics::default().rejected.increment(1);
    debug!(%id, method = queued.request.method(), "Rejected request.");

    let error = RemoteError::UserRejected.to_rpc_error();
    remote.waiters().settle(id, Err(error.clone()));
    remote.messenger().send(Message::reply(id.clone(), Err(error)));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::RemoteConfig,
        error::{QueueError, USER_REJECTED_CODE, user_rejected},
        messenger::{Inbound, Messenger, MessengerEvent, NoopMessenger, bridge},
        mode::Deferred,
        storage::RemoteStorage,
        types::{Origin, RequestStatus, RpcError},
        wallet::test_utils::MockWallet,
    };
    use serde_json::json;
    use std::sync::Arc;

    fn app() -> Origin {
        "https://app.example".parse().unwrap()
    }

    fn remote_with(wallet: MockWallet) -> (Remote, Arc<MockWallet>) {
        let wallet = Arc::new(wallet);
        let remote = Remote::new(
            &RemoteConfig::default(),
            Arc::new(NoopMessenger::default()),
            wallet.clone(),
            RemoteStorage::in_memory(),
        );
        (remote, wallet)
    }

    async fn enqueue(remote: &Remote, id: u64) -> Deferred {
        remote
            .handle(Inbound {
                origin: app(),
                message: Message::request(id, "wallet_sendCalls", json!([{ "calls": [] }])),
            })
            .await
            .unwrap()
    }

    fn ids(remote: &Remote) -> Vec<RequestId> {
        remote.store().list().iter().map(|queued| queued.id().clone()).collect()
    }

    #[tokio::test]
    async fn respond_preserves_order_of_the_rest() {
        let (remote, wallet) = remote_with(MockWallet::default());
        let _a = enqueue(&remote, 1).await;
        let b = enqueue(&remote, 2).await;
        let _c = enqueue(&remote, 3).await;

        assert_eq!(respond(&remote, &2.into()).await.unwrap(), "wallet_sendCalls:ok");
        assert_eq!(ids(&remote), vec![RequestId::from(1), 3.into()]);
        assert_eq!(b.settled().await.unwrap(), "wallet_sendCalls:ok");
        assert_eq!(wallet.methods(), vec!["wallet_sendCalls"]);
    }

    #[tokio::test]
    async fn reject_removes_exactly_one() {
        let (remote, wallet) = remote_with(MockWallet::default());
        let _a = enqueue(&remote, 1).await;
        let b = enqueue(&remote, 2).await;
        let _c = enqueue(&remote, 3).await;

        reject(&remote, &2.into()).unwrap();
        assert_eq!(ids(&remote), vec![RequestId::from(1), 3.into()]);
        assert_eq!(b.settled().await.unwrap_err().code, USER_REJECTED_CODE);
        assert!(wallet.methods().is_empty());
    }

    #[tokio::test]
    async fn actions_are_terminal() {
        let (remote, _) = remote_with(MockWallet::default());
        let _a = enqueue(&remote, 1).await;
        let _b = enqueue(&remote, 2).await;

        reject(&remote, &1.into()).unwrap();
        assert!(matches!(
            reject(&remote, &1.into()),
            Err(RemoteError::Queue(QueueError::UnknownRequest(_)))
        ));
        assert!(matches!(
            respond(&remote, &1.into()).await,
            Err(RemoteError::Queue(QueueError::UnknownRequest(_)))
        ));
        assert_eq!(ids(&remote), vec![RequestId::from(2)]);
    }

    #[tokio::test]
    async fn respond_to_unknown_id_does_not_touch_the_queue() {
        let (remote, wallet) = remote_with(MockWallet::default());
        let _a = enqueue(&remote, 1).await;
        let before = remote.store().snapshot();

        assert!(matches!(
            respond(&remote, &9.into()).await,
            Err(RemoteError::Queue(QueueError::UnknownRequest(_)))
        ));
        assert_eq!(remote.store().snapshot(), before);
        assert!(wallet.methods().is_empty());
    }

    #[tokio::test]
    async fn handler_errors_still_remove_the_request() {
        let failure = RpcError::new(-32000, "execution reverted").with_data(json!("0xdeadbeef"));
        let (remote, _) = remote_with(MockWallet::failing(failure.clone()));
        let deferred = enqueue(&remote, 1).await;

        assert!(matches!(
            respond(&remote, &1.into()).await,
            Err(RemoteError::Handler(err)) if err == failure
        ));
        assert!(remote.store().is_empty());
        assert_eq!(deferred.settled().await.unwrap_err(), failure);
    }

    #[tokio::test]
    async fn requests_being_responded_to_cannot_be_rejected() {
        let (remote, _) = remote_with(MockWallet::default());
        let _a = enqueue(&remote, 1).await;
        remote.store().claim(&1.into()).unwrap();

        assert_eq!(remote.store().peek().unwrap().status, RequestStatus::Responding);
        assert!(reject(&remote, &1.into()).is_err());
    }

    #[tokio::test]
    async fn replies_reach_the_requester() {
        let (requester, messenger) = bridge::pair(app(), "https://id.porto.sh".parse().unwrap());
        let remote = Remote::new(
            &RemoteConfig::default(),
            Arc::new(messenger),
            Arc::new(MockWallet::default()),
            RemoteStorage::in_memory(),
        );
        let mut replies = requester.subscribe();
        let _a = enqueue(&remote, 1).await;
        let _b = enqueue(&remote, 2).await;

        respond(&remote, &1.into()).await.unwrap();
        reject(&remote, &2.into()).unwrap();

        let Some(MessengerEvent::Message(first)) = replies.recv().await else { panic!() };
        assert_eq!(first.message, Message::reply(1.into(), Ok(json!("wallet_sendCalls:ok"))));
        let Some(MessengerEvent::Message(second)) = replies.recv().await else { panic!() };
        assert_eq!(second.message, Message::reply(2.into(), Err(user_rejected())));
    }
}
