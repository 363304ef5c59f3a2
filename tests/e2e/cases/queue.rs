use crate::e2e::{EMPTY_BUNDLE_CODE, Environment, error_code};
use jsonrpsee::{
    http_client::HttpClient,
    types::error::{INVALID_PARAMS_CODE, METHOD_NOT_FOUND_CODE},
};
use remote::{
    config::RemoteConfig,
    error::USER_REJECTED_CODE,
    rpc::RemoteApiClient,
    types::{Message, RequestId, RequestStatus},
};
use serde_json::{Value, json};
use tokio::task::JoinHandle;

fn send_calls(
    client: &HttpClient,
    calls: Value,
) -> JoinHandle<Result<Value, jsonrpsee::core::ClientError>> {
    let client = client.clone();
    tokio::spawn(async move {
        client.send_request("wallet_sendCalls".into(), Some(json!([{ "calls": calls }]))).await
    })
}

fn transfer() -> Value {
    json!([{ "to": "0x0000000000000000000000000000000000000001", "value": "0x1" }])
}

#[tokio::test]
async fn reject_answers_user_rejected() -> eyre::Result<()> {
    let env = Environment::setup().await?;

    let request = send_calls(&env.remote_endpoint, transfer());
    let pending = env.wait_for_pending(1).await?;
    assert_eq!(pending[0].status, RequestStatus::Pending);

    env.remote_endpoint.reject(pending[0].id().clone()).await?;
    assert_eq!(error_code(request.await?)?, USER_REJECTED_CODE);
    assert!(env.remote_endpoint.pending_requests().await?.is_empty());
    assert!(env.upstream.calls.methods().is_empty());

    let rendered = env.remote_handle.metrics.render();
    assert!(rendered.contains("remote_queue_enqueued"), "{rendered}");
    assert!(rendered.contains("remote_queue_rejected"), "{rendered}");

    env.cleanup().await;
    Ok(())
}

#[tokio::test]
async fn respond_attaches_merchant_rpc() -> eyre::Result<()> {
    let env = Environment::setup_with_config(
        RemoteConfig::default()
            .with_merchant_rpc_url(Some("https://merchant.example/rpc".parse()?)),
    )
    .await?;

    let request = send_calls(&env.remote_endpoint, transfer());
    let pending = env.wait_for_pending(1).await?;

    let result = env.remote_endpoint.respond(pending[0].id().clone()).await?;
    assert_eq!(result, json!({ "id": "0x01" }));
    assert_eq!(request.await??, result);

    let forwarded = env.upstream.calls.last("wallet_sendCalls").unwrap();
    assert_eq!(forwarded["capabilities"]["merchantRpcUrl"], "https://merchant.example/rpc");

    env.cleanup().await;
    Ok(())
}

#[tokio::test]
async fn handler_errors_reach_both_sides() -> eyre::Result<()> {
    let env = Environment::setup().await?;

    let request = send_calls(&env.remote_endpoint, json!([]));
    let pending = env.wait_for_pending(1).await?;

    let code = error_code(env.remote_endpoint.respond(pending[0].id().clone()).await)?;
    assert_eq!(code, EMPTY_BUNDLE_CODE);
    assert_eq!(error_code(request.await?)?, EMPTY_BUNDLE_CODE);
    assert!(env.remote_endpoint.pending_requests().await?.is_empty());

    env.cleanup().await;
    Ok(())
}

#[tokio::test]
async fn queue_keeps_arrival_order() -> eyre::Result<()> {
    let env = Environment::setup().await?;

    let mut requests = Vec::new();
    for len in 1..=3 {
        requests.push(send_calls(&env.remote_endpoint, transfer()));
        env.wait_for_pending(len).await?;
    }
    let ids: Vec<RequestId> =
        env.wait_for_pending(3).await?.iter().map(|queued| queued.id().clone()).collect();

    env.remote_endpoint.reject(ids[1].clone()).await?;
    let rest: Vec<RequestId> =
        env.wait_for_pending(2).await?.iter().map(|queued| queued.id().clone()).collect();
    assert_eq!(rest, vec![ids[0].clone(), ids[2].clone()]);

    for id in rest {
        env.remote_endpoint.respond(id).await?;
    }
    for request in requests {
        let _ = request.await?;
    }
    assert_eq!(env.upstream.calls.methods(), ["wallet_sendCalls", "wallet_sendCalls"]);

    env.cleanup().await;
    Ok(())
}

#[tokio::test]
async fn actions_on_unknown_requests_fail() -> eyre::Result<()> {
    let env = Environment::setup().await?;

    let request = send_calls(&env.remote_endpoint, transfer());
    let pending = env.wait_for_pending(1).await?;
    let id = pending[0].id().clone();

    assert_eq!(
        error_code(env.remote_endpoint.respond(RequestId::from(999)).await)?,
        INVALID_PARAMS_CODE
    );
    env.remote_endpoint.reject(id.clone()).await?;
    assert_eq!(error_code(env.remote_endpoint.reject(id.clone()).await)?, INVALID_PARAMS_CODE);
    assert_eq!(error_code(env.remote_endpoint.respond(id).await)?, INVALID_PARAMS_CODE);
    let _ = request.await?;

    env.cleanup().await;
    Ok(())
}

#[tokio::test]
async fn auto_approval() -> eyre::Result<()> {
    let env = Environment::setup_with_config(RemoteConfig::default().with_auto_approve(Some(true)))
        .await?;
    assert_eq!(send_calls(&env.remote_endpoint, transfer()).await??, json!({ "id": "0x01" }));
    env.cleanup().await;

    let env =
        Environment::setup_with_config(RemoteConfig::default().with_auto_approve(Some(false)))
            .await?;
    let code = error_code(send_calls(&env.remote_endpoint, transfer()).await?)?;
    assert_eq!(code, USER_REJECTED_CODE);
    assert!(env.upstream.calls.methods().is_empty());
    env.cleanup().await;

    Ok(())
}

#[tokio::test]
async fn relay_methods_are_unavailable_when_bridged() -> eyre::Result<()> {
    let env = Environment::setup().await?;

    let message = Message::request(1, "wallet_sendCalls", json!([]));
    assert_eq!(error_code(env.remote_endpoint.deliver(message).await)?, METHOD_NOT_FOUND_CODE);
    assert_eq!(error_code(env.remote_endpoint.close().await)?, METHOD_NOT_FOUND_CODE);

    env.cleanup().await;
    Ok(())
}
