use crate::e2e::{Environment, RelaySink, error_code};
use jsonrpsee::types::error::METHOD_NOT_FOUND_CODE;
use remote::{
    config::RemoteConfig,
    error::UNAUTHORIZED_CODE,
    rpc::{RemoteApiClient, Transport},
    types::{Message, Origin, RequestId},
};
use serde_json::json;
use std::time::Duration;

async fn next(sink: &mut RelaySink) -> eyre::Result<Message> {
    tokio::time::timeout(Duration::from_secs(5), sink.messages.recv())
        .await?
        .ok_or_else(|| eyre::eyre!("relay sink closed"))
}

fn send_calls(id: u64) -> Message {
    Message::request(
        id,
        "wallet_sendCalls",
        json!([{ "calls": [{ "to": "0x0000000000000000000000000000000000000001" }] }]),
    )
}

#[tokio::test]
async fn relayed_requests() -> eyre::Result<()> {
    let mut sink = RelaySink::spawn().await?;
    let env =
        Environment::setup_with_config(RemoteConfig::default().with_relay_url(Some(sink.url())))
            .await?;
    assert_eq!(env.remote_endpoint.health().await?.transport, Transport::Relay);

    env.remote_endpoint.deliver(send_calls(7)).await?;
    let pending = env.wait_for_pending(1).await?;
    assert_eq!(pending[0].id(), &RequestId::from(7));
    assert_eq!(pending[0].request.origin(), &Origin::from_url(&sink.url()));

    env.remote_endpoint.respond(RequestId::from(7)).await?;
    assert_eq!(next(&mut sink).await?, Message::reply(7.into(), Ok(json!({ "id": "0x01" }))));

    // Headless methods still need a connection.
    env.remote_endpoint
        .deliver(Message::request(8, "wallet_getCapabilities", json!([])))
        .await?;
    let Message::RpcError { id, error } = next(&mut sink).await? else {
        eyre::bail!("expected an error reply")
    };
    assert_eq!(id, RequestId::from(8));
    assert_eq!(error.code, UNAUTHORIZED_CODE);

    env.cleanup().await;
    Ok(())
}

#[tokio::test]
async fn closing_the_relay_drops_the_queue() -> eyre::Result<()> {
    let sink = RelaySink::spawn().await?;
    let env =
        Environment::setup_with_config(RemoteConfig::default().with_relay_url(Some(sink.url())))
            .await?;

    env.remote_endpoint.deliver(send_calls(1)).await?;
    env.remote_endpoint.deliver(send_calls(2)).await?;
    env.wait_for_pending(2).await?;

    env.remote_endpoint.close().await?;
    env.wait_for_pending(0).await?;

    let code = error_code(env.remote_endpoint.send_request("eth_accounts".into(), None).await)?;
    assert_eq!(code, METHOD_NOT_FOUND_CODE);

    env.cleanup().await;
    Ok(())
}
