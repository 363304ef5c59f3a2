use crate::e2e::{ACCOUNT, Environment, error_code};
use remote::{error::UNAUTHORIZED_CODE, error::UNSUPPORTED_METHOD_CODE, rpc::RemoteApiClient};
use serde_json::json;

#[tokio::test]
async fn headless_requires_a_connection() -> eyre::Result<()> {
    let env = Environment::setup().await?;

    let code = error_code(
        env.remote_endpoint.send_request("wallet_getCapabilities".into(), Some(json!([]))).await,
    )?;
    assert_eq!(code, UNAUTHORIZED_CODE);
    assert!(env.upstream.calls.methods().is_empty());

    env.connect().await?;
    let capabilities =
        env.remote_endpoint.send_request("wallet_getCapabilities".into(), Some(json!([]))).await?;
    assert_eq!(capabilities["0x14a34"]["atomic"]["status"], "supported");
    assert_eq!(
        env.upstream.calls.methods(),
        ["eth_requestAccounts", "wallet_getAccountVersion", "wallet_getCapabilities"]
    );
    assert_eq!(
        env.upstream.calls.last("wallet_getAccountVersion"),
        Some(json!({ "address": ACCOUNT }))
    );
    // Never queued.
    assert!(env.remote_endpoint.pending_requests().await?.is_empty());

    env.cleanup().await;
    Ok(())
}

#[tokio::test]
async fn connect_goes_through_the_dialog() -> eyre::Result<()> {
    let env = Environment::setup().await?;

    let client = env.remote_endpoint.clone();
    let request =
        tokio::spawn(async move { client.send_request("eth_requestAccounts".into(), None).await });

    let pending = env.wait_for_pending(1).await?;
    assert_eq!(pending[0].request.method(), "eth_requestAccounts");
    assert_eq!(pending[0].request.origin().as_str(), "http://localhost:5173");
    assert!(env.upstream.calls.methods().is_empty());

    let result = env.remote_endpoint.respond(pending[0].id().clone()).await?;
    assert_eq!(result, json!([ACCOUNT]));
    assert_eq!(request.await??, json!([ACCOUNT]));

    let state = env.remote_handle.remote.state().load().await?;
    assert_eq!(state.accounts, vec![ACCOUNT]);

    env.cleanup().await;
    Ok(())
}

#[tokio::test]
async fn cross_origin_admin_methods_are_refused() -> eyre::Result<()> {
    let env = Environment::setup().await?;
    env.connect().await?;

    let code = error_code(
        env.remote_endpoint.send_request("wallet_grantAdmin".into(), Some(json!([{}]))).await,
    )?;
    assert_eq!(code, UNSUPPORTED_METHOD_CODE);
    assert!(env.remote_endpoint.pending_requests().await?.is_empty());

    env.cleanup().await;
    Ok(())
}
