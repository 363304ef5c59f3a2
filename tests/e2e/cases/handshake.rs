use crate::e2e::Environment;
use remote::{
    config::RemoteConfig,
    policy::PolicyOverride,
    rpc::{RemoteApiClient, Transport},
    types::MethodPolicies,
};
use std::time::Duration;

#[tokio::test]
async fn health() -> eyre::Result<()> {
    let env = Environment::setup().await?;

    let health = env.remote_endpoint.health().await?;
    assert_eq!(health.status, "ok");
    assert_eq!(health.transport, Transport::Bridge);
    assert_eq!(health.queued, 0);

    env.cleanup().await;
    Ok(())
}

#[tokio::test]
async fn ready_announces_policies() -> eyre::Result<()> {
    let env = Environment::setup_with_config(
        RemoteConfig::default().with_chain_id(Some(10)).with_fee_token(Some("EXP".into())),
    )
    .await?;
    let requester = env.requester()?;

    let payload = requester.wait_ready(Duration::from_secs(5)).await?;
    assert_eq!(payload.chain_id, 10);
    assert_eq!(payload.fee_token.as_deref(), Some("EXP"));
    assert_eq!(payload.method_policies, MethodPolicies::default());

    assert!(requester.headless_eligible("wallet_getCapabilities"));
    // Only headless for same-origin requesters.
    assert!(!requester.headless_eligible("wallet_connect"));
    assert!(!requester.headless_eligible("wallet_sendCalls"));

    env.cleanup().await;
    Ok(())
}

#[tokio::test]
async fn overrides_narrow_announced_policies() -> eyre::Result<()> {
    let env = Environment::setup_with_config(
        RemoteConfig::default()
            .with_policy_override(PolicyOverride::disable_headless("wallet_getCapabilities")),
    )
    .await?;
    let requester = env.requester()?;

    requester.wait_ready(Duration::from_secs(5)).await?;
    assert!(!requester.headless_eligible("wallet_getCapabilities"));
    assert!(requester.headless_eligible("wallet_getKeys"));

    // Asking again yields the same handshake.
    env.remote_endpoint.ready().await?;
    assert!(!requester.headless_eligible("wallet_getCapabilities"));

    env.cleanup().await;
    Ok(())
}
