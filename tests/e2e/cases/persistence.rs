use crate::e2e::{ACCOUNT, Environment};
use remote::{config::RemoteConfig, constants::DEFAULT_STORAGE_KEY, rpc::RemoteApiClient};
use serde_json::{Value, json};

#[tokio::test]
async fn connection_survives_restart() -> eyre::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("state.json");
    let config = RemoteConfig::default().with_storage_path(Some(path.clone()));

    let env = Environment::setup_with_config(config.clone()).await?;
    env.connect().await?;
    env.cleanup().await;

    let stored: Value = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
    assert_eq!(stored[DEFAULT_STORAGE_KEY]["accounts"], json!([ACCOUNT]));

    let env = Environment::setup_with_config(config).await?;
    let capabilities =
        env.remote_endpoint.send_request("wallet_getCapabilities".into(), Some(json!([]))).await?;
    assert!(capabilities.get("0x14a34").is_some());
    assert_eq!(
        env.upstream.calls.methods(),
        ["wallet_getAccountVersion", "wallet_getCapabilities"]
    );
    env.cleanup().await;

    Ok(())
}
