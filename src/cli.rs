//! # Remote CLI
use crate::{
    config::RemoteConfig,
    constants::{DEFAULT_METRICS_PORT, DEFAULT_PORT},
    spawn::try_spawn_with_args,
    types::Origin,
};
use alloy_primitives::ChainId;
use clap::Parser;
use std::{
    net::{IpAddr, Ipv4Addr},
    path::PathBuf,
};
use url::Url;

/// Mediates wallet requests between a requester and the wallet, queueing those that need a
/// human decision.
#[derive(Debug, Parser)]
#[command(author, about = "Remote", long_about = None)]
pub struct Args {
    /// The configuration file.
    ///
    /// If missing, a default one will be used and stored in the working directory under
    /// `remote.yaml`.
    #[arg(long, value_name = "CONFIG", env = "REMOTE_CONFIG", default_value = "remote.yaml")]
    pub config: PathBuf,
    /// The address to serve the RPC on.
    #[arg(long = "http.addr", value_name = "ADDR", default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub address: IpAddr,
    /// The port to serve the RPC on.
    #[arg(long = "http.port", value_name = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,
    /// The port to serve the metrics on.
    #[arg(long = "http.metrics-port", value_name = "PORT", default_value_t = DEFAULT_METRICS_PORT)]
    pub metrics_port: u16,
    /// The JSON-RPC endpoint of the wallet core executing approved requests.
    #[arg(long, value_name = "RPC_ENDPOINT", env = "REMOTE_UPSTREAM")]
    pub upstream: Option<Url>,
    /// Tunnel messages through this relay endpoint instead of an in-process requester.
    #[arg(long = "relay-url", value_name = "URL")]
    pub relay_url: Option<Url>,
    /// The origin owning the wallet.
    #[arg(long, value_name = "ORIGIN")]
    pub origin: Option<Origin>,
    /// The origin of the in-process requester.
    #[arg(long = "requester-origin", value_name = "ORIGIN")]
    pub requester_origin: Option<Origin>,
    /// The chain announced until the wallet persisted one.
    #[arg(long = "chain-id", value_name = "CHAIN_ID")]
    pub chain_id: Option<ChainId>,
    /// The fee token announced until the wallet persisted one.
    #[arg(long = "fee-token", value_name = "TOKEN")]
    pub fee_token: Option<String>,
    /// Merchant RPC sponsoring calls.
    #[arg(long = "merchant-rpc-url", value_name = "URL")]
    pub merchant_rpc_url: Option<Url>,
    /// User agent of the hosting browser.
    #[arg(long = "user-agent", value_name = "USER_AGENT")]
    pub user_agent: Option<String>,
    /// File to persist the wallet state to. Kept in memory if unset.
    #[arg(long = "storage-path", value_name = "PATH", env = "REMOTE_STORAGE_PATH")]
    pub storage_path: Option<PathBuf>,
    /// Answer every dialog request automatically: `true` approves, `false` rejects.
    #[arg(long = "auto-approve", value_name = "BOOL")]
    pub auto_approve: Option<bool>,
}

impl Args {
    /// Run the remote service.
    pub async fn run(self) -> eyre::Result<()> {
        let config_path = self.config.clone();
        try_spawn_with_args(self, &config_path).await?.server.stopped().await;

        Ok(())
    }

    /// Merges [`Args`] values into an existing [`RemoteConfig`] instance.
    pub fn merge_remote_config(self, config: RemoteConfig) -> RemoteConfig {
        config
            .with_address(self.address)
            .with_port(self.port)
            .with_metrics_port(self.metrics_port)
            .with_upstream(self.upstream)
            .with_relay_url(self.relay_url)
            .with_origin(self.origin)
            .with_requester_origin(self.requester_origin)
            .with_chain_id(self.chain_id)
            .with_fee_token(self.fee_token)
            .with_merchant_rpc_url(self.merchant_rpc_url)
            .with_user_agent(self.user_agent)
            .with_storage_path(self.storage_path)
            .with_auto_approve(self.auto_approve)
    }
}
