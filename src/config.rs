//! Remote configuration.
use crate::{
    constants::{
        DEFAULT_CHAIN_ID, DEFAULT_METRICS_PORT, DEFAULT_PORT, DEFAULT_REQUESTER_ORIGIN,
        DEFAULT_STORAGE_KEY, DEFAULT_WALLET_ORIGIN,
    },
    policy::{Environment, PolicyOverride},
    state::State,
    storage::RemoteStorage,
    types::{MethodPolicies, Origin},
};
use alloy_primitives::ChainId;
use eyre::Context;
use serde::{Deserialize, Serialize};
use std::{
    net::{IpAddr, Ipv4Addr},
    path::{Path, PathBuf},
};
use url::Url;

/// Remote configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// The origin that owns the wallet.
    #[serde(default = "default_wallet_origin")]
    pub origin: Origin,
    /// The chain announced until the wallet persisted one.
    #[serde(default = "default_chain_id")]
    pub chain_id: ChainId,
    /// The fee token announced until the wallet persisted one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_token: Option<String>,
    /// Merchant RPC sponsoring calls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant_rpc_url: Option<Url>,
    /// Storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// JSON-RPC endpoint of the wallet core.
    ///
    /// Without one, every approved request fails.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream: Option<Url>,
    /// Relay endpoint to tunnel messages through instead of bridging to an in-process requester.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relay_url: Option<Url>,
    /// Origin of the in-process requester.
    #[serde(default = "default_requester_origin")]
    pub requester_origin: Origin,
    /// User agent of the hosting browser, used to derive policy overrides.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// The method policy table.
    #[serde(default)]
    pub method_policies: MethodPolicies,
    /// Additional restrictions applied on top of the policy table.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub policy_overrides: Vec<PolicyOverride>,
    /// Answer every dialog request automatically: `true` approves, `false` rejects.
    ///
    /// Without it, requests wait for `remote_respond` or `remote_reject`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_approve: Option<bool>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            origin: default_wallet_origin(),
            chain_id: default_chain_id(),
            fee_token: None,
            merchant_rpc_url: None,
            storage: StorageConfig::default(),
            upstream: None,
            relay_url: None,
            requester_origin: default_requester_origin(),
            user_agent: None,
            method_policies: MethodPolicies::default(),
            policy_overrides: Vec::new(),
            auto_approve: None,
        }
    }
}

impl RemoteConfig {
    /// Sets the IP address to serve the RPC on.
    pub fn with_address(mut self, address: IpAddr) -> Self {
        self.server.address = address;
        self
    }

    /// Sets the port to serve the RPC on.
    pub fn with_port(mut self, port: u16) -> Self {
        self.server.port = port;
        self
    }

    /// Sets the port to serve metrics on.
    pub fn with_metrics_port(mut self, port: u16) -> Self {
        self.server.metrics_port = port;
        self
    }

    /// Sets the wallet origin.
    pub fn with_origin(mut self, origin: Option<Origin>) -> Self {
        if let Some(origin) = origin {
            self.origin = origin;
        }
        self
    }

    /// Sets the default chain.
    pub fn with_chain_id(mut self, chain_id: Option<ChainId>) -> Self {
        self.chain_id = chain_id.unwrap_or(self.chain_id);
        self
    }

    /// Sets the default fee token.
    pub fn with_fee_token(mut self, fee_token: Option<String>) -> Self {
        self.fee_token = fee_token.or(self.fee_token);
        self
    }

    /// Sets the merchant RPC.
    pub fn with_merchant_rpc_url(mut self, merchant_rpc_url: Option<Url>) -> Self {
        self.merchant_rpc_url = merchant_rpc_url.or(self.merchant_rpc_url);
        self
    }

    /// Sets the upstream wallet endpoint.
    pub fn with_upstream(mut self, upstream: Option<Url>) -> Self {
        self.upstream = upstream.or(self.upstream);
        self
    }

    /// Sets the relay endpoint.
    pub fn with_relay_url(mut self, relay_url: Option<Url>) -> Self {
        self.relay_url = relay_url.or(self.relay_url);
        self
    }

    /// Sets the in-process requester origin.
    pub fn with_requester_origin(mut self, requester_origin: Option<Origin>) -> Self {
        if let Some(requester_origin) = requester_origin {
            self.requester_origin = requester_origin;
        }
        self
    }

    /// Sets the user agent.
    pub fn with_user_agent(mut self, user_agent: Option<String>) -> Self {
        self.user_agent = user_agent.or(self.user_agent);
        self
    }

    /// Sets the storage key.
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage.key = key.into();
        self
    }

    /// Sets the storage file.
    pub fn with_storage_path(mut self, path: Option<PathBuf>) -> Self {
        self.storage.path = path.or(self.storage.path);
        self
    }

    /// Sets the method policy table.
    pub fn with_method_policies(mut self, method_policies: MethodPolicies) -> Self {
        self.method_policies = method_policies;
        self
    }

    /// Adds a policy override.
    pub fn with_policy_override(mut self, policy_override: PolicyOverride) -> Self {
        self.policy_overrides.push(policy_override);
        self
    }

    /// Sets the auto approval behaviour.
    pub fn with_auto_approve(mut self, auto_approve: Option<bool>) -> Self {
        self.auto_approve = auto_approve.or(self.auto_approve);
        self
    }

    /// The environment described by the configured user agent.
    pub fn environment(&self) -> Environment {
        Environment { user_agent: self.user_agent.clone() }
    }

    /// Every override in effect: the configured ones and the ones the environment imposes.
    pub fn overrides(&self) -> Vec<PolicyOverride> {
        let mut overrides = self.policy_overrides.clone();
        overrides.extend(self.environment().overrides());
        overrides
    }

    /// The state used until the wallet persisted one.
    pub fn default_state(&self) -> State {
        State { chain_id: self.chain_id, fee_token: self.fee_token.clone(), accounts: Vec::new() }
    }

    /// Load from a YAML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> eyre::Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .wrap_err_with(|| format!("failed to read config file: {}", path.display()))?;
        let config = serde_yaml::from_reader(&file)
            .wrap_err_with(|| format!("failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Save to a YAML file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> eyre::Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The address to serve the RPC on.
    pub address: IpAddr,
    /// The port to serve the RPC on.
    pub port: u16,
    /// The port to serve metrics on.
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_PORT,
            metrics_port: DEFAULT_METRICS_PORT,
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Key the instance state is persisted under.
    pub key: String,
    /// File to persist to. Kept in memory if unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { key: DEFAULT_STORAGE_KEY.to_string(), path: None }
    }
}

impl StorageConfig {
    /// Opens the configured storage.
    pub fn open(&self) -> RemoteStorage {
        match &self.path {
            Some(path) => RemoteStorage::file(path),
            None => RemoteStorage::in_memory(),
        }
    }
}

fn default_wallet_origin() -> Origin {
    Origin::from_url(&Url::parse(DEFAULT_WALLET_ORIGIN).expect("valid default origin"))
}

fn default_requester_origin() -> Origin {
    Origin::from_url(&Url::parse(DEFAULT_REQUESTER_ORIGIN).expect("valid default origin"))
}

fn default_metrics_port() -> u16 {
    DEFAULT_METRICS_PORT
}

fn default_chain_id() -> ChainId {
    DEFAULT_CHAIN_ID
}
