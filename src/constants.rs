//! Remote constants.

use std::time::Duration;

/// The storage key the instance state is persisted under.
pub const DEFAULT_STORAGE_KEY: &str = "porto.store";

/// The origin that owns the wallet.
pub const DEFAULT_WALLET_ORIGIN: &str = "https://id.porto.sh";

/// The origin of the in-process requester used when no relay is configured.
pub const DEFAULT_REQUESTER_ORIGIN: &str = "http://localhost:5173";

/// Base Sepolia.
pub const DEFAULT_CHAIN_ID: u64 = 84532;

/// The port the harness RPC is served on.
pub const DEFAULT_PORT: u16 = 9119;

/// The port metrics are served on.
pub const DEFAULT_METRICS_PORT: u16 = 9000;

/// How long a requester waits for the dialog to announce itself.
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(10);

/// Request timeout for the upstream wallet.
pub const UPSTREAM_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Methods whose params carry call capabilities.
pub const CALLS_METHODS: [&str; 2] = ["wallet_prepareCalls", "wallet_sendCalls"];
