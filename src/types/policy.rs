//! Per-method execution policies.

use serde::{Deserialize, Serialize};
use std::{ops::Deref, slice};

/// Constraints attached to an execution mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeConstraints {
    /// The mode is only permitted when the requester has the same origin as the wallet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub same_origin: Option<bool>,
}

/// Whether an execution mode is permitted for a method.
///
/// On the wire this is either `true` or an object of [`ModeConstraints`]. A mode that is not
/// permitted is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawModeRule", into = "RawModeRule")]
pub enum ModeRule {
    /// Permitted unconditionally.
    Enabled,
    /// Permitted if the constraints hold.
    Constrained(ModeConstraints),
}

impl ModeRule {
    /// A rule that only permits the mode for same-origin requesters.
    pub const fn same_origin() -> Self {
        Self::Constrained(ModeConstraints { same_origin: Some(true) })
    }

    /// Whether the rule permits the mode given whether the requester is same-origin.
    pub fn permits(&self, same_origin: bool) -> bool {
        match self {
            Self::Enabled => true,
            Self::Constrained(constraints) => same_origin || constraints.same_origin != Some(true),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawModeRule {
    Flag(bool),
    Constrained(ModeConstraints),
}

impl TryFrom<RawModeRule> for ModeRule {
    type Error = &'static str;

    fn try_from(raw: RawModeRule) -> Result<Self, Self::Error> {
        match raw {
            RawModeRule::Flag(true) => Ok(Self::Enabled),
            RawModeRule::Flag(false) => Err("a mode is either `true`, an object, or absent"),
            RawModeRule::Constrained(constraints) => Ok(Self::Constrained(constraints)),
        }
    }
}

impl From<ModeRule> for RawModeRule {
    fn from(rule: ModeRule) -> Self {
        match rule {
            ModeRule::Enabled => Self::Flag(true),
            ModeRule::Constrained(constraints) => Self::Constrained(constraints),
        }
    }
}

/// The execution modes a method may use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modes {
    /// Resolve without human interaction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headless: Option<ModeRule>,
    /// Resolve through the dialog.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dialog: Option<ModeRule>,
}

/// A rule declaring how a single method may be executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodPolicy {
    /// The method this policy applies to. Matched exactly.
    pub method: String,
    /// The permitted modes. If absent, the method may only use the dialog.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modes: Option<Modes>,
    /// Whether an account must already be connected. Defaults to `true`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_connection: Option<bool>,
    /// Whether the account must be up to date. Defaults to `true`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_updated_account: Option<bool>,
}

impl MethodPolicy {
    /// A policy with no explicit modes and default requirements.
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            modes: None,
            require_connection: None,
            require_updated_account: None,
        }
    }

    /// A policy that only permits headless execution.
    pub fn headless(method: impl Into<String>) -> Self {
        Self::new(method).with_modes(Modes { headless: Some(ModeRule::Enabled), dialog: None })
    }

    /// Sets the permitted modes.
    pub fn with_modes(mut self, modes: Modes) -> Self {
        self.modes = Some(modes);
        self
    }

    /// Sets whether a connection is required.
    pub fn with_require_connection(mut self, require: bool) -> Self {
        self.require_connection = Some(require);
        self
    }

    /// Sets whether an up to date account is required.
    pub fn with_require_updated_account(mut self, require: bool) -> Self {
        self.require_updated_account = Some(require);
        self
    }

    /// The headless rule in effect.
    pub fn headless_rule(&self) -> Option<ModeRule> {
        self.modes.and_then(|modes| modes.headless)
    }

    /// The dialog rule in effect. Policies without modes permit the dialog.
    pub fn dialog_rule(&self) -> Option<ModeRule> {
        match self.modes {
            Some(modes) => modes.dialog,
            None => Some(ModeRule::Enabled),
        }
    }

    /// Whether a connection is required, applying the default.
    pub fn requires_connection(&self) -> bool {
        self.require_connection.unwrap_or(true)
    }

    /// Whether an up to date account is required, applying the default.
    pub fn requires_updated_account(&self) -> bool {
        self.require_updated_account.unwrap_or(true)
    }
}

/// An ordered list of [`MethodPolicy`], at most one per method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MethodPolicies(Vec<MethodPolicy>);

impl MethodPolicies {
    /// Creates a table from `policies`. Later duplicates of a method are dropped.
    pub fn new(policies: Vec<MethodPolicy>) -> Self {
        let mut table: Vec<MethodPolicy> = Vec::with_capacity(policies.len());
        for policy in policies {
            if table.iter().any(|existing| existing.method == policy.method) {
                tracing::warn!(method = %policy.method, "Ignoring duplicate method policy.");
                continue;
            }
            table.push(policy);
        }
        Self(table)
    }

    /// A table without any policies.
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Looks up the policy for `method`.
    pub fn get(&self, method: &str) -> Option<&MethodPolicy> {
        self.0.iter().find(|policy| policy.method == method)
    }

    /// Mutable lookup of the policy for `method`.
    pub(crate) fn get_mut(&mut self, method: &str) -> Option<&mut MethodPolicy> {
        self.0.iter_mut().find(|policy| policy.method == method)
    }
}

impl<'de> Deserialize<'de> for MethodPolicies {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let policies = Vec::<MethodPolicy>::deserialize(deserializer)?;
        let mut seen = std::collections::HashSet::new();
        if let Some(duplicate) = policies.iter().find(|policy| !seen.insert(&policy.method)) {
            return Err(serde::de::Error::custom(format!(
                "duplicate method policy for {}",
                duplicate.method
            )));
        }
        Ok(Self(policies))
    }
}

impl Deref for MethodPolicies {
    type Target = [MethodPolicy];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<'a> IntoIterator for &'a MethodPolicies {
    type Item = &'a MethodPolicy;
    type IntoIter = slice::Iter<'a, MethodPolicy>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Default for MethodPolicies {
    /// The policies a remote wallet ships with.
    fn default() -> Self {
        let headless = Modes { headless: Some(ModeRule::Enabled), dialog: None };
        let dialog_or_same_origin_headless =
            Modes { headless: Some(ModeRule::same_origin()), dialog: Some(ModeRule::Enabled) };
        let same_origin_dialog = Modes { headless: None, dialog: Some(ModeRule::same_origin()) };

        Self(vec![
            MethodPolicy::new("eth_requestAccounts")
                .with_modes(dialog_or_same_origin_headless)
                .with_require_connection(false)
                .with_require_updated_account(false),
            MethodPolicy::new("wallet_getAccountVersion").with_modes(headless),
            MethodPolicy::new("wallet_getKeys").with_modes(headless),
            MethodPolicy::new("wallet_getPermissions").with_modes(headless),
            MethodPolicy::new("wallet_grantAdmin").with_modes(same_origin_dialog),
            MethodPolicy::new("wallet_revokeAdmin").with_modes(same_origin_dialog),
            MethodPolicy::new("wallet_upgradeAccount").with_modes(headless),
            MethodPolicy::new("wallet_updateAccount").with_require_updated_account(false),
            MethodPolicy::new("wallet_connect")
                .with_modes(dialog_or_same_origin_headless)
                .with_require_connection(false)
                .with_require_updated_account(false),
            MethodPolicy::new("wallet_getCallsStatus").with_modes(headless),
            MethodPolicy::new("wallet_getCapabilities").with_modes(headless),
            MethodPolicy::new("wallet_prepareCalls").with_modes(headless),
            MethodPolicy::new("wallet_sendPreparedCalls").with_modes(headless),
        ])
    }
}
