//! Method policy resolution.
//!
//! Given a method and the context a request arrives in, the [`Resolver`] decides whether the
//! request may be answered headlessly, must go through the dialog, or may not be serviced at all.
//! Resolution is pure: it depends only on the method, the context and the policy table.

use crate::{
    error::PolicyError,
    metrics::ResolverMetrics,
    mode::ModeKind,
    types::{MethodPolicies, MethodPolicy, Origin},
};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// The context a request is resolved in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionContext {
    /// Origin of the requester, as validated by the transport.
    pub requester: Origin,
    /// Origin that owns the wallet.
    pub wallet: Origin,
}

impl ExecutionContext {
    /// Creates a new [`ExecutionContext`].
    pub fn new(requester: Origin, wallet: Origin) -> Self {
        Self { requester, wallet }
    }

    /// Whether the requester is the wallet's own origin.
    pub fn is_same_origin(&self) -> bool {
        self.requester.same_origin(&self.wallet)
    }
}

/// The outcome of resolving a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    /// The selected mode.
    pub mode: ModeKind,
    /// Whether an account must already be connected.
    pub require_connection: bool,
    /// Whether the account must be up to date.
    pub require_updated_account: bool,
}

/// A runtime restriction of the policy table.
///
/// Overrides can only take modes away from a method, never grant them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyOverride {
    /// The method to restrict.
    pub method: String,
    /// The mode that is no longer permitted.
    pub disable: ModeKind,
}

impl PolicyOverride {
    /// Forbids headless execution of `method`.
    pub fn disable_headless(method: impl Into<String>) -> Self {
        Self { method: method.into(), disable: ModeKind::Headless }
    }

    /// Forbids dialog execution of `method`.
    pub fn disable_dialog(method: impl Into<String>) -> Self {
        Self { method: method.into(), disable: ModeKind::Dialog }
    }

    /// Applies the restriction to `policy`, if it targets it.
    fn narrow(&self, policy: &mut MethodPolicy) {
        if policy.method != self.method {
            return;
        }
        let mut modes = policy.modes.unwrap_or_default();
        if policy.modes.is_none() {
            // Policies without modes implicitly permit the dialog.
            modes.dialog = policy.dialog_rule();
        }
        match self.disable {
            ModeKind::Headless => modes.headless = None,
            ModeKind::Dialog => modes.dialog = None,
        }
        policy.modes = Some(modes);
    }
}

/// The environment the remote runs in, probed once at construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    /// The user agent of the hosting browser, if any.
    pub user_agent: Option<String>,
}

impl Environment {
    /// Creates an environment from a user agent string.
    pub fn from_user_agent(user_agent: impl Into<String>) -> Self {
        Self { user_agent: Some(user_agent.into()) }
    }

    /// Whether the host is Safari.
    pub fn is_safari(&self) -> bool {
        let Some(user_agent) = &self.user_agent else { return false };
        let user_agent = user_agent.to_lowercase();
        let Some(safari) = user_agent.find("safari") else { return false };
        let prefix = &user_agent[..safari];
        !prefix.contains("chrome") && !prefix.contains("android")
    }

    /// Restrictions this environment imposes.
    ///
    /// Safari breaks messaging between a headless frame and its opener during connection, so
    /// `wallet_connect` always goes through the dialog there.
    pub fn overrides(&self) -> Vec<PolicyOverride> {
        if self.is_safari() {
            vec![PolicyOverride::disable_headless("wallet_connect")]
        } else {
            vec![]
        }
    }
}

/// Resolves requests against a method policy table.
#[derive(Debug, Clone)]
pub struct Resolver {
    /// The policy table with all overrides applied.
    policies: MethodPolicies,
}

impl Resolver {
    /// Creates a resolver for `policies` narrowed by `overrides`.
    pub fn new(policies: MethodPolicies, overrides: &[PolicyOverride]) -> Self {
        let mut policies = policies;
        for policy_override in overrides {
            match policies.get_mut(&policy_override.method) {
                Some(policy) => policy_override.narrow(policy),
                None => trace!(
                    method = %policy_override.method,
                    "Override targets a method without policy, it already has no headless path."
                ),
            }
        }
        Self { policies }
    }

    /// The policy table in effect.
    pub fn policies(&self) -> &MethodPolicies {
        &self.policies
    }

    /// Resolves the mode and pre-conditions for `method` in `context`.
    pub fn resolve(
        &self,
        method: &str,
        context: &ExecutionContext,
    ) -> Result<Resolution, PolicyError> {
        let resolution = self.select(method, context);

        let metrics = ResolverMetrics::new_with_labels(&[("method", method.to_string())]);
        match &resolution {
            Ok(Resolution { mode: ModeKind::Headless, .. }) => metrics.headless.increment(1),
            Ok(Resolution { mode: ModeKind::Dialog, .. }) => metrics.dialog.increment(1),
            Err(_) => metrics.violations.increment(1),
        }
        resolution
    }

    /// Like [`Resolver::resolve`], without recording metrics.
    ///
    /// Used by requesters predicting how the remote side will resolve a method.
    pub fn select(
        &self,
        method: &str,
        context: &ExecutionContext,
    ) -> Result<Resolution, PolicyError> {
        let Some(policy) = self.policies.get(method) else {
            return Ok(Resolution {
                mode: ModeKind::Dialog,
                require_connection: true,
                require_updated_account: true,
            });
        };

        let same_origin = context.is_same_origin();
        let mode = if policy.headless_rule().is_some_and(|rule| rule.permits(same_origin)) {
            ModeKind::Headless
        } else if policy.dialog_rule().is_some_and(|rule| rule.permits(same_origin)) {
            ModeKind::Dialog
        } else {
            return Err(PolicyError::PolicyViolation {
                method: method.to_string(),
                origin: context.requester.clone(),
            });
        };

        trace!(method, ?mode, same_origin, "Resolved request mode.");
        Ok(Resolution {
            mode,
            require_connection: policy.requires_connection(),
            require_updated_account: policy.requires_updated_account(),
        })
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(MethodPolicies::default(), &[])
    }
}
