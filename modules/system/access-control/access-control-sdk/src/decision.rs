//! Evaluator outputs.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AccessDenied;

/// Reason attached to decisions made while inputs are still loading.
pub const PERMISSIONS_LOADING_REASON: &str = "Permissions are loading";

/// Reason attached to menu results while entitlements are still loading.
pub const ENTITLEMENTS_LOADING_REASON: &str = "Loading entitlements\u{2026}";

/// Reason attached to menu results after the entitlement fetch failed.
pub const ENTITLEMENTS_UNAVAILABLE_REASON: &str = "Entitlements could not be loaded";

/// Badge text shown on modules running on a trial.
pub const TRIAL_BADGE: &str = "Trial";

/// Layer that produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnforcementLevel {
    /// Organization scoping.
    Tenant,
    /// Commercial availability of the module.
    Entitlement,
    /// Role-based permission of the actor.
    Rbac,
}

impl fmt::Display for EnforcementLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tenant => f.write_str("TENANT"),
            Self::Entitlement => f.write_str("ENTITLEMENT"),
            Self::Rbac => f.write_str("RBAC"),
        }
    }
}

/// Result of a boolean access check.
///
/// `allowed == true` implies `reason == None`; a denial always carries a
/// non-empty reason and names the first layer that failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessDecision {
    pub allowed: bool,
    pub reason: Option<String>,
    pub enforcement_level: EnforcementLevel,
    /// Set when inputs were not ready; the decision is provisional.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub pending: bool,
}

impl AccessDecision {
    #[must_use]
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
            enforcement_level: EnforcementLevel::Rbac,
            pending: false,
        }
    }

    #[must_use]
    pub fn deny(level: EnforcementLevel, reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
            enforcement_level: level,
            pending: false,
        }
    }

    /// Not yet determined: inputs are still loading.
    #[must_use]
    pub fn loading() -> Self {
        Self {
            pending: true,
            ..Self::deny(EnforcementLevel::Rbac, PERMISSIONS_LOADING_REASON)
        }
    }

    /// `true` when this is a hard denial rather than a loading placeholder.
    #[must_use]
    pub fn is_denied(&self) -> bool {
        !self.allowed && !self.pending
    }

    /// Convert into a `Result` for callers that want `?`.
    ///
    /// # Errors
    ///
    /// Returns [`AccessDenied::Pending`] while loading and
    /// [`AccessDenied::Denied`] for a denial.
    pub fn require(self) -> Result<(), AccessDenied> {
        if self.allowed {
            return Ok(());
        }
        let reason = self.reason.unwrap_or_default();
        if self.pending {
            Err(AccessDenied::Pending { reason })
        } else {
            Err(AccessDenied::Denied {
                level: self.enforcement_level,
                reason,
            })
        }
    }
}

/// Navigation classification. `Hidden` and `Disabled` are not interchangeable:
/// hidden entries are not rendered, disabled ones are rendered greyed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuResult {
    Hidden,
    Disabled,
    Enabled,
}

/// Result of a navigation access check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuAccessResult {
    pub result: MenuResult,
    pub reason: Option<String>,
    pub is_trial: bool,
    pub trial_expires_at: Option<DateTime<Utc>>,
}

impl MenuAccessResult {
    #[must_use]
    pub fn enabled() -> Self {
        Self {
            result: MenuResult::Enabled,
            reason: None,
            is_trial: false,
            trial_expires_at: None,
        }
    }

    /// Enabled through an active trial.
    #[must_use]
    pub fn trial(expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            is_trial: true,
            trial_expires_at: expires_at,
            ..Self::enabled()
        }
    }

    #[must_use]
    pub fn disabled(reason: impl Into<String>) -> Self {
        Self {
            result: MenuResult::Disabled,
            reason: Some(reason.into()),
            is_trial: false,
            trial_expires_at: None,
        }
    }

    #[must_use]
    pub fn hidden(reason: impl Into<String>) -> Self {
        Self {
            result: MenuResult::Hidden,
            ..Self::disabled(reason)
        }
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.result != MenuResult::Hidden
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.result == MenuResult::Enabled
    }

    #[must_use]
    pub fn badge(&self) -> Option<&'static str> {
        self.is_trial.then_some(TRIAL_BADGE)
    }

    /// Explanation to show on hover, only for disabled entries.
    #[must_use]
    pub fn tooltip(&self) -> Option<&str> {
        match self.result {
            MenuResult::Disabled => self.reason.as_deref(),
            MenuResult::Hidden | MenuResult::Enabled => None,
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn allow_has_no_reason() {
        let decision = AccessDecision::allow();
        assert!(decision.allowed);
        assert_eq!(decision.reason, None);
        assert_eq!(decision.enforcement_level, EnforcementLevel::Rbac);
        assert!(decision.require().is_ok());
    }

    #[test]
    fn loading_is_not_a_hard_denial() {
        let decision = AccessDecision::loading();
        assert!(!decision.allowed);
        assert!(!decision.is_denied());
        assert_eq!(decision.reason.as_deref(), Some(PERMISSIONS_LOADING_REASON));
        assert_eq!(
            decision.require(),
            Err(AccessDenied::Pending {
                reason: PERMISSIONS_LOADING_REASON.to_owned()
            })
        );
    }

    #[test]
    fn entitlement_reasons_tell_loading_from_failure() {
        let loading = MenuAccessResult::disabled(ENTITLEMENTS_LOADING_REASON);
        assert_eq!(loading.tooltip(), Some("Loading entitlements\u{2026}"));

        let failed = MenuAccessResult::disabled(ENTITLEMENTS_UNAVAILABLE_REASON);
        assert_ne!(failed.tooltip(), loading.tooltip());
    }

    #[test]
    fn require_carries_level_of_denial() {
        let err = AccessDecision::deny(EnforcementLevel::Entitlement, "Module 'crm' is disabled")
            .require()
            .unwrap_err();
        assert_eq!(err.level(), Some(EnforcementLevel::Entitlement));
        assert_eq!(
            err.to_string(),
            "access denied at ENTITLEMENT layer: Module 'crm' is disabled"
        );
    }

    #[test]
    fn decision_serializes_with_screaming_level() {
        let json = serde_json::to_value(AccessDecision::deny(EnforcementLevel::Tenant, "x")).unwrap();
        assert_eq!(json["enforcementLevel"], "TENANT");
        assert!(json.get("pending").is_none());
    }

    #[test]
    fn menu_helpers() {
        let trial = MenuAccessResult::trial(None);
        assert!(trial.is_enabled());
        assert_eq!(trial.badge(), Some(TRIAL_BADGE));
        assert_eq!(trial.tooltip(), None);

        let disabled = MenuAccessResult::disabled("Module 'hr' is disabled");
        assert!(disabled.is_visible());
        assert!(!disabled.is_enabled());
        assert_eq!(disabled.tooltip(), Some("Module 'hr' is disabled"));
        assert_eq!(disabled.badge(), None);

        let hidden = MenuAccessResult::hidden("Module 'hr' is disabled");
        assert!(!hidden.is_visible());
        assert_eq!(hidden.tooltip(), None);
    }
}
