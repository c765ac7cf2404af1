//! Entitlement snapshot models.
//!
//! Mirrors the shape the entitlements endpoint returns for one organization:
//!
//! ```json
//! {
//!   "organizationId": 100,
//!   "entitlements": {
//!     "finance": { "status": "trial", "trialExpiresAt": "2026-01-31T00:00:00Z", "submodules": { "budgets": false } }
//!   }
//! }
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::OrganizationId;

/// Commercial status of a module as stored by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntitlementStatus {
    Enabled,
    Disabled,
    /// Behaves as enabled until `trial_expires_at` passes.
    Trial,
}

/// Module status as reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleStatus {
    Enabled,
    /// Loaded and off, or absent from a loaded snapshot.
    Disabled,
    Trial,
    /// The snapshot has not loaded yet.
    Unknown,
}

impl From<EntitlementStatus> for ModuleStatus {
    fn from(value: EntitlementStatus) -> Self {
        match value {
            EntitlementStatus::Enabled => Self::Enabled,
            EntitlementStatus::Disabled => Self::Disabled,
            EntitlementStatus::Trial => Self::Trial,
        }
    }
}

/// Entitlement of one module within a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleEntitlement {
    pub status: EntitlementStatus,
    #[serde(default)]
    pub trial_expires_at: Option<DateTime<Utc>>,
    /// Explicit submodule flags. Absent keys inherit the module's state.
    #[serde(default)]
    pub submodules: BTreeMap<String, bool>,
}

impl ModuleEntitlement {
    #[must_use]
    pub fn enabled() -> Self {
        Self::with_status(EntitlementStatus::Enabled)
    }

    #[must_use]
    pub fn disabled() -> Self {
        Self::with_status(EntitlementStatus::Disabled)
    }

    /// A trial; `None` means no expiry has been set.
    #[must_use]
    pub fn trial(expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            trial_expires_at: expires_at,
            ..Self::with_status(EntitlementStatus::Trial)
        }
    }

    fn with_status(status: EntitlementStatus) -> Self {
        Self {
            status,
            trial_expires_at: None,
            submodules: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_submodule(mut self, key: impl Into<String>, enabled: bool) -> Self {
        self.submodules.insert(key.into(), enabled);
        self
    }

    /// `true` for a trial whose expiry is set and not strictly in the future.
    #[must_use]
    pub fn is_trial_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.status == EntitlementStatus::Trial
            && self.trial_expires_at.is_some_and(|expires| expires <= now)
    }

    /// Effective enabled state at `now`; expiry is evaluated here, never stored.
    #[must_use]
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        match self.status {
            EntitlementStatus::Enabled => true,
            EntitlementStatus::Disabled => false,
            EntitlementStatus::Trial => !self.is_trial_expired_at(now),
        }
    }

    /// Explicit flag for `submodule`, `None` when it inherits.
    #[must_use]
    pub fn submodule_flag(&self, submodule: &str) -> Option<bool> {
        self.submodules.get(submodule).copied()
    }
}

/// All module entitlements of one organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitlementSnapshot {
    pub organization_id: OrganizationId,
    #[serde(default)]
    pub entitlements: BTreeMap<String, ModuleEntitlement>,
}

impl EntitlementSnapshot {
    #[must_use]
    pub fn new(organization_id: OrganizationId) -> Self {
        Self {
            organization_id,
            entitlements: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_module(mut self, key: impl Into<String>, entitlement: ModuleEntitlement) -> Self {
        self.entitlements.insert(key.into(), entitlement);
        self
    }

    #[must_use]
    pub fn module(&self, key: &str) -> Option<&ModuleEntitlement> {
        self.entitlements.get(key)
    }
}
