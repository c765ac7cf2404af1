//! Entitlement queries over a loaded snapshot.
//!
//! Trial expiry is evaluated at query time against the supplied `now`; the
//! snapshot itself never changes when a trial runs out.

use access_control_sdk::{
    EntitlementSnapshot, EntitlementStatus, ModuleEntitlement, ModuleStatus,
};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Why a module or submodule is not commercially available.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntitlementDenial {
    /// Module absent from the snapshot or explicitly disabled.
    #[error("Module '{module}' is not enabled for this organization")]
    ModuleDisabled { module: String },

    #[error("Trial for module '{module}' expired on {}", .expired_at.format("%Y-%m-%d"))]
    TrialExpired {
        module: String,
        expired_at: DateTime<Utc>,
    },

    #[error("Submodule '{module}.{submodule}' is not enabled for this organization")]
    SubmoduleDisabled { module: String, submodule: String },
    /// No organization is selected, so there is no snapshot to check against.
    #[error("Module '{module}' requires an organization to check entitlements")]
    NoOrganization { module: String },
}

/// Successful entitlement check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entitled {
    pub is_trial: bool,
    pub trial_expires_at: Option<DateTime<Utc>>,
}

/// Check `module` (and optionally `submodule`) against `snapshot` at `now`.
///
/// # Errors
///
/// Returns the [`EntitlementDenial`] describing the first failing condition.
pub fn check_entitlement(
    snapshot: &EntitlementSnapshot,
    module: &str,
    submodule: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Entitled, EntitlementDenial> {
    let entitlement = active_module(snapshot, module, now)?;

    if let Some(submodule) = submodule
        && entitlement.submodule_flag(submodule) == Some(false)
    {
        return Err(EntitlementDenial::SubmoduleDisabled {
            module: module.to_owned(),
            submodule: submodule.to_owned(),
        });
    }

    let is_trial = entitlement.status == EntitlementStatus::Trial;
    Ok(Entitled {
        is_trial,
        trial_expires_at: if is_trial {
            entitlement.trial_expires_at
        } else {
            None
        },
    })
}

fn active_module<'a>(
    snapshot: &'a EntitlementSnapshot,
    module: &str,
    now: DateTime<Utc>,
) -> Result<&'a ModuleEntitlement, EntitlementDenial> {
    let disabled = || EntitlementDenial::ModuleDisabled {
        module: module.to_owned(),
    };
    let entitlement = snapshot.module(module).ok_or_else(disabled)?;
    match entitlement.status {
        EntitlementStatus::Enabled => Ok(entitlement),
        EntitlementStatus::Disabled => Err(disabled()),
        EntitlementStatus::Trial => match entitlement.trial_expires_at {
            Some(expired_at) if expired_at <= now => Err(EntitlementDenial::TrialExpired {
                module: module.to_owned(),
                expired_at,
            }),
            _ => Ok(entitlement),
        },
    }
}

/// Whether `module` is enabled right now.
#[must_use]
pub fn is_module_enabled(snapshot: &EntitlementSnapshot, module: &str) -> bool {
    is_module_enabled_at(snapshot, module, Utc::now())
}

#[must_use]
pub fn is_module_enabled_at(
    snapshot: &EntitlementSnapshot,
    module: &str,
    now: DateTime<Utc>,
) -> bool {
    snapshot
        .module(module)
        .is_some_and(|entitlement| entitlement.is_active_at(now))
}

/// Whether `module.submodule` is enabled right now. Absent submodules inherit.
#[must_use]
pub fn is_submodule_enabled(snapshot: &EntitlementSnapshot, module: &str, submodule: &str) -> bool {
    is_submodule_enabled_at(snapshot, module, submodule, Utc::now())
}

#[must_use]
pub fn is_submodule_enabled_at(
    snapshot: &EntitlementSnapshot,
    module: &str,
    submodule: &str,
    now: DateTime<Utc>,
) -> bool {
    check_entitlement(snapshot, module, Some(submodule), now).is_ok()
}

/// Stored status of `module`; [`ModuleStatus::Unknown`] until a snapshot is loaded.
#[must_use]
pub fn module_status(snapshot: Option<&EntitlementSnapshot>, module: &str) -> ModuleStatus {
    match snapshot {
        None => ModuleStatus::Unknown,
        Some(snapshot) => snapshot
            .module(module)
            .map_or(ModuleStatus::Disabled, |entitlement| entitlement.status.into()),
    }
}

#[must_use]
pub fn trial_expiry(snapshot: &EntitlementSnapshot, module: &str) -> Option<DateTime<Utc>> {
    snapshot
        .module(module)
        .and_then(|entitlement| entitlement.trial_expires_at)
}
