//! Boolean access evaluator: the single merge point of the tenant, entitlement
//! and RBAC layers.
//!
//! Layers run in order and the first failure decides:
//!
//! 1. inputs not loaded -> provisional denial ([`AccessDecision::loading`])
//! 2. tenant scoping -> `TENANT`; a scoped request also waits for the snapshot
//!    of its organization
//! 3. super-admin entitlement bypass (only if configured)
//! 4. module / submodule entitlement -> `ENTITLEMENT`
//! 5. `<module>.<action>` permission -> `RBAC` (super admins always pass)
//!
//! A super admin without a selected organization has no snapshot to wait for:
//! the bypass policy allows, the strict policy denies every module that is not
//! always on.

use std::sync::Arc;

use access_control_sdk::{
    AccessDecision, Actor, CanonicalPermission, EnforcementLevel, EntitlementSnapshot,
    OrganizationId,
};
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::domain::entitlements::{EntitlementDenial, check_entitlement};
use crate::domain::permission_set::PermissionSet;
use crate::domain::policy::AccessPolicy;
use crate::domain::tenant_guard::{self, TenantScope};

/// Inputs of one access check. All references are borrowed snapshots; the
/// evaluator keeps nothing between calls.
#[derive(Debug, Clone, Copy)]
pub struct AccessRequest<'a> {
    pub module_key: &'a str,
    pub submodule_key: Option<&'a str>,
    pub action: &'a str,
    pub actor: Option<&'a Actor>,
    pub organization_id: Option<OrganizationId>,
    pub entitlements: Option<&'a EntitlementSnapshot>,
    pub permissions: Option<&'a PermissionSet>,
    /// Set by the fetching layer while any input is in flight.
    pub is_loading: bool,
}

impl<'a> AccessRequest<'a> {
    #[must_use]
    pub fn new(module_key: &'a str, action: &'a str) -> Self {
        Self {
            module_key,
            submodule_key: None,
            action,
            actor: None,
            organization_id: None,
            entitlements: None,
            permissions: None,
            is_loading: false,
        }
    }

    #[must_use]
    pub fn submodule(mut self, submodule_key: &'a str) -> Self {
        self.submodule_key = Some(submodule_key);
        self
    }

    /// Set the actor; the organization defaults to the actor's own.
    #[must_use]
    pub fn actor(mut self, actor: &'a Actor) -> Self {
        self.actor = Some(actor);
        if self.organization_id.is_none() {
            self.organization_id = actor.organization_id;
        }
        self
    }

    #[must_use]
    pub fn organization(mut self, organization_id: Option<OrganizationId>) -> Self {
        self.organization_id = organization_id;
        self
    }

    #[must_use]
    pub fn entitlements(mut self, snapshot: &'a EntitlementSnapshot) -> Self {
        self.entitlements = Some(snapshot);
        self
    }

    #[must_use]
    pub fn permissions(mut self, permissions: &'a PermissionSet) -> Self {
        self.permissions = Some(permissions);
        self
    }

    #[must_use]
    pub fn loading(mut self, is_loading: bool) -> Self {
        self.is_loading = is_loading;
        self
    }

    /// `true` once every input is loaded and the tenant context is usable,
    /// so callers can tell "still loading" from "loaded and denied".
    ///
    /// An unscoped super admin needs no entitlement snapshot.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        let Some(actor) = self.actor else {
            return false;
        };
        let scoped = tenant_guard::has_valid_tenant_context(self.organization_id);
        !self.is_loading
            && self.permissions.is_some()
            && (scoped || actor.is_super_admin)
            && (self.entitlements.is_some() || !scoped)
    }
}

/// Evaluates [`AccessRequest`]s into [`AccessDecision`]s.
#[derive(Debug, Clone, Default)]
pub struct AccessEvaluator {
    policy: Arc<AccessPolicy>,
}

impl AccessEvaluator {
    #[must_use]
    pub fn new(policy: Arc<AccessPolicy>) -> Self {
        Self { policy }
    }

    #[must_use]
    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    /// Evaluate against the current wall-clock time.
    #[must_use]
    pub fn evaluate(&self, request: &AccessRequest<'_>) -> AccessDecision {
        self.evaluate_at(request, Utc::now())
    }

    /// Evaluate with trial expiry judged at `now`. Identical inputs always yield
    /// identical decisions.
    #[must_use]
    pub fn evaluate_at(&self, request: &AccessRequest<'_>, now: DateTime<Utc>) -> AccessDecision {
        let decision = self.decide(request, now);
        if decision.is_denied() {
            debug!(
                module = request.module_key,
                submodule = request.submodule_key,
                action = request.action,
                organization_id = request.organization_id,
                level = %decision.enforcement_level,
                reason = decision.reason.as_deref(),
                "Access denied"
            );
        }
        decision
    }

    fn decide(&self, request: &AccessRequest<'_>, now: DateTime<Utc>) -> AccessDecision {
        let (Some(actor), Some(permissions), false) =
            (request.actor, request.permissions, request.is_loading)
        else {
            return AccessDecision::loading();
        };

        let scope = match tenant_guard::ensure_scope(actor, request.organization_id) {
            Ok(scope) => scope,
            Err(denial) => return AccessDecision::deny(EnforcementLevel::Tenant, denial.to_string()),
        };

        let snapshot = match (scope, request.entitlements) {
            (TenantScope::Organization(_), None) => return AccessDecision::loading(),
            (TenantScope::Organization(organization_id), Some(snapshot))
                if snapshot.organization_id != organization_id =>
            {
                // Snapshot of the previously selected organization; the new one is in flight.
                debug!(
                    organization_id,
                    snapshot_organization_id = snapshot.organization_id,
                    "Entitlement snapshot belongs to another organization"
                );
                return AccessDecision::loading();
            }
            (_, snapshot) => snapshot,
        };

        if actor.is_super_admin && self.policy.super_admin_bypasses_entitlements {
            return AccessDecision::allow();
        }

        if !self.policy.is_always_on(request.module_key) {
            let entitled = match snapshot {
                Some(snapshot) => {
                    check_entitlement(snapshot, request.module_key, request.submodule_key, now)
                }
                None => Err(EntitlementDenial::NoOrganization {
                    module: request.module_key.to_owned(),
                }),
            };
            if let Err(denial) = entitled {
                return AccessDecision::deny(EnforcementLevel::Entitlement, denial.to_string());
            }
        }

        if actor.is_super_admin {
            return AccessDecision::allow();
        }

        let permitted = CanonicalPermission::new(request.module_key, request.action)
            .is_some_and(|perm| permissions.holds_with_hierarchy(&perm, &self.policy.hierarchy));
        if permitted {
            AccessDecision::allow()
        } else {
            AccessDecision::deny(
                EnforcementLevel::Rbac,
                format!(
                    "Missing permission '{}.{}'",
                    request.module_key.trim().to_ascii_lowercase(),
                    request.action.trim().to_ascii_lowercase()
                ),
            )
        }
    }
}
