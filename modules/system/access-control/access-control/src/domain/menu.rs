//! Navigation classification: `hidden`, `disabled` or `enabled`.

use std::sync::Arc;

use access_control_sdk::{
    Actor, ENTITLEMENTS_LOADING_REASON, ENTITLEMENTS_UNAVAILABLE_REASON, EntitlementSnapshot,
    Loadable, MenuAccessResult, OrganizationId,
};
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::domain::entitlements::{Entitled, EntitlementDenial, check_entitlement};
use crate::domain::policy::AccessPolicy;
use crate::domain::tenant_guard;

/// Requirements of one navigation entry plus the caller's context.
#[derive(Debug, Clone, Default)]
pub struct MenuRequest<'a> {
    pub require_module: Option<&'a str>,
    /// `(module, submodule)`.
    pub require_submodule: Option<(&'a str, &'a str)>,
    /// Selected organization; a snapshot of any other one counts as loading.
    pub organization_id: Option<OrganizationId>,
    pub entitlements: Loadable<&'a EntitlementSnapshot>,
    pub is_admin_like: bool,
    pub is_super_admin: bool,
}

impl<'a> MenuRequest<'a> {
    /// Request carrying the admin flags and organization of `actor`.
    /// A missing snapshot counts as loading.
    #[must_use]
    pub fn for_actor(actor: &Actor, entitlements: Option<&'a EntitlementSnapshot>) -> Self {
        Self {
            organization_id: actor.organization_id,
            entitlements: entitlements.into(),
            is_admin_like: actor.is_admin_like(),
            is_super_admin: actor.is_super_admin,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn organization(mut self, organization_id: Option<OrganizationId>) -> Self {
        self.organization_id = organization_id;
        self
    }

    /// Replace the snapshot with its full fetch state.
    #[must_use]
    pub fn entitlements(mut self, entitlements: Loadable<&'a EntitlementSnapshot>) -> Self {
        self.entitlements = entitlements;
        self
    }

    #[must_use]
    pub fn module(mut self, module: &'a str) -> Self {
        self.require_module = Some(module);
        self
    }

    #[must_use]
    pub fn submodule(mut self, module: &'a str, submodule: &'a str) -> Self {
        self.require_submodule = Some((module, submodule));
        self
    }
}

/// Classifies navigation entries. Never fails: unknown modules behave as disabled.
#[derive(Debug, Clone, Default)]
pub struct MenuAccessEvaluator {
    policy: Arc<AccessPolicy>,
}

impl MenuAccessEvaluator {
    #[must_use]
    pub fn new(policy: Arc<AccessPolicy>) -> Self {
        Self { policy }
    }

    #[must_use]
    pub fn evaluate(&self, request: &MenuRequest<'_>) -> MenuAccessResult {
        self.evaluate_at(request, Utc::now())
    }

    #[must_use]
    pub fn evaluate_at(&self, request: &MenuRequest<'_>, now: DateTime<Utc>) -> MenuAccessResult {
        let requirements = [
            request.require_module.map(|module| (module, None)),
            request
                .require_submodule
                .map(|(module, submodule)| (module, Some(submodule))),
        ];
        if requirements.iter().all(Option::is_none) {
            return MenuAccessResult::enabled();
        }

        let scoped = tenant_guard::has_valid_tenant_context(request.organization_id);
        let snapshot = match &request.entitlements {
            Loadable::Loaded(snapshot) => {
                if let Some(organization_id) = request.organization_id
                    && scoped
                    && snapshot.organization_id != organization_id
                {
                    debug!(
                        organization_id,
                        snapshot_organization_id = snapshot.organization_id,
                        "Entitlement snapshot belongs to another organization"
                    );
                    return MenuAccessResult::disabled(ENTITLEMENTS_LOADING_REASON);
                }
                Some(*snapshot)
            }
            Loadable::Errored(_) => {
                return MenuAccessResult::disabled(ENTITLEMENTS_UNAVAILABLE_REASON);
            }
            // nothing to wait for without an organization
            _ if request.is_super_admin && !scoped => None,
            Loadable::NotRequested | Loadable::Loading => {
                return MenuAccessResult::disabled(ENTITLEMENTS_LOADING_REASON);
            }
        };

        if request.is_super_admin && self.policy.super_admin_bypasses_entitlements {
            return MenuAccessResult::enabled();
        }

        let mut trial: Option<Entitled> = None;
        for (module, submodule) in requirements.into_iter().flatten() {
            if self.policy.is_always_on(module) {
                continue;
            }
            let entitled = match snapshot {
                Some(snapshot) => check_entitlement(snapshot, module, submodule, now),
                None => Err(EntitlementDenial::NoOrganization {
                    module: module.to_owned(),
                }),
            };
            match entitled {
                Ok(entitled) if entitled.is_trial => trial = trial.or(Some(entitled)),
                Ok(_) => {}
                Err(denial) => return Self::unavailable(request, &denial),
            }
        }

        match trial {
            Some(entitled) => MenuAccessResult::trial(entitled.trial_expires_at),
            None => MenuAccessResult::enabled(),
        }
    }

    // Admin-like actors get a disabled entry, everyone else a hidden one.
    fn unavailable(request: &MenuRequest<'_>, denial: &EntitlementDenial) -> MenuAccessResult {
        if request.is_admin_like || request.is_super_admin {
            MenuAccessResult::disabled(denial.to_string())
        } else {
            MenuAccessResult::hidden(denial.to_string())
        }
    }
}
