//! Boundary adapter holding the signed-in actor and loaded inputs.
//!
//! UI code talks to [`AccessSession`]; the evaluators underneath only ever see
//! explicit arguments.

use std::sync::Arc;

use access_control_sdk::{
    AccessControlError, AccessDecision, Actor, EntitlementSnapshot, EntitlementSource, Loadable,
    MenuAccessResult, OrganizationId, Role,
};
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::domain::cache::EntitlementCache;
use crate::domain::evaluator::{AccessEvaluator, AccessRequest};
use crate::domain::menu::{MenuAccessEvaluator, MenuRequest};
use crate::domain::permission_set::PermissionSet;
use crate::domain::policy::AccessPolicy;
use crate::domain::tenant_guard;

/// Session state for one signed-in user.
#[derive(Debug, Clone)]
pub struct AccessSession {
    actor: Option<Actor>,
    organization_id: Option<OrganizationId>,
    permissions: Loadable<PermissionSet>,
    entitlements: Loadable<Arc<EntitlementSnapshot>>,
    policy: Arc<AccessPolicy>,
    access: AccessEvaluator,
    menu: MenuAccessEvaluator,
}

impl AccessSession {
    #[must_use]
    pub fn new(policy: Arc<AccessPolicy>) -> Self {
        Self {
            actor: None,
            organization_id: None,
            permissions: Loadable::NotRequested,
            entitlements: Loadable::NotRequested,
            access: AccessEvaluator::new(Arc::clone(&policy)),
            menu: MenuAccessEvaluator::new(Arc::clone(&policy)),
            policy,
        }
    }

    /// Start a session; inputs move to `Loading` until the fetching layer fills them.
    pub fn sign_in(&mut self, actor: Actor) {
        debug!(role = %actor.role, organization_id = actor.organization_id, "Signed in");
        self.organization_id = actor.organization_id;
        self.actor = Some(actor);
        self.permissions = Loadable::Loading;
        self.entitlements = Loadable::Loading;
    }

    pub fn sign_out(&mut self) {
        self.actor = None;
        self.organization_id = None;
        self.permissions = Loadable::NotRequested;
        self.entitlements = Loadable::NotRequested;
    }

    /// Replace the actor after a profile refetch.
    ///
    /// Regular actors follow their own organization; super admins keep the one
    /// they selected.
    pub fn refresh_actor(&mut self, actor: Actor) {
        let organization_id = if actor.is_super_admin {
            self.organization_id.or(actor.organization_id)
        } else {
            actor.organization_id
        };
        self.actor = Some(actor);
        self.switch_organization(organization_id);
    }

    /// Change the organization context. Entitlements of the previous one are dropped.
    pub fn select_organization(&mut self, organization_id: Option<OrganizationId>) {
        self.switch_organization(organization_id);
    }

    fn switch_organization(&mut self, organization_id: Option<OrganizationId>) {
        if self.organization_id != organization_id {
            debug!(
                from = self.organization_id,
                to = organization_id,
                "Organization context changed"
            );
            self.organization_id = organization_id;
            self.entitlements = Loadable::Loading;
        }
    }

    pub fn set_permissions(&mut self, permissions: Loadable<PermissionSet>) {
        self.permissions = permissions;
    }

    pub fn set_entitlements(&mut self, entitlements: Loadable<Arc<EntitlementSnapshot>>) {
        self.entitlements = entitlements;
    }

    /// Fill entitlements of the selected organization through `cache`.
    ///
    /// # Errors
    ///
    /// Returns the source error; the session's entitlements become `Errored`.
    /// Without a selected organization nothing is fetched.
    pub fn refresh_entitlements(
        &mut self,
        cache: &EntitlementCache,
        source: &dyn EntitlementSource,
        now: DateTime<Utc>,
    ) -> Result<(), AccessControlError> {
        let Some(organization_id) = self.organization_id else {
            self.entitlements = Loadable::NotRequested;
            return Ok(());
        };
        match cache.get_or_fetch(organization_id, source, now) {
            Ok(snapshot) => {
                self.entitlements = Loadable::Loaded(snapshot);
                Ok(())
            }
            Err(err) => {
                warn!(organization_id, error = %err, "Failed to load entitlements");
                self.entitlements = Loadable::Errored(err.to_string());
                Err(err)
            }
        }
    }

    #[must_use]
    pub fn actor(&self) -> Option<&Actor> {
        self.actor.as_ref()
    }

    #[must_use]
    pub fn organization_id(&self) -> Option<OrganizationId> {
        self.organization_id
    }

    #[must_use]
    pub fn permissions(&self) -> &Loadable<PermissionSet> {
        &self.permissions
    }

    #[must_use]
    pub fn entitlements(&self) -> &Loadable<Arc<EntitlementSnapshot>> {
        &self.entitlements
    }

    /// Loaded and tenant-scoped; a denial from [`Self::can`] is then final.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.request("", "").is_ready()
    }

    #[must_use]
    pub fn can(&self, module: &str, action: &str) -> AccessDecision {
        self.access.evaluate(&self.request(module, action))
    }

    #[must_use]
    pub fn can_submodule(&self, module: &str, submodule: &str, action: &str) -> AccessDecision {
        self.access
            .evaluate(&self.request(module, action).submodule(submodule))
    }

    /// Classify a navigation entry for the current actor.
    #[must_use]
    pub fn menu(
        &self,
        require_module: Option<&str>,
        require_submodule: Option<(&str, &str)>,
    ) -> MenuAccessResult {
        let request = MenuRequest {
            require_module,
            require_submodule,
            organization_id: self.organization_id,
            entitlements: self.entitlements.as_ref().map(AsRef::as_ref),
            is_admin_like: self.actor.as_ref().is_some_and(Actor::is_admin_like),
            is_super_admin: self.is_super_admin(),
        };
        self.menu.evaluate(&request)
    }

    /// Permission check with the super-admin RBAC bypass applied.
    #[must_use]
    pub fn has_permission(&self, permission: &str) -> bool {
        self.check_permissions(|set, policy| set.has_with_hierarchy(permission, &policy.hierarchy))
    }

    #[must_use]
    pub fn has_any(&self, permissions: &[&str]) -> bool {
        self.check_permissions(|set, policy| set.has_any(permissions, &policy.hierarchy))
    }

    #[must_use]
    pub fn has_all(&self, permissions: &[&str]) -> bool {
        self.check_permissions(|set, policy| set.has_all(permissions, &policy.hierarchy))
    }

    /// Whether the current actor outranks `role`.
    #[must_use]
    pub fn can_manage(&self, role: &Role) -> bool {
        self.actor
            .as_ref()
            .is_some_and(|actor| actor.is_super_admin || actor.role.can_manage(role))
    }

    fn check_permissions(&self, check: impl FnOnce(&PermissionSet, &AccessPolicy) -> bool) -> bool {
        if self.is_super_admin() {
            return true;
        }
        self.permissions
            .loaded()
            .is_some_and(|set| check(set, &self.policy))
    }

    fn is_super_admin(&self) -> bool {
        self.actor.as_ref().is_some_and(|actor| actor.is_super_admin)
    }

    fn current_entitlements(&self) -> Option<&EntitlementSnapshot> {
        self.entitlements.loaded().map(AsRef::as_ref)
    }

    fn request<'a>(&'a self, module: &'a str, action: &'a str) -> AccessRequest<'a> {
        // without an organization there is no snapshot to wait for
        let awaiting_entitlements = tenant_guard::has_valid_tenant_context(self.organization_id)
            && self.entitlements.is_pending();
        AccessRequest {
            module_key: module,
            submodule_key: None,
            action,
            actor: self.actor.as_ref(),
            organization_id: self.organization_id,
            entitlements: self.current_entitlements(),
            permissions: self.permissions.loaded(),
            is_loading: self.permissions.is_pending() || awaiting_entitlements,
        }
    }
}

impl Default for AccessSession {
    fn default() -> Self {
        Self::new(Arc::new(AccessPolicy::default()))
    }
}
