//! Tenant scoping checks.
//!
//! The primitives do not know about super admins except [`can_cross_org`];
//! the evaluator decides when the cross-organization bypass applies.

use access_control_sdk::{Actor, OrganizationId};
use thiserror::Error;

/// Why an operation is not anchored to an organization the actor may act in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TenantDenial {
    #[error("Organization context is required")]
    MissingContext,

    #[error("Organization context {organization_id} does not match the signed-in user's organization")]
    ForeignOrganization { organization_id: OrganizationId },
}

/// Organization an operation ends up scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenantScope {
    Organization(OrganizationId),
    /// A super admin acting without a selected organization.
    Unscoped,
}

/// `true` iff `organization_id` is present and positive.
#[must_use]
pub fn has_valid_tenant_context(organization_id: Option<OrganizationId>) -> bool {
    organization_id.is_some_and(|id| id > 0)
}

/// `true` iff both ids are valid and equal. Evaluated the same for super admins.
#[must_use]
pub fn actor_belongs_to_org(
    actor_org_id: Option<OrganizationId>,
    target_org_id: Option<OrganizationId>,
) -> bool {
    has_valid_tenant_context(actor_org_id) && actor_org_id == target_org_id
}

/// Super admins may act in any organization; everybody else only in their own.
#[must_use]
pub fn can_cross_org(actor: &Actor, target_org_id: Option<OrganizationId>) -> bool {
    actor.is_super_admin || actor_belongs_to_org(actor.organization_id, target_org_id)
}

/// Resolve the organization `actor` operates in for `target_org_id`.
///
/// # Errors
///
/// - [`TenantDenial::MissingContext`] when no valid organization is given and
///   the actor is not a super admin
/// - [`TenantDenial::ForeignOrganization`] when the actor may not act in it
pub fn ensure_scope(
    actor: &Actor,
    target_org_id: Option<OrganizationId>,
) -> Result<TenantScope, TenantDenial> {
    match target_org_id {
        Some(id) if has_valid_tenant_context(target_org_id) => {
            if can_cross_org(actor, target_org_id) {
                Ok(TenantScope::Organization(id))
            } else {
                Err(TenantDenial::ForeignOrganization {
                    organization_id: id,
                })
            }
        }
        _ if actor.is_super_admin => Ok(TenantScope::Unscoped),
        _ => Err(TenantDenial::MissingContext),
    }
}
