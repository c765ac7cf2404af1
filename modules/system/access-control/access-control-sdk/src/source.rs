//! Entitlement source trait.
//!
//! Implemented by the data-fetching layer (REST client, static fixtures) so the
//! entitlement cache can refill itself without knowing the transport.

use crate::entitlement::EntitlementSnapshot;
use crate::error::AccessControlError;
use crate::models::OrganizationId;

/// Provides the entitlement snapshot of an organization.
pub trait EntitlementSource: Send + Sync {
    /// Fetch the current snapshot of `organization_id`.
    ///
    /// # Errors
    ///
    /// Returns [`AccessControlError::EntitlementsUnavailable`] if the snapshot
    /// cannot be obtained (organization unknown, backend unreachable, bad payload).
    fn fetch_entitlements(
        &self,
        organization_id: OrganizationId,
    ) -> Result<EntitlementSnapshot, AccessControlError>;
}
