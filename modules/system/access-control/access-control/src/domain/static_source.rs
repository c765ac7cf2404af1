//! Static entitlement source.
//!
//! Serves fixed snapshots for bootstrap and testing.

use std::collections::HashMap;

use access_control_sdk::{
    AccessControlError, EntitlementSnapshot, EntitlementSource, OrganizationId,
};

/// In-memory [`EntitlementSource`] keyed by organization.
#[derive(Debug, Clone, Default)]
pub struct StaticEntitlementSource {
    snapshots: HashMap<OrganizationId, EntitlementSnapshot>,
}

impl StaticEntitlementSource {
    /// Build from snapshots; a later snapshot for the same organization wins.
    #[must_use]
    pub fn new<I>(snapshots: I) -> Self
    where
        I: IntoIterator<Item = EntitlementSnapshot>,
    {
        Self {
            snapshots: snapshots
                .into_iter()
                .map(|snapshot| (snapshot.organization_id, snapshot))
                .collect(),
        }
    }

    #[must_use]
    pub fn with_snapshot(mut self, snapshot: EntitlementSnapshot) -> Self {
        self.snapshots.insert(snapshot.organization_id, snapshot);
        self
    }
}

impl EntitlementSource for StaticEntitlementSource {
    fn fetch_entitlements(
        &self,
        organization_id: OrganizationId,
    ) -> Result<EntitlementSnapshot, AccessControlError> {
        self.snapshots.get(&organization_id).cloned().ok_or_else(|| {
            AccessControlError::entitlements_unavailable(
                organization_id,
                "no static entitlements configured",
            )
        })
    }
}
