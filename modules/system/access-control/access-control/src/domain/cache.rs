//! Per-organization entitlement cache with explicit staleness and invalidation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use access_control_sdk::{
    AccessControlError, EntitlementSnapshot, EntitlementSource, OrganizationId,
};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::{debug, info};

/// A cached snapshot and the moment it was fetched.
#[derive(Debug, Clone)]
pub struct CachedSnapshot {
    pub value: Arc<EntitlementSnapshot>,
    pub fetched_at: DateTime<Utc>,
}

impl CachedSnapshot {
    /// `true` once `ttl` has elapsed since `fetched_at`. Pure; never reads the clock.
    #[must_use]
    pub fn is_stale(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        // a TTL beyond chrono's range never expires
        chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| self.fetched_at.checked_add_signed(ttl))
            .is_some_and(|expires_at| now >= expires_at)
    }
}

/// Cache-aside store in front of an [`EntitlementSource`].
#[derive(Debug)]
pub struct EntitlementCache {
    ttl: Duration,
    entries: RwLock<HashMap<OrganizationId, CachedSnapshot>>,
}

impl EntitlementCache {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh snapshot for `organization_id`, or `None` on a miss or stale entry.
    #[must_use]
    pub fn get(
        &self,
        organization_id: OrganizationId,
        now: DateTime<Utc>,
    ) -> Option<Arc<EntitlementSnapshot>> {
        let entries = self.entries.read();
        entries
            .get(&organization_id)
            .filter(|entry| !entry.is_stale(now, self.ttl))
            .map(|entry| Arc::clone(&entry.value))
    }

    /// Store `snapshot` under its own organization id.
    pub fn insert(&self, snapshot: EntitlementSnapshot, now: DateTime<Utc>) {
        self.store(Arc::new(snapshot), now);
    }

    fn store(&self, value: Arc<EntitlementSnapshot>, now: DateTime<Utc>) {
        self.entries.write().insert(
            value.organization_id,
            CachedSnapshot {
                value,
                fetched_at: now,
            },
        );
    }

    /// Drop the entry of one organization, e.g. right after a plan change.
    pub fn invalidate(&self, organization_id: OrganizationId) {
        if self.entries.write().remove(&organization_id).is_some() {
            info!(organization_id, "Invalidated cached entitlements");
        }
    }

    pub fn invalidate_all(&self) {
        let mut entries = self.entries.write();
        let dropped = entries.len();
        entries.clear();
        info!(dropped, "Invalidated all cached entitlements");
    }

    /// Return the cached snapshot or fetch, store and return a fresh one.
    ///
    /// # Errors
    ///
    /// Propagates the source's error. Failures are not cached, so the next call
    /// retries the source.
    #[tracing::instrument(skip_all, fields(organization_id = organization_id))]
    pub fn get_or_fetch(
        &self,
        organization_id: OrganizationId,
        source: &dyn EntitlementSource,
        now: DateTime<Utc>,
    ) -> Result<Arc<EntitlementSnapshot>, AccessControlError> {
        if let Some(cached) = self.get(organization_id, now) {
            debug!("Cache hit for entitlements");
            return Ok(cached);
        }

        debug!("Cache miss for entitlements, fetching from source");
        let snapshot = source.fetch_entitlements(organization_id)?;
        if snapshot.organization_id != organization_id {
            return Err(AccessControlError::internal(format!(
                "entitlement source returned organization {} for request {organization_id}",
                snapshot.organization_id
            )));
        }
        let value = Arc::new(snapshot);
        self.store(Arc::clone(&value), now);
        Ok(value)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use access_control_sdk::ModuleEntitlement;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tracing_test::traced_test;

    /// Counts fetches; fails for organization 500.
    #[derive(Default)]
    struct CountingSource {
        calls: AtomicUsize,
    }

    impl EntitlementSource for CountingSource {
        fn fetch_entitlements(
            &self,
            organization_id: OrganizationId,
        ) -> Result<EntitlementSnapshot, AccessControlError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if organization_id == 500 {
                return Err(AccessControlError::entitlements_unavailable(
                    organization_id,
                    "backend down",
                ));
            }
            Ok(EntitlementSnapshot::new(organization_id)
                .with_module("crm", ModuleEntitlement::enabled()))
        }
    }

    #[test]
    fn staleness_is_a_pure_function_of_now() {
        let fetched_at = Utc::now();
        let entry = CachedSnapshot {
            value: Arc::new(EntitlementSnapshot::new(100)),
            fetched_at,
        };
        let ttl = Duration::from_secs(60);

        assert!(!entry.is_stale(fetched_at, ttl));
        assert!(!entry.is_stale(fetched_at + chrono::Duration::seconds(59), ttl));
        assert!(entry.is_stale(fetched_at + chrono::Duration::seconds(60), ttl));
    }

    #[test]
    fn cache_hit_within_ttl_skips_source() {
        // Arrange
        let cache = EntitlementCache::new(Duration::from_secs(60));
        let source = CountingSource::default();
        let now = Utc::now();

        // Act
        let first = cache.get_or_fetch(100, &source, now).unwrap();
        let second = cache
            .get_or_fetch(100, &source, now + chrono::Duration::seconds(30))
            .unwrap();

        // Assert
        assert_eq!(source.calls.load(Ordering::SeqCst), 1, "second call should hit cache");
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn stale_entry_is_refetched() {
        let cache = EntitlementCache::new(Duration::from_secs(60));
        let source = CountingSource::default();
        let now = Utc::now();

        cache.get_or_fetch(100, &source, now).unwrap();
        assert!(cache.get(100, now + chrono::Duration::seconds(61)).is_none());
        cache
            .get_or_fetch(100, &source, now + chrono::Duration::seconds(61))
            .unwrap();

        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[traced_test]
    #[test]
    fn invalidate_forces_refetch() {
        let cache = EntitlementCache::new(Duration::from_secs(60));
        let source = CountingSource::default();
        let now = Utc::now();

        cache.get_or_fetch(100, &source, now).unwrap();
        cache.get_or_fetch(200, &source, now).unwrap();
        cache.invalidate(100);

        assert!(cache.get(100, now).is_none());
        assert!(cache.get(200, now).is_some());
        assert!(logs_contain("Invalidated cached entitlements"));

        cache.invalidate_all();
        assert!(cache.is_empty());
    }

    #[test]
    fn errors_are_not_cached() {
        let cache = EntitlementCache::new(Duration::from_secs(60));
        let source = CountingSource::default();
        let now = Utc::now();

        let err = cache.get_or_fetch(500, &source, now).unwrap_err();
        assert!(matches!(err, AccessControlError::EntitlementsUnavailable { .. }));
        assert!(cache.is_empty());

        cache.get_or_fetch(500, &source, now).unwrap_err();
        assert_eq!(source.calls.load(Ordering::SeqCst), 2, "failure must not be cached");
    }

    #[test]
    fn snapshot_for_wrong_organization_is_rejected() {
        struct Misrouted;
        impl EntitlementSource for Misrouted {
            fn fetch_entitlements(
                &self,
                _organization_id: OrganizationId,
            ) -> Result<EntitlementSnapshot, AccessControlError> {
                Ok(EntitlementSnapshot::new(999))
            }
        }

        let cache = EntitlementCache::new(Duration::from_secs(60));
        let err = cache.get_or_fetch(100, &Misrouted, Utc::now()).unwrap_err();
        assert!(matches!(err, AccessControlError::Internal { .. }));
        assert!(cache.is_empty());
    }
}
