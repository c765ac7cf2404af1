//! Granted permissions of one actor and the parent/child permission table.
//!
//! This layer knows nothing about super admins; callers apply that bypass
//! before asking (see `AccessSession`).

use std::collections::{BTreeMap, BTreeSet};

use access_control_sdk::{CanonicalPermission, parse_permission, permission_candidates};
use tracing::warn;

/// Fixed "holding parent implies holding children" table.
///
/// Only one level deep: a child that is itself a parent does not pass its own
/// children on unless they are listed under the first parent as well.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionHierarchy {
    edges: BTreeMap<CanonicalPermission, Vec<CanonicalPermission>>,
}

impl PermissionHierarchy {
    /// Build from a raw `parent -> [children]` table. Malformed entries are skipped.
    #[must_use]
    pub fn from_table(table: &BTreeMap<String, Vec<String>>) -> Self {
        let mut edges = BTreeMap::new();
        for (parent, children) in table {
            let parents = permission_candidates(parent);
            if parents.is_empty() {
                warn!(permission = %parent, "Skipping malformed hierarchy parent");
                continue;
            }
            let children: Vec<CanonicalPermission> = children
                .iter()
                .flat_map(|child| {
                    let readings = permission_candidates(child);
                    if readings.is_empty() {
                        warn!(parent = %parent, permission = %child, "Skipping malformed hierarchy child");
                    }
                    readings
                })
                .collect();
            for parent_perm in parents {
                edges
                    .entry(parent_perm)
                    .or_insert_with(Vec::new)
                    .extend(children.iter().cloned());
            }
        }
        Self { edges }
    }

    /// Children implied by `parent`.
    #[must_use]
    pub fn children(&self, parent: &CanonicalPermission) -> &[CanonicalPermission] {
        self.edges.get(parent).map(Vec::as_slice).unwrap_or_default()
    }

    /// Parents whose children include (or wildcard-cover) `permission`.
    pub fn parents_of<'a>(
        &'a self,
        permission: &'a CanonicalPermission,
    ) -> impl Iterator<Item = &'a CanonicalPermission> + 'a {
        self.edges
            .iter()
            .filter(move |(_, children)| children.iter().any(|c| c.covers(permission)))
            .map(|(parent, _)| parent)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

/// Normalized set of permissions granted to an actor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionSet {
    granted: BTreeSet<CanonicalPermission>,
}

impl PermissionSet {
    /// Normalize raw grants in any accepted spelling.
    ///
    /// An underscore-only grant is stored under every reading, so
    /// `"sales_create_invoice"` answers both `sales.create_invoice` and
    /// `sales_create.invoice`. Malformed strings are logged and ignored so one
    /// bad entry cannot break unrelated checks.
    #[must_use]
    pub fn from_granted<I, S>(raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let granted = raw
            .into_iter()
            .flat_map(|entry| {
                let entry = entry.as_ref();
                let readings = Self::readings(entry);
                if readings.is_empty() {
                    warn!(permission = %entry, "Ignoring malformed granted permission");
                }
                readings
            })
            .collect();
        Self { granted }
    }

    /// The single place where legacy spellings are accepted.
    #[must_use]
    pub fn normalize(permission: &str) -> Option<CanonicalPermission> {
        parse_permission(permission)
    }

    /// Every reading of `permission`; more than one only for the ambiguous `_` form.
    #[must_use]
    pub fn readings(permission: &str) -> Vec<CanonicalPermission> {
        permission_candidates(permission)
    }

    /// `true` if `permission`, any equivalent spelling, or `"<module>.*"` is granted.
    /// A malformed `permission` matches nothing.
    #[must_use]
    pub fn has_direct(&self, permission: &str) -> bool {
        Self::readings(permission).iter().any(|p| self.holds(p))
    }

    /// Direct check by parts, e.g. `has_permission("sales", "create")`.
    #[must_use]
    pub fn has_permission(&self, module: &str, action: &str) -> bool {
        CanonicalPermission::new(module, action).is_some_and(|p| self.holds(&p))
    }

    /// Direct grant, or a granted parent in `hierarchy` implies it.
    #[must_use]
    pub fn has_with_hierarchy(&self, permission: &str, hierarchy: &PermissionHierarchy) -> bool {
        Self::readings(permission)
            .iter()
            .any(|p| self.holds_with_hierarchy(p, hierarchy))
    }

    /// `true` if at least one of `permissions` is held. Empty input is `false`.
    #[must_use]
    pub fn has_any(&self, permissions: &[&str], hierarchy: &PermissionHierarchy) -> bool {
        permissions
            .iter()
            .any(|p| self.has_with_hierarchy(p, hierarchy))
    }

    /// `true` if every one of `permissions` is held. Empty input is `true`.
    #[must_use]
    pub fn has_all(&self, permissions: &[&str], hierarchy: &PermissionHierarchy) -> bool {
        permissions
            .iter()
            .all(|p| self.has_with_hierarchy(p, hierarchy))
    }

    pub(crate) fn holds_with_hierarchy(
        &self,
        permission: &CanonicalPermission,
        hierarchy: &PermissionHierarchy,
    ) -> bool {
        self.holds(permission)
            || hierarchy
                .parents_of(permission)
                .any(|parent| self.holds(parent))
    }

    fn holds(&self, permission: &CanonicalPermission) -> bool {
        self.granted.contains(permission)
            || CanonicalPermission::wildcard(permission.module())
                .is_some_and(|w| self.granted.contains(&w))
    }

    pub fn iter(&self) -> impl Iterator<Item = &CanonicalPermission> {
        self.granted.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.granted.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.granted.is_empty()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::config::AccessControlConfig;
    use tracing_test::traced_test;

    fn default_hierarchy() -> PermissionHierarchy {
        PermissionHierarchy::from_table(&AccessControlConfig::default().permission_hierarchy)
    }

    #[test]
    fn separator_spellings_agree_for_every_backing_set() {
        let sets = [
            PermissionSet::from_granted(["crm.read"]),
            PermissionSet::from_granted(["crm:read"]),
            PermissionSet::from_granted(["crm_read"]),
            PermissionSet::from_granted(["crm.write"]),
        ];
        for set in &sets {
            let dotted = set.has_direct("crm.read");
            assert_eq!(set.has_direct("crm:read"), dotted);
            assert_eq!(set.has_direct("crm_read"), dotted);
        }
        assert!(sets[0].has_direct("crm:read"));
        assert!(!sets[3].has_direct("crm_read"));
    }

    #[test]
    fn underscore_grant_answers_has_permission() {
        let set = PermissionSet::from_granted(["sales_create"]);
        assert!(set.has_permission("sales", "create"));
        assert!(!set.has_permission("sales", "delete"));
    }

    #[test]
    fn underscored_action_matches_from_grant_and_query_side() {
        let dotted_grant = PermissionSet::from_granted(["sales.create_invoice"]);
        for query in ["sales.create_invoice", "sales:create_invoice", "sales_create_invoice"] {
            assert!(dotted_grant.has_direct(query), "{query}");
        }
        assert!(dotted_grant.has_permission("sales", "create_invoice"));

        let underscore_grant = PermissionSet::from_granted(["sales_create_invoice"]);
        for query in ["sales.create_invoice", "sales:create_invoice", "sales_create_invoice"] {
            assert!(underscore_grant.has_direct(query), "{query}");
        }
        assert!(underscore_grant.has_permission("sales", "create_invoice"));
        assert!(!underscore_grant.has_direct("sales.create"));
        assert!(!underscore_grant.has_direct("sales.delete_invoice"));
    }

    #[test]
    fn underscored_action_resolves_through_hierarchy() {
        let mut table = BTreeMap::new();
        table.insert("sales.manage".to_owned(), vec!["sales.create_invoice".to_owned()]);
        let hierarchy = PermissionHierarchy::from_table(&table);
        let set = PermissionSet::from_granted(["sales_manage"]);

        assert!(set.has_with_hierarchy("sales_create_invoice", &hierarchy));
        assert!(set.has_with_hierarchy("sales.create_invoice", &hierarchy));
        assert!(!set.has_with_hierarchy("sales.void_invoice", &hierarchy));
    }

    #[test]
    fn module_wildcard_grants_every_action() {
        let set = PermissionSet::from_granted(["inventory.*"]);
        for action in ["read", "create", "update", "delete", "export"] {
            assert!(set.has_direct(&format!("inventory.{action}")), "{action}");
        }
        assert!(!set.has_direct("crm.read"));
    }

    #[traced_test]
    #[test]
    fn malformed_grants_are_ignored_and_logged() {
        let set = PermissionSet::from_granted(["crm.read", "garbage", ""]);
        assert_eq!(set.len(), 1);
        assert!(set.has_direct("crm.read"));
        assert!(!set.has_direct("garbage"));
        assert!(logs_contain("Ignoring malformed granted permission"));
    }

    #[test]
    fn hierarchy_parent_implies_listed_children() {
        let hierarchy = default_hierarchy();
        let set = PermissionSet::from_granted(["hr.manage"]);

        assert!(set.has_with_hierarchy("hr.read", &hierarchy));
        assert!(set.has_with_hierarchy("employees:read", &hierarchy));
        assert!(!set.has_with_hierarchy("hr.delete", &hierarchy));
        assert!(!set.has_direct("hr.read"));
    }

    #[test]
    fn hierarchy_is_not_transitive() {
        let mut table = BTreeMap::new();
        table.insert("ops.manage".to_owned(), vec!["ops.supervise".to_owned()]);
        table.insert("ops.supervise".to_owned(), vec!["ops.read".to_owned()]);
        let hierarchy = PermissionHierarchy::from_table(&table);
        let set = PermissionSet::from_granted(["ops.manage"]);

        assert!(set.has_with_hierarchy("ops.supervise", &hierarchy));
        assert!(!set.has_with_hierarchy("ops.read", &hierarchy));
    }

    #[test]
    fn wildcard_parent_and_child_entries() {
        let mut table = BTreeMap::new();
        table.insert("projects.manage".to_owned(), vec!["tasks.*".to_owned()]);
        let hierarchy = PermissionHierarchy::from_table(&table);

        let via_wildcard_parent = PermissionSet::from_granted(["projects.*"]);
        assert!(via_wildcard_parent.has_with_hierarchy("tasks.assign", &hierarchy));
        assert_eq!(
            hierarchy
                .children(&CanonicalPermission::new("projects", "manage").unwrap())
                .len(),
            1
        );
    }

    #[test]
    fn any_and_all_combinators() {
        let hierarchy = default_hierarchy();
        let set = PermissionSet::from_granted(["crm.read", "sales.manage"]);

        assert!(set.has_any(&["crm.write", "sales.create"], &hierarchy));
        assert!(!set.has_any(&["crm.write", "finance.read"], &hierarchy));
        assert!(!set.has_any(&[], &hierarchy));

        assert!(set.has_all(&["crm.read", "sales:update"], &hierarchy));
        assert!(!set.has_all(&["crm.read", "crm.write"], &hierarchy));
        assert!(set.has_all(&[], &hierarchy));
    }

    #[test]
    fn malformed_hierarchy_entries_are_skipped() {
        let mut table = BTreeMap::new();
        table.insert("bad".to_owned(), vec!["crm.read".to_owned()]);
        table.insert("crm.manage".to_owned(), vec!["oops".to_owned(), "crm.read".to_owned()]);
        let hierarchy = PermissionHierarchy::from_table(&table);

        let parent = CanonicalPermission::new("crm", "manage").unwrap();
        assert_eq!(hierarchy.children(&parent).len(), 1);
        assert!(PermissionSet::from_granted(["crm.manage"]).has_with_hierarchy("crm.read", &hierarchy));
    }
}
