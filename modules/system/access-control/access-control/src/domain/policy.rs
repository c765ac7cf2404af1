use std::collections::BTreeSet;

use crate::config::AccessControlConfig;
use crate::domain::permission_set::PermissionHierarchy;

/// Evaluation policy shared by [`AccessEvaluator`](super::AccessEvaluator) and
/// [`MenuAccessEvaluator`](super::MenuAccessEvaluator) so both apply the same
/// super-admin and always-on rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPolicy {
    pub super_admin_bypasses_entitlements: bool,
    pub always_on_modules: BTreeSet<String>,
    pub hierarchy: PermissionHierarchy,
}

impl AccessPolicy {
    #[must_use]
    pub fn from_config(config: &AccessControlConfig) -> Self {
        Self {
            super_admin_bypasses_entitlements: config.super_admin_bypasses_entitlements,
            always_on_modules: config
                .always_on_modules
                .iter()
                .map(|m| m.trim().to_owned())
                .collect(),
            hierarchy: PermissionHierarchy::from_table(&config.permission_hierarchy),
        }
    }

    #[must_use]
    pub fn is_always_on(&self, module: &str) -> bool {
        self.always_on_modules.contains(module)
    }
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self::from_config(&AccessControlConfig::default())
    }
}
