//! Configuration for the access-control evaluators.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use access_control_sdk::{AccessControlError, parse_permission};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};

/// Prefix of environment variables overriding file configuration.
pub const ENV_PREFIX: &str = "ACCESS_CONTROL_";

/// Access-control configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AccessControlConfig {
    /// Whether super admins skip the entitlement layer.
    ///
    /// `false` (strict enforcement): super admins skip the tenant and RBAC layers
    /// but still need the organization to be entitled to the module. Applies to
    /// both the boolean evaluator and the menu evaluator.
    pub super_admin_bypasses_entitlements: bool,

    /// Modules that are available to every organization regardless of entitlements.
    pub always_on_modules: Vec<String>,

    /// How long a fetched entitlement snapshot is reused before refetching.
    #[serde(with = "humantime_duration")]
    pub entitlement_cache_ttl: Duration,

    /// Parent permission -> child permissions it implies (one level, not transitive).
    pub permission_hierarchy: BTreeMap<String, Vec<String>>,
}

fn default_always_on_modules() -> Vec<String> {
    vec!["email".to_owned()]
}

fn default_entitlement_cache_ttl() -> Duration {
    Duration::from_secs(60)
}

fn default_permission_hierarchy() -> BTreeMap<String, Vec<String>> {
    let table: [(&str, &[&str]); 4] = [
        (
            "finance.manage",
            &["finance.read", "finance.create", "finance.update", "finance.approve"],
        ),
        ("sales.manage", &["sales.read", "sales.create", "sales.update"]),
        ("hr.manage", &["hr.read", "hr.create", "hr.update", "employees.read"]),
        (
            "inventory.manage",
            &["inventory.read", "inventory.create", "inventory.update"],
        ),
    ];
    table
        .into_iter()
        .map(|(parent, children)| {
            (
                parent.to_owned(),
                children.iter().map(|&c| c.to_owned()).collect(),
            )
        })
        .collect()
}

impl Default for AccessControlConfig {
    fn default() -> Self {
        Self {
            super_admin_bypasses_entitlements: false,
            always_on_modules: default_always_on_modules(),
            entitlement_cache_ttl: default_entitlement_cache_ttl(),
            permission_hierarchy: default_permission_hierarchy(),
        }
    }
}

impl AccessControlConfig {
    /// Load configuration: defaults, then the optional YAML file, then
    /// `ACCESS_CONTROL_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`AccessControlError::InvalidConfig`] if a source fails to parse
    /// or the merged configuration does not validate.
    pub fn load(path: Option<&Path>) -> Result<Self, AccessControlError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        let config: Self = figment
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()
            .map_err(|e| AccessControlError::invalid_config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check invariants serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`AccessControlError::InvalidConfig`] for a zero cache TTL, a
    /// blank always-on module, or an unparsable hierarchy permission.
    pub fn validate(&self) -> Result<(), AccessControlError> {
        if self.entitlement_cache_ttl.is_zero() {
            return Err(AccessControlError::invalid_config(
                "entitlement_cache_ttl must be greater than zero",
            ));
        }
        if self.always_on_modules.iter().any(|m| m.trim().is_empty()) {
            return Err(AccessControlError::invalid_config(
                "always_on_modules must not contain blank entries",
            ));
        }
        for (parent, children) in &self.permission_hierarchy {
            for perm in std::iter::once(parent).chain(children) {
                if parse_permission(perm).is_none() {
                    return Err(AccessControlError::invalid_config(format!(
                        "permission_hierarchy entry '{perm}' is not a 'module.action' permission"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Serde support for `Duration` in humantime form (`"60s"`, `"5m"`).
mod humantime_duration {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer, de};

    pub(super) fn serialize<S>(d: &Duration, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.collect_str(&humantime::format_duration(*d))
    }

    pub(super) fn deserialize<'de, D>(d: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(d)?;
        humantime::parse_duration(&raw).map_err(de::Error::custom)
    }
}
