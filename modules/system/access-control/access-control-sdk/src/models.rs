//! Actor, role and input-state models.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Organization (tenant) identifier as delivered by the backend.
///
/// Signed so that malformed inputs (zero, negative) can be represented and
/// rejected by the tenant guard instead of failing at the parsing boundary.
pub type OrganizationId = i64;

const DEPARTMENT_MANAGER_SUFFIX: &str = "_manager";

/// Role tag carried by an actor.
///
/// Roles form a partial management hierarchy used only by [`Role::can_manage`];
/// feature access is decided by permissions, never by role rank.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    SuperAdmin,
    Admin,
    OrgAdmin,
    Executive,
    Management,
    /// `<department>_manager`, e.g. `hr_manager`.
    DepartmentManager(String),
    Manager,
    User,
    Employee,
    /// Any role string this crate does not know about.
    Other(String),
}

impl Role {
    /// Position in the management hierarchy; higher manages lower.
    #[must_use]
    pub fn rank(&self) -> u8 {
        match self {
            Self::SuperAdmin => 100,
            Self::Admin | Self::OrgAdmin => 90,
            Self::Executive => 80,
            Self::Management => 70,
            Self::DepartmentManager(_) | Self::Manager => 60,
            Self::User | Self::Employee => 10,
            Self::Other(_) => 0,
        }
    }

    /// Returns `true` if this role may act on `other` (strictly below it).
    #[must_use]
    pub fn can_manage(&self, other: &Role) -> bool {
        self.rank() > other.rank()
    }

    /// Org admins and super admins can remediate a disabled module themselves.
    #[must_use]
    pub fn is_admin_like(&self) -> bool {
        matches!(self, Self::SuperAdmin | Self::Admin | Self::OrgAdmin)
    }

    /// Department of a `<department>_manager` role.
    #[must_use]
    pub fn department(&self) -> Option<&str> {
        match self {
            Self::DepartmentManager(dept) => Some(dept),
            _ => None,
        }
    }
}

impl FromStr for Role {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_ascii_lowercase();
        let role = match tag.as_str() {
            "super_admin" | "superadmin" => Self::SuperAdmin,
            "admin" => Self::Admin,
            "org_admin" => Self::OrgAdmin,
            "executive" => Self::Executive,
            "management" => Self::Management,
            "manager" => Self::Manager,
            "user" => Self::User,
            "employee" => Self::Employee,
            _ => match tag.strip_suffix(DEPARTMENT_MANAGER_SUFFIX) {
                Some(dept) if !dept.is_empty() => Self::DepartmentManager(dept.to_owned()),
                _ => Self::Other(tag),
            },
        };
        Ok(role)
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        match value.parse() {
            Ok(role) => role,
            Err(never) => match never {},
        }
    }
}

impl From<Role> for String {
    fn from(value: Role) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SuperAdmin => f.write_str("super_admin"),
            Self::Admin => f.write_str("admin"),
            Self::OrgAdmin => f.write_str("org_admin"),
            Self::Executive => f.write_str("executive"),
            Self::Management => f.write_str("management"),
            Self::DepartmentManager(dept) => write!(f, "{dept}{DEPARTMENT_MANAGER_SUFFIX}"),
            Self::Manager => f.write_str("manager"),
            Self::User => f.write_str("user"),
            Self::Employee => f.write_str("employee"),
            Self::Other(tag) => f.write_str(tag),
        }
    }
}

/// The signed-in principal an access check is made for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    pub role: Role,
    /// Organization the actor belongs to. `None` until one is selected.
    #[serde(default)]
    pub organization_id: Option<OrganizationId>,
    #[serde(default)]
    pub is_super_admin: bool,
}

impl Actor {
    /// Create an actor; the super-admin flag follows the role.
    #[must_use]
    pub fn new(role: Role, organization_id: Option<OrganizationId>) -> Self {
        let is_super_admin = role == Role::SuperAdmin;
        Self {
            user_id: None,
            role,
            organization_id,
            is_super_admin,
        }
    }

    #[must_use]
    pub fn with_user_id(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Admin-like actors see disabled modules greyed out instead of hidden.
    #[must_use]
    pub fn is_admin_like(&self) -> bool {
        self.is_super_admin || self.role.is_admin_like()
    }
}

/// Fetch state of an input owned by the data-fetching layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Loadable<T> {
    /// Nobody asked for it yet.
    #[default]
    NotRequested,
    /// A fetch is in flight.
    Loading,
    /// Fetched; possibly stale up to the cache window.
    Loaded(T),
    /// The last fetch failed.
    Errored(String),
}

impl<T> Loadable<T> {
    /// The value, if loaded.
    #[must_use]
    pub fn loaded(&self) -> Option<&T> {
        match self {
            Self::Loaded(value) => Some(value),
            _ => None,
        }
    }

    /// `true` while the outcome is not determined yet.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::NotRequested | Self::Loading)
    }

    #[must_use]
    pub fn is_errored(&self) -> bool {
        matches!(self, Self::Errored(_))
    }

    #[must_use]
    pub fn as_ref(&self) -> Loadable<&T> {
        match self {
            Self::NotRequested => Loadable::NotRequested,
            Self::Loading => Loadable::Loading,
            Self::Loaded(value) => Loadable::Loaded(value),
            Self::Errored(message) => Loadable::Errored(message.clone()),
        }
    }

    #[must_use]
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Loadable<U> {
        match self {
            Self::NotRequested => Loadable::NotRequested,
            Self::Loading => Loadable::Loading,
            Self::Loaded(value) => Loadable::Loaded(f(value)),
            Self::Errored(message) => Loadable::Errored(message),
        }
    }
}

impl<T> From<Option<T>> for Loadable<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Loading, Self::Loaded)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn role_parses_known_and_department_tags() {
        assert_eq!("super_admin".parse::<Role>().unwrap(), Role::SuperAdmin);
        assert_eq!("ORG_ADMIN".parse::<Role>().unwrap(), Role::OrgAdmin);
        assert_eq!(
            "hr_manager".parse::<Role>().unwrap(),
            Role::DepartmentManager("hr".to_owned())
        );
        assert_eq!(
            "_manager".parse::<Role>().unwrap(),
            Role::Other("_manager".to_owned())
        );
        assert_eq!(
            "auditor".parse::<Role>().unwrap(),
            Role::Other("auditor".to_owned())
        );
    }

    #[test]
    fn role_display_roundtrips_through_parse() {
        for tag in ["super_admin", "admin", "finance_manager", "employee", "auditor"] {
            let role: Role = tag.parse().unwrap();
            assert_eq!(role.to_string(), tag);
        }
    }

    #[test]
    fn can_manage_only_strictly_lower_roles() {
        let admin = Role::Admin;
        let manager = Role::DepartmentManager("sales".to_owned());

        assert!(admin.can_manage(&manager));
        assert!(manager.can_manage(&Role::Employee));
        assert!(!manager.can_manage(&Role::Manager));
        assert!(!admin.can_manage(&Role::OrgAdmin));
        assert!(!Role::User.can_manage(&Role::Employee));
        assert!(Role::SuperAdmin.can_manage(&Role::Admin));
    }

    #[test]
    fn actor_deserializes_from_wire_shape() {
        let actor: Actor = serde_json::from_str(
            r#"{ "role": "manager", "organizationId": 100, "isSuperAdmin": false }"#,
        )
        .unwrap();
        assert_eq!(actor.role, Role::Manager);
        assert_eq!(actor.organization_id, Some(100));
        assert!(!actor.is_super_admin);
        assert_eq!(actor.user_id, None);

        let no_org: Actor =
            serde_json::from_str(r#"{ "role": "user", "organizationId": null }"#).unwrap();
        assert_eq!(no_org.organization_id, None);
    }

    #[test]
    fn admin_like_follows_flag_or_role() {
        assert!(Actor::new(Role::OrgAdmin, Some(1)).is_admin_like());
        assert!(!Actor::new(Role::Executive, Some(1)).is_admin_like());

        let mut flagged = Actor::new(Role::User, None);
        flagged.is_super_admin = true;
        assert!(flagged.is_admin_like());
    }

    #[test]
    fn loadable_pending_states() {
        assert!(Loadable::<u8>::NotRequested.is_pending());
        assert!(Loadable::<u8>::Loading.is_pending());
        assert!(!Loadable::Loaded(1).is_pending());
        assert!(!Loadable::<u8>::Errored("boom".to_owned()).is_pending());
        assert_eq!(Loadable::Loaded(7).loaded(), Some(&7));
        assert_eq!(Loadable::<u8>::from(None), Loadable::Loading);
    }

    #[test]
    fn loadable_map_keeps_the_state() {
        assert_eq!(Loadable::Loaded(2).map(|n| n * 10), Loadable::Loaded(20));
        assert_eq!(Loadable::<u8>::Loading.map(|n| n * 10), Loadable::Loading);
        assert_eq!(
            Loadable::<u8>::Errored("boom".to_owned()).map(u16::from),
            Loadable::Errored("boom".to_owned())
        );
    }
}
