//! Domain layer for access control.

pub mod cache;
pub mod entitlements;
pub mod evaluator;
pub mod menu;
pub mod permission_set;
pub mod policy;
pub mod session;
pub mod static_source;
pub mod tenant_guard;

pub use cache::{CachedSnapshot, EntitlementCache};
pub use entitlements::{EntitlementDenial, Entitled};
pub use evaluator::{AccessEvaluator, AccessRequest};
pub use menu::{MenuAccessEvaluator, MenuRequest};
pub use permission_set::{PermissionHierarchy, PermissionSet};
pub use policy::AccessPolicy;
pub use session::AccessSession;
pub use static_source::StaticEntitlementSource;
pub use tenant_guard::{TenantDenial, TenantScope};
