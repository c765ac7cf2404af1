//! Access Control Module
//!
//! Decides whether an actor may use a feature by merging three layers:
//!
//! - **Tenant**: the request is scoped to an organization the actor may act in
//! - **Entitlement**: the organization's subscription includes the module
//! - **RBAC**: the actor holds `<module>.<action>` directly or through the
//!   permission hierarchy
//!
//! [`AccessEvaluator`] answers with an [`AccessDecision`] naming the first
//! failing layer; [`MenuAccessEvaluator`] classifies navigation entries as
//! hidden, disabled or enabled. Both are pure: every input is passed in and
//! identical inputs give identical answers. [`AccessSession`] is the stateful
//! adapter that holds the signed-in actor and the loaded inputs.
//!
//! ```
//! use std::sync::Arc;
//! use access_control::{
//!     AccessEvaluator, AccessPolicy, AccessRequest, Actor, EntitlementSnapshot,
//!     ModuleEntitlement, PermissionSet, Role,
//! };
//!
//! let evaluator = AccessEvaluator::new(Arc::new(AccessPolicy::default()));
//! let actor = Actor::new(Role::Manager, Some(100));
//! let snapshot = EntitlementSnapshot::new(100).with_module("crm", ModuleEntitlement::enabled());
//! let permissions = PermissionSet::from_granted(["crm:read"]);
//!
//! let decision = evaluator.evaluate(
//!     &AccessRequest::new("crm", "read")
//!         .actor(&actor)
//!         .entitlements(&snapshot)
//!         .permissions(&permissions),
//! );
//! assert!(decision.allowed);
//! ```
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

// Re-export SDK types
pub use access_control_sdk::*;

pub mod config;
pub mod domain;

pub use config::AccessControlConfig;
pub use domain::{
    AccessEvaluator, AccessPolicy, AccessRequest, AccessSession, EntitlementCache,
    MenuAccessEvaluator, MenuRequest, PermissionHierarchy, PermissionSet,
    StaticEntitlementSource,
};
