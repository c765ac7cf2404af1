//! Access Control SDK
//!
//! This crate provides the public models for the `access-control` module:
//!
//! - [`Actor`] and [`Role`] - who is asking
//! - [`CanonicalPermission`] and [`parse_permission`] - what they were granted
//! - [`EntitlementSnapshot`] and [`ModuleEntitlement`] - what their organization pays for
//! - [`AccessDecision`] and [`MenuAccessResult`] - what the evaluators answer
//! - [`Loadable`] - fetch state of each input
//! - [`EntitlementSource`] - trait implemented by the entitlement fetching layer
//! - [`AccessControlError`] and [`AccessDenied`] - error types
//!
//! ## Usage
//!
//! ```
//! # use access_control_sdk::{Actor, Role, parse_permission};
//! let actor = Actor::new(Role::Manager, Some(100));
//! assert!(!actor.is_super_admin);
//!
//! let perm = parse_permission("crm:read").unwrap();
//! assert_eq!(perm.to_string(), "crm.read");
//! ```
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

pub mod decision;
pub mod entitlement;
pub mod error;
pub mod models;
pub mod permission;
pub mod source;

pub use decision::{
    AccessDecision, ENTITLEMENTS_LOADING_REASON, ENTITLEMENTS_UNAVAILABLE_REASON, EnforcementLevel,
    MenuAccessResult, MenuResult, PERMISSIONS_LOADING_REASON, TRIAL_BADGE,
};
pub use entitlement::{EntitlementSnapshot, EntitlementStatus, ModuleEntitlement, ModuleStatus};
pub use error::{AccessControlError, AccessDenied};
pub use models::{Actor, Loadable, OrganizationId, Role};
pub use permission::{
    CanonicalPermission, WILDCARD_ACTION, parse_permission, permission_candidates,
};
pub use source::EntitlementSource;
