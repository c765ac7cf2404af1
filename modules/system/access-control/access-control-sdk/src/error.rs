//! Error types for the access-control module.
//!
//! Denials are not errors: evaluators always answer with a decision value.
//! These types cover the fallible edges around the core (fetching entitlements,
//! loading configuration) and the opt-in [`AccessDenied`] conversion for callers
//! that want to use `?`.

use thiserror::Error;

use crate::decision::EnforcementLevel;
use crate::models::OrganizationId;

/// Errors raised outside the pure decision path.
#[derive(Debug, Error)]
pub enum AccessControlError {
    /// The entitlement snapshot could not be fetched for an organization.
    #[error("Entitlements unavailable for organization {organization_id}: {message}")]
    EntitlementsUnavailable {
        /// Organization whose snapshot was requested
        organization_id: OrganizationId,
        /// Error message
        message: String,
        /// Source error from the fetching layer
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration failed to load or validate.
    #[error("Invalid access-control configuration: {reason}")]
    InvalidConfig {
        /// Reason for invalidity
        reason: String,
    },

    /// Internal error
    #[error("Internal error: {message}")]
    Internal {
        /// Error message
        message: String,
        /// Source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl AccessControlError {
    /// Create an entitlements-unavailable error with a message only.
    #[must_use]
    pub fn entitlements_unavailable(
        organization_id: OrganizationId,
        message: impl Into<String>,
    ) -> Self {
        Self::EntitlementsUnavailable {
            organization_id,
            message: message.into(),
            source: None,
        }
    }

    /// Create an entitlements-unavailable error with a source error.
    #[must_use]
    pub fn entitlements_unavailable_with_source(
        organization_id: OrganizationId,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::EntitlementsUnavailable {
            organization_id,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Create an internal error with a message only.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }
}

/// A non-allowed [`AccessDecision`](crate::AccessDecision) converted into an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessDenied {
    /// Inputs are still loading; the outcome is not known yet.
    #[error("access check pending: {reason}")]
    Pending {
        /// Loading message
        reason: String,
    },

    /// A layer denied the request.
    #[error("access denied at {level} layer: {reason}")]
    Denied {
        /// First failing layer
        level: EnforcementLevel,
        /// Human-readable explanation
        reason: String,
    },
}

impl AccessDenied {
    /// Layer that produced the denial, `None` while pending.
    #[must_use]
    pub fn level(&self) -> Option<EnforcementLevel> {
        match self {
            Self::Pending { .. } => None,
            Self::Denied { level, .. } => Some(*level),
        }
    }
}
