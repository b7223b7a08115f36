//! # Error Taxonomy
//!
//! This module defines the common error types used throughout the admin toolkit.
//! By centralizing error definitions, we ensure consistent error handling across
//! clients, resolvers, and form controllers.
//!
//! The taxonomy mirrors how each error is presented:
//! - [`ApiError::Validation`] is field-scoped and shown inline; it never reaches
//!   the network.
//! - [`ApiError::Unauthorized`] blocks the action entirely and redirects.
//! - [`ApiError::NotFound`] and [`ApiError::Network`] surface as banners;
//!   network failures are recoverable by resubmission.

use crate::access::{AccessOperation, AccessService};
use std::collections::BTreeMap;
use thiserror::Error;

/// Field-keyed validation messages, ordered by field name for stable display.
pub type FieldErrors = BTreeMap<String, String>;

/// Errors that can occur while driving a resource through the API.
///
/// The client and query layers never swallow or translate these; the form
/// controller alone decides how each variant is presented.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ApiError {
    /// One or more draft fields failed schema validation.
    #[error("validation failed on {} field(s)", .0.len())]
    Validation(FieldErrors),

    /// The access context denies this operation on this entity.
    #[error("{operation} on {entity} denied for service {service}")]
    Unauthorized {
        service: AccessService,
        entity: String,
        operation: AccessOperation,
    },

    /// The entity (or a related entity) does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// An opaque transport-level failure.
    #[error("network error: {0}")]
    Network(String),
}

impl ApiError {
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    /// Whether the user can recover by editing and resubmitting the form.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::Network(_))
    }
}
