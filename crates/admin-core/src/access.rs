//! # Authorization Gate
//!
//! Capability checks for the (service, entity, operation) triple. The
//! [`AccessContext`] is an explicit value handed to the form controller at
//! construction time — there is no ambient global session lookup. A denied
//! check is a hard gate: the caller redirects to the landing route instead of
//! mounting interactive state.

use crate::error::ApiError;
use std::collections::HashSet;
use std::fmt::{self, Display};

/// The service scope an authorization grant applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessService {
    Project,
    Platform,
}

impl Display for AccessService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Project => write!(f, "project"),
            Self::Platform => write!(f, "platform"),
        }
    }
}

/// The operation kind being authorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessOperation {
    Create,
    Read,
    Update,
    Delete,
}

impl Display for AccessOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Read => write!(f, "read"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// An explicit set of capability grants.
///
/// Built once (e.g. from the auth provider's session) and passed by value into
/// every controller that needs gating.
#[derive(Debug, Clone, Default)]
pub struct AccessContext {
    grants: HashSet<(AccessService, String, AccessOperation)>,
}

impl AccessContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a grant for one operation on one entity.
    pub fn with_grant(
        mut self,
        service: AccessService,
        entity: &str,
        operation: AccessOperation,
    ) -> Self {
        self.grants.insert((service, entity.to_string(), operation));
        self
    }

    /// Adds grants for all four CRUD operations on one entity.
    pub fn with_full_access(self, service: AccessService, entity: &str) -> Self {
        [
            AccessOperation::Create,
            AccessOperation::Read,
            AccessOperation::Update,
            AccessOperation::Delete,
        ]
        .into_iter()
        .fold(self, |ctx, op| ctx.with_grant(service, entity, op))
    }

    pub fn allows(
        &self,
        service: AccessService,
        entity: &str,
        operation: AccessOperation,
    ) -> bool {
        self.grants
            .contains(&(service, entity.to_string(), operation))
    }

    /// The capability check: allow, or [`ApiError::Unauthorized`].
    pub fn check(
        &self,
        service: AccessService,
        entity: &str,
        operation: AccessOperation,
    ) -> Result<(), ApiError> {
        if self.allows(service, entity, operation) {
            Ok(())
        } else {
            Err(ApiError::Unauthorized {
                service,
                entity: entity.to_string(),
                operation,
            })
        }
    }
}
