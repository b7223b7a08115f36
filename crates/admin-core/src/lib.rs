//! # Admin Core
//!
//! The generic resource-handling core of a generated administrative
//! interface: for every business entity it provides the same list, create,
//! edit, view and delete machinery, instantiated once per entity rather than
//! duplicated per page.
//!
//! ## Architecture Overview
//!
//! The crate separates concerns into three layers:
//!
//! 1. **Contract layer** ([`Resource`]) — an entity declares its endpoint,
//!    identifier, draft/patch/filter types, and validation schema once.
//! 2. **Pipeline layer** ([`ResourceClient`], [`LinkedRecordResolver`],
//!    [`FormController`]) — generic machinery written once against the
//!    contract: typed CRUD over the transport seam, debounced
//!    last-request-wins foreign-key search, and the authorization-gated
//!    submission state machine.
//! 3. **Boundary layer** ([`Transport`]) — the seam to the actual network
//!    stack. [`ApiServer`] is an in-memory, actor-style implementation used
//!    by demos and tests; [`mock::MockTransport`] scripts responses for unit
//!    tests.
//!
//! ## Type Safety
//!
//! Associated types on [`Resource`] make cross-entity mistakes
//! unrepresentable: a billings draft cannot be posted to another endpoint,
//! and a filter can only name fields its entity declares — unknown filter
//! fields are rejected at compile time, not at request time.
//!
//! ## Error Handling
//!
//! One taxonomy ([`ApiError`]) flows through every layer. The client and
//! query layers never translate or swallow errors; the form controller alone
//! decides presentation (inline field errors, redirect, or banner).

pub mod access;
pub mod client;
pub mod error;
pub mod form;
pub mod mock;
pub mod query;
pub mod resolver;
pub mod resource;
pub mod schema;
pub mod server;
pub mod tracing;
pub mod transport;

// Re-export core types for convenience
pub use access::{AccessContext, AccessOperation, AccessService};
pub use client::ResourceClient;
pub use error::{ApiError, FieldErrors};
pub use form::{FormController, FormMode, FormState, Navigation};
pub use query::{Filter, FilterMatch, Page, Query, ResourceQuery, SortDirection};
pub use resolver::{LinkedField, LinkedOption, LinkedRecordResolver};
pub use resource::Resource;
pub use schema::{FieldKind, FieldSpec, Schema};
pub use server::{ApiServer, ChannelTransport, CountRelation, EndpointSpec, IncludeRelation};
pub use transport::{ApiRequest, Method, Transport};
