//! # Resource Trait
//!
//! The contract every managed entity implements to get the generic list,
//! create, edit, view and delete machinery for free.
//!
//! By defining one contract ([`Resource`]) that all entity types satisfy, the
//! client, resolver, and form controller are written *once* and instantiated
//! per entity. Associated types keep the instantiation type-safe: a billings
//! draft cannot be submitted to a restaurants endpoint, and a filter struct
//! can only name fields its own entity declares.

use crate::query::ResourceQuery;
use crate::schema::Schema;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::{Debug, Display};
use std::hash::Hash;

/// Contract for an entity managed through the generic resource pipeline.
pub trait Resource: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// The REST collection name, e.g. `"billings"`. Routes derive from it:
    /// `POST /billings`, `GET /billings/{id}`, and the list route the form
    /// controller navigates to.
    const ENDPOINT: &'static str;

    /// The field the linked-record resolver searches and labels by.
    const DISPLAY_FIELD: &'static str;

    /// The unique identifier, assigned server-side on create.
    type Id: Clone + Eq + Hash + Display + Debug + Serialize + DeserializeOwned + Send + Sync;

    /// An in-progress, possibly invalid record held in form state. Has no
    /// identifier; `Default` gives the empty draft for create forms.
    type Draft: Serialize + Debug + Default + Clone + Send + Sync;

    /// A partial-update payload; untouched fields are omitted from the body.
    type Patch: Serialize + Debug + Send + Sync + for<'a> From<&'a Self::Draft>;

    /// The typed filter struct for list queries.
    type Filter: ResourceQuery;

    fn id(&self) -> &Self::Id;

    /// Human-readable label for linked-option display.
    fn display_label(&self) -> String;

    /// The validation rules enforced before submission.
    fn schema() -> Schema;

    /// Builds a filter matching `text` against [`Self::DISPLAY_FIELD`].
    /// Empty text must yield the empty (match-all) filter.
    fn search_filter(text: &str) -> Self::Filter;

    /// Prefills an edit-form draft from a loaded record.
    fn to_draft(&self) -> Self::Draft;
}
