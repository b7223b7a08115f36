//! Entity definitions for the billings admin.
//!
//! Pure data: each entity declares its wire shape, draft, patch, filter, and
//! validation schema. All behavior lives in the generic pipeline.

pub mod billing;
pub mod restaurant;

pub use billing::{Billing, BillingDraft, BillingFilter, BillingId, BillingPatch};
pub use restaurant::{
    Restaurant, RestaurantCounts, RestaurantDraft, RestaurantFilter, RestaurantId,
    RestaurantPatch, RestaurantRef,
};
