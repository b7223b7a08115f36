//! The billing entity: one order record, optionally linked to a restaurant.
//!
//! The restaurant link travels as a nullable `restaurant_id`; reads may embed
//! the full restaurant record under `restaurant` when the query asks for it.

use crate::model::{Restaurant, RestaurantId, RestaurantRef};
use admin_core::{Filter, FilterMatch, Resource, ResourceQuery, Schema};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Type-safe identifier for Billings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BillingId(pub String);

impl Display for BillingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for BillingId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Billing {
    pub id: BillingId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub order_summary: String,
    pub total_value: f64,
    #[serde(default)]
    pub table_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restaurant_id: Option<RestaurantId>,
    /// Embedded relation, present only when the query included it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restaurant: Option<Restaurant>,
}

/// Form state for a billing. The empty default backs create forms; edit forms
/// prefill it from the loaded record.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BillingDraft {
    pub order_summary: String,
    pub total_value: f64,
    pub table_number: String,
    /// Serializes as the bare id, `null` when unselected.
    pub restaurant_id: RestaurantRef,
}

/// Partial update. Omitted fields are untouched; `restaurant_id` carries an
/// explicit `null` to clear the link, so it is never skipped when set.
#[derive(Debug, Default, Serialize)]
pub struct BillingPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restaurant_id: Option<RestaurantRef>,
}

impl From<&BillingDraft> for BillingPatch {
    fn from(draft: &BillingDraft) -> Self {
        Self {
            order_summary: Some(draft.order_summary.clone()),
            total_value: Some(draft.total_value),
            table_number: Some(draft.table_number.clone()),
            restaurant_id: Some(draft.restaurant_id.clone()),
        }
    }
}

#[derive(Debug, Default)]
pub struct BillingFilter {
    pub id: Option<BillingId>,
    /// Substring match.
    pub order_summary: Option<String>,
    /// Substring match.
    pub table_number: Option<String>,
    pub restaurant_id: Option<RestaurantId>,
}

impl ResourceQuery for BillingFilter {
    fn filters(&self) -> Vec<Filter> {
        let mut filters = Vec::new();
        if let Some(id) = &self.id {
            filters.push(Filter {
                field: "id",
                matching: FilterMatch::Equals(id.0.clone()),
            });
        }
        if let Some(summary) = &self.order_summary {
            filters.push(Filter {
                field: "order_summary",
                matching: FilterMatch::Contains(summary.clone()),
            });
        }
        if let Some(table) = &self.table_number {
            filters.push(Filter {
                field: "table_number",
                matching: FilterMatch::Contains(table.clone()),
            });
        }
        if let Some(restaurant) = &self.restaurant_id {
            filters.push(Filter {
                field: "restaurant_id",
                matching: FilterMatch::Equals(restaurant.0.clone()),
            });
        }
        filters
    }
}

impl Resource for Billing {
    const ENDPOINT: &'static str = "billings";
    const DISPLAY_FIELD: &'static str = "order_summary";
    type Id = BillingId;
    type Draft = BillingDraft;
    type Patch = BillingPatch;
    type Filter = BillingFilter;

    fn id(&self) -> &BillingId {
        &self.id
    }

    fn display_label(&self) -> String {
        self.order_summary.clone()
    }

    fn schema() -> Schema {
        Schema::new("billings")
            .text("order_summary", true, Some(255))
            .number("total_value", true, Some(0.0), None)
            .text("table_number", false, Some(32))
    }

    fn search_filter(text: &str) -> BillingFilter {
        BillingFilter {
            order_summary: (!text.is_empty()).then(|| text.to_string()),
            ..BillingFilter::default()
        }
    }

    fn to_draft(&self) -> BillingDraft {
        BillingDraft {
            order_summary: self.order_summary.clone(),
            total_value: self.total_value,
            table_number: self.table_number.clone(),
            restaurant_id: RestaurantRef::from(self.restaurant_id.clone()),
        }
    }
}
