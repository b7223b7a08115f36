//! The restaurant entity: the parent side of the billing relationship.
//!
//! Restaurants are primarily consumed as linked options (searched by name
//! through the resolver), but they get the full resource pipeline like any
//! other entity, including the read-only `_count.billings` aggregate on reads.

use admin_core::{Filter, FilterMatch, LinkedField, Resource, ResourceQuery, Schema};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Type-safe identifier for Restaurants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RestaurantId(pub String);

impl Display for RestaurantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RestaurantId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Child-collection counts attached server-side on reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestaurantCounts {
    pub billings: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: RestaurantId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub name: String,
    /// Read-only aggregate; never part of a draft or patch.
    #[serde(rename = "_count", default, skip_serializing_if = "Option::is_none")]
    pub counts: Option<RestaurantCounts>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RestaurantDraft {
    pub name: String,
}

#[derive(Debug, Default, Serialize)]
pub struct RestaurantPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl From<&RestaurantDraft> for RestaurantPatch {
    fn from(draft: &RestaurantDraft) -> Self {
        Self {
            name: Some(draft.name.clone()),
        }
    }
}

#[derive(Debug, Default)]
pub struct RestaurantFilter {
    pub id: Option<RestaurantId>,
    /// Substring match on the name.
    pub name: Option<String>,
}

impl ResourceQuery for RestaurantFilter {
    fn filters(&self) -> Vec<Filter> {
        let mut filters = Vec::new();
        if let Some(id) = &self.id {
            filters.push(Filter {
                field: "id",
                matching: FilterMatch::Equals(id.0.clone()),
            });
        }
        if let Some(name) = &self.name {
            filters.push(Filter {
                field: "name",
                matching: FilterMatch::Contains(name.clone()),
            });
        }
        filters
    }
}

impl Resource for Restaurant {
    const ENDPOINT: &'static str = "restaurants";
    const DISPLAY_FIELD: &'static str = "name";
    type Id = RestaurantId;
    type Draft = RestaurantDraft;
    type Patch = RestaurantPatch;
    type Filter = RestaurantFilter;

    fn id(&self) -> &RestaurantId {
        &self.id
    }

    fn display_label(&self) -> String {
        self.name.clone()
    }

    fn schema() -> Schema {
        Schema::new("restaurants").text("name", true, Some(255))
    }

    fn search_filter(text: &str) -> RestaurantFilter {
        RestaurantFilter {
            id: None,
            name: (!text.is_empty()).then(|| text.to_string()),
        }
    }

    fn to_draft(&self) -> RestaurantDraft {
        RestaurantDraft {
            name: self.name.clone(),
        }
    }
}

/// A `LinkedField` pointing at a restaurant, as held by billing drafts.
pub type RestaurantRef = LinkedField<RestaurantId>;
