//! # Query Descriptor
//!
//! The typed filter/pagination contract consumed by list endpoints.
//!
//! Each resource declares its own filter struct implementing [`ResourceQuery`]
//! whose fields are a subset of the entity's fields, so an unknown filter
//! field is unrepresentable — rejected at the type level rather than at
//! request time. The backend still validates the lowered wire filters and
//! rejects a malformed one as a request failure; nothing is silently dropped.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Server-side cap on page size; larger requested limits are clamped.
pub const MAX_PAGE_SIZE: u64 = 50;

/// Page size used when the caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: u64 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// How one filter value matches a field.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterMatch {
    /// Exact equality, used for identifier fields.
    Equals(String),
    /// Case-insensitive substring match on a designated text field.
    Contains(String),
}

/// One lowered wire filter.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: &'static str,
    pub matching: FilterMatch,
}

/// The contract for an entity's typed filter struct.
pub trait ResourceQuery: Default + Debug + Send + Sync {
    /// Lowers the set fields to wire filters.
    fn filters(&self) -> Vec<Filter>;
}

/// The full list request: typed filter plus the standard list controls.
#[derive(Debug, Clone)]
pub struct Query<F: ResourceQuery> {
    pub filter: F,
    pub offset: u64,
    pub limit: u64,
    pub sort_by: Option<&'static str>,
    pub direction: SortDirection,
    pub include: Vec<&'static str>,
}

impl<F: ResourceQuery> Default for Query<F> {
    fn default() -> Self {
        Self {
            filter: F::default(),
            offset: 0,
            limit: DEFAULT_PAGE_SIZE,
            sort_by: None,
            direction: SortDirection::Asc,
            include: Vec::new(),
        }
    }
}

impl<F: ResourceQuery> Query<F> {
    pub fn filtered(filter: F) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    pub fn sort(mut self, field: &'static str, direction: SortDirection) -> Self {
        self.sort_by = Some(field);
        self.direction = direction;
        self
    }

    pub fn page(mut self, offset: u64, limit: u64) -> Self {
        self.offset = offset;
        self.limit = limit;
        self
    }

    /// Requests a related-entity embed by relation name.
    pub fn include(mut self, relation: &'static str) -> Self {
        self.include.push(relation);
        self
    }

    /// Lowers the descriptor to wire query parameters.
    ///
    /// Equality filters travel as `field=value`; substring filters use the
    /// bracket qualifier `field[contains]=value`.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        for filter in self.filter.filters() {
            match &filter.matching {
                FilterMatch::Equals(value) => {
                    params.push((filter.field.to_string(), value.clone()));
                }
                FilterMatch::Contains(value) => {
                    params.push((format!("{}[contains]", filter.field), value.clone()));
                }
            }
        }
        params.push(("offset".to_string(), self.offset.to_string()));
        params.push(("limit".to_string(), self.limit.to_string()));
        if let Some(sort_by) = self.sort_by {
            params.push(("sort_by".to_string(), sort_by.to_string()));
            let direction = match self.direction {
                SortDirection::Asc => "asc",
                SortDirection::Desc => "desc",
            };
            params.push(("direction".to_string(), direction.to_string()));
        }
        for relation in &self.include {
            params.push(("include".to_string(), relation.to_string()));
        }
        params
    }
}

/// One page of a list response: the ordered window plus the total match count
/// before pagination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct NoteFilter {
        title: Option<String>,
    }

    impl ResourceQuery for NoteFilter {
        fn filters(&self) -> Vec<Filter> {
            self.title
                .iter()
                .map(|title| Filter {
                    field: "title",
                    matching: FilterMatch::Contains(title.clone()),
                })
                .collect()
        }
    }

    #[test]
    fn contains_filters_use_the_bracket_qualifier() {
        let query = Query::filtered(NoteFilter {
            title: Some("din".to_string()),
        });
        let params = query.to_params();
        assert!(params.contains(&("title[contains]".to_string(), "din".to_string())));
    }

    #[test]
    fn sort_and_include_are_lowered() {
        let query = Query::<NoteFilter>::default()
            .sort("title", SortDirection::Desc)
            .page(10, 5)
            .include("author");
        let params = query.to_params();
        assert!(params.contains(&("sort_by".to_string(), "title".to_string())));
        assert!(params.contains(&("direction".to_string(), "desc".to_string())));
        assert!(params.contains(&("offset".to_string(), "10".to_string())));
        assert!(params.contains(&("limit".to_string(), "5".to_string())));
        assert!(params.contains(&("include".to_string(), "author".to_string())));
    }

    #[test]
    fn default_query_has_no_filters_and_default_page() {
        let query = Query::<NoteFilter>::default();
        let params = query.to_params();
        assert_eq!(
            params,
            vec![
                ("offset".to_string(), "0".to_string()),
                ("limit".to_string(), DEFAULT_PAGE_SIZE.to_string()),
            ]
        );
    }
}
