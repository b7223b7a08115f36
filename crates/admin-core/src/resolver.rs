//! # Linked-Record Resolver
//!
//! Search-as-you-type resolution of foreign-key references into selectable
//! (identifier, label) pairs, backed by the related entity's list endpoint.
//!
//! Every call is keyed by a monotonically increasing sequence number. A call
//! superseded during the debounce window never issues its request; a response
//! that arrives for a superseded call resolves to `Ok(None)` and must not be
//! applied. Last request wins regardless of arrival order — no explicit
//! network cancellation is needed.

use crate::client::ResourceClient;
use crate::error::ApiError;
use crate::query::{Query, SortDirection};
use crate::resource::Resource;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

/// How many matches a search returns at most.
pub const SEARCH_LIMIT: u64 = 10;

/// Delay before a keystroke's query is issued.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(30);

/// A selectable foreign entity: identifier plus display label.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkedOption<Id> {
    pub id: Id,
    pub label: String,
}

/// The owning draft field for a foreign-key reference.
///
/// Selecting an option sets the identifier; clearing nulls it out so a stale
/// id can never linger. Serializes transparently as the inner option, letting
/// a patch carry an explicit `null` to clear the reference server-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkedField<Id> {
    value: Option<Id>,
}

// Written out so the empty field needs no `Id: Default`.
impl<Id> Default for LinkedField<Id> {
    fn default() -> Self {
        Self { value: None }
    }
}

impl<Id> LinkedField<Id> {
    pub fn selected(&self) -> Option<&Id> {
        self.value.as_ref()
    }

    pub fn select(&mut self, option: LinkedOption<Id>) {
        self.value = Some(option.id);
    }

    pub fn clear(&mut self) {
        self.value = None;
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_none()
    }
}

impl<Id> From<Option<Id>> for LinkedField<Id> {
    fn from(value: Option<Id>) -> Self {
        Self { value }
    }
}

/// Debounced, supersedable search against one related entity.
#[derive(Clone)]
pub struct LinkedRecordResolver<T: Resource> {
    client: ResourceClient<T>,
    latest: Arc<AtomicU64>,
    debounce: Duration,
    limit: u64,
}

impl<T: Resource> LinkedRecordResolver<T> {
    pub fn new(client: ResourceClient<T>) -> Self {
        Self {
            client,
            latest: Arc::new(AtomicU64::new(0)),
            debounce: SEARCH_DEBOUNCE,
            limit: SEARCH_LIMIT,
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    /// Resolves `text` to the top matches on the related entity's display
    /// field, sorted by that field ascending.
    ///
    /// Empty text returns the unfiltered top-N list (a deliberate policy:
    /// opening the select before typing shows something to pick).
    ///
    /// `Ok(None)` means the call was superseded by a newer one and its result
    /// must be discarded — stale errors are discarded the same way.
    pub async fn search(&self, text: &str) -> Result<Option<Vec<LinkedOption<T::Id>>>, ApiError> {
        let ticket = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        sleep(self.debounce).await;
        if self.latest.load(Ordering::SeqCst) != ticket {
            debug!(entity = T::ENDPOINT, ticket, "Search superseded before request");
            return Ok(None);
        }

        let query = Query::filtered(T::search_filter(text))
            .sort(T::DISPLAY_FIELD, SortDirection::Asc)
            .page(0, self.limit);
        let result = self.client.list(&query).await;

        if self.latest.load(Ordering::SeqCst) != ticket {
            debug!(entity = T::ENDPOINT, ticket, "Search superseded; result discarded");
            return Ok(None);
        }
        let page = result?;
        Ok(Some(
            page.items
                .iter()
                .map(|record| LinkedOption {
                    id: record.id().clone(),
                    label: record.display_label(),
                })
                .collect(),
        ))
    }
}
