//! Pagination state and its persisted page size preference
//!
//! `current_page` is 1-indexed and always satisfies
//! `1 <= current_page <= total_pages()` once [`PaginationState::recompute`]
//! has seen the latest item count. Only the page size is a preference; the
//! page index and total are recomputed from data.

use std::ops::Range;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tabview_core::{Result, TabviewError};
use tabview_storage::{load_json, pagination_key, save_json, PreferenceStore};

use crate::config::FilterConfig;

/// Pagination state for one table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationState {
    /// Current page number (1-indexed)
    pub current_page: usize,
    /// Rows per page
    pub page_size: usize,
    /// Rows in the filtered result set
    pub total_items: usize,
}

impl PaginationState {
    pub fn new(page_size: usize) -> Self {
        Self {
            current_page: 1,
            page_size: page_size.max(1),
            total_items: 0,
        }
    }

    /// Number of pages; an empty result still has one (empty) page
    pub fn total_pages(&self) -> usize {
        let page_size = self.page_size.max(1);
        self.total_items.div_ceil(page_size).max(1)
    }

    /// Index of the first row on the current page
    pub fn offset(&self) -> usize {
        (self.current_page.max(1) - 1).saturating_mul(self.page_size)
    }

    /// Row index range of the current page, clipped to the total
    pub fn page_range(&self) -> Range<usize> {
        let start = self.offset().min(self.total_items);
        let end = start.saturating_add(self.page_size).min(self.total_items);
        start..end
    }

    /// Adopt a new item count, clamping the current page into range
    pub fn recompute(&self, total_items: usize) -> Self {
        let mut next = Self {
            total_items,
            ..*self
        };
        next.current_page = self.current_page.clamp(1, next.total_pages());
        next
    }

    /// Navigate to `page`, clamped to `[1, total_pages]`
    pub fn set_page(&self, page: usize) -> Self {
        Self {
            current_page: page.clamp(1, self.total_pages()),
            ..*self
        }
    }

    /// Change the page size and clamp the current page against the new
    /// page count. The same rows are not kept in view.
    pub fn set_page_size(&self, page_size: usize) -> Self {
        let resized = Self {
            page_size: page_size.max(1),
            ..*self
        };
        resized.set_page(self.current_page)
    }

    pub fn first_page(&self) -> Self {
        self.set_page(1)
    }

    pub fn last_page(&self) -> Self {
        self.set_page(self.total_pages())
    }

    pub fn can_go_next(&self) -> bool {
        self.current_page < self.total_pages()
    }

    pub fn can_go_prev(&self) -> bool {
        self.current_page > 1
    }

    pub fn next_page(&self) -> Self {
        self.set_page(self.current_page.saturating_add(1))
    }

    pub fn prev_page(&self) -> Self {
        self.set_page(self.current_page.saturating_sub(1))
    }

    /// Human-readable row range, e.g. "26–50 of 57"
    pub fn range_label(&self) -> String {
        let range = self.page_range();
        if range.is_empty() {
            format!("0 of {}", self.total_items)
        } else {
            format!("{}–{} of {}", range.start + 1, range.end, self.total_items)
        }
    }
}

/// Persisted page size preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageSizePreference {
    page_size: usize,
}

/// Pagination state of one table plus persistence of its page size
pub struct PaginationStore {
    storage_key: String,
    page_size_options: Vec<usize>,
    state: PaginationState,
    store: Arc<dyn PreferenceStore>,
}

impl PaginationStore {
    /// Seed from the persisted page size, or the configured default
    pub fn load<E>(store: Arc<dyn PreferenceStore>, config: &FilterConfig<E>) -> Self {
        let page_size = Self::load_page_size(store.as_ref(), config);
        Self {
            storage_key: config.storage_key().to_string(),
            page_size_options: config.page_size_options().to_vec(),
            state: PaginationState::new(page_size),
            store,
        }
    }

    /// Read the persisted page size. A missing, corrupt or no longer
    /// offered size yields the configured default.
    pub fn load_page_size<E>(store: &dyn PreferenceStore, config: &FilterConfig<E>) -> usize {
        load_json::<PageSizePreference>(store, &pagination_key(config.storage_key()))
            .map(|pref| pref.page_size)
            .filter(|size| config.is_page_size_allowed(*size))
            .unwrap_or_else(|| config.default_page_size())
    }

    pub fn state(&self) -> PaginationState {
        self.state
    }

    pub fn page_size_options(&self) -> &[usize] {
        &self.page_size_options
    }

    /// Adopt a new filtered item count
    pub fn recompute(&mut self, total_items: usize) -> PaginationState {
        self.state = self.state.recompute(total_items);
        self.state
    }

    /// Store a state already recomputed by the view composer
    pub fn commit(&mut self, state: PaginationState) {
        self.state = state;
    }

    pub fn set_page(&mut self, page: usize) -> PaginationState {
        self.state = self.state.set_page(page);
        self.state
    }

    /// Back to page 1, e.g. after the filtered set changed
    pub fn reset_page(&mut self) -> PaginationState {
        self.state = self.state.first_page();
        self.state
    }

    /// Change the page size and persist it. Only configured options are
    /// accepted.
    pub fn set_page_size(&mut self, page_size: usize) -> Result<PaginationState> {
        if !self.page_size_options.contains(&page_size) {
            return Err(TabviewError::InvalidPageSize(page_size));
        }
        self.state = self.state.set_page_size(page_size);
        self.save();
        Ok(self.state)
    }

    /// Persist the page size. Failures are logged, never surfaced.
    pub fn save(&self) {
        let pref = PageSizePreference {
            page_size: self.state.page_size,
        };
        if let Err(e) = save_json(self.store.as_ref(), &pagination_key(&self.storage_key), &pref)
        {
            tracing::warn!(
                storage_key = %self.storage_key,
                error = %e,
                "Failed to persist page size"
            );
        }
    }
}
