//! The view composition pipeline
//!
//! Every recomposition runs, in this order:
//!
//! 1. filter the raw collection through the [`FilterPredicate`]
//! 2. sort the survivors on the state's sort column, ties by id
//! 3. recompute pagination from the filtered count, clamping the page
//! 4. slice the current page out of the sorted rows
//!
//! Exports stop after step 2 via [`filter_and_sort`], so they always see the
//! full filtered set rather than one page.

use tabview_core::{Entity, RowId};

use crate::config::FilterConfig;
use crate::filter::FilterState;
use crate::pagination::PaginationState;
use crate::predicate::FilterPredicate;
use crate::sort::sort_entities;

/// Why a view has (or lacks) rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewStatus {
    /// At least one row matches
    Populated,
    /// The collection itself is empty
    NoData,
    /// Rows exist but the current filters exclude all of them
    NoMatches,
}

impl ViewStatus {
    fn classify(raw_len: usize, filtered_len: usize) -> Self {
        if raw_len == 0 {
            Self::NoData
        } else if filtered_len == 0 {
            Self::NoMatches
        } else {
            Self::Populated
        }
    }

    /// Guidance shown in place of an empty table
    pub fn empty_message(&self) -> Option<&'static str> {
        match self {
            Self::Populated => None,
            Self::NoData => Some("No records yet. Create the first one to get started."),
            Self::NoMatches => Some("No records match the current filters. Clear filters to see all records."),
        }
    }
}

/// The rows currently visible plus their pagination metadata
#[derive(Debug, Clone)]
pub struct ComposedView<'a, E> {
    pub visible_rows: Vec<&'a E>,
    pub pagination: PaginationState,
    pub status: ViewStatus,
}

impl<E: Entity> ComposedView<'_, E> {
    pub fn visible_ids(&self) -> Vec<RowId> {
        self.visible_rows.iter().map(|row| row.id()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.visible_rows.is_empty()
    }
}

/// Steps 1-2 of the pipeline: every matching row, sorted, unpaginated
pub fn filter_and_sort<'a, E: Entity>(
    rows: &'a [E],
    state: &FilterState,
    config: &FilterConfig<E>,
) -> Vec<&'a E> {
    let predicate = FilterPredicate::new(state, config);
    let mut matched: Vec<&E> = rows.iter().filter(|row| predicate.matches(row)).collect();
    sort_entities(&mut matched, &state.sort_column, state.sort_direction, config);
    matched
}

/// Run the full pipeline against `pagination`
pub fn compose_view<'a, E: Entity>(
    rows: &'a [E],
    state: &FilterState,
    config: &FilterConfig<E>,
    pagination: PaginationState,
) -> ComposedView<'a, E> {
    let sorted = filter_and_sort(rows, state, config);
    let pagination = pagination.recompute(sorted.len());
    let range = pagination.page_range();
    let status = ViewStatus::classify(rows.len(), sorted.len());

    tracing::debug!(
        storage_key = %config.storage_key(),
        total = rows.len(),
        matched = sorted.len(),
        page = pagination.current_page,
        total_pages = pagination.total_pages(),
        "Composed table view"
    );

    let visible_rows = sorted[range].to_vec();
    ComposedView {
        visible_rows,
        pagination,
        status,
    }
}
