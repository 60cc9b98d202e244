//! Filter and sort state for one table
//!
//! `FilterState` is always fully defined: a freshly mounted table starts from
//! [`FilterState::defaults`], never from an absent state. Changes are applied
//! with [`FilterState::apply`], which returns a new value and leaves the old
//! one untouched.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tabview_core::{Result, TabviewError};

use crate::config::FilterConfig;
use crate::sort::SortDirection;

/// The current search/categorical/date/sort configuration of a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    /// Free-text search; empty means no search constraint
    pub search_text: String,
    /// Selected values per categorical field; an empty or absent set means
    /// the field is not filtered
    #[serde(default)]
    pub categorical: BTreeMap<String, BTreeSet<String>>,
    /// Inclusive lower bound of the date range
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound of the date range
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_to: Option<DateTime<Utc>>,
    pub sort_column: String,
    pub sort_direction: SortDirection,
}

/// A partial change to a [`FilterState`]
#[derive(Debug, Clone, PartialEq)]
pub enum FilterChange {
    /// Replace the search text
    SetSearch(String),
    /// Add or remove one value from a categorical selection
    ToggleCategory { field: String, value: String },
    /// Replace a categorical selection
    SetCategory {
        field: String,
        values: BTreeSet<String>,
    },
    /// Remove every selected value of a categorical field
    ClearCategory(String),
    /// Replace both date bounds
    SetDateRange {
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    },
    /// Sort by `column` in `direction`
    SetSort {
        column: String,
        direction: SortDirection,
    },
    /// Column header click: flips the direction of the current sort column,
    /// or starts a new column ascending
    ToggleSort(String),
    /// Back to the configured defaults
    Reset,
}

impl FilterState {
    /// The state a table starts with when nothing is persisted
    pub fn defaults<E>(config: &FilterConfig<E>) -> Self {
        Self {
            search_text: String::new(),
            categorical: BTreeMap::new(),
            date_from: None,
            date_to: None,
            sort_column: config.default_sort_column().to_string(),
            sort_direction: config.default_sort_direction(),
        }
    }

    /// Whether no row can be excluded by this state (sorting aside)
    pub fn is_identity(&self) -> bool {
        self.search_text.is_empty()
            && self.categorical.values().all(BTreeSet::is_empty)
            && self.date_from.is_none()
            && self.date_to.is_none()
    }

    pub fn has_active_filters(&self) -> bool {
        !self.is_identity()
    }

    /// Selected values of a categorical field
    pub fn selected(&self, field: &str) -> Option<&BTreeSet<String>> {
        self.categorical.get(field).filter(|values| !values.is_empty())
    }

    /// Whether every field this state references is declared by `config`
    /// in the right role
    pub fn fits<E>(&self, config: &FilterConfig<E>) -> bool {
        let sort_ok = self.sort_column.is_empty() || config.has_field(&self.sort_column);
        let categories_ok = self
            .categorical
            .keys()
            .all(|field| config.is_categorical(field));
        sort_ok && categories_ok
    }

    /// Apply `change`, returning the new state.
    ///
    /// Categorical changes must name a categorical field and sort changes a
    /// declared field; anything else is rejected with `UnknownField`.
    pub fn apply<E>(&self, change: FilterChange, config: &FilterConfig<E>) -> Result<FilterState> {
        let mut next = self.clone();
        match change {
            FilterChange::SetSearch(text) => {
                next.search_text = text;
            }
            FilterChange::ToggleCategory { field, value } => {
                ensure_categorical(config, &field)?;
                let values = next.categorical.entry(field.clone()).or_default();
                if !values.remove(&value) {
                    values.insert(value);
                }
                if values.is_empty() {
                    next.categorical.remove(&field);
                }
            }
            FilterChange::SetCategory { field, values } => {
                ensure_categorical(config, &field)?;
                if values.is_empty() {
                    next.categorical.remove(&field);
                } else {
                    next.categorical.insert(field, values);
                }
            }
            FilterChange::ClearCategory(field) => {
                ensure_categorical(config, &field)?;
                next.categorical.remove(&field);
            }
            FilterChange::SetDateRange { from, to } => {
                next.date_from = from;
                next.date_to = to;
            }
            FilterChange::SetSort { column, direction } => {
                ensure_declared(config, &column)?;
                next.sort_column = column;
                next.sort_direction = direction;
            }
            FilterChange::ToggleSort(column) => {
                ensure_declared(config, &column)?;
                if next.sort_column == column {
                    next.sort_direction = next.sort_direction.toggle();
                } else {
                    next.sort_column = column;
                    next.sort_direction = SortDirection::Ascending;
                }
            }
            FilterChange::Reset => {
                next = FilterState::defaults(config);
            }
        }
        Ok(next)
    }
}

fn ensure_categorical<E>(config: &FilterConfig<E>, field: &str) -> Result<()> {
    if config.is_categorical(field) {
        Ok(())
    } else {
        Err(TabviewError::UnknownField(field.to_string()))
    }
}

fn ensure_declared<E>(config: &FilterConfig<E>, field: &str) -> Result<()> {
    if config.has_field(field) {
        Ok(())
    } else {
        Err(TabviewError::UnknownField(field.to_string()))
    }
}
