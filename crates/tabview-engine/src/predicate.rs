//! Row inclusion against a filter state
//!
//! The predicate is the conjunction of three clauses:
//!
//! - search: passes when the search text is empty, otherwise some search
//!   field must contain it (case-insensitive substring)
//! - categorical: every field with a non-empty selection must hold one of
//!   the selected values
//! - date range: when a bound is set, the date field must parse and fall
//!   inside `[date_from, date_to]`
//!
//! A missing value never matches a non-empty search, a categorical
//! selection or a date bound.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::config::{FieldDef, FilterConfig};
use crate::filter::FilterState;

/// A filter state resolved against its config, ready to test many rows
pub struct FilterPredicate<'a, E> {
    needle: Option<String>,
    search_fields: Vec<&'a FieldDef<E>>,
    categorical: Vec<(&'a FieldDef<E>, &'a BTreeSet<String>)>,
    date_field: Option<&'a FieldDef<E>>,
    date_from: Option<DateTime<Utc>>,
    date_to: Option<DateTime<Utc>>,
}

impl<'a, E> FilterPredicate<'a, E> {
    pub fn new(state: &'a FilterState, config: &'a FilterConfig<E>) -> Self {
        let needle = Some(state.search_text.to_lowercase()).filter(|s| !s.is_empty());

        let search_fields = config
            .search_fields()
            .iter()
            .filter_map(|name| config.field_def(name))
            .collect();

        let categorical = state
            .categorical
            .iter()
            .filter(|(_, values)| !values.is_empty())
            .filter(|(field, _)| config.is_categorical(field))
            .filter_map(|(field, values)| config.field_def(field).map(|def| (def, values)))
            .collect();

        let has_bound = state.date_from.is_some() || state.date_to.is_some();
        let date_field = config
            .date_field()
            .filter(|_| has_bound)
            .and_then(|name| config.field_def(name));

        Self {
            needle,
            search_fields,
            categorical,
            date_field,
            date_from: state.date_from,
            date_to: state.date_to,
        }
    }

    pub fn matches(&self, entity: &E) -> bool {
        self.matches_search(entity) && self.matches_categories(entity) && self.matches_dates(entity)
    }

    fn matches_search(&self, entity: &E) -> bool {
        let Some(needle) = &self.needle else {
            return true;
        };
        self.search_fields.iter().any(|field| {
            field
                .value(entity)
                .search_text()
                .map(|text| text.to_lowercase().contains(needle.as_str()))
                .unwrap_or(false)
        })
    }

    fn matches_categories(&self, entity: &E) -> bool {
        self.categorical.iter().all(|(field, selected)| {
            field
                .value(entity)
                .category_key()
                .map(|key| selected.contains(&key))
                .unwrap_or(false)
        })
    }

    fn matches_dates(&self, entity: &E) -> bool {
        let Some(field) = self.date_field else {
            return true;
        };
        let Some(timestamp) = field.value(entity).as_timestamp() else {
            return false;
        };
        self.date_from.is_none_or(|from| timestamp >= from)
            && self.date_to.is_none_or(|to| timestamp <= to)
    }
}

/// Decide whether `entity` is included by `state`
pub fn matches<E>(entity: &E, state: &FilterState, config: &FilterConfig<E>) -> bool {
    FilterPredicate::new(state, config).matches(entity)
}
