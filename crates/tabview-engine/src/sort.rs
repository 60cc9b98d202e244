//! Type-aware row ordering
//!
//! Rows compare on the configured sort column first, using the field kind to
//! pick numeric, timestamp, boolean or case-insensitive text ordering. Values
//! that are missing or cannot be read as the field kind sort after every
//! present value. Equal primary keys fall back to the row id, ascending, so
//! the order is total and page boundaries are reproducible.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tabview_core::{Entity, RowId, Value};

use crate::config::{FieldKind, FilterConfig};

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}

impl SortDirection {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Ascending => "asc",
            Self::Descending => "desc",
        }
    }

    pub fn toggle(&self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }

    /// Apply this direction to an ascending ordering
    pub fn apply(&self, ordering: Ordering) -> Ordering {
        match self {
            Self::Ascending => ordering,
            Self::Descending => ordering.reverse(),
        }
    }
}

/// A field value reduced to the representation its kind orders by
#[derive(Debug, Clone, PartialEq)]
pub enum SortKey {
    Missing,
    Number(f64),
    Time(DateTime<Utc>),
    Bool(bool),
    Text(String),
}

impl SortKey {
    pub fn from_value(kind: FieldKind, value: &Value) -> Self {
        let key = match kind {
            FieldKind::Number => value.as_f64().map(SortKey::Number),
            FieldKind::Date => value.as_timestamp().map(SortKey::Time),
            FieldKind::Bool => value.as_bool().map(SortKey::Bool),
            FieldKind::Text => value.search_text().map(|s| SortKey::Text(s.to_lowercase())),
        };
        key.unwrap_or(SortKey::Missing)
    }
}

/// Ascending comparison of two keys; missing keys sort last
pub fn compare_keys(a: &SortKey, b: &SortKey) -> Ordering {
    match (a, b) {
        (SortKey::Missing, SortKey::Missing) => Ordering::Equal,
        (SortKey::Missing, _) => Ordering::Greater,
        (_, SortKey::Missing) => Ordering::Less,
        (SortKey::Number(a), SortKey::Number(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
        (SortKey::Time(a), SortKey::Time(b)) => a.cmp(b),
        (SortKey::Bool(a), SortKey::Bool(b)) => a.cmp(b),
        (SortKey::Text(a), SortKey::Text(b)) => a.cmp(b),
        // A single field kind never mixes key variants
        _ => Ordering::Equal,
    }
}

/// Ascending comparison of two values of the given kind
pub fn compare_values(kind: FieldKind, a: &Value, b: &Value) -> Ordering {
    compare_keys(&SortKey::from_value(kind, a), &SortKey::from_value(kind, b))
}

/// Compare two entities on `sort_column` in `direction`, breaking ties by id.
///
/// An undeclared column imposes no primary order, leaving the id order.
pub fn compare<E: Entity>(
    a: &E,
    b: &E,
    sort_column: &str,
    direction: SortDirection,
    config: &FilterConfig<E>,
) -> Ordering {
    let primary = config
        .field_def(sort_column)
        .map(|field| compare_values(field.kind(), &field.value(a), &field.value(b)))
        .unwrap_or(Ordering::Equal);

    direction
        .apply(primary)
        .then_with(|| a.id().cmp(&b.id()))
}

/// Sort entity references in place.
///
/// Keys and ids are extracted once per row rather than once per comparison.
pub fn sort_entities<E: Entity>(
    rows: &mut Vec<&E>,
    sort_column: &str,
    direction: SortDirection,
    config: &FilterConfig<E>,
) {
    let field = config.field_def(sort_column);
    let mut keyed: Vec<(SortKey, RowId, &E)> = rows
        .drain(..)
        .map(|row| {
            let key = field
                .map(|f| SortKey::from_value(f.kind(), &f.value(row)))
                .unwrap_or(SortKey::Missing);
            (key, row.id(), row)
        })
        .collect();

    keyed.sort_by(|(key_a, id_a, _), (key_b, id_b, _)| {
        direction
            .apply(compare_keys(key_a, key_b))
            .then_with(|| id_a.cmp(id_b))
    });

    rows.extend(keyed.into_iter().map(|(_, _, row)| row));
}
