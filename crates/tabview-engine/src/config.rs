//! Per-table field configuration
//!
//! A table declares the fields the engine may read as typed descriptors: a
//! name, a kind that drives comparison, and an accessor closure. Generic
//! code never indexes into entities by string; it only calls accessors.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tabview_core::{Result, TabviewError, Value};

use crate::settings::TableDefaults;
use crate::sort::SortDirection;

/// How a field's values are ordered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Case-insensitive string ordering
    #[default]
    Text,
    /// Numeric ordering
    Number,
    /// Ordering by parsed timestamp
    Date,
    /// `false` before `true`
    Bool,
}

/// Reads one field out of an entity
pub type FieldAccessor<E> = Arc<dyn Fn(&E) -> Value + Send + Sync>;

/// Typed descriptor for one entity field
pub struct FieldDef<E> {
    name: String,
    kind: FieldKind,
    accessor: FieldAccessor<E>,
}

impl<E> FieldDef<E> {
    pub fn new(
        name: impl Into<String>,
        kind: FieldKind,
        accessor: impl Fn(&E) -> Value + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            accessor: Arc::new(accessor),
        }
    }

    pub fn text(
        name: impl Into<String>,
        accessor: impl Fn(&E) -> Value + Send + Sync + 'static,
    ) -> Self {
        Self::new(name, FieldKind::Text, accessor)
    }

    pub fn number(
        name: impl Into<String>,
        accessor: impl Fn(&E) -> Value + Send + Sync + 'static,
    ) -> Self {
        Self::new(name, FieldKind::Number, accessor)
    }

    pub fn date(
        name: impl Into<String>,
        accessor: impl Fn(&E) -> Value + Send + Sync + 'static,
    ) -> Self {
        Self::new(name, FieldKind::Date, accessor)
    }

    pub fn boolean(
        name: impl Into<String>,
        accessor: impl Fn(&E) -> Value + Send + Sync + 'static,
    ) -> Self {
        Self::new(name, FieldKind::Bool, accessor)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Read this field from `entity`
    pub fn value(&self, entity: &E) -> Value {
        (self.accessor)(entity)
    }
}

impl<E> Clone for FieldDef<E> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            kind: self.kind,
            accessor: Arc::clone(&self.accessor),
        }
    }
}

impl<E> std::fmt::Debug for FieldDef<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldDef")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Whether a filter change also clears the bulk selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Clear the selection whenever the filter/sort state changes
    #[default]
    ClearOnFilterChange,
    /// Keep the selection until the collection is reloaded
    KeepOnFilterChange,
}

/// Filter, sort and pagination configuration for one table
pub struct FilterConfig<E> {
    storage_key: String,
    fields: Vec<FieldDef<E>>,
    search_fields: Vec<String>,
    categorical_fields: Vec<String>,
    date_field: Option<String>,
    default_sort: Option<(String, SortDirection)>,
    page_size_options: Vec<usize>,
    default_page_size: usize,
    selection_policy: SelectionPolicy,
}

impl<E> Clone for FilterConfig<E> {
    fn clone(&self) -> Self {
        Self {
            storage_key: self.storage_key.clone(),
            fields: self.fields.clone(),
            search_fields: self.search_fields.clone(),
            categorical_fields: self.categorical_fields.clone(),
            date_field: self.date_field.clone(),
            default_sort: self.default_sort.clone(),
            page_size_options: self.page_size_options.clone(),
            default_page_size: self.default_page_size,
            selection_policy: self.selection_policy,
        }
    }
}

impl<E> std::fmt::Debug for FilterConfig<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterConfig")
            .field("storage_key", &self.storage_key)
            .field("fields", &self.fields)
            .field("search_fields", &self.search_fields)
            .field("categorical_fields", &self.categorical_fields)
            .field("date_field", &self.date_field)
            .field("default_sort", &self.default_sort)
            .field("page_size_options", &self.page_size_options)
            .field("default_page_size", &self.default_page_size)
            .field("selection_policy", &self.selection_policy)
            .finish()
    }
}

impl<E> FilterConfig<E> {
    /// Start a configuration persisted under `storage_key`
    pub fn new(storage_key: impl Into<String>) -> Self {
        let defaults = TableDefaults::default();
        Self {
            storage_key: storage_key.into(),
            fields: Vec::new(),
            search_fields: Vec::new(),
            categorical_fields: Vec::new(),
            date_field: None,
            default_sort: None,
            page_size_options: defaults.page_size_options,
            default_page_size: defaults.default_page_size,
            selection_policy: defaults.selection_policy,
        }
    }

    /// Declare a field
    pub fn field(mut self, field: FieldDef<E>) -> Self {
        self.fields.push(field);
        self
    }

    /// Fields searched by free text, in order
    pub fn search<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.search_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Add a categorical filter field
    pub fn categorical(mut self, field: impl Into<String>) -> Self {
        self.categorical_fields.push(field.into());
        self
    }

    /// Use `field` for the date range filter
    pub fn date_range(mut self, field: impl Into<String>) -> Self {
        self.date_field = Some(field.into());
        self
    }

    pub fn default_sort(mut self, column: impl Into<String>, direction: SortDirection) -> Self {
        self.default_sort = Some((column.into(), direction));
        self
    }

    pub fn page_sizes(mut self, options: impl Into<Vec<usize>>, default_page_size: usize) -> Self {
        self.page_size_options = options.into();
        self.default_page_size = default_page_size;
        self
    }

    pub fn with_selection_policy(mut self, policy: SelectionPolicy) -> Self {
        self.selection_policy = policy;
        self
    }

    /// Seed page sizes and selection policy from engine settings
    pub fn with_defaults(self, defaults: &TableDefaults) -> Self {
        self.page_sizes(
            defaults.page_size_options.clone(),
            defaults.default_page_size,
        )
        .with_selection_policy(defaults.selection_policy)
    }

    /// Check that every referenced field is declared and the page size
    /// options are usable
    pub fn validate(&self) -> Result<()> {
        if self.storage_key.trim().is_empty() {
            return Err(TabviewError::InvalidConfig(
                "storage key must not be empty".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.name()) {
                return Err(TabviewError::InvalidConfig(format!(
                    "field '{}' is declared twice",
                    field.name()
                )));
            }
        }

        let referenced = self
            .search_fields
            .iter()
            .chain(self.categorical_fields.iter())
            .chain(self.date_field.iter())
            .chain(self.default_sort.iter().map(|(column, _)| column));
        for name in referenced {
            if !seen.contains(name.as_str()) {
                return Err(TabviewError::UnknownField(name.clone()));
            }
        }

        if self.page_size_options.is_empty() {
            return Err(TabviewError::InvalidConfig(
                "at least one page size option is required".to_string(),
            ));
        }
        if self.page_size_options.contains(&0) {
            return Err(TabviewError::InvalidConfig(
                "page sizes must be at least 1".to_string(),
            ));
        }
        if !self.page_size_options.contains(&self.default_page_size) {
            return Err(TabviewError::InvalidPageSize(self.default_page_size));
        }
        Ok(())
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    pub fn fields(&self) -> &[FieldDef<E>] {
        &self.fields
    }

    /// Look up a declared field by name
    pub fn field_def(&self, name: &str) -> Option<&FieldDef<E>> {
        self.fields.iter().find(|f| f.name() == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field_def(name).is_some()
    }

    pub fn search_fields(&self) -> &[String] {
        &self.search_fields
    }

    pub fn categorical_fields(&self) -> &[String] {
        &self.categorical_fields
    }

    pub fn is_categorical(&self, name: &str) -> bool {
        self.categorical_fields.iter().any(|f| f == name)
    }

    pub fn date_field(&self) -> Option<&str> {
        self.date_field.as_deref()
    }

    /// Column sorted on first mount. Falls back to the first declared
    /// field, or to no column (id order) for a table without fields.
    pub fn default_sort_column(&self) -> &str {
        self.default_sort
            .as_ref()
            .map(|(column, _)| column.as_str())
            .or_else(|| self.fields.first().map(FieldDef::name))
            .unwrap_or("")
    }

    pub fn default_sort_direction(&self) -> SortDirection {
        self.default_sort
            .as_ref()
            .map(|(_, direction)| *direction)
            .unwrap_or_default()
    }

    pub fn page_size_options(&self) -> &[usize] {
        &self.page_size_options
    }

    pub fn default_page_size(&self) -> usize {
        self.default_page_size
    }

    pub fn is_page_size_allowed(&self, size: usize) -> bool {
        self.page_size_options.contains(&size)
    }

    pub fn selection_policy(&self) -> SelectionPolicy {
        self.selection_policy
    }
}
