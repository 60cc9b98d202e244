//! Table configuration for JSON records loaded from a file

use anyhow::{bail, Result};
use tabview_core::{parse_timestamp, Record, Value};
use tabview_engine::{FieldDef, FieldKind, FilterConfig, FilterState, TableDefaults};

/// A column discovered in the input records
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub kind: FieldKind,
}

/// Column names in order of first appearance, each typed by its first
/// non-null value
pub fn infer_columns(rows: &[Record]) -> Vec<Column> {
    let mut names: Vec<String> = Vec::new();
    for row in rows {
        for name in row.field_names() {
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
    }

    names
        .into_iter()
        .map(|name| {
            let kind = rows
                .iter()
                .map(|row| row.get(&name))
                .find(|value| !value.is_null())
                .map(|value| infer_kind(&value))
                .unwrap_or_default();
            Column { name, kind }
        })
        .collect()
}

fn infer_kind(value: &Value) -> FieldKind {
    match value {
        Value::Bool(_) => FieldKind::Bool,
        Value::Int64(_) | Value::Float64(_) | Value::Decimal(_) => FieldKind::Number,
        Value::Date(_) | Value::DateTime(_) | Value::DateTimeUtc(_) => FieldKind::Date,
        Value::String(s) if parse_timestamp(s).is_some() => FieldKind::Date,
        _ => FieldKind::Text,
    }
}

/// Categorical fields referenced by a saved filter state that still exist
/// in the data. Declaring them keeps the saved state loadable when a later
/// run omits `--category`/`--where`.
pub fn remembered_categories(saved: &FilterState, columns: &[Column]) -> Vec<String> {
    saved
        .categorical
        .keys()
        .filter(|field| columns.iter().any(|c| &c.name == *field))
        .cloned()
        .collect()
}

/// Field roles requested on the command line
#[derive(Debug, Clone, Default)]
pub struct TableOptions {
    pub storage_key: String,
    pub search_fields: Vec<String>,
    pub categorical_fields: Vec<String>,
    pub date_field: Option<String>,
    /// Pick the first date column when no date field is named
    pub want_date_range: bool,
}

/// Build the table config for `columns`.
///
/// Without explicit search fields every text column is searched.
pub fn build_config(
    columns: &[Column],
    options: &TableOptions,
    defaults: &TableDefaults,
) -> Result<FilterConfig<Record>> {
    let mut config = FilterConfig::new(options.storage_key.clone()).with_defaults(defaults);

    for column in columns {
        let name = column.name.clone();
        config = config.field(FieldDef::new(
            column.name.clone(),
            column.kind,
            move |row: &Record| row.get(&name),
        ));
    }

    let search_fields: Vec<String> = if options.search_fields.is_empty() {
        columns
            .iter()
            .filter(|c| c.kind == FieldKind::Text)
            .map(|c| c.name.clone())
            .collect()
    } else {
        options.search_fields.clone()
    };
    config = config.search(search_fields);

    for field in &options.categorical_fields {
        if !config.is_categorical(field) {
            config = config.categorical(field.clone());
        }
    }

    let date_field = match &options.date_field {
        Some(field) => Some(field.clone()),
        None if options.want_date_range => columns
            .iter()
            .find(|c| c.kind == FieldKind::Date)
            .map(|c| c.name.clone()),
        None => None,
    };
    match date_field {
        Some(field) => config = config.date_range(field),
        None if options.want_date_range => bail!("no date column found for --from/--to"),
        None => {}
    }

    config.validate()?;
    Ok(config)
}
