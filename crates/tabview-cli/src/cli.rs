//! # tabview CLI
//!
//! Filters, sorts and pages a JSON array of records the way an admin table
//! does, remembering filter state and page size between runs.

mod logging;
mod output;
mod schema;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, ValueEnum};
use tabview_core::{parse_timestamp, Record};
use tabview_engine::{
    EngineSettings, FilterChange, FilterState, SortDirection, StaticSource, TableView,
};
use tabview_storage::{
    filter_state_key, load_json, MemoryPreferenceStore, PreferenceStore, SqlitePreferenceStore,
};

use crate::logging::{LoggingConfig, TimingGuard};
use crate::schema::{build_config, infer_columns, remembered_categories, TableOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

/// Filter, sort and page a JSON collection.
#[derive(Parser, Debug)]
#[command(name = "tabview", version, about)]
struct Cli {
    /// JSON file holding an array of objects, each with an `id`
    #[arg(long, short)]
    input: PathBuf,

    /// Key under which preferences are stored (defaults to the file stem)
    #[arg(long)]
    key: Option<String>,

    /// Field searched by --search (repeatable; defaults to all text fields)
    #[arg(long = "search-field")]
    search_fields: Vec<String>,

    /// Field offered as a categorical filter (repeatable)
    #[arg(long = "category")]
    categories: Vec<String>,

    /// Field used by --from/--to
    #[arg(long)]
    date_field: Option<String>,

    /// Case-insensitive substring search
    #[arg(long)]
    search: Option<String>,

    /// Categorical filter FIELD=VALUE (repeatable; values of one field are ORed)
    #[arg(long = "where", value_parser = parse_assignment)]
    filters: Vec<(String, String)>,

    /// Inclusive lower date bound
    #[arg(long)]
    from: Option<String>,

    /// Inclusive upper date bound; a bare date covers the whole day
    #[arg(long)]
    to: Option<String>,

    /// Sort column
    #[arg(long)]
    sort: Option<String>,

    /// Sort descending
    #[arg(long)]
    desc: bool,

    /// Page to show
    #[arg(long)]
    page: Option<usize>,

    /// Rows per page (must be one of the configured options)
    #[arg(long)]
    page_size: Option<usize>,

    /// Print every matching row instead of one page
    #[arg(long)]
    export: bool,

    /// Forget the saved filter state before applying flags
    #[arg(long)]
    reset: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Preference database
    #[arg(long, env = "TABVIEW_STATE_DB")]
    state_db: Option<PathBuf>,

    /// Keep preferences in memory only
    #[arg(long, conflicts_with = "state_db")]
    ephemeral: bool,

    /// Settings file (defaults to the user config directory)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Verbose logging
    #[arg(long, short)]
    verbose: bool,
}

fn parse_assignment(input: &str) -> std::result::Result<(String, String), String> {
    let (field, value) = input
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=VALUE, got '{}'", input))?;
    let field = field.trim();
    if field.is_empty() {
        return Err(format!("missing field name in '{}'", input));
    }
    Ok((field.to_string(), value.to_string()))
}

/// Parse a --from/--to bound. A bare `YYYY-MM-DD` upper bound extends to
/// the last instant of that day.
fn parse_bound(input: &str, upper: bool) -> Result<DateTime<Utc>> {
    let input = input.trim();
    if upper {
        if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
            if let Some(end) = date.and_hms_milli_opt(23, 59, 59, 999) {
                return Ok(end.and_utc());
            }
        }
    }
    parse_timestamp(input).with_context(|| format!("unrecognized date '{}'", input))
}

fn open_preferences(cli: &Cli, settings: &EngineSettings) -> Arc<dyn PreferenceStore> {
    if cli.ephemeral {
        return Arc::new(MemoryPreferenceStore::new());
    }
    let path = match &cli.state_db {
        Some(path) => Ok(path.clone()),
        None => settings.storage.resolved_preferences_db(),
    };
    match path.and_then(SqlitePreferenceStore::open) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::warn!(error = %e, "Preferences unavailable, continuing without persistence");
            Arc::new(MemoryPreferenceStore::new())
        }
    }
}

fn load_settings(cli: &Cli) -> Result<EngineSettings> {
    match &cli.settings {
        Some(path) => EngineSettings::load_from(path),
        None => Ok(EngineSettings::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Using default settings");
            EngineSettings::default()
        })),
    }
}

fn filter_changes(cli: &Cli) -> Result<Vec<FilterChange>> {
    let mut changes = Vec::new();
    if cli.reset {
        changes.push(FilterChange::Reset);
    }
    if let Some(search) = &cli.search {
        changes.push(FilterChange::SetSearch(search.clone()));
    }

    let mut by_field: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for (field, value) in &cli.filters {
        by_field.entry(field).or_default().push(value.clone());
    }
    for (field, values) in by_field {
        changes.push(FilterChange::SetCategory {
            field: field.to_string(),
            values: values.into_iter().collect(),
        });
    }

    if cli.from.is_some() || cli.to.is_some() {
        let from = cli.from.as_deref().map(|s| parse_bound(s, false)).transpose()?;
        let to = cli.to.as_deref().map(|s| parse_bound(s, true)).transpose()?;
        changes.push(FilterChange::SetDateRange { from, to });
    }
    Ok(changes)
}

async fn run(cli: Cli) -> Result<()> {
    let settings = load_settings(&cli)?;

    let json = std::fs::read_to_string(&cli.input)
        .with_context(|| format!("Failed to read {:?}", cli.input))?;
    let rows = Record::parse_collection(&json)?;
    let columns = infer_columns(&rows);

    let storage_key = match &cli.key {
        Some(key) => key.clone(),
        None => cli
            .input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .context("input path has no file name")?,
    };

    let prefs = open_preferences(&cli, &settings);
    let mut categorical_fields = cli.categories.clone();
    categorical_fields.extend(cli.filters.iter().map(|(field, _)| field.clone()));
    if let Some(saved) =
        load_json::<FilterState>(prefs.as_ref(), &filter_state_key(&storage_key))
    {
        categorical_fields.extend(remembered_categories(&saved, &columns));
    }
    let options = TableOptions {
        storage_key,
        search_fields: cli.search_fields.clone(),
        categorical_fields,
        date_field: cli.date_field.clone(),
        want_date_range: cli.from.is_some() || cli.to.is_some(),
    };
    let config = build_config(&columns, &options, &settings.table)?;

    let mut table = TableView::mount(config, Arc::new(StaticSource::new(rows)), prefs)?;
    table.reload().await?;

    for change in filter_changes(&cli)? {
        table.apply_filter(change)?;
    }
    match (&cli.sort, cli.desc) {
        (Some(column), desc) => {
            let direction = if desc {
                SortDirection::Descending
            } else {
                SortDirection::Ascending
            };
            table.apply_filter(FilterChange::SetSort {
                column: column.clone(),
                direction,
            })?;
        }
        (None, true) => {
            let column = table.filter_state().sort_column.clone();
            table.apply_filter(FilterChange::SetSort {
                column,
                direction: SortDirection::Descending,
            })?;
        }
        (None, false) => {}
    }
    if let Some(page_size) = cli.page_size {
        table.set_page_size(page_size)?;
    }
    if let Some(page) = cli.page {
        table.set_page(page);
    }

    let _timer = TimingGuard::new("render");
    if cli.export {
        let rows = table.export_rows();
        match cli.format {
            OutputFormat::Table => println!("{}", output::render_table(&columns, &rows)),
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&output::export_json(&rows))?)
            }
        }
        return Ok(());
    }

    let view = table.view();
    match cli.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&output::view_json(&view))?);
        }
        OutputFormat::Table => {
            if let Some(message) = view.status.empty_message() {
                println!("{}", message);
            } else {
                println!("{}", output::render_table(&columns, &view.visible_rows));
                println!("{}", output::pagination_footer(&view.pagination));
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(&LoggingConfig::for_cli(cli.verbose));

    run(cli).await
}
