//! End-to-end behavior of a mounted table: filtering, paging, selection
//! resets, exports and bulk actions working together.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use serde_json::json;
use tabview_core::{Entity, Record, Result, RowId, TabviewError};
use tabview_engine::{
    compose_view, AutoConfirm, BulkAction, DataSource, FieldDef, FilterChange, FilterConfig,
    FilterState, PaginationState, SortDirection, StaticSource, TableView, ViewStatus,
};
use tabview_storage::{MemoryPreferenceStore, PreferenceStore, SqlitePreferenceStore};

fn record(id: i64, name: &str, status: &str, created_at: &str) -> Record {
    serde_json::from_value(json!({
        "id": id,
        "name": name,
        "status": status,
        "created_at": created_at,
    }))
    .unwrap()
}

/// 57 projects: 40 active and 17 archived, with many shared creation dates
fn projects() -> Vec<Record> {
    (1..=57)
        .map(|id| {
            let status = if id <= 40 { "active" } else { "archived" };
            let day = (id % 9) + 1;
            record(
                id,
                &format!("Project {:02}", id),
                status,
                &format!("2024-03-{:02}", day),
            )
        })
        .collect()
}

fn config() -> FilterConfig<Record> {
    FilterConfig::new("projects")
        .field(FieldDef::text("name", |r: &Record| r.get("name")))
        .field(FieldDef::text("status", |r: &Record| r.get("status")))
        .field(FieldDef::date("created_at", |r: &Record| r.get("created_at")))
        .search(["name"])
        .categorical("status")
        .date_range("created_at")
        .default_sort("created_at", SortDirection::Descending)
}

fn memory_prefs() -> Arc<dyn PreferenceStore> {
    Arc::new(MemoryPreferenceStore::new())
}

fn mount(rows: Vec<Record>, prefs: Arc<dyn PreferenceStore>) -> TableView<Record> {
    let source = Arc::new(StaticSource::<Record>::new(Vec::new()));
    let mut table = TableView::mount(config(), source, prefs).unwrap();
    table.replace_collection(rows);
    table
}

fn ids(rows: &[&Record]) -> Vec<RowId> {
    rows.iter().map(|r| r.id()).collect()
}

#[test]
fn test_identity_filter_keeps_full_membership() {
    let rows = projects();
    let table = mount(rows.clone(), memory_prefs());
    assert!(table.filter_state().is_identity());

    let exported: HashSet<RowId> = table.export_rows().iter().map(|r| r.id()).collect();
    let all: HashSet<RowId> = rows.iter().map(|r| r.id()).collect();
    assert_eq!(exported, all);
}

#[test]
fn test_shrinking_result_set_clamps_current_page() {
    let rows = projects();
    let config = config();
    let state = FilterState::defaults(&config);

    let on_last_page = PaginationState::new(25).recompute(57).set_page(3);
    let view = compose_view(&rows, &state, &config, on_last_page);
    assert_eq!(view.pagination.current_page, 3);
    assert_eq!(view.visible_rows.len(), 7);

    let active_only = state
        .apply(
            FilterChange::ToggleCategory {
                field: "status".into(),
                value: "active".into(),
            },
            &config,
        )
        .unwrap();
    let view = compose_view(&rows, &active_only, &config, view.pagination);
    assert_eq!(view.pagination.total_items, 40);
    assert_eq!(view.pagination.total_pages(), 2);
    assert_eq!(view.pagination.current_page, 2);
    assert_eq!(view.visible_rows.len(), 15);
}

#[test]
fn test_shrinking_collection_clamps_mounted_table() {
    let mut table = mount(projects(), memory_prefs());
    table.set_page(3);
    assert_eq!(table.pagination().current_page, 3);

    let remaining: Vec<Record> = projects().into_iter().take(40).collect();
    table.replace_collection(remaining);
    assert_eq!(table.pagination().total_pages(), 2);
    assert_eq!(table.pagination().current_page, 2);

    table
        .apply_filter(FilterChange::SetSearch("project 1".into()))
        .unwrap();
    assert_eq!(table.pagination().current_page, 1);
}

#[test]
fn test_pages_concatenate_to_the_export() {
    let mut table = mount(projects(), memory_prefs());
    table.set_page_size(10).unwrap();

    let expected = ids(&table.export_rows());
    let mut paged = Vec::new();
    for page in 1..=table.pagination().total_pages() {
        table.set_page(page);
        paged.extend(table.view().visible_ids());
    }

    assert_eq!(paged.len(), 57);
    assert_eq!(paged, expected);
}

#[test]
fn test_export_is_not_limited_to_one_page() {
    let mut table = mount(projects(), memory_prefs());
    table
        .apply_filter(FilterChange::ToggleCategory {
            field: "status".into(),
            value: "active".into(),
        })
        .unwrap();

    assert_eq!(table.view().visible_rows.len(), 25);
    assert_eq!(table.export_rows().len(), 40);
}

#[test]
fn test_descending_dates_break_ties_by_ascending_id() {
    let table = mount(projects(), memory_prefs());
    let exported = table.export_rows();

    let newest: Vec<RowId> = exported
        .iter()
        .take_while(|r| r.get("created_at").as_str() == Some("2024-03-09"))
        .map(|r| r.id())
        .collect();
    assert_eq!(
        newest,
        vec![RowId::Int(8), RowId::Int(17), RowId::Int(26), RowId::Int(35), RowId::Int(44), RowId::Int(53)]
    );
}

#[test]
fn test_empty_states_are_distinguished() {
    let mut table = mount(Vec::new(), memory_prefs());
    assert_eq!(table.view().status, ViewStatus::NoData);

    table.replace_collection(projects());
    table
        .apply_filter(FilterChange::SetSearch("no such project".into()))
        .unwrap();
    let view = table.view();
    assert_eq!(view.status, ViewStatus::NoMatches);
    assert_eq!(view.pagination.current_page, 1);
    assert_eq!(view.pagination.range_label(), "0 of 0");
}

#[tokio::test]
async fn test_reload_clears_selection_before_next_view() {
    let mut table = TableView::mount(
        config(),
        Arc::new(StaticSource::new(projects())),
        memory_prefs(),
    )
    .unwrap();
    table.reload().await.unwrap();
    table.select_all_visible();
    assert_eq!(table.selection().len(), 25);

    table.reload().await.unwrap();
    assert!(table.selection().is_empty());
}

#[test]
fn test_preferences_survive_remount() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("prefs.db");

    {
        let prefs: Arc<dyn PreferenceStore> = Arc::new(SqlitePreferenceStore::open(&db).unwrap());
        let mut table = mount(projects(), prefs);
        table
            .apply_filter(FilterChange::ToggleCategory {
                field: "status".into(),
                value: "archived".into(),
            })
            .unwrap();
        table
            .apply_filter(FilterChange::ToggleSort("name".into()))
            .unwrap();
        table.set_page_size(50).unwrap();
        table.set_page(2);
    }

    let prefs: Arc<dyn PreferenceStore> = Arc::new(SqlitePreferenceStore::open(&db).unwrap());
    let table = mount(projects(), prefs);
    assert_eq!(table.filter_state().sort_column, "name");
    assert_eq!(table.filter_state().sort_direction, SortDirection::Ascending);
    assert!(table.filter_state().selected("status").is_some());
    assert_eq!(table.pagination().page_size, 50);
    assert_eq!(table.pagination().current_page, 1);
    assert_eq!(table.pagination().total_items, 17);
}

/// A fake backend that archives records unless told to reject them
struct ProjectServer {
    rows: Mutex<Vec<Record>>,
    rejected: HashSet<RowId>,
    offline: AtomicBool,
}

impl ProjectServer {
    fn new(rejected: &[i64]) -> Arc<Self> {
        Arc::new(Self {
            rows: Mutex::new(projects()),
            rejected: rejected.iter().map(|id| RowId::Int(*id)).collect(),
            offline: AtomicBool::new(false),
        })
    }

    fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl DataSource<Record> for ProjectServer {
    async fn fetch_collection(&self) -> Result<Vec<Record>> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(TabviewError::Fetch("connection refused".into()));
        }
        Ok(self.rows.lock().clone())
    }
}

struct Archive {
    server: Arc<ProjectServer>,
}

#[async_trait]
impl BulkAction for Archive {
    fn name(&self) -> &str {
        "archive"
    }

    fn past_tense(&self) -> &str {
        "archived"
    }

    fn is_destructive(&self) -> bool {
        true
    }

    async fn execute(&self, id: &RowId) -> Result<()> {
        if self.server.rejected.contains(id) {
            return Err(TabviewError::Action(format!("project {} is locked", id)));
        }
        let mut rows = self.server.rows.lock();
        let row = rows
            .iter_mut()
            .find(|r| &r.id() == id)
            .ok_or_else(|| TabviewError::Action(format!("project {} not found", id)))?;
        row.set("status", json!("archived"));
        Ok(())
    }
}

#[tokio::test]
async fn test_bulk_archive_with_partial_failure_reloads_and_clears() {
    let server = ProjectServer::new(&[2, 4]);
    let mut table = TableView::mount(config(), server.clone(), memory_prefs())
        .unwrap()
        .with_confirmation(Arc::new(AutoConfirm));
    table.reload().await.unwrap();

    for id in 1..=5 {
        assert!(table.toggle_selection(RowId::Int(id)));
    }
    assert_eq!(table.selection().len(), 5);

    let outcome = table
        .run_bulk(Arc::new(Archive {
            server: server.clone(),
        }))
        .await
        .unwrap();

    assert_eq!(outcome.succeeded.len(), 3);
    assert_eq!(outcome.failed, vec![RowId::Int(2), RowId::Int(4)]);
    assert_eq!(outcome.summary(), "3 of 5 archived");
    assert!(table.selection().is_empty());

    let archived = table.category_options("status").unwrap();
    assert_eq!(archived[1].value, "archived");
    assert_eq!(archived[1].count, 20);
}

#[tokio::test]
async fn test_destructive_bulk_action_needs_a_gate() {
    let server = ProjectServer::new(&[]);
    let mut table = TableView::mount(config(), server.clone(), memory_prefs()).unwrap();
    table.reload().await.unwrap();
    table.toggle_selection(RowId::Int(1));

    let result = table.run_bulk(Arc::new(Archive { server })).await;
    assert!(matches!(result, Err(TabviewError::ConfirmationDeclined(_))));
    assert_eq!(table.selected_ids(), vec![RowId::Int(1)]);
}

#[tokio::test]
async fn test_bulk_action_requires_a_selection() {
    let server = ProjectServer::new(&[]);
    let mut table = TableView::mount(config(), server.clone(), memory_prefs())
        .unwrap()
        .with_confirmation(Arc::new(AutoConfirm));
    table.reload().await.unwrap();

    let result = table.run_bulk(Arc::new(Archive { server })).await;
    assert!(matches!(result, Err(TabviewError::EmptySelection)));
}

#[tokio::test]
async fn test_failed_fetch_keeps_snapshot_and_selection() {
    let server = ProjectServer::new(&[]);
    let mut table = TableView::mount(config(), server.clone(), memory_prefs()).unwrap();
    table.reload().await.unwrap();
    table.toggle_selection(RowId::Int(3));
    table.toggle_selection(RowId::Int(7));

    server.go_offline();
    let result = table.reload().await;

    assert!(matches!(result, Err(TabviewError::Fetch(_))));
    assert_eq!(table.rows().len(), 57);
    assert_eq!(table.selected_ids(), vec![RowId::Int(3), RowId::Int(7)]);
    assert_eq!(table.view().pagination.total_items, 57);
}

#[tokio::test]
async fn test_bulk_outcome_survives_a_failed_reload() {
    let server = ProjectServer::new(&[]);
    let mut table = TableView::mount(config(), server.clone(), memory_prefs())
        .unwrap()
        .with_confirmation(Arc::new(AutoConfirm));
    table.reload().await.unwrap();
    table.toggle_selection(RowId::Int(1));
    table.toggle_selection(RowId::Int(2));

    server.go_offline();
    let outcome = table
        .run_bulk(Arc::new(Archive {
            server: server.clone(),
        }))
        .await
        .unwrap();

    assert_eq!(outcome.summary(), "2 of 2 archived");
    assert!(outcome.is_complete_success());
    assert!(table.selection().is_empty());

    // The stale snapshot is still shown until the next successful reload
    let statuses = table.category_options("status").unwrap();
    assert_eq!(statuses[0].value, "active");
    assert_eq!(statuses[0].count, 40);
    assert_eq!(table.view().pagination.total_items, 57);
}
