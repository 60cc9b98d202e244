//! One table instance and its state stores
//!
//! `TableView` is the per-table context: it owns the config, the current
//! snapshot of the collection and the filter, pagination and selection
//! stores. Every mutating operation recomposes the view and notifies
//! observers, so nothing renders from stale pagination.
//!
//! Reset rules:
//!
//! - a filter/sort change that alters the state goes back to page 1, and
//!   clears the selection under [`SelectionPolicy::ClearOnFilterChange`]
//! - replacing the collection (reload) always clears the selection and
//!   clamps the current page against the new count
//! - optimistic patches keep the selection but drop ids that vanished

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tabview_core::{Entity, Result, RowId, TabviewError};
use tabview_storage::PreferenceStore;

use crate::bulk::{BulkAction, BulkDispatcher, BulkOutcome, ConfirmationGate};
use crate::compose::{compose_view, filter_and_sort, ComposedView};
use crate::config::{FilterConfig, SelectionPolicy};
use crate::filter::{FilterChange, FilterState};
use crate::filter_store::FilterStore;
use crate::pagination::{PaginationState, PaginationStore};
use crate::selection::SelectionStore;

/// Fetches a full, unfiltered snapshot of a collection.
///
/// Implementations report transport failures as `TabviewError::Fetch`.
#[async_trait]
pub trait DataSource<E>: Send + Sync {
    async fn fetch_collection(&self) -> Result<Vec<E>>;
}

/// A data source serving a fixed snapshot
pub struct StaticSource<E> {
    rows: Vec<E>,
}

impl<E> StaticSource<E> {
    pub fn new(rows: Vec<E>) -> Self {
        Self { rows }
    }
}

#[async_trait]
impl<E: Clone + Send + Sync> DataSource<E> for StaticSource<E> {
    async fn fetch_collection(&self) -> Result<Vec<E>> {
        Ok(self.rows.clone())
    }
}

/// Receives every recomposed view and selection change
pub trait TableObserver<E>: Send + Sync {
    fn on_view_changed(&self, _view: &ComposedView<'_, E>) {}

    fn on_selection_changed(&self, _selected: &[RowId]) {}
}

/// One distinct value of a categorical field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryOption {
    pub value: String,
    /// Rows holding this value in the unfiltered collection
    pub count: usize,
    pub selected: bool,
}

pub struct TableView<E> {
    config: FilterConfig<E>,
    rows: Arc<Vec<E>>,
    filters: FilterStore,
    pagination: PaginationStore,
    selection: SelectionStore,
    observers: Vec<Arc<dyn TableObserver<E>>>,
    source: Arc<dyn DataSource<E>>,
    dispatcher: BulkDispatcher,
}

impl<E> TableView<E>
where
    E: Entity + Clone + Send + Sync + 'static,
{
    /// Create the table, seeding filter state and page size from persisted
    /// preferences. The collection stays empty until [`Self::reload`].
    pub fn mount(
        config: FilterConfig<E>,
        source: Arc<dyn DataSource<E>>,
        prefs: Arc<dyn PreferenceStore>,
    ) -> Result<Self> {
        config.validate()?;
        let filters = FilterStore::load(prefs.clone(), &config);
        let pagination = PaginationStore::load(prefs, &config);

        tracing::debug!(
            storage_key = %config.storage_key(),
            page_size = pagination.state().page_size,
            active_filters = filters.state().has_active_filters(),
            "Mounted table"
        );

        Ok(Self {
            config,
            rows: Arc::new(Vec::new()),
            filters,
            pagination,
            selection: SelectionStore::new(),
            observers: Vec::new(),
            source,
            // Destructive actions stay blocked until a gate is installed
            dispatcher: BulkDispatcher::new(Arc::new(|_: &str| false)),
        })
    }

    /// Install the gate that confirms destructive bulk actions
    pub fn with_confirmation(mut self, gate: Arc<dyn ConfirmationGate>) -> Self {
        self.dispatcher = BulkDispatcher::new(gate);
        self
    }

    pub fn subscribe(&mut self, observer: Arc<dyn TableObserver<E>>) {
        let listener = Arc::clone(&observer);
        self.selection
            .subscribe(move |selected| listener.on_selection_changed(selected));
        self.observers.push(observer);
    }

    pub fn config(&self) -> &FilterConfig<E> {
        &self.config
    }

    /// The current raw snapshot
    pub fn rows(&self) -> &Arc<Vec<E>> {
        &self.rows
    }

    pub fn filter_state(&self) -> &FilterState {
        self.filters.state()
    }

    pub fn pagination(&self) -> PaginationState {
        self.pagination.state()
    }

    pub fn selection(&self) -> &SelectionStore {
        &self.selection
    }

    pub fn selected_ids(&self) -> Vec<RowId> {
        self.selection.selected_ids()
    }

    /// Fetch a fresh snapshot and replace the collection.
    ///
    /// Filter/sort state survives a reload; the selection does not. On a
    /// fetch error the previous snapshot and selection stay in place.
    #[tracing::instrument(skip(self), fields(storage_key = %self.config.storage_key()))]
    pub async fn reload(&mut self) -> Result<()> {
        let rows = self.source.fetch_collection().await?;
        tracing::info!(rows = rows.len(), "Reloaded table data");
        self.replace_collection(rows);
        Ok(())
    }

    /// Swap in a new collection, clearing the selection
    pub fn replace_collection(&mut self, rows: Vec<E>) {
        self.rows = Arc::new(rows);
        self.selection.clear();
        self.recompose();
    }

    /// Apply a filter/sort change and return the new state
    pub fn apply_filter(&mut self, change: FilterChange) -> Result<FilterState> {
        let before = self.filters.state().clone();
        let next = self.filters.update(change, &self.config)?;
        if next != before {
            self.pagination.reset_page();
            if self.config.selection_policy() == SelectionPolicy::ClearOnFilterChange {
                self.selection.clear();
            }
        }
        self.recompose();
        Ok(next)
    }

    pub fn set_page(&mut self, page: usize) -> PaginationState {
        self.pagination.set_page(page);
        self.recompose();
        self.pagination.state()
    }

    pub fn set_page_size(&mut self, page_size: usize) -> Result<PaginationState> {
        self.pagination.set_page_size(page_size)?;
        self.recompose();
        Ok(self.pagination.state())
    }

    /// Flip one row's selection. Ids absent from the collection are
    /// ignored; returns whether the id was known.
    pub fn toggle_selection(&mut self, id: RowId) -> bool {
        if !self.rows.iter().any(|row| row.id() == id) {
            tracing::debug!(id = %id, "Ignoring selection toggle for unknown row");
            return false;
        }
        self.selection.toggle(id);
        true
    }

    /// Select every row on the current page
    pub fn select_all_visible(&mut self) {
        let ids = self.view().visible_ids();
        self.selection.select_all(ids);
    }

    /// Header checkbox over the current page
    pub fn toggle_all_visible(&mut self) {
        let ids = self.view().visible_ids();
        self.selection.toggle_all(&ids);
    }

    /// Select every row matching the filters, across all pages
    pub fn select_all_filtered(&mut self) {
        let ids: Vec<RowId> = self.export_rows().iter().map(|row| row.id()).collect();
        self.selection.select_all(ids);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// The current page, computed from the committed state
    pub fn view(&self) -> ComposedView<'_, E> {
        compose_view(
            self.rows.as_slice(),
            self.filters.state(),
            &self.config,
            self.pagination.state(),
        )
    }

    /// Every row matching the filters, sorted, unpaginated
    pub fn export_rows(&self) -> Vec<&E> {
        filter_and_sort(self.rows.as_slice(), self.filters.state(), &self.config)
    }

    /// Distinct values of a categorical field with their counts, sorted by
    /// value. Selected values missing from the data are still listed so they
    /// can be deselected.
    pub fn category_options(&self, field: &str) -> Result<Vec<CategoryOption>> {
        let def = self
            .config
            .field_def(field)
            .filter(|_| self.config.is_categorical(field))
            .ok_or_else(|| TabviewError::UnknownField(field.to_string()))?;

        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for row in self.rows.iter() {
            if let Some(key) = def.value(row).category_key() {
                *counts.entry(key).or_default() += 1;
            }
        }

        let selected = self.filters.state().selected(field);
        if let Some(selected) = selected {
            for value in selected {
                counts.entry(value.clone()).or_default();
            }
        }

        Ok(counts
            .into_iter()
            .map(|(value, count)| CategoryOption {
                selected: selected.is_some_and(|s| s.contains(&value)),
                value,
                count,
            })
            .collect())
    }

    /// Speculatively patch the local snapshot ahead of the server.
    ///
    /// The snapshot is copied on write, so views composed earlier keep
    /// their rows. Selected ids that no longer exist are dropped.
    pub fn apply_optimistic<F>(&mut self, patch: F)
    where
        F: FnOnce(&mut Vec<E>),
    {
        patch(Arc::make_mut(&mut self.rows));
        let existing: HashSet<RowId> = self.rows.iter().map(|row| row.id()).collect();
        self.selection.retain_existing(&existing);
        self.recompose();
    }

    /// Run `action` over the selection, then clear it and reload.
    ///
    /// The reload happens even when some operations failed. A failed reload
    /// is logged and the outcome is still returned.
    #[tracing::instrument(skip(self, action), fields(storage_key = %self.config.storage_key(), action = %action.name()))]
    pub async fn run_bulk(&mut self, action: Arc<dyn BulkAction>) -> Result<BulkOutcome> {
        let ids = self.selection.selected_ids();
        let outcome = self.dispatcher.run(action, ids).await?;

        self.selection.clear();
        if let Err(e) = self.reload().await {
            tracing::warn!(error = %e, "Reload after bulk action failed");
            self.recompose();
        }
        Ok(outcome)
    }

    fn recompose(&mut self) {
        let view = compose_view(
            self.rows.as_slice(),
            self.filters.state(),
            &self.config,
            self.pagination.state(),
        );
        for observer in &self.observers {
            observer.on_view_changed(&view);
        }
        self.pagination.commit(view.pagination);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FieldDef;
    use crate::sort::SortDirection;
    use parking_lot::Mutex;
    use tabview_core::Value;
    use tabview_storage::MemoryPreferenceStore;

    #[derive(Debug, Clone, PartialEq)]
    struct Invoice {
        id: i64,
        client: String,
        status: String,
    }

    impl Entity for Invoice {
        fn id(&self) -> RowId {
            RowId::Int(self.id)
        }
    }

    fn invoices(count: i64) -> Vec<Invoice> {
        (1..=count)
            .map(|id| Invoice {
                id,
                client: format!("Client {}", id),
                status: if id % 2 == 0 { "paid" } else { "open" }.to_string(),
            })
            .collect()
    }

    fn config() -> FilterConfig<Invoice> {
        FilterConfig::new("invoices")
            .field(FieldDef::text("client", |i: &Invoice| Value::from(i.client.as_str())))
            .field(FieldDef::text("status", |i: &Invoice| Value::from(i.status.as_str())))
            .search(["client"])
            .categorical("status")
            .default_sort("client", SortDirection::Ascending)
            .page_sizes(vec![5, 10], 5)
    }

    fn table(rows: Vec<Invoice>) -> TableView<Invoice> {
        let prefs: Arc<dyn PreferenceStore> = Arc::new(MemoryPreferenceStore::new());
        let mut table =
            TableView::mount(config(), Arc::new(StaticSource::<Invoice>::new(Vec::new())), prefs)
                .unwrap();
        table.replace_collection(rows);
        table
    }

    #[derive(Default)]
    struct Recorder {
        views: Mutex<Vec<(usize, usize)>>,
        selections: Mutex<Vec<usize>>,
    }

    impl TableObserver<Invoice> for Recorder {
        fn on_view_changed(&self, view: &ComposedView<'_, Invoice>) {
            self.views
                .lock()
                .push((view.visible_rows.len(), view.pagination.current_page));
        }

        fn on_selection_changed(&self, selected: &[RowId]) {
            self.selections.lock().push(selected.len());
        }
    }

    #[test]
    fn test_mount_rejects_invalid_config() {
        let prefs: Arc<dyn PreferenceStore> = Arc::new(MemoryPreferenceStore::new());
        let result = TableView::mount(
            config().categorical("missing"),
            Arc::new(StaticSource::<Invoice>::new(Vec::new())),
            prefs,
        );
        assert!(matches!(result, Err(TabviewError::UnknownField(_))));
    }

    #[test]
    fn test_filter_change_resets_page_and_selection() {
        let mut table = table(invoices(12));
        table.set_page(3);
        assert!(table.toggle_selection(RowId::Int(1)));

        table
            .apply_filter(FilterChange::SetSearch("client".into()))
            .unwrap();
        assert_eq!(table.pagination().current_page, 1);
        assert!(table.selection().is_empty());
    }

    #[test]
    fn test_unchanged_filter_keeps_page() {
        let mut table = table(invoices(12));
        table.set_page(2);
        table.apply_filter(FilterChange::SetSearch(String::new())).unwrap();
        assert_eq!(table.pagination().current_page, 2);
    }

    #[test]
    fn test_keep_policy_preserves_selection() {
        let prefs: Arc<dyn PreferenceStore> = Arc::new(MemoryPreferenceStore::new());
        let mut table = TableView::mount(
            config().with_selection_policy(SelectionPolicy::KeepOnFilterChange),
            Arc::new(StaticSource::<Invoice>::new(Vec::new())),
            prefs,
        )
        .unwrap();
        table.replace_collection(invoices(4));
        table.toggle_selection(RowId::Int(2));
        table
            .apply_filter(FilterChange::ToggleCategory {
                field: "status".into(),
                value: "open".into(),
            })
            .unwrap();
        assert_eq!(table.selected_ids(), vec![RowId::Int(2)]);
    }

    #[test]
    fn test_toggle_unknown_id_is_ignored() {
        let mut table = table(invoices(3));
        assert!(!table.toggle_selection(RowId::Int(99)));
        assert!(table.selection().is_empty());
    }

    #[test]
    fn test_select_all_visible_vs_filtered() {
        let mut table = table(invoices(12));
        table.select_all_visible();
        assert_eq!(table.selection().len(), 5);

        table.clear_selection();
        table.select_all_filtered();
        assert_eq!(table.selection().len(), 12);

        table.toggle_all_visible();
        assert_eq!(table.selection().len(), 7);
    }

    #[test]
    fn test_category_options() {
        let mut table = table(invoices(5));
        table
            .apply_filter(FilterChange::SetCategory {
                field: "status".into(),
                values: ["paid".to_string(), "void".to_string()].into_iter().collect(),
            })
            .unwrap();

        let options = table.category_options("status").unwrap();
        assert_eq!(
            options,
            vec![
                CategoryOption { value: "open".into(), count: 3, selected: false },
                CategoryOption { value: "paid".into(), count: 2, selected: true },
                CategoryOption { value: "void".into(), count: 0, selected: true },
            ]
        );
        assert!(table.category_options("client").is_err());
    }

    #[test]
    fn test_apply_optimistic_is_copy_on_write() {
        let mut table = table(invoices(6));
        let before = Arc::clone(table.rows());
        table.toggle_selection(RowId::Int(2));
        table.toggle_selection(RowId::Int(3));

        table.apply_optimistic(|rows| rows.retain(|i| i.id != 3));

        assert_eq!(before.len(), 6);
        assert_eq!(table.rows().len(), 5);
        assert_eq!(table.selected_ids(), vec![RowId::Int(2)]);
    }

    #[test]
    fn test_observers_receive_views_and_selection() {
        let mut table = table(invoices(7));
        let recorder = Arc::new(Recorder::default());
        table.subscribe(recorder.clone());

        table.set_page(2);
        table.toggle_selection(RowId::Int(1));
        table.replace_collection(invoices(3));

        assert_eq!(*recorder.views.lock(), vec![(2, 2), (3, 1)]);
        assert_eq!(*recorder.selections.lock(), vec![1, 0]);
    }

    #[tokio::test]
    async fn test_reload_clears_selection_keeps_filters() {
        let prefs: Arc<dyn PreferenceStore> = Arc::new(MemoryPreferenceStore::new());
        let mut table = TableView::mount(
            config(),
            Arc::new(StaticSource::new(invoices(8))),
            prefs,
        )
        .unwrap();
        table.reload().await.unwrap();
        table
            .apply_filter(FilterChange::ToggleCategory {
                field: "status".into(),
                value: "paid".into(),
            })
            .unwrap();
        table.select_all_visible();
        assert_eq!(table.selection().len(), 4);

        table.reload().await.unwrap();
        assert!(table.selection().is_empty());
        assert_eq!(table.view().visible_rows.len(), 4);
        assert!(table.filter_state().has_active_filters());
    }
}
