//! Bulk-selection state for one table
//!
//! The selected set is transient and never persisted. Ids are kept ordered
//! so `selected_ids` is deterministic.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use tabview_core::RowId;

/// Callback invoked with the selected ids after every change
pub type SelectionListener = Arc<dyn Fn(&[RowId]) + Send + Sync>;

#[derive(Default)]
pub struct SelectionStore {
    ids: BTreeSet<RowId>,
    listeners: Vec<SelectionListener>,
}

impl SelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for selection changes
    pub fn subscribe(&mut self, listener: impl Fn(&[RowId]) + Send + Sync + 'static) {
        self.listeners.push(Arc::new(listener));
    }

    /// Flip the selection of one id
    pub fn toggle(&mut self, id: RowId) {
        if !self.ids.remove(&id) {
            self.ids.insert(id);
        }
        self.notify();
    }

    /// Add every id in `ids`; ids outside it keep their state
    pub fn select_all<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = RowId>,
    {
        let before = self.ids.len();
        self.ids.extend(ids);
        if self.ids.len() != before {
            self.notify();
        }
    }

    /// Header checkbox behavior: deselect `ids` if all are selected,
    /// otherwise select all of them
    pub fn toggle_all(&mut self, ids: &[RowId]) {
        if !ids.is_empty() && ids.iter().all(|id| self.ids.contains(id)) {
            for id in ids {
                self.ids.remove(id);
            }
            self.notify();
        } else {
            self.select_all(ids.iter().cloned());
        }
    }

    pub fn clear(&mut self) {
        if self.ids.is_empty() {
            return;
        }
        self.ids.clear();
        self.notify();
    }

    /// Drop every selected id not present in `existing`
    pub fn retain_existing(&mut self, existing: &HashSet<RowId>) {
        let before = self.ids.len();
        self.ids.retain(|id| existing.contains(id));
        if self.ids.len() != before {
            self.notify();
        }
    }

    pub fn is_selected(&self, id: &RowId) -> bool {
        self.ids.contains(id)
    }

    pub fn selected_ids(&self) -> Vec<RowId> {
        self.ids.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    fn notify(&self) {
        if self.listeners.is_empty() {
            return;
        }
        let ids = self.selected_ids();
        for listener in &self.listeners {
            listener(&ids);
        }
    }
}

impl std::fmt::Debug for SelectionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectionStore")
            .field("ids", &self.ids)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn ids(values: &[i64]) -> Vec<RowId> {
        values.iter().map(|v| RowId::Int(*v)).collect()
    }

    #[test]
    fn test_toggle() {
        let mut selection = SelectionStore::new();
        selection.toggle(RowId::Int(1));
        selection.toggle(RowId::Int(2));
        assert!(selection.is_selected(&RowId::Int(1)));
        assert_eq!(selection.len(), 2);

        selection.toggle(RowId::Int(1));
        assert!(!selection.is_selected(&RowId::Int(1)));
        assert_eq!(selection.selected_ids(), ids(&[2]));
    }

    #[test]
    fn test_select_all_only_touches_given_ids() {
        let mut selection = SelectionStore::new();
        selection.toggle(RowId::Int(9));
        selection.select_all(ids(&[3, 1, 2]));
        assert_eq!(selection.selected_ids(), ids(&[1, 2, 3, 9]));
    }

    #[test]
    fn test_toggle_all() {
        let mut selection = SelectionStore::new();
        let page = ids(&[1, 2, 3]);

        selection.toggle(RowId::Int(2));
        selection.toggle_all(&page);
        assert_eq!(selection.len(), 3);

        selection.toggle_all(&page);
        assert!(selection.is_empty());
    }

    #[test]
    fn test_retain_existing() {
        let mut selection = SelectionStore::new();
        selection.select_all(ids(&[1, 2, 3]));
        let existing: HashSet<RowId> = ids(&[2, 3, 4]).into_iter().collect();
        selection.retain_existing(&existing);
        assert_eq!(selection.selected_ids(), ids(&[2, 3]));
    }

    #[test]
    fn test_listeners_see_changes_only() {
        let seen = Arc::new(Mutex::new(Vec::<Vec<RowId>>::new()));
        let mut selection = SelectionStore::new();
        let sink = seen.clone();
        selection.subscribe(move |ids| sink.lock().push(ids.to_vec()));

        selection.toggle(RowId::Int(1));
        selection.select_all(ids(&[1]));
        selection.clear();
        selection.clear();

        assert_eq!(*seen.lock(), vec![ids(&[1]), Vec::new()]);
    }
}
