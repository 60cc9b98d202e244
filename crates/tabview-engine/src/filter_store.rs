//! Persisted filter/sort state for one table

use std::sync::Arc;

use tabview_core::Result;
use tabview_storage::{filter_state_key, load_json, save_json, PreferenceStore};

use crate::config::FilterConfig;
use crate::filter::{FilterChange, FilterState};

/// Holds the current [`FilterState`] of one table and writes it through to
/// the preference store after every change
pub struct FilterStore {
    storage_key: String,
    state: FilterState,
    store: Arc<dyn PreferenceStore>,
}

impl FilterStore {
    /// Seed from persisted state, or the config defaults
    pub fn load<E>(store: Arc<dyn PreferenceStore>, config: &FilterConfig<E>) -> Self {
        let state = Self::load_state(store.as_ref(), config);
        Self {
            storage_key: config.storage_key().to_string(),
            state,
            store,
        }
    }

    /// Read the persisted state for `config`. Absent, corrupt or
    /// mismatched blobs all yield [`FilterState::defaults`].
    pub fn load_state<E>(store: &dyn PreferenceStore, config: &FilterConfig<E>) -> FilterState {
        let key = filter_state_key(config.storage_key());
        match load_json::<FilterState>(store, &key) {
            Some(state) if state.fits(config) => state,
            Some(_) => {
                tracing::debug!(key = %key, "Persisted filter state no longer fits config");
                FilterState::defaults(config)
            }
            None => FilterState::defaults(config),
        }
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    /// Apply `change`, persist, and return the new state.
    ///
    /// A rejected change leaves both the state and the stored blob as they
    /// were.
    pub fn update<E>(&mut self, change: FilterChange, config: &FilterConfig<E>) -> Result<FilterState> {
        let next = self.state.apply(change, config)?;
        self.state = next.clone();
        self.save();
        Ok(next)
    }

    /// Persist the current state. Failures are logged, never surfaced.
    pub fn save(&self) {
        Self::save_state(self.store.as_ref(), &self.storage_key, &self.state);
    }

    pub fn save_state(store: &dyn PreferenceStore, storage_key: &str, state: &FilterState) {
        if let Err(e) = save_json(store, &filter_state_key(storage_key), state) {
            tracing::warn!(
                storage_key = %storage_key,
                error = %e,
                "Failed to persist filter state"
            );
        }
    }
}
