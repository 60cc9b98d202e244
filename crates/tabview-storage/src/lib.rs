//! Tabview Storage - persistence of per-table user preferences
//!
//! Table preferences (filter/sort state and the preferred page size) are
//! small JSON blobs stored under a stable per-table key. This crate defines
//! the key-value collaborator the engine persists through and ships two
//! implementations:
//!
//! - [`MemoryPreferenceStore`] - process-local, used by tests and previews
//! - [`SqlitePreferenceStore`] - durable storage in a local SQLite file
//!
//! Reading a blob never fails from the caller's point of view: a missing,
//! unreadable or corrupt value is reported as "no saved preference" by
//! [`load_json`].

mod blob;
mod keys;
mod memory;
mod sqlite;

pub use blob::{load_json, save_json};
pub use keys::{filter_state_key, pagination_key};
pub use memory::MemoryPreferenceStore;
pub use sqlite::SqlitePreferenceStore;

use anyhow::Result;

/// Key-value storage for user preferences
pub trait PreferenceStore: Send + Sync {
    /// Read the raw value stored under `key`
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Returns whether a value was present.
    fn remove(&self, key: &str) -> Result<bool>;
}
