//! Typed JSON blobs on top of a [`PreferenceStore`]

use anyhow::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::PreferenceStore;

/// Load and decode the blob stored under `key`.
///
/// Absence, a storage read failure and a value that does not decode into `T`
/// all yield `None`; the caller falls back to its defaults.
pub fn load_json<T: DeserializeOwned>(store: &dyn PreferenceStore, key: &str) -> Option<T> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!(key, error = %e, "Failed to read preference, using defaults");
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!(key, error = %e, "Discarding unreadable preference");
            None
        }
    }
}

/// Encode `value` and store it under `key`
pub fn save_json<T: Serialize + ?Sized>(
    store: &dyn PreferenceStore,
    key: &str,
    value: &T,
) -> Result<()> {
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw)
}
