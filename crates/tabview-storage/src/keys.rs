//! Storage key derivation
//!
//! Each table persists two independent blobs under its `storage_key`.

/// Key of the filter/sort state blob
pub fn filter_state_key(storage_key: &str) -> String {
    format!("{}.filters", storage_key)
}

/// Key of the page size preference blob
pub fn pagination_key(storage_key: &str) -> String {
    format!("{}.pagination", storage_key)
}
