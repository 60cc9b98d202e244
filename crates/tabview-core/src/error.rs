//! Error types for tabview

use thiserror::Error;

/// Core error type for table view operations
#[derive(Error, Debug)]
pub enum TabviewError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Page size {0} is not one of the configured options")]
    InvalidPageSize(usize),

    #[error("No rows selected")]
    EmptySelection,

    #[error("Action '{0}' was not confirmed")]
    ConfirmationDeclined(String),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Action error: {0}")]
    Action(String),
}

/// Result type alias for table view operations
pub type Result<T> = std::result::Result<T, TabviewError>;
