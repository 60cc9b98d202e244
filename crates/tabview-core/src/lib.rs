//! Tabview Core - shared abstractions for the table view engine
//!
//! This crate provides the types every other tabview crate depends on:
//!
//! - `Value` - a typed cell value read out of an entity through a field accessor
//! - `RowId` - the stable, totally ordered row identifier
//! - `Entity` - the trait every table row implements
//! - `Record` - a JSON-object entity for data fetched from REST endpoints
//! - `TabviewError` / `Result` - the shared error type

mod entity;
mod error;
mod record;
mod types;

pub use entity::*;
pub use error::*;
pub use record::*;
pub use types::*;
