//! Tabview Engine - client-side filtering, sorting, pagination and bulk
//! selection for admin tables
//!
//! Every table derives "which rows are visible, in what order, and which are
//! selected" from an in-memory snapshot of its collection, persisted user
//! preferences and a stream of user actions. This crate keeps that
//! derivation in one place:
//!
//! - [`FilterConfig`] declares the fields a table exposes, as typed accessors
//! - [`FilterState`] / [`FilterStore`] hold search, categorical, date and
//!   sort state, persisted per table
//! - [`PaginationState`] / [`PaginationStore`] hold the page, with the page
//!   size persisted
//! - [`SelectionStore`] holds the transient bulk selection
//! - [`compose_view`] runs filter, sort, paginate in a fixed order
//! - [`BulkDispatcher`] fans a [`BulkAction`] out over selected ids
//! - [`TableView`] ties all of the above to one table instance

mod bulk;
mod compose;
mod config;
mod filter;
mod filter_store;
mod pagination;
mod predicate;
mod selection;
mod settings;
mod sort;
mod table;

pub use bulk::*;
pub use compose::*;
pub use config::*;
pub use filter::*;
pub use filter_store::*;
pub use pagination::*;
pub use predicate::*;
pub use selection::*;
pub use settings::*;
pub use sort::*;
pub use table::*;
