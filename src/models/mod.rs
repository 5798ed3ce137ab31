//! Table and column definitions
//!
//! Immutable value objects describing staging, dedup and destination tables.

pub mod column;
pub mod table;

pub use column::{BaseType, ColumnDefinition};
pub use table::TableDefinition;
