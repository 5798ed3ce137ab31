//! Warehouse import - staged-load merge engine
//!
//! Moves rows that a stage loader has placed in a staging table into a
//! permanent destination table:
//! - full load (replace), with primary-key deduplication when the
//!   destination declares a key
//! - incremental load (upsert), updating changed rows and appending new ones
//! - empty/NULL normalisation and `_timestamp` stamping
//! - transactions with retryable rollback and guaranteed temp-table cleanup
//!
//! SQL is produced per backend through [`SqlDialect`] adapters and issued via
//! a caller-supplied [`SqlExecutor`].
//!
//! ```no_run
//! use warehouse_import::{
//!     ColumnDefinition, DialectKind, ImportOptions, ImportState, Importer, SqlExecutor,
//!     StageTableDefinitionFactory, TableDefinition,
//! };
//!
//! fn load(executor: &dyn SqlExecutor) -> warehouse_import::ImportResult<()> {
//!     let dialect = DialectKind::Snowflake.dialect();
//!     let destination = TableDefinition::new(
//!         "in.c-main",
//!         "accounts",
//!         vec![
//!             ColumnDefinition::new("id", "VARCHAR(16777216)"),
//!             ColumnDefinition::new("name", "VARCHAR(16777216)"),
//!         ],
//!     )
//!     .with_primary_keys(["id"]);
//!     let staging = StageTableDefinitionFactory::new(&*dialect)
//!         .create_staging_table_definition(&destination, &["id", "name"]);
//!
//!     // ... stage loader creates and fills `staging` ...
//!     let mut state = ImportState::new(staging.name.clone());
//!     state.add_imported_rows_count(2);
//!
//!     let options = ImportOptions::default().incremental(true);
//!     let report = Importer::new(executor, &*dialect)
//!         .import_to_table(&staging, &destination, &options, state)?;
//!     println!("{} rows updated", report.rows_updated);
//!     Ok(())
//! }
//! ```

pub mod builder;
#[cfg(feature = "config")]
pub mod config;
pub mod dialect;
pub mod error;
pub mod executor;
pub mod importer;
pub mod models;
pub mod options;
pub mod staging;
pub mod state;
pub mod transaction;

pub use builder::StatementBuilder;
#[cfg(feature = "config")]
pub use config::ImportConfig;
pub use dialect::{DialectKind, SqlDialect};
pub use error::{ErrorClass, ImportError, ImportResult};
#[cfg(feature = "duckdb-backend")]
pub use executor::DuckDbExecutor;
pub use executor::{ExecutorError, ExecutorResult, QueryResult, SessionId, SqlExecutor};
pub use importer::{FullImporter, IncrementalImporter, Importer};
pub use models::{BaseType, ColumnDefinition, TableDefinition};
pub use options::{ImportFeature, ImportOptions, TIMESTAMP_COLUMN_NAME};
pub use staging::StageTableDefinitionFactory;
pub use state::{ImportReport, ImportState, TimerRecord};
pub use transaction::RetryPolicy;
