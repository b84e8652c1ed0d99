//! # pg-sqlite-migrate
//!
//! PostgreSQL to SQLite single-table migration library.
//!
//! This library provides the core functionality for copying one table from
//! PostgreSQL into an existing SQLite database with support for:
//!
//! - **Schema introspection** of columns, primary keys and foreign keys
//! - **Type mapping** from PostgreSQL types to SQLite storage classes
//! - **Streaming transfer** over a bounded channel, in a single transaction
//! - **Row-count verification** after the transfer commits
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use pg_sqlite_migrate::{
//!     MigrationOptions, NoopProgress, Orchestrator, PgCatalog, SqliteTarget,
//! };
//!
//! #[tokio::main]
//! async fn main() -> pg_sqlite_migrate::Result<()> {
//!     let source = PgCatalog::connect("postgres://localhost/mydb").await?;
//!     let target = SqliteTarget::connect(Path::new("my.db")).await?;
//!
//!     let mut orchestrator = Orchestrator::new(
//!         Box::new(source),
//!         Box::new(target),
//!         MigrationOptions::new("employees"),
//!     );
//!     let plan = orchestrator.plan().await?;
//!     let result = orchestrator.execute(&plan, &NoopProgress).await?;
//!     println!("Migrated {} rows", result.rows_transferred);
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod ddl;
pub mod error;
pub mod introspect;
pub mod orchestrator;
pub mod progress;
pub mod schema;
pub mod source;
pub mod target;
pub mod transfer;
pub mod typemap;
pub mod value;
pub mod verify;

#[cfg(test)]
pub(crate) mod testutil;

// Re-exports for convenient access
pub use catalog::{SelectPlan, SourceCatalog, TargetStore};
pub use error::{MigrateError, Result};
pub use orchestrator::{MigrationOptions, MigrationPlan, MigrationResult, Orchestrator};
pub use progress::{NoopProgress, ProgressSink};
pub use schema::{Column, ForeignKeyRef, TableSchema};
pub use source::PgCatalog;
pub use target::SqliteTarget;
pub use transfer::{TransferConfig, TransferStats};
pub use value::{Row, SqlValue, ValueKind};
