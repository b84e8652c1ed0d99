//! Core traits for the source catalog and the target store.
//!
//! Both stores are injected as trait objects so the introspector, pipeline,
//! verifier, and orchestrator can run against fakes in unit tests. The
//! source streams rows through a bounded channel; errors travel in-band as
//! `Err` items so the consumer sees them in row order.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::schema::ForeignKeyRef;
use crate::value::{Row, ValueKind};

/// A fully built source data query plus the decode plan for its projection,
/// one [`ValueKind`] per selected column.
#[derive(Debug, Clone)]
pub struct SelectPlan {
    pub statement: String,
    pub kinds: Vec<ValueKind>,
}

/// Read-only metadata and row-streaming capabilities of the source database.
#[async_trait]
pub trait SourceCatalog: Send + Sync {
    /// Column `(name, type_name)` pairs in ordinal order. An empty result
    /// means the table does not exist.
    async fn columns(&self, table: &str, namespace: Option<&str>) -> Result<Vec<(String, String)>>;

    /// Primary key column names in constraint order. Empty when the table
    /// has no primary key.
    async fn primary_key(&self, table: &str, namespace: Option<&str>) -> Result<Vec<String>>;

    /// Foreign key references as `(column, referenced)` pairs. Informational
    /// only.
    async fn foreign_keys(
        &self,
        table: &str,
        namespace: Option<&str>,
    ) -> Result<Vec<(String, ForeignKeyRef)>>;

    /// Approximate row count from the source's planner statistics.
    async fn row_estimate(&self, table: &str) -> Result<u64>;

    /// Start streaming rows for a select plan.
    ///
    /// Spawns a producer task that pushes `Result<Row>` items into a bounded
    /// channel of the given capacity, suspending when the channel is full.
    /// The channel closes once the query is exhausted or after an error item
    /// has been sent. The join handle is returned so the caller can await
    /// the producer and not leak it.
    fn stream_rows(
        &self,
        plan: SelectPlan,
        capacity: usize,
    ) -> (mpsc::Receiver<Result<Row>>, JoinHandle<()>);
}

/// DDL, transactional insert, and counting capabilities of the target
/// database. At most one transaction is open at a time; it is owned by the
/// consumer side of the pipeline for the whole transfer.
#[async_trait]
pub trait TargetStore: Send {
    /// Whether a table with this name exists in the target.
    async fn table_exists(&mut self, table: &str) -> Result<bool>;

    /// Drop the table if it exists.
    async fn drop_table(&mut self, table: &str) -> Result<()>;

    /// Execute a DDL statement outside of any transaction.
    async fn exec_ddl(&mut self, statement: &str) -> Result<()>;

    /// Open the single transfer transaction.
    async fn begin(&mut self) -> Result<()>;

    /// Execute a parameterized insert inside the open transaction and return
    /// the number of affected rows.
    async fn insert(&mut self, statement: &str, row: &[crate::value::SqlValue]) -> Result<u64>;

    /// Commit the open transaction.
    async fn commit(&mut self) -> Result<()>;

    /// Roll back the open transaction, undoing every insert of this run.
    async fn rollback(&mut self) -> Result<()>;

    /// `COUNT(*)` of the target table.
    async fn count(&mut self, table: &str) -> Result<u64>;
}
