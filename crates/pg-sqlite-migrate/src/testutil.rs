//! In-memory fakes of the store traits, shared by unit tests.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::catalog::{SelectPlan, SourceCatalog, TargetStore};
use crate::error::{MigrateError, Result};
use crate::schema::ForeignKeyRef;
use crate::value::{Row, SqlValue};

/// Fake source backed by literal metadata and rows. A `Err(message)` entry
/// in `rows` is delivered in-band as a transfer error, the way the real
/// producer reports a mid-stream read failure.
#[derive(Clone, Default)]
pub struct FakeCatalog {
    pub columns: Vec<(String, String)>,
    pub pk: Vec<String>,
    pub fks: Vec<(String, ForeignKeyRef)>,
    pub estimate: u64,
    pub rows: Vec<std::result::Result<Row, String>>,
}

#[async_trait]
impl SourceCatalog for FakeCatalog {
    async fn columns(&self, _table: &str, _namespace: Option<&str>) -> Result<Vec<(String, String)>> {
        Ok(self.columns.clone())
    }

    async fn primary_key(&self, _table: &str, _namespace: Option<&str>) -> Result<Vec<String>> {
        Ok(self.pk.clone())
    }

    async fn foreign_keys(
        &self,
        _table: &str,
        _namespace: Option<&str>,
    ) -> Result<Vec<(String, ForeignKeyRef)>> {
        Ok(self.fks.clone())
    }

    async fn row_estimate(&self, _table: &str) -> Result<u64> {
        Ok(self.estimate)
    }

    fn stream_rows(
        &self,
        _plan: SelectPlan,
        capacity: usize,
    ) -> (mpsc::Receiver<Result<Row>>, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity);
        let rows = self.rows.clone();
        let handle = tokio::spawn(async move {
            for item in rows {
                let item = item.map_err(|m| MigrateError::transfer("fake", m));
                let stop = item.is_err();
                if tx.send(item).await.is_err() || stop {
                    break;
                }
            }
        });
        (rx, handle)
    }
}

/// Observable state of a [`FakeTarget`].
#[derive(Default)]
pub struct FakeTargetState {
    pub existing_tables: HashSet<String>,
    pub dropped: Vec<String>,
    pub ddl: Vec<String>,
    /// Rows inserted in the current (uncommitted) transaction.
    pub pending: Vec<Row>,
    /// Rows surviving a commit.
    pub committed_rows: Vec<Row>,
    pub in_transaction: bool,
    pub committed: bool,
    pub rolled_back: bool,
    /// Fail the insert with this 0-based index.
    pub fail_on_insert: Option<usize>,
    /// Report this affected-row count instead of 1.
    pub affected_override: Option<u64>,
    /// Report this count instead of the committed row count.
    pub count_override: Option<u64>,
}

/// Fake target sharing its state behind an `Arc` so tests can inspect it
/// after the store has been moved into the orchestrator.
#[derive(Clone, Default)]
pub struct FakeTarget {
    pub state: Arc<Mutex<FakeTargetState>>,
}

impl FakeTarget {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TargetStore for FakeTarget {
    async fn table_exists(&mut self, table: &str) -> Result<bool> {
        Ok(self.state.lock().unwrap().existing_tables.contains(table))
    }

    async fn drop_table(&mut self, table: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.existing_tables.remove(table);
        state.dropped.push(table.to_string());
        Ok(())
    }

    async fn exec_ddl(&mut self, statement: &str) -> Result<()> {
        self.state.lock().unwrap().ddl.push(statement.to_string());
        Ok(())
    }

    async fn begin(&mut self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.in_transaction = true;
        state.pending.clear();
        Ok(())
    }

    async fn insert(&mut self, _statement: &str, row: &[SqlValue]) -> Result<u64> {
        let mut state = self.state.lock().unwrap();
        if state.fail_on_insert == Some(state.pending.len()) {
            return Err(MigrateError::transfer("fake", "injected insert failure"));
        }
        state.pending.push(row.to_vec());
        Ok(state.affected_override.unwrap_or(1))
    }

    async fn commit(&mut self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let pending = std::mem::take(&mut state.pending);
        state.committed_rows.extend(pending);
        state.in_transaction = false;
        state.committed = true;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.pending.clear();
        state.in_transaction = false;
        state.rolled_back = true;
        Ok(())
    }

    async fn count(&mut self, _table: &str) -> Result<u64> {
        let state = self.state.lock().unwrap();
        Ok(state
            .count_override
            .unwrap_or(state.committed_rows.len() as u64))
    }
}
