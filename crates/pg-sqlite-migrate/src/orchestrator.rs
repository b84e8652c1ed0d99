//! Migration orchestration.
//!
//! Split into two phases so the caller can interpose a confirmation prompt:
//! [`Orchestrator::plan`] is read-only (validation, introspection, DDL
//! rendering, row estimate) and [`Orchestrator::execute`] mutates the target
//! (optional drop, create, transfer, verification).

use std::collections::HashSet;
use std::time::Instant;

use serde::Serialize;
use tracing::info;

use crate::catalog::{SourceCatalog, TargetStore};
use crate::ddl;
use crate::error::{MigrateError, Result};
use crate::introspect;
use crate::progress::ProgressSink;
use crate::schema::TableSchema;
use crate::transfer::{self, TransferConfig};
use crate::verify;

/// Operator-supplied migration options.
#[derive(Debug, Clone)]
pub struct MigrationOptions {
    /// Table to migrate; same name on source and target.
    pub table: String,

    /// Source namespace qualifier for introspection queries.
    pub namespace: Option<String>,

    /// Columns excluded from both DDL and transfer.
    pub ignored_columns: Vec<String>,

    /// Drop a pre-existing target table instead of failing.
    pub drop_existing: bool,

    /// Emit SQLite strict typing mode in the DDL.
    pub strict: bool,

    /// Reconcile row counts after the transfer.
    pub verify: bool,

    /// Row channel capacity of the transfer pipeline.
    pub channel_capacity: usize,
}

impl MigrationOptions {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            namespace: None,
            ignored_columns: Vec::new(),
            drop_existing: false,
            strict: false,
            verify: true,
            channel_capacity: TransferConfig::default().channel_capacity,
        }
    }
}

/// Everything decided before any target mutation: the introspected schema,
/// the rendered DDL, and the approximate source row count.
#[derive(Debug, Clone)]
pub struct MigrationPlan {
    pub schema: TableSchema,
    pub ddl: String,
    pub row_estimate: u64,
}

/// Final result of a migration run.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationResult {
    pub table: String,
    pub rows_transferred: u64,
    pub row_estimate: u64,
    pub duration_seconds: f64,
    pub verified: bool,
}

impl MigrationResult {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Owns both store handles and drives the migration end to end.
pub struct Orchestrator {
    source: Box<dyn SourceCatalog>,
    target: Box<dyn TargetStore>,
    options: MigrationOptions,
}

impl Orchestrator {
    pub fn new(
        source: Box<dyn SourceCatalog>,
        target: Box<dyn TargetStore>,
        options: MigrationOptions,
    ) -> Self {
        Self {
            source,
            target,
            options,
        }
    }

    /// Validate the target state and build the migration plan. No DDL or
    /// data is touched.
    pub async fn plan(&mut self) -> Result<MigrationPlan> {
        let table = self.options.table.clone();

        if !self.options.drop_existing && self.target.table_exists(&table).await? {
            return Err(MigrateError::TableAlreadyExists(table));
        }

        let ignored: HashSet<String> = self.options.ignored_columns.iter().cloned().collect();
        let schema = introspect::fetch_schema(
            &*self.source,
            &table,
            self.options.namespace.as_deref(),
            &ignored,
        )
        .await?;

        let ddl = ddl::build_create_table(&schema, self.options.strict)?;
        let row_estimate = self.source.row_estimate(&table).await?;

        Ok(MigrationPlan {
            schema,
            ddl,
            row_estimate,
        })
    }

    /// Create the target table and run the transfer, then reconcile counts
    /// when verification is enabled.
    pub async fn execute(
        &mut self,
        plan: &MigrationPlan,
        progress: &dyn ProgressSink,
    ) -> Result<MigrationResult> {
        let start = Instant::now();
        let table = self.options.table.clone();

        if self.options.drop_existing {
            self.target.drop_table(&table).await?;
        }
        self.target.exec_ddl(&plan.ddl).await?;
        info!(table = %table, "created target table");

        let stats = transfer::execute(
            &*self.source,
            &mut *self.target,
            &plan.schema,
            progress,
            &TransferConfig {
                channel_capacity: self.options.channel_capacity,
            },
        )
        .await?;

        if self.options.verify {
            verify::reconcile(&mut *self.target, &table, stats.rows).await?;
        }

        Ok(MigrationResult {
            table,
            rows_transferred: stats.rows,
            row_estimate: plan.row_estimate,
            duration_seconds: start.elapsed().as_secs_f64(),
            verified: self.options.verify,
        })
    }
}
