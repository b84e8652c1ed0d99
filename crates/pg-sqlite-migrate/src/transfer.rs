//! Streaming transfer engine.
//!
//! Exactly two tasks run concurrently: the producer (spawned by the source
//! catalog) streams rows into a bounded channel, and the consumer drains it
//! into one target transaction. Backpressure comes from the channel bound;
//! ordering from the single-reader FIFO. Commit happens only after the
//! channel is fully drained; any insert error or in-band producer error
//! rolls the whole transaction back, so a failed run leaves zero rows behind.

use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::catalog::{SelectPlan, SourceCatalog, TargetStore};
use crate::ddl::quote_ident;
use crate::error::{MigrateError, Result};
use crate::progress::ProgressSink;
use crate::schema::TableSchema;
use crate::value::{cast_rule, render_cast};

/// Transfer engine configuration.
#[derive(Debug, Clone)]
pub struct TransferConfig {
    /// Bounded row channel capacity; also the number of rows the producer
    /// may run ahead of the consumer.
    pub channel_capacity: usize,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 10_000,
        }
    }
}

/// Outcome of a completed transfer.
#[derive(Debug, Clone)]
pub struct TransferStats {
    /// Authoritative count of transferred rows, independent of the
    /// pre-transfer estimate.
    pub rows: u64,
    pub elapsed: Duration,
}

/// Build the source SELECT over the non-ignored columns, applying the
/// per-type cast expressions so non-native values arrive as text.
pub fn build_select(schema: &TableSchema) -> SelectPlan {
    let mut exprs = Vec::new();
    let mut kinds = Vec::new();
    for col in schema.transfer_columns() {
        let rule = cast_rule(&col.source_type);
        exprs.push(render_cast(rule.template, &quote_ident(&col.name)));
        kinds.push(rule.kind);
    }

    SelectPlan {
        statement: format!(
            "SELECT {} FROM {}",
            exprs.join(", "),
            quote_ident(&schema.name)
        ),
        kinds,
    }
}

/// Build the positional-placeholder INSERT sized to the transferred columns.
pub fn build_insert(schema: &TableSchema) -> String {
    let cols: Vec<String> = schema
        .transfer_columns()
        .map(|c| quote_ident(&c.name))
        .collect();
    let placeholders: Vec<&str> = cols.iter().map(|_| "?").collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(&schema.name),
        cols.join(", "),
        placeholders.join(", ")
    )
}

/// Stream all rows of the table from source to target inside one target
/// transaction.
///
/// Fails with [`MigrateError::EmptySource`] when the query matches zero
/// rows, and rolls back (never committing partially) on any insert or
/// producer error. Progress is incremented once per inserted row.
pub async fn execute(
    source: &dyn SourceCatalog,
    target: &mut dyn TargetStore,
    schema: &TableSchema,
    progress: &dyn ProgressSink,
    config: &TransferConfig,
) -> Result<TransferStats> {
    let start = Instant::now();
    let plan = build_select(schema);
    let insert_sql = build_insert(schema);

    info!(table = %schema.name, "starting transfer: {}", plan.statement);

    let (mut rx, producer) = source.stream_rows(plan, config.channel_capacity);

    target.begin().await?;

    let mut inserted: u64 = 0;
    let mut failure: Option<MigrateError> = None;

    while let Some(item) = rx.recv().await {
        match item {
            Ok(row) => match target.insert(&insert_sql, &row).await {
                Ok(1) => {
                    inserted += 1;
                    progress.increment();
                }
                Ok(affected) => {
                    failure = Some(MigrateError::transfer(
                        &schema.name,
                        format!(
                            "insert affected {} rows instead of exactly 1, this should not happen",
                            affected
                        ),
                    ));
                    break;
                }
                Err(e) => {
                    failure = Some(MigrateError::transfer(
                        &schema.name,
                        format!("error inserting a row: {}", e),
                    ));
                    break;
                }
            },
            Err(e) => {
                // Producer-side read failure. Everything buffered before it
                // was already inserted; roll it all back for an atomic run.
                failure = Some(e);
                break;
            }
        }
    }

    // Unblock the producer if it is suspended on a full channel, then await
    // it so the task never outlives the transfer.
    drop(rx);
    let _ = producer.await;

    if let Some(err) = failure {
        warn!(table = %schema.name, "transfer failed, rolling back: {}", err);
        target.rollback().await?;
        return Err(err);
    }

    if inserted == 0 {
        target.rollback().await?;
        return Err(MigrateError::EmptySource(schema.name.clone()));
    }

    target.commit().await?;

    let elapsed = start.elapsed();
    info!(
        table = %schema.name,
        rows = inserted,
        "transfer committed in {:.2}s",
        elapsed.as_secs_f64()
    );

    Ok(TransferStats {
        rows: inserted,
        elapsed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoopProgress;
    use crate::schema::Column;
    use crate::testutil::{FakeCatalog, FakeTarget};
    use crate::value::SqlValue;
    use std::sync::atomic::{AtomicU64, Ordering};

    fn col(name: &str, source_type: &str) -> Column {
        Column {
            name: name.to_string(),
            source_type: source_type.to_string(),
            ignored: false,
            is_primary_key: false,
            foreign_key: None,
        }
    }

    fn schema(columns: Vec<Column>) -> TableSchema {
        TableSchema {
            name: "t".into(),
            namespace: None,
            columns,
        }
    }

    fn int_rows(values: &[i32]) -> Vec<std::result::Result<Vec<SqlValue>, String>> {
        values.iter().map(|v| Ok(vec![SqlValue::Int(*v)])).collect()
    }

    struct CountingProgress(AtomicU64);

    impl ProgressSink for CountingProgress {
        fn increment(&self) {
            self.0.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[test]
    fn test_select_skips_ignored_and_applies_casts() {
        let mut b = col("b", "integer");
        b.ignored = true;
        let s = schema(vec![col("a", "integer"), b, col("c", "jsonb")]);

        let plan = build_select(&s);
        assert_eq!(plan.statement, "SELECT \"a\", \"c\"::text FROM \"t\"");
        assert_eq!(plan.kinds.len(), 2);
    }

    #[test]
    fn test_select_casts_numeric_to_float8() {
        let plan = build_select(&schema(vec![col("amount", "numeric")]));
        assert_eq!(plan.statement, "SELECT \"amount\"::float8 FROM \"t\"");
    }

    #[test]
    fn test_insert_arity_matches_transfer_columns() {
        let mut b = col("b", "integer");
        b.ignored = true;
        let s = schema(vec![col("a", "integer"), b, col("c", "text")]);

        assert_eq!(
            build_insert(&s),
            "INSERT INTO \"t\" (\"a\", \"c\") VALUES (?, ?)"
        );
    }

    #[tokio::test]
    async fn test_rows_arrive_in_source_order() {
        let source = FakeCatalog {
            rows: int_rows(&[1, 2, 3, 4, 5]),
            ..Default::default()
        };
        let mut target = FakeTarget::new();
        let progress = CountingProgress(AtomicU64::new(0));

        let stats = execute(
            &source,
            &mut target,
            &schema(vec![col("v", "integer")]),
            &progress,
            &TransferConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(stats.rows, 5);
        assert_eq!(progress.0.load(Ordering::Relaxed), 5);

        let state = target.state.lock().unwrap();
        assert!(state.committed);
        assert!(!state.rolled_back);
        let values: Vec<&SqlValue> = state.committed_rows.iter().map(|r| &r[0]).collect();
        assert_eq!(
            values,
            vec![
                &SqlValue::Int(1),
                &SqlValue::Int(2),
                &SqlValue::Int(3),
                &SqlValue::Int(4),
                &SqlValue::Int(5)
            ]
        );
    }

    #[tokio::test]
    async fn test_backpressure_with_tiny_channel() {
        let source = FakeCatalog {
            rows: int_rows(&(0..100).collect::<Vec<_>>()),
            ..Default::default()
        };
        let mut target = FakeTarget::new();

        let stats = execute(
            &source,
            &mut target,
            &schema(vec![col("v", "integer")]),
            &NoopProgress,
            &TransferConfig {
                channel_capacity: 1,
            },
        )
        .await
        .unwrap();

        assert_eq!(stats.rows, 100);
    }

    #[tokio::test]
    async fn test_insert_failure_rolls_back_everything() {
        let source = FakeCatalog {
            rows: int_rows(&[1, 2, 3, 4]),
            ..Default::default()
        };
        let target = FakeTarget::new();
        target.state.lock().unwrap().fail_on_insert = Some(2);
        let mut store = target.clone();

        let err = execute(
            &source,
            &mut store,
            &schema(vec![col("v", "integer")]),
            &NoopProgress,
            &TransferConfig::default(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, MigrateError::Transfer { .. }));
        let state = target.state.lock().unwrap();
        assert!(state.rolled_back);
        assert!(!state.committed);
        assert!(state.committed_rows.is_empty());
        assert!(state.pending.is_empty());
    }

    #[tokio::test]
    async fn test_unexpected_affected_count_is_integrity_error() {
        let source = FakeCatalog {
            rows: int_rows(&[1]),
            ..Default::default()
        };
        let target = FakeTarget::new();
        target.state.lock().unwrap().affected_override = Some(0);
        let mut store = target.clone();

        let err = execute(
            &source,
            &mut store,
            &schema(vec![col("v", "integer")]),
            &NoopProgress,
            &TransferConfig::default(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, MigrateError::Transfer { .. }));
        assert!(err.to_string().contains("instead of exactly 1"));
        assert!(target.state.lock().unwrap().rolled_back);
    }

    #[tokio::test]
    async fn test_producer_error_inserts_buffered_rows_then_rolls_back() {
        let mut rows = int_rows(&[1, 2]);
        rows.push(Err("source connection dropped".into()));
        let source = FakeCatalog {
            rows,
            ..Default::default()
        };
        let target = FakeTarget::new();
        let mut store = target.clone();

        let err = execute(
            &source,
            &mut store,
            &schema(vec![col("v", "integer")]),
            &NoopProgress,
            &TransferConfig::default(),
        )
        .await
        .unwrap_err();

        assert!(err.to_string().contains("source connection dropped"));
        let state = target.state.lock().unwrap();
        assert!(state.rolled_back);
        assert!(state.committed_rows.is_empty());
    }

    #[tokio::test]
    async fn test_zero_rows_is_empty_source_error() {
        let source = FakeCatalog::default();
        let target = FakeTarget::new();
        let mut store = target.clone();

        let err = execute(
            &source,
            &mut store,
            &schema(vec![col("v", "integer")]),
            &NoopProgress,
            &TransferConfig::default(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, MigrateError::EmptySource(t) if t == "t"));
        let state = target.state.lock().unwrap();
        assert!(state.rolled_back);
        assert!(!state.committed);
    }
}
