//! PostgreSQL source: catalog introspection and row streaming.

use std::sync::Arc;

use async_trait::async_trait;
use futures::{pin_mut, TryStreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_postgres::{Client, NoTls};
use tracing::{debug, warn};

use crate::catalog::{SelectPlan, SourceCatalog};
use crate::error::{MigrateError, Result};
use crate::schema::ForeignKeyRef;
use crate::value::{Row, SqlValue, ValueKind};

const COLUMNS_SQL: &str = "SELECT column_name, data_type \
     FROM information_schema.columns \
     WHERE table_name = $1 \
     ORDER BY ordinal_position";

const COLUMNS_IN_SCHEMA_SQL: &str = "SELECT column_name, data_type \
     FROM information_schema.columns \
     WHERE table_name = $1 AND table_schema = $2 \
     ORDER BY ordinal_position";

const PRIMARY_KEY_SQL: &str = "SELECT kcu.column_name \
     FROM information_schema.table_constraints tc \
     JOIN information_schema.key_column_usage kcu \
       ON kcu.constraint_name = tc.constraint_name \
      AND kcu.table_schema = tc.table_schema \
     WHERE tc.constraint_type = 'PRIMARY KEY' AND tc.table_name = $1 \
     ORDER BY kcu.ordinal_position";

const PRIMARY_KEY_IN_SCHEMA_SQL: &str = "SELECT kcu.column_name \
     FROM information_schema.table_constraints tc \
     JOIN information_schema.key_column_usage kcu \
       ON kcu.constraint_name = tc.constraint_name \
      AND kcu.table_schema = tc.table_schema \
     WHERE tc.constraint_type = 'PRIMARY KEY' \
       AND tc.table_name = $1 AND tc.table_schema = $2 \
     ORDER BY kcu.ordinal_position";

const FOREIGN_KEYS_SQL: &str = "SELECT kcu.column_name, ccu.table_name, ccu.column_name \
     FROM information_schema.table_constraints tc \
     JOIN information_schema.key_column_usage kcu \
       ON kcu.constraint_name = tc.constraint_name \
      AND kcu.table_schema = tc.table_schema \
     JOIN information_schema.constraint_column_usage ccu \
       ON ccu.constraint_name = tc.constraint_name \
      AND ccu.table_schema = tc.table_schema \
     WHERE tc.constraint_type = 'FOREIGN KEY' AND tc.table_name = $1";

const FOREIGN_KEYS_IN_SCHEMA_SQL: &str = "SELECT kcu.column_name, ccu.table_name, ccu.column_name \
     FROM information_schema.table_constraints tc \
     JOIN information_schema.key_column_usage kcu \
       ON kcu.constraint_name = tc.constraint_name \
      AND kcu.table_schema = tc.table_schema \
     JOIN information_schema.constraint_column_usage ccu \
       ON ccu.constraint_name = tc.constraint_name \
      AND ccu.table_schema = tc.table_schema \
     WHERE tc.constraint_type = 'FOREIGN KEY' \
       AND tc.table_name = $1 AND tc.table_schema = $2";

const ROW_ESTIMATE_SQL: &str =
    "SELECT reltuples::bigint AS estimate FROM pg_class WHERE relname = $1 LIMIT 1";

/// PostgreSQL source catalog over a single connection.
pub struct PgCatalog {
    client: Arc<Client>,
}

impl PgCatalog {
    /// Connect and validate the source connection. The background connection
    /// task lives until the client is dropped.
    pub async fn connect(url: &str) -> Result<Self> {
        let (client, connection) = tokio_postgres::connect(url, NoTls).await.map_err(|e| {
            MigrateError::connection("source", format!("unable to connect to Postgres database: {}", e))
        })?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                warn!("Postgres connection error: {}", e);
            }
        });

        Ok(Self {
            client: Arc::new(client),
        })
    }
}

#[async_trait]
impl SourceCatalog for PgCatalog {
    async fn columns(&self, table: &str, namespace: Option<&str>) -> Result<Vec<(String, String)>> {
        let rows = match namespace {
            Some(ns) => self.client.query(COLUMNS_IN_SCHEMA_SQL, &[&table, &ns]).await?,
            None => self.client.query(COLUMNS_SQL, &[&table]).await?,
        };

        Ok(rows
            .iter()
            .map(|r| (r.get::<_, String>(0), r.get::<_, String>(1)))
            .collect())
    }

    async fn primary_key(&self, table: &str, namespace: Option<&str>) -> Result<Vec<String>> {
        let rows = match namespace {
            Some(ns) => {
                self.client
                    .query(PRIMARY_KEY_IN_SCHEMA_SQL, &[&table, &ns])
                    .await?
            }
            None => self.client.query(PRIMARY_KEY_SQL, &[&table]).await?,
        };

        Ok(rows.iter().map(|r| r.get::<_, String>(0)).collect())
    }

    async fn foreign_keys(
        &self,
        table: &str,
        namespace: Option<&str>,
    ) -> Result<Vec<(String, ForeignKeyRef)>> {
        let rows = match namespace {
            Some(ns) => {
                self.client
                    .query(FOREIGN_KEYS_IN_SCHEMA_SQL, &[&table, &ns])
                    .await?
            }
            None => self.client.query(FOREIGN_KEYS_SQL, &[&table]).await?,
        };

        Ok(rows
            .iter()
            .map(|r| {
                (
                    r.get::<_, String>(0),
                    ForeignKeyRef {
                        table: r.get::<_, String>(1),
                        column: r.get::<_, String>(2),
                    },
                )
            })
            .collect())
    }

    async fn row_estimate(&self, table: &str) -> Result<u64> {
        let row = self
            .client
            .query_opt(ROW_ESTIMATE_SQL, &[&table])
            .await?
            .ok_or_else(|| MigrateError::TableNotFound(table.to_string()))?;

        // reltuples is -1 for never-analyzed tables
        let estimate: i64 = row.get(0);
        Ok(estimate.max(0) as u64)
    }

    fn stream_rows(
        &self,
        plan: SelectPlan,
        capacity: usize,
    ) -> (mpsc::Receiver<Result<Row>>, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity);
        let client = Arc::clone(&self.client);

        let handle = tokio::spawn(async move {
            let stream = match client
                .query_raw(plan.statement.as_str(), Vec::<i32>::new())
                .await
            {
                Ok(stream) => stream,
                Err(e) => {
                    let _ = tx.send(Err(e.into())).await;
                    return;
                }
            };
            pin_mut!(stream);

            let mut produced: u64 = 0;
            loop {
                match stream.try_next().await {
                    Ok(Some(row)) => {
                        let decoded = decode_row(&row, &plan.kinds);
                        let stop = decoded.is_err();
                        if tx.send(decoded).await.is_err() || stop {
                            break;
                        }
                        produced += 1;
                    }
                    Ok(None) => break,
                    Err(e) => {
                        let _ = tx.send(Err(e.into())).await;
                        break;
                    }
                }
            }
            debug!(rows = produced, "source cursor closed");
        });

        (rx, handle)
    }
}

/// Decode one driver row positionally using the plan's value kinds.
fn decode_row(row: &tokio_postgres::Row, kinds: &[ValueKind]) -> Result<Row> {
    kinds
        .iter()
        .enumerate()
        .map(|(idx, kind)| decode_value(row, idx, *kind))
        .collect()
}

fn decode_value(row: &tokio_postgres::Row, idx: usize, kind: ValueKind) -> Result<SqlValue> {
    let value = match kind {
        ValueKind::SmallInt => row.try_get::<_, Option<i16>>(idx)?.map(SqlValue::SmallInt),
        ValueKind::Int => row.try_get::<_, Option<i32>>(idx)?.map(SqlValue::Int),
        ValueKind::BigInt => row.try_get::<_, Option<i64>>(idx)?.map(SqlValue::BigInt),
        ValueKind::Real => row.try_get::<_, Option<f32>>(idx)?.map(SqlValue::Real),
        ValueKind::Double => row.try_get::<_, Option<f64>>(idx)?.map(SqlValue::Double),
        ValueKind::Bool => row.try_get::<_, Option<bool>>(idx)?.map(SqlValue::Bool),
        ValueKind::Bytes => row.try_get::<_, Option<Vec<u8>>>(idx)?.map(SqlValue::Bytes),
        ValueKind::Text => row.try_get::<_, Option<String>>(idx)?.map(SqlValue::Text),
    };
    Ok(value.unwrap_or(SqlValue::Null))
}
