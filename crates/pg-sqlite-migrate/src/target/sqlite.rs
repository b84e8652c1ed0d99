//! SQLite target store backed by sqlx.

use std::path::Path;

use async_trait::async_trait;
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Transaction;

use crate::catalog::TargetStore;
use crate::ddl::quote_ident;
use crate::error::{MigrateError, Result};
use crate::value::SqlValue;

/// SQLite target over a single connection. The transfer transaction is held
/// here between `begin` and `commit`/`rollback`; sqlx caches the prepared
/// insert statement on the connection, so repeated inserts do not re-parse.
#[derive(Debug)]
pub struct SqliteTarget {
    pool: SqlitePool,
    tx: Option<Transaction<'static, Sqlite>>,
}

impl SqliteTarget {
    /// Open and validate an existing SQLite database file. The file must
    /// already exist: creating a brand-new database is left to the operator
    /// so a typo in the path does not silently migrate into a fresh file.
    pub async fn connect(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(MigrateError::connection(
                "target",
                format!("unable to access sqlite3 file: {}", path.display()),
            ));
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(false);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| {
                MigrateError::connection(
                    "target",
                    format!("unable to open sqlite3 database: {}", e),
                )
            })?;

        sqlx::query("SELECT 1").execute(&pool).await.map_err(|e| {
            MigrateError::connection("target", format!("unable to ping sqlite3 database: {}", e))
        })?;

        Ok(Self { pool, tx: None })
    }
}

#[async_trait]
impl TargetStore for SqliteTarget {
    async fn table_exists(&mut self, table: &str) -> Result<bool> {
        let found: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?")
                .bind(table)
                .fetch_optional(&self.pool)
                .await?;
        Ok(found.is_some())
    }

    async fn drop_table(&mut self, table: &str) -> Result<()> {
        sqlx::query(&format!("DROP TABLE IF EXISTS {}", quote_ident(table)))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn exec_ddl(&mut self, statement: &str) -> Result<()> {
        sqlx::query(statement).execute(&self.pool).await?;
        Ok(())
    }

    async fn begin(&mut self) -> Result<()> {
        self.tx = Some(self.pool.begin().await?);
        Ok(())
    }

    async fn insert(&mut self, statement: &str, row: &[SqlValue]) -> Result<u64> {
        let tx = self
            .tx
            .as_mut()
            .ok_or_else(|| MigrateError::transfer("", "insert outside of a transaction"))?;

        let mut query = sqlx::query(statement);
        for value in row {
            query = bind_value(query, value);
        }

        Ok(query.execute(&mut **tx).await?.rows_affected())
    }

    async fn commit(&mut self) -> Result<()> {
        match self.tx.take() {
            Some(tx) => {
                tx.commit().await?;
                Ok(())
            }
            None => Err(MigrateError::transfer("", "commit without a transaction")),
        }
    }

    async fn rollback(&mut self) -> Result<()> {
        match self.tx.take() {
            Some(tx) => {
                tx.rollback().await?;
                Ok(())
            }
            None => Err(MigrateError::transfer("", "rollback without a transaction")),
        }
    }

    async fn count(&mut self, table: &str) -> Result<u64> {
        let count: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", quote_ident(table)))
                .fetch_one(&self.pool)
                .await?;
        Ok(count as u64)
    }
}

fn bind_value<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &'q SqlValue,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        SqlValue::Null => query.bind(None::<String>),
        SqlValue::SmallInt(v) => query.bind(*v),
        SqlValue::Int(v) => query.bind(*v),
        SqlValue::BigInt(v) => query.bind(*v),
        SqlValue::Real(v) => query.bind(*v),
        SqlValue::Double(v) => query.bind(*v),
        SqlValue::Bool(v) => query.bind(*v),
        SqlValue::Text(v) => query.bind(v.as_str()),
        SqlValue::Bytes(v) => query.bind(v.as_slice()),
    }
}
