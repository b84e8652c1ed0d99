//! Error types for the migration library.

use thiserror::Error;

/// Main error type for migration operations.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Source or target store unreachable before any DDL or data was touched.
    #[error("Connection to {store} failed: {message}")]
    Connection { store: String, message: String },

    /// Source table absent (or introspected with zero columns).
    #[error("table {0} doesn't exist in Postgres")]
    TableNotFound(String),

    /// Target table collision without permission to drop it.
    #[error("sqlite table {0} already exists (use --drop-table-if-exists to replace it)")]
    TableAlreadyExists(String),

    /// Type mapping table is missing even its default entry.
    #[error("Type mapping error: {0}")]
    TypeMapping(String),

    /// The data query matched zero rows.
    #[error("no rows in source table {0} found")]
    EmptySource(String),

    /// Data transfer failed; the whole transaction was rolled back.
    #[error("Transfer failed for table {table}: {message}")]
    Transfer { table: String, message: String },

    /// Post-transfer row count reconciliation failed. The data is already
    /// committed, so this is reported distinctly instead of rolling back.
    #[error(
        "Verification failed for table {table}: transferred {transferred} rows but target counts {actual}"
    )]
    Verification {
        table: String,
        transferred: u64,
        actual: u64,
    },

    /// Migration was cancelled at the confirmation prompt.
    #[error("Migration cancelled")]
    Cancelled,

    /// Source database error.
    #[error("Source database error: {0}")]
    Source(#[from] tokio_postgres::Error),

    /// Target database error.
    #[error("Target database error: {0}")]
    Target(#[from] sqlx::Error),

    /// IO error (file operations, prompts).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MigrateError {
    /// Create a Connection error for the named store ("source" or "target").
    pub fn connection(store: impl Into<String>, message: impl Into<String>) -> Self {
        MigrateError::Connection {
            store: store.into(),
            message: message.into(),
        }
    }

    /// Create a Transfer error.
    pub fn transfer(table: impl Into<String>, message: impl Into<String>) -> Self {
        MigrateError::Transfer {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Process exit code for this error. Verification mismatch is the one
    /// failure mode with its own exit status, since the data is committed
    /// and the operator needs to distinguish it from a failed transfer.
    pub fn exit_code(&self) -> u8 {
        match self {
            MigrateError::Verification { .. } => 3,
            _ => 1,
        }
    }

    /// Format error with full details including error chain.
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\n\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;
