//! Schema metadata types for the table being migrated.
//!
//! A [`TableSchema`] is built once by the introspector and never mutated
//! afterwards; the DDL generator and the transfer pipeline derive their own
//! views (mapped types, ignored columns dropped) so the original always
//! reflects what the source catalog reported.

use serde::{Deserialize, Serialize};

/// Informational foreign key reference. Not enforced or rendered in target
/// DDL; shown in the schema preview only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyRef {
    /// Referenced table name.
    pub table: String,

    /// Referenced column name.
    pub column: String,
}

/// One source table column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    /// Column name, unique within the table.
    pub name: String,

    /// Raw type name as reported by the source catalog.
    pub source_type: String,

    /// Operator-requested exclusion from both DDL and data transfer.
    pub ignored: bool,

    /// Whether the column belongs to the source primary key.
    pub is_primary_key: bool,

    /// Informational foreign key descriptor.
    pub foreign_key: Option<ForeignKeyRef>,
}

/// The table being migrated. Column order is the source ordinal order and is
/// the binding contract between DDL, SELECT projection, and INSERT values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSchema {
    /// Table name, identical on source and target.
    pub name: String,

    /// Source namespace qualifier, used only for introspection queries.
    pub namespace: Option<String>,

    /// Columns in source ordinal order. Never empty: a table introspected
    /// with zero columns is treated as not existing.
    pub columns: Vec<Column>,
}

impl TableSchema {
    /// Columns that take part in DDL and data transfer, in ordinal order.
    pub fn transfer_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| !c.ignored)
    }

    /// Primary key column names among the transferred columns, in declared
    /// order. A primary key column on the ignore list drops out of the
    /// constraint as well.
    pub fn primary_key(&self) -> Vec<&str> {
        self.transfer_columns()
            .filter(|c| c.is_primary_key)
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Whether any transferred column is part of the primary key.
    pub fn has_primary_key(&self) -> bool {
        self.transfer_columns().any(|c| c.is_primary_key)
    }
}
