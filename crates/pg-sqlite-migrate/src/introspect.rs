//! Source schema introspection.

use std::collections::HashSet;

use tracing::debug;

use crate::catalog::SourceCatalog;
use crate::error::{MigrateError, Result};
use crate::schema::{Column, TableSchema};

/// Fetch the schema of a source table.
///
/// Columns come back in ordinal order; zero columns means the table does not
/// exist. Primary key membership and foreign key references are annotated
/// afterwards. The returned schema is treated as immutable from here on.
pub async fn fetch_schema(
    catalog: &dyn SourceCatalog,
    table: &str,
    namespace: Option<&str>,
    ignored_columns: &HashSet<String>,
) -> Result<TableSchema> {
    let columns = catalog.columns(table, namespace).await?;
    if columns.is_empty() {
        return Err(MigrateError::TableNotFound(table.to_string()));
    }

    let mut schema = TableSchema {
        name: table.to_string(),
        namespace: namespace.map(str::to_string),
        columns: columns
            .into_iter()
            .map(|(name, source_type)| {
                let ignored = ignored_columns.contains(&name);
                Column {
                    name,
                    source_type,
                    ignored,
                    is_primary_key: false,
                    foreign_key: None,
                }
            })
            .collect(),
    };

    let pk = catalog.primary_key(table, namespace).await?;
    for col in &mut schema.columns {
        if pk.iter().any(|p| p == &col.name) {
            col.is_primary_key = true;
        }
    }

    for (col_name, reference) in catalog.foreign_keys(table, namespace).await? {
        if let Some(col) = schema.columns.iter_mut().find(|c| c.name == col_name) {
            col.foreign_key = Some(reference);
        }
    }

    debug!(
        table,
        columns = schema.columns.len(),
        primary_key = pk.len(),
        "introspected source schema"
    );

    Ok(schema)
}
