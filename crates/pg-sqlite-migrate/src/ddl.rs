//! `CREATE TABLE` generation for the target database.

use crate::error::Result;
use crate::schema::TableSchema;
use crate::typemap;

/// Quote an identifier, escaping embedded double quotes.
///
/// Identifiers cannot be passed as statement parameters, so quoting is the
/// only way to tolerate reserved words and mixed case in dynamic SQL.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Render the `CREATE TABLE` statement for the mapped schema.
///
/// Ignored columns are dropped, each remaining type is mapped through the
/// type table, and a `PRIMARY KEY (...)` clause is appended when at least
/// one transferred column carries the source primary key. `strict` appends
/// SQLite's strict typing mode.
pub fn build_create_table(schema: &TableSchema, strict: bool) -> Result<String> {
    let mut defs = Vec::new();
    for col in schema.transfer_columns() {
        let target_type = typemap::map_type(&col.source_type)?;
        defs.push(format!("{} {}", quote_ident(&col.name), target_type));
    }

    let pk = schema.primary_key();
    if !pk.is_empty() {
        defs.push(format!("PRIMARY KEY ({})", pk.join(", ")));
    }

    let mut statement = format!(
        "CREATE TABLE {} ( {} )",
        quote_ident(&schema.name),
        defs.join(", ")
    );
    if strict {
        statement.push_str(" STRICT");
    }

    Ok(statement)
}
