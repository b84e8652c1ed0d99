//! Console rendering of the migration plan.

use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use pg_sqlite_migrate::{typemap, TableSchema};

/// Render the introspected schema as a preview table: source type, mapped
/// SQLite storage class, and any attributes worth the operator's attention.
pub fn schema_preview(schema: &TableSchema) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Column", "Postgres type", "SQLite type", "Attributes"]);

    for column in &schema.columns {
        let mapped = typemap::map_type(&column.source_type).unwrap_or("?");

        let mut attrs = Vec::new();
        if column.is_primary_key {
            attrs.push("primary key".to_string());
        }
        if column.ignored {
            attrs.push("ignored".to_string());
        }
        if let Some(fk) = &column.foreign_key {
            attrs.push(format!("references {}({})", fk.table, fk.column));
        }

        table.add_row(vec![
            column.name.clone(),
            column.source_type.clone(),
            mapped.to_string(),
            attrs.join(", "),
        ]);
    }

    table
}
