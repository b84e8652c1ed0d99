//! Type mapping between PostgreSQL catalog type names and SQLite column types.

use crate::error::{MigrateError, Result};

/// Fallback entry used for any source type without an explicit mapping.
const DEFAULT_TYPE: &str = "__other";

/// Static mapping from `information_schema` type names to SQLite types.
/// Lookup is case-sensitive and exact.
static TYPE_MAP: &[(&str, &str)] = &[
    ("integer", "INTEGER"),
    ("smallint", "INTEGER"),
    ("numeric", "REAL"),
    ("date", "TEXT"),
    ("array", "TEXT"),
    ("character", "TEXT"),
    ("character varying", "TEXT"),
    ("timestamp with time zone", "TEXT"),
    (DEFAULT_TYPE, "TEXT"),
];

/// Map a PostgreSQL type name to a SQLite column type.
///
/// Unknown types fall back to the `__other` entry. This only fails when the
/// fallback entry itself is missing from the table, which indicates a defect
/// in the table, not bad user input.
pub fn map_type(source_type: &str) -> Result<&'static str> {
    let lookup = |key: &str| {
        TYPE_MAP
            .iter()
            .find(|(from, _)| *from == key)
            .map(|(_, to)| *to)
    };

    lookup(source_type)
        .or_else(|| lookup(DEFAULT_TYPE))
        .ok_or_else(|| {
            MigrateError::TypeMapping(format!(
                "type {} could not be mapped and no default entry exists, this should not happen",
                source_type
            ))
        })
}
