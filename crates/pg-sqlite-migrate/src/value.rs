//! Row values and the per-type cast rules used to build the SELECT projection.
//!
//! Types that cannot round-trip as native driver values (json, arrays, uuid,
//! timestamps, anything else exotic) are cast to text at the source, so the
//! target always receives a plain string for them.

/// One value of a transferred row.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    SmallInt(i16),
    Int(i32),
    BigInt(i64),
    Real(f32),
    Double(f64),
    Bool(bool),
    Text(String),
    Bytes(Vec<u8>),
}

/// One row of the source result set, positionally aligned to the
/// non-ignored columns of the table schema.
pub type Row = Vec<SqlValue>;

/// How a projected column is decoded from the source driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    SmallInt,
    Int,
    BigInt,
    Real,
    Double,
    Bool,
    Bytes,
    Text,
}

/// Projection rule for one source type: how to select the column and how to
/// decode the result.
#[derive(Debug, Clone, Copy)]
pub struct CastRule {
    pub source_type: &'static str,
    pub kind: ValueKind,
    /// SELECT expression template; `{col}` is replaced with the quoted
    /// column name.
    pub template: &'static str,
}

/// Types that survive the wire as native values. Everything else is cast to
/// text at the source via [`DEFAULT_CAST`].
static CAST_RULES: &[CastRule] = &[
    CastRule {
        source_type: "smallint",
        kind: ValueKind::SmallInt,
        template: "{col}",
    },
    CastRule {
        source_type: "integer",
        kind: ValueKind::Int,
        template: "{col}",
    },
    CastRule {
        source_type: "bigint",
        kind: ValueKind::BigInt,
        template: "{col}",
    },
    CastRule {
        source_type: "real",
        kind: ValueKind::Real,
        template: "{col}",
    },
    CastRule {
        source_type: "double precision",
        kind: ValueKind::Double,
        template: "{col}",
    },
    // numeric has arbitrary precision; it maps to REAL on the target, so the
    // precision loss is accepted and made explicit here.
    CastRule {
        source_type: "numeric",
        kind: ValueKind::Double,
        template: "{col}::float8",
    },
    CastRule {
        source_type: "boolean",
        kind: ValueKind::Bool,
        template: "{col}",
    },
    CastRule {
        source_type: "bytea",
        kind: ValueKind::Bytes,
        template: "{col}",
    },
];

const DEFAULT_CAST: CastRule = CastRule {
    source_type: "",
    kind: ValueKind::Text,
    template: "{col}::text",
};

/// Look up the projection rule for a source type.
pub fn cast_rule(source_type: &str) -> CastRule {
    CAST_RULES
        .iter()
        .copied()
        .find(|r| r.source_type == source_type)
        .unwrap_or(DEFAULT_CAST)
}

/// Render a cast template against a quoted column reference.
pub fn render_cast(template: &str, quoted_col: &str) -> String {
    template.replace("{col}", quoted_col)
}
