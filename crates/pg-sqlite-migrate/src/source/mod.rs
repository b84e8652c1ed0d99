//! Source database implementations.

mod postgres;

pub use postgres::PgCatalog;
