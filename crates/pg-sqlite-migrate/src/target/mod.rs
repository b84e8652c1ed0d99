//! Target database implementations.

mod sqlite;

pub use sqlite::SqliteTarget;
