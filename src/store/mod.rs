//! Index Store (spec §4.3): SQL schema plus the `rusqlite`-backed
//! implementation that keeps it to plain storage and indexed lookups.

pub mod schema;
pub mod sqlite;

pub use sqlite::{FullMatches, NewSource, NewSymbol, SqliteStore};
