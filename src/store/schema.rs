//! SQL schema for the index store (spec §6 "Persisted state").
//!
//! Applied once via [`apply`] with `execute_batch`, in the teacher's
//! export-schema style: one DDL string, no migration framework. This
//! engine has a single schema version, so there is nothing to migrate
//! between yet.

use rusqlite::Connection;

use crate::error::Result;

// ON DELETE CASCADE below requires PRAGMA foreign_keys = ON for the
// lifetime of the connection (spec §3: deleting a Source cascades to its
// Symbols, deleting a Symbol cascades to its Windows).
const DDL: &str = r#"
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS projects (
    id              INTEGER PRIMARY KEY,
    name            TEXT NOT NULL,
    repository_url  TEXT
);

CREATE TABLE IF NOT EXISTS versions (
    id          INTEGER PRIMARY KEY,
    project_id  INTEGER NOT NULL REFERENCES projects(id),
    name        TEXT NOT NULL,
    platform    INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS objects (
    id            INTEGER PRIMARY KEY,
    hash          TEXT NOT NULL UNIQUE,
    storage_path  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS sources (
    id          INTEGER PRIMARY KEY,
    slug        TEXT NOT NULL UNIQUE,
    project_id  INTEGER NOT NULL REFERENCES projects(id),
    object_id   INTEGER NOT NULL REFERENCES objects(id),
    version_id  INTEGER REFERENCES versions(id),
    name        TEXT NOT NULL,
    upstream    TEXT
);

CREATE TABLE IF NOT EXISTS symbols (
    id              INTEGER PRIMARY KEY,
    slug            TEXT NOT NULL UNIQUE,
    source_id       INTEGER NOT NULL REFERENCES sources(id) ON DELETE CASCADE,
    name            TEXT NOT NULL,
    symbol_idx      INTEGER NOT NULL,
    len             INTEGER NOT NULL,
    is_decompiled   INTEGER NOT NULL,
    fp_opcode       INTEGER NOT NULL,
    fp_equiv        INTEGER NOT NULL,
    fp_exact        INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS windows (
    id          INTEGER PRIMARY KEY,
    symbol_id   INTEGER NOT NULL REFERENCES symbols(id) ON DELETE CASCADE,
    pos         INTEGER NOT NULL,
    hash        INTEGER NOT NULL
);

-- Three fingerprint indexes, one per fidelity (spec §6).
CREATE INDEX IF NOT EXISTS idx_symbols_fp_opcode ON symbols(fp_opcode);
CREATE INDEX IF NOT EXISTS idx_symbols_fp_equiv  ON symbols(fp_equiv);
CREATE INDEX IF NOT EXISTS idx_symbols_fp_exact  ON symbols(fp_exact);
CREATE INDEX IF NOT EXISTS idx_symbols_source    ON symbols(source_id);
CREATE INDEX IF NOT EXISTS idx_symbols_name      ON symbols(name);

-- The submatch hot path: anchor self-join by hash, plus bulk deletion by symbol.
CREATE INDEX IF NOT EXISTS idx_windows_hash            ON windows(hash);
CREATE INDEX IF NOT EXISTS idx_windows_symbol          ON windows(symbol_id);
CREATE INDEX IF NOT EXISTS idx_windows_hash_symbol     ON windows(hash, symbol_id);
"#;

pub fn apply(conn: &Connection) -> Result<()> {
    conn.execute_batch(DDL)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ddl_applies_cleanly_and_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        apply(&conn).unwrap();
        apply(&conn).unwrap();
    }
}
