//! `SqliteStore`: the Index Store (spec §4.3) backed by `rusqlite`.
//!
//! Kept to plain storage and indexed point/range lookups — the submatch
//! diagonal-grouping algorithm itself lives in [`crate::submatch`], not in
//! SQL (see DESIGN.md Open Question 1). Wrapped in `Arc<parking_lot::Mutex<_>>`
//! so [`crate::service`] can drive it from `tokio::task::spawn_blocking`
//! without a connection-pool crate this corpus never reaches for.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{Result, SymhoundError};
use crate::instruction::Instruction;
use crate::model::{
    Fingerprints, ObjectRow, PlatformTag, Project, Source, SourceMeta, Symbol, SymbolMeta,
    SLUG_MAX_ATTEMPTS,
};
use crate::store::schema;
use crate::window;

/// One symbol as handed to [`SqliteStore::insert_source`]: its metadata,
/// precomputed fingerprints, the equivalence-hash stream used to derive
/// Windows, and its raw instructions for later rehydration.
pub struct NewSymbol {
    pub name: String,
    pub symbol_idx: i64,
    pub is_decompiled: bool,
    pub len: i64,
    pub fingerprints: Fingerprints,
    pub equiv_hashes: Vec<u64>,
    pub instructions: Vec<Instruction>,
}

/// Everything needed to materialize a Source ingestion in one transaction.
pub struct NewSource {
    pub project_name: String,
    pub project_repository_url: Option<String>,
    pub version_name: Option<String>,
    pub platform: Option<PlatformTag>,
    pub object_hash: String,
    pub object_storage_path: String,
    pub source_name: String,
    pub upstream: Option<String>,
    pub symbols: Vec<NewSymbol>,
}

/// Three independently-computed full-match buckets (spec §4.5, §9).
#[derive(Debug, Default, Clone, serde::Serialize)]
pub struct FullMatches {
    pub exact: Vec<SymbolMeta>,
    pub equivalent: Vec<SymbolMeta>,
    pub opcode: Vec<SymbolMeta>,
}

pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    blob_root: PathBuf,
    window_width: usize,
    hash_seed: u64,
    max_anchor_count: usize,
}

impl SqliteStore {
    pub fn open(
        db_path: &Path,
        blob_root: PathBuf,
        window_width: usize,
        hash_seed: u64,
        max_anchor_count: usize,
    ) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::create_dir_all(&blob_root)?;

        let conn = Connection::open(db_path)?;
        conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL;")?;
        schema::apply(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            blob_root,
            window_width,
            hash_seed,
            max_anchor_count,
        })
    }

    fn instructions_path(&self, object_hash: &str, symbol_idx: i64) -> PathBuf {
        self.blob_root
            .join(object_hash)
            .join(format!("{symbol_idx}.bin"))
    }

    /// Atomic: creates Source, dedups Object by content hash, creates
    /// Symbols and Windows. `Conflict` if the Object hash already exists
    /// under a Source of a different name; `IntegrityError` on schema
    /// violation.
    pub fn insert_source(&self, new: NewSource) -> Result<Source> {
        let mut guard = self.conn.lock();
        let tx = guard.transaction()?;

        let existing_project: Option<i64> = tx
            .query_row(
                "SELECT id FROM projects WHERE name = ?1",
                params![new.project_name],
                |r| r.get(0),
            )
            .optional()?;
        let project_id: i64 = match existing_project {
            Some(id) => id,
            None => {
                tx.execute(
                    "INSERT INTO projects (name, repository_url) VALUES (?1, ?2)",
                    params![new.project_name, new.project_repository_url],
                )?;
                tx.last_insert_rowid()
            }
        };

        let version_id: Option<i64> = match &new.version_name {
            Some(vname) => {
                let platform = new.platform.unwrap_or_default();
                let existing: Option<i64> = tx
                    .query_row(
                        "SELECT id FROM versions WHERE project_id = ?1 AND name = ?2",
                        params![project_id, vname],
                        |r| r.get(0),
                    )
                    .optional()?;
                let id = match existing {
                    Some(id) => id,
                    None => {
                        tx.execute(
                            "INSERT INTO versions (project_id, name, platform) VALUES (?1, ?2, ?3)",
                            params![project_id, vname, platform],
                        )?;
                        tx.last_insert_rowid()
                    }
                };
                Some(id)
            }
            None => None,
        };

        let existing_object: Option<i64> = tx
            .query_row(
                "SELECT id FROM objects WHERE hash = ?1",
                params![new.object_hash],
                |r| r.get(0),
            )
            .optional()?;

        let object_id = match existing_object {
            Some(id) => {
                let conflicting_name: Option<String> = tx
                    .query_row(
                        "SELECT name FROM sources WHERE object_id = ?1 AND name != ?2 LIMIT 1",
                        params![id, new.source_name],
                        |r| r.get(0),
                    )
                    .optional()?;
                if let Some(other_name) = conflicting_name {
                    return Err(SymhoundError::Conflict {
                        message: format!(
                            "object {} already ingested as source '{}', refusing to alias as '{}'",
                            new.object_hash, other_name, new.source_name
                        ),
                    });
                }
                id
            }
            None => {
                tx.execute(
                    "INSERT INTO objects (hash, storage_path) VALUES (?1, ?2)",
                    params![new.object_hash, new.object_storage_path],
                )?;
                tx.last_insert_rowid()
            }
        };

        let source_slug = Self::reserve_slug(&tx, "sources")?;
        tx.execute(
            "INSERT INTO sources (slug, project_id, object_id, version_id, name, upstream)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![source_slug, project_id, object_id, version_id, new.source_name, new.upstream],
        )?;
        let source_id = tx.last_insert_rowid();

        {
            let mut insert_symbol = tx.prepare_cached(
                "INSERT INTO symbols
                 (slug, source_id, name, symbol_idx, len, is_decompiled, fp_opcode, fp_equiv, fp_exact)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;
            let mut insert_window = tx.prepare_cached(
                "INSERT INTO windows (symbol_id, pos, hash) VALUES (?1, ?2, ?3)",
            )?;

            for sym in &new.symbols {
                let slug = Self::reserve_slug(&tx, "symbols")?;
                insert_symbol.execute(params![
                    slug,
                    source_id,
                    sym.name,
                    sym.symbol_idx,
                    sym.len,
                    sym.is_decompiled,
                    sym.fingerprints.opcode as i64,
                    sym.fingerprints.equiv as i64,
                    sym.fingerprints.exact as i64,
                ])?;
                let symbol_id = tx.last_insert_rowid();

                for w in window::extract_windows(&sym.equiv_hashes, self.window_width, self.hash_seed)
                {
                    insert_window.execute(params![symbol_id, w.pos, w.hash as i64])?;
                }

                let path = self.instructions_path(&new.object_hash, sym.symbol_idx);
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                let bytes = bincode::serialize(&sym.instructions)?;
                std::fs::write(&path, bytes)?;
            }
        }

        tx.commit()?;

        Ok(Source {
            id: source_id,
            slug: source_slug,
            project_id,
            object_id,
            version_id,
            name: new.source_name,
            upstream: new.upstream,
        })
    }

    /// Generate a slug and reserve it: inserting-and-rolling-back would
    /// cost a round trip per attempt; instead probe uniqueness directly
    /// against the in-progress transaction before the real insert.
    /// `table` is always one of the two literal table names below, never
    /// caller/user-supplied input.
    fn reserve_slug(tx: &rusqlite::Transaction<'_>, table: &str) -> Result<String> {
        debug_assert!(table == "sources" || table == "symbols");
        let sql = format!("SELECT 1 FROM {table} WHERE slug = ?1");
        for _ in 0..SLUG_MAX_ATTEMPTS {
            let candidate = crate::model::generate_slug_candidate();
            let taken: Option<i64> = tx
                .query_row(&sql, params![candidate], |r| r.get(0))
                .optional()?;
            if taken.is_none() {
                return Ok(candidate);
            }
        }
        Err(SymhoundError::ResourceExhausted {
            message: format!("slug space exhausted after bounded retries for {table}"),
        })
    }

    pub fn get_symbol(&self, slug: &str) -> Result<SymbolMeta> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT sym.slug, sym.name, sym.len,
                    src.id, src.name,
                    ver.id, ver.name,
                    proj.id, proj.name, proj.repository_url,
                    COALESCE(ver.platform, 0)
             FROM symbols sym
             JOIN sources src ON src.id = sym.source_id
             JOIN projects proj ON proj.id = src.project_id
             LEFT JOIN versions ver ON ver.id = src.version_id
             WHERE sym.slug = ?1",
            params![slug],
            |r| {
                Ok(SymbolMeta {
                    slug: r.get(0)?,
                    name: r.get(1)?,
                    len: r.get(2)?,
                    source_id: r.get(3)?,
                    source_name: r.get(4)?,
                    version_id: r.get(5)?,
                    version_name: r.get(6)?,
                    project_id: r.get(7)?,
                    project_name: r.get(8)?,
                    project_repo: r.get(9)?,
                    platform: r.get(10)?,
                })
            },
        )
        .optional()?
        .ok_or_else(|| SymhoundError::NotFound { what: slug.to_string() })
    }

    pub fn get_symbol_instructions(&self, slug: &str) -> Result<Vec<Instruction>> {
        let (object_hash, symbol_idx) = {
            let conn = self.conn.lock();
            conn.query_row(
                "SELECT obj.hash, sym.symbol_idx
                 FROM symbols sym
                 JOIN sources src ON src.id = sym.source_id
                 JOIN objects obj ON obj.id = src.object_id
                 WHERE sym.slug = ?1",
                params![slug],
                |r| Ok((r.get::<_, String>(0)?, r.get::<_, i64>(1)?)),
            )
            .optional()?
            .ok_or_else(|| SymhoundError::NotFound { what: slug.to_string() })?
        };

        let path = self.instructions_path(&object_hash, symbol_idx);
        let bytes = std::fs::read(&path).map_err(|_| {
            SymhoundError::BackingStoreMissing { path: path.display().to_string() }
        })?;
        Ok(bincode::deserialize(&bytes)?)
    }

    fn symbol_len_and_id(&self, slug: &str) -> Result<(i64, i64)> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT id, len FROM symbols WHERE slug = ?1",
            params![slug],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .optional()?
        .ok_or_else(|| SymhoundError::NotFound { what: slug.to_string() })
    }

    /// Point lookups on the three fingerprint columns, each bucket
    /// computed and returned independently with no cross-bucket
    /// deduplication (spec §4.5, §9 "Full-match bucket disjointness").
    pub fn find_full_matches(&self, slug: &str) -> Result<FullMatches> {
        let (symbol_id, _len) = self.symbol_len_and_id(slug)?;
        let conn = self.conn.lock();

        let fp: (i64, i64, i64) = conn.query_row(
            "SELECT fp_opcode, fp_equiv, fp_exact FROM symbols WHERE id = ?1",
            params![symbol_id],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )?;

        let bucket = |column: &str, value: i64| -> Result<Vec<SymbolMeta>> {
            let sql = format!(
                "SELECT sym.slug, sym.name, sym.len,
                        src.id, src.name,
                        ver.id, ver.name,
                        proj.id, proj.name, proj.repository_url,
                        COALESCE(ver.platform, 0)
                 FROM symbols sym
                 JOIN sources src ON src.id = sym.source_id
                 JOIN projects proj ON proj.id = src.project_id
                 LEFT JOIN versions ver ON ver.id = src.version_id
                 WHERE sym.{column} = ?1 AND sym.id != ?2
                 ORDER BY proj.id, src.id, sym.symbol_idx"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params![value, symbol_id], |r| {
                    Ok(SymbolMeta {
                        slug: r.get(0)?,
                        name: r.get(1)?,
                        len: r.get(2)?,
                        source_id: r.get(3)?,
                        source_name: r.get(4)?,
                        version_id: r.get(5)?,
                        version_name: r.get(6)?,
                        project_id: r.get(7)?,
                        project_name: r.get(8)?,
                        project_repo: r.get(9)?,
                        platform: r.get(10)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        };

        Ok(FullMatches {
            exact: bucket("fp_exact", fp.2)?,
            equivalent: bucket("fp_equiv", fp.1)?,
            opcode: bucket("fp_opcode", fp.0)?,
        })
    }

    /// Anchor retrieval (spec §4.4 step 1): the self-join on window hash,
    /// restricted to the query symbol on one side and every other symbol
    /// on the other. Returns raw rows for [`crate::submatch::reconstruct`].
    pub fn anchors_for_submatch(
        &self,
        symbol_id: i64,
        start: i64,
        end: i64,
    ) -> Result<Vec<crate::submatch::Anchor>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT b.symbol_id, src.project_id, sym.source_id, a.pos, b.pos
             FROM windows a
             JOIN windows b ON a.hash = b.hash AND b.symbol_id != a.symbol_id
             JOIN symbols sym ON sym.id = b.symbol_id
             JOIN sources src ON src.id = sym.source_id
             WHERE a.symbol_id = ?1 AND a.pos BETWEEN ?2 AND ?3
             LIMIT ?4",
        )?;
        let rows = stmt
            .query_map(
                params![symbol_id, start, end, self.max_anchor_count as i64 + 1],
                |r| {
                    Ok(crate::submatch::Anchor {
                        other_symbol_id: r.get(0)?,
                        project_id: r.get(1)?,
                        source_id: r.get(2)?,
                        query_pos: r.get(3)?,
                        match_pos: r.get(4)?,
                    })
                },
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn window_width(&self) -> usize {
        self.window_width
    }

    pub fn max_anchor_count(&self) -> usize {
        self.max_anchor_count
    }

    pub fn symbol_len(&self, slug: &str) -> Result<i64> {
        Ok(self.symbol_len_and_id(slug)?.1)
    }

    pub fn symbol_id(&self, slug: &str) -> Result<i64> {
        Ok(self.symbol_len_and_id(slug)?.0)
    }

    pub fn find_by_name_prefix(&self, fragment: &str) -> Result<Vec<SymbolMeta>> {
        let conn = self.conn.lock();
        let pattern = format!("%{}%", fragment.replace('%', "\\%").replace('_', "\\_"));
        let mut stmt = conn.prepare(
            "SELECT sym.slug, sym.name, sym.len,
                    src.id, src.name,
                    ver.id, ver.name,
                    proj.id, proj.name, proj.repository_url,
                    COALESCE(ver.platform, 0)
             FROM symbols sym
             JOIN sources src ON src.id = sym.source_id
             JOIN projects proj ON proj.id = src.project_id
             LEFT JOIN versions ver ON ver.id = src.version_id
             WHERE sym.name LIKE ?1 ESCAPE '\\'
             ORDER BY sym.name
             LIMIT 200",
        )?;
        let rows = stmt
            .query_map(params![pattern], |r| {
                Ok(SymbolMeta {
                    slug: r.get(0)?,
                    name: r.get(1)?,
                    len: r.get(2)?,
                    source_id: r.get(3)?,
                    source_name: r.get(4)?,
                    version_id: r.get(5)?,
                    version_name: r.get(6)?,
                    project_id: r.get(7)?,
                    project_name: r.get(8)?,
                    project_repo: r.get(9)?,
                    platform: r.get(10)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Group a Source's symbols by `exact` fingerprint, emitting clusters
    /// with cardinality `>= min_size` (spec §4.6). `cross_source` widens
    /// the grouping to every Source in the store instead of just the one
    /// named (see DESIGN.md Open Question 3).
    pub fn cluster_source(
        &self,
        source_id: i64,
        min_size: usize,
        cross_source: bool,
    ) -> Result<Vec<Vec<Symbol>>> {
        let conn = self.conn.lock();
        let sql = if cross_source {
            "SELECT id, slug, name, len, symbol_idx, is_decompiled, fp_opcode, fp_equiv, fp_exact, source_id
             FROM symbols ORDER BY fp_exact"
        } else {
            "SELECT id, slug, name, len, symbol_idx, is_decompiled, fp_opcode, fp_equiv, fp_exact, source_id
             FROM symbols WHERE source_id = ?1 ORDER BY fp_exact"
        };
        let mut stmt = conn.prepare(sql)?;

        let to_symbol = |r: &rusqlite::Row| -> rusqlite::Result<Symbol> {
            Ok(Symbol {
                id: r.get(0)?,
                slug: r.get(1)?,
                name: r.get(2)?,
                len: r.get(3)?,
                symbol_idx: r.get(4)?,
                is_decompiled: r.get(5)?,
                fingerprints: Fingerprints {
                    opcode: r.get::<_, i64>(6)? as u64,
                    equiv: r.get::<_, i64>(7)? as u64,
                    exact: r.get::<_, i64>(8)? as u64,
                },
                source_id: r.get(9)?,
            })
        };

        let rows: Vec<Symbol> = if cross_source {
            stmt.query_map([], to_symbol)?
                .collect::<std::result::Result<Vec<_>, _>>()?
        } else {
            stmt.query_map(params![source_id], to_symbol)?
                .collect::<std::result::Result<Vec<_>, _>>()?
        };

        let mut clusters: Vec<Vec<Symbol>> = Vec::new();
        let mut current: Vec<Symbol> = Vec::new();
        for sym in rows {
            if let Some(last) = current.last() {
                if last.fingerprints.exact != sym.fingerprints.exact {
                    if current.len() >= min_size {
                        clusters.push(std::mem::take(&mut current));
                    } else {
                        current.clear();
                    }
                }
            }
            current.push(sym);
        }
        if current.len() >= min_size {
            clusters.push(current);
        }

        Ok(clusters)
    }

    pub fn list_projects(&self) -> Result<Vec<Project>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT id, name, repository_url FROM projects ORDER BY name")?;
        let rows = stmt
            .query_map([], |r| {
                Ok(Project {
                    id: r.get(0)?,
                    name: r.get(1)?,
                    repository_url: r.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// `GET /sources/{slug}` (spec §6): resolves by slug first, falling
    /// back to exact name, and is denormalized with its actual Version
    /// and Project context (spec §3: a Source has at most one Version).
    pub fn get_source(&self, slug_or_name: &str) -> Result<SourceMeta> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT src.slug, src.name, src.upstream,
                    ver.id, ver.name,
                    proj.id, proj.name, proj.repository_url,
                    COALESCE(ver.platform, 0)
             FROM sources src
             JOIN projects proj ON proj.id = src.project_id
             LEFT JOIN versions ver ON ver.id = src.version_id
             WHERE src.slug = ?1 OR src.name = ?1",
            params![slug_or_name],
            |r| {
                Ok(SourceMeta {
                    slug: r.get(0)?,
                    name: r.get(1)?,
                    upstream: r.get(2)?,
                    version_id: r.get(3)?,
                    version_name: r.get(4)?,
                    project_id: r.get(5)?,
                    project_name: r.get(6)?,
                    project_repo: r.get(7)?,
                    platform: r.get(8)?,
                })
            },
        )
        .optional()?
        .ok_or_else(|| SymhoundError::NotFound { what: slug_or_name.to_string() })
    }

    /// Resolve a Source's internal numeric id by slug or exact name, for
    /// callers (e.g. clustering) that need it rather than the denormalized
    /// [`SourceMeta`].
    pub fn source_id_by_slug_or_name(&self, slug_or_name: &str) -> Result<i64> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT id FROM sources WHERE slug = ?1 OR name = ?1",
            params![slug_or_name],
            |r| r.get(0),
        )
        .optional()?
        .ok_or_else(|| SymhoundError::NotFound { what: slug_or_name.to_string() })
    }

    /// Delete a Source. Cascades (`ON DELETE CASCADE`) to its Symbols and
    /// their Windows (spec §3). Object blobs are left on disk: Objects are
    /// deduplicated by content hash and may still be referenced by other
    /// Sources.
    pub fn delete_source(&self, source_id: i64) -> Result<()> {
        let conn = self.conn.lock();
        let affected = conn.execute("DELETE FROM sources WHERE id = ?1", params![source_id])?;
        if affected == 0 {
            return Err(SymhoundError::NotFound { what: source_id.to_string() });
        }
        Ok(())
    }

    /// Delete a single Symbol. Cascades (`ON DELETE CASCADE`) to its
    /// Windows (spec §3).
    pub fn delete_symbol(&self, symbol_id: i64) -> Result<()> {
        let conn = self.conn.lock();
        let affected = conn.execute("DELETE FROM symbols WHERE id = ?1", params![symbol_id])?;
        if affected == 0 {
            return Err(SymhoundError::NotFound { what: symbol_id.to_string() });
        }
        Ok(())
    }

    pub fn object_row(&self, object_id: i64) -> Result<ObjectRow> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT id, hash, storage_path FROM objects WHERE id = ?1",
            params![object_id],
            |r| {
                Ok(ObjectRow {
                    id: r.get(0)?,
                    hash: r.get(1)?,
                    storage_path: r.get(2)?,
                })
            },
        )
        .optional()?
        .ok_or_else(|| SymhoundError::NotFound { what: object_id.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::fold_sequence;
    use crate::normalize::canonical_equivalence;

    fn test_store() -> (SqliteStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(
            &dir.path().join("index.db"),
            dir.path().join("blobs"),
            8,
            0x1234,
            1_000_000,
        )
        .unwrap();
        (store, dir)
    }

    fn make_symbol(name: &str, idx: i64, opcodes: &[&str]) -> NewSymbol {
        let instructions: Vec<Instruction> = opcodes
            .iter()
            .map(|op| Instruction::new(op, vec![]))
            .collect();
        let equiv: Vec<String> = instructions.iter().map(canonical_equivalence).collect();
        let equiv_hashes: Vec<u64> = equiv.iter().map(|s| crate::hash::hash_token(s, 0x1234)).collect();
        let fp = fold_sequence(&equiv, 0x1234);
        NewSymbol {
            name: name.to_string(),
            symbol_idx: idx,
            is_decompiled: false,
            len: instructions.len() as i64,
            fingerprints: Fingerprints {
                opcode: fp,
                equiv: fp,
                exact: fp,
            },
            equiv_hashes,
            instructions,
        }
    }

    #[test]
    fn insert_and_fetch_round_trips() {
        let (store, _dir) = test_store();
        let source = store
            .insert_source(NewSource {
                project_name: "proj".into(),
                project_repository_url: None,
                version_name: None,
                platform: None,
                object_hash: "abc123".into(),
                object_storage_path: "/tmp/abc123".into(),
                source_name: "libfoo.so".into(),
                upstream: None,
                symbols: vec![make_symbol("foo", 0, &["mov", "add", "ret"])],
            })
            .unwrap();
        assert_eq!(source.name, "libfoo.so");

        let meta = store
            .conn
            .lock()
            .query_row("SELECT slug FROM symbols WHERE name = 'foo'", [], |r| {
                r.get::<_, String>(0)
            })
            .unwrap();
        let fetched = store.get_symbol(&meta).unwrap();
        assert_eq!(fetched.name, "foo");
        assert_eq!(fetched.project_name, "proj");

        let insns = store.get_symbol_instructions(&meta).unwrap();
        assert_eq!(insns.len(), 3);
    }

    #[test]
    fn conflicting_object_identity_is_rejected() {
        let (store, _dir) = test_store();
        store
            .insert_source(NewSource {
                project_name: "proj".into(),
                project_repository_url: None,
                version_name: None,
                platform: None,
                object_hash: "same-hash".into(),
                object_storage_path: "/tmp/x".into(),
                source_name: "a.so".into(),
                upstream: None,
                symbols: vec![make_symbol("foo", 0, &["mov"])],
            })
            .unwrap();

        let err = store
            .insert_source(NewSource {
                project_name: "proj".into(),
                project_repository_url: None,
                version_name: None,
                platform: None,
                object_hash: "same-hash".into(),
                object_storage_path: "/tmp/x".into(),
                source_name: "b.so".into(),
                upstream: None,
                symbols: vec![make_symbol("bar", 0, &["mov"])],
            })
            .unwrap_err();
        assert!(matches!(err, SymhoundError::Conflict { .. }));
    }

    #[test]
    fn full_matches_are_independent_buckets() {
        let (store, _dir) = test_store();
        store
            .insert_source(NewSource {
                project_name: "proj".into(),
                project_repository_url: None,
                version_name: None,
                platform: None,
                object_hash: "h1".into(),
                object_storage_path: "/tmp/h1".into(),
                source_name: "a.so".into(),
                upstream: None,
                symbols: vec![
                    make_symbol("foo", 0, &["mov", "add", "ret"]),
                    make_symbol("foo_dup", 1, &["mov", "add", "ret"]),
                ],
            })
            .unwrap();

        let slug = store
            .conn
            .lock()
            .query_row("SELECT slug FROM symbols WHERE name = 'foo'", [], |r| {
                r.get::<_, String>(0)
            })
            .unwrap();
        let matches = store.find_full_matches(&slug).unwrap();
        assert_eq!(matches.exact.len(), 1);
        assert_eq!(matches.exact[0].name, "foo_dup");
    }

    #[test]
    fn clustering_groups_by_exact_fingerprint() {
        let (store, _dir) = test_store();
        let source = store
            .insert_source(NewSource {
                project_name: "proj".into(),
                project_repository_url: None,
                version_name: None,
                platform: None,
                object_hash: "h2".into(),
                object_storage_path: "/tmp/h2".into(),
                source_name: "a.so".into(),
                upstream: None,
                symbols: vec![
                    make_symbol("a", 0, &["mov", "ret"]),
                    make_symbol("b", 1, &["mov", "ret"]),
                    make_symbol("c", 2, &["add", "ret"]),
                ],
            })
            .unwrap();

        let clusters = store.cluster_source(source.id, 2, false).unwrap();
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].len(), 2);
    }

    #[test]
    fn get_source_resolves_by_slug_or_name() {
        let (store, _dir) = test_store();
        let source = store
            .insert_source(NewSource {
                project_name: "proj".into(),
                project_repository_url: None,
                version_name: Some("1.0".into()),
                platform: Some(2),
                object_hash: "h3".into(),
                object_storage_path: "/tmp/h3".into(),
                source_name: "a.so".into(),
                upstream: None,
                symbols: vec![make_symbol("a", 0, &["mov"])],
            })
            .unwrap();

        let by_name = store.get_source("a.so").unwrap();
        assert_eq!(by_name.slug, source.slug);
        assert_eq!(by_name.version_name.as_deref(), Some("1.0"));
        assert_eq!(by_name.platform, 2);

        let by_slug = store.get_source(&source.slug).unwrap();
        assert_eq!(by_slug.name, "a.so");
    }

    #[test]
    fn delete_source_cascades_to_symbols_and_windows() {
        let (store, _dir) = test_store();
        let source = store
            .insert_source(NewSource {
                project_name: "proj".into(),
                project_repository_url: None,
                version_name: None,
                platform: None,
                object_hash: "h4".into(),
                object_storage_path: "/tmp/h4".into(),
                source_name: "a.so".into(),
                upstream: None,
                symbols: vec![make_symbol("a", 0, &["mov", "add", "ret", "nop", "nop", "nop", "nop", "nop"])],
            })
            .unwrap();

        let (symbol_id, window_count): (i64, i64) = {
            let conn = store.conn.lock();
            let symbol_id: i64 = conn
                .query_row("SELECT id FROM symbols WHERE name = 'a'", [], |r| r.get(0))
                .unwrap();
            let window_count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM windows WHERE symbol_id = ?1",
                    params![symbol_id],
                    |r| r.get(0),
                )
                .unwrap();
            (symbol_id, window_count)
        };
        assert!(window_count > 0);

        store.delete_source(source.id).unwrap();

        let conn = store.conn.lock();
        let remaining_symbols: i64 = conn
            .query_row("SELECT COUNT(*) FROM symbols WHERE id = ?1", params![symbol_id], |r| {
                r.get(0)
            })
            .unwrap();
        let remaining_windows: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM windows WHERE symbol_id = ?1",
                params![symbol_id],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(remaining_symbols, 0);
        assert_eq!(remaining_windows, 0);
    }

    #[test]
    fn delete_symbol_cascades_to_windows_only() {
        let (store, _dir) = test_store();
        store
            .insert_source(NewSource {
                project_name: "proj".into(),
                project_repository_url: None,
                version_name: None,
                platform: None,
                object_hash: "h5".into(),
                object_storage_path: "/tmp/h5".into(),
                source_name: "a.so".into(),
                upstream: None,
                symbols: vec![make_symbol("a", 0, &["mov", "add", "ret", "nop", "nop", "nop", "nop", "nop"])],
            })
            .unwrap();

        let symbol_id: i64 = {
            let conn = store.conn.lock();
            conn.query_row("SELECT id FROM symbols WHERE name = 'a'", [], |r| r.get(0))
                .unwrap()
        };

        store.delete_symbol(symbol_id).unwrap();

        let conn = store.conn.lock();
        let remaining_windows: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM windows WHERE symbol_id = ?1",
                params![symbol_id],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(remaining_windows, 0);
    }

    #[test]
    fn delete_source_not_found_is_reported() {
        let (store, _dir) = test_store();
        let err = store.delete_source(999).unwrap_err();
        assert!(matches!(err, SymhoundError::NotFound { .. }));
    }
}
