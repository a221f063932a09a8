//! Runtime configuration: backing store path, blob storage root, hash seed,
//! and window width (spec §6 Environment).

use std::path::PathBuf;

/// The deployment-wide window width `W` (spec §4.2 design default).
pub const DEFAULT_WINDOW_WIDTH: usize = 8;

/// Fixed hash seed used when `SYMHOUND_HASH_SEED` is not set. Arbitrary but
/// stable across the lifetime of an index: changing this invalidates every
/// previously stored fingerprint and window hash.
pub const DEFAULT_HASH_SEED: u64 = 0x5359_4D48_4F55_4E44; // "SYMHOUND" folded into a u64

/// Default cap on the number of anchors a single submatch query may fan out
/// to before returning `ResourceExhausted` (spec §5 back-pressure).
pub const DEFAULT_MAX_ANCHOR_COUNT: usize = 1_000_000;

/// Engine-wide configuration, loaded from the environment at process start.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Path to the SQLite backing store file.
    pub db_path: PathBuf,
    /// Root directory under which content-addressed object blobs are stored.
    pub blob_root: PathBuf,
    /// Seed for the deterministic 64-bit hash function. Must be identical
    /// across every ingestion and lookup path or fingerprints will not compare.
    pub hash_seed: u64,
    /// Window width `W` (spec §4.2).
    pub window_width: usize,
    /// Per-query anchor fan-out cap (spec §5).
    pub max_anchor_count: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("./symhound.sqlite3"),
            blob_root: default_blob_root(),
            hash_seed: DEFAULT_HASH_SEED,
            window_width: DEFAULT_WINDOW_WIDTH,
            max_anchor_count: DEFAULT_MAX_ANCHOR_COUNT,
        }
    }
}

impl EngineConfig {
    /// Build configuration from environment variables, falling back to
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            db_path: std::env::var("SYMHOUND_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            blob_root: std::env::var("SYMHOUND_BLOB_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.blob_root),
            hash_seed: std::env::var("SYMHOUND_HASH_SEED")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.hash_seed),
            window_width: std::env::var("SYMHOUND_WINDOW_WIDTH")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.window_width),
            max_anchor_count: std::env::var("SYMHOUND_MAX_ANCHOR_COUNT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_anchor_count),
        }
    }
}

fn default_blob_root() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("symhound")
        .join("objects")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_stable() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.window_width, 8);
        assert_eq!(cfg.hash_seed, DEFAULT_HASH_SEED);
        assert_eq!(cfg.max_anchor_count, DEFAULT_MAX_ANCHOR_COUNT);
    }
}
