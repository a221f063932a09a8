//! Domain entities (spec §3): Project, Version, Object, Source, Symbol,
//! Window, plus the opaque-identity conventions (`id`, `slug`) that tie
//! them together.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// 62-symbol alphabet for slug generation: `[A-Za-z0-9]`.
const SLUG_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
const SLUG_LEN: usize = 5;
/// Bounded retry count for slug collisions (spec is silent on this; see
/// DESIGN.md "Slug retry exhaustion").
pub const SLUG_MAX_ATTEMPTS: usize = 64;

/// Generate one candidate 5-character alphanumeric slug.
pub fn generate_slug_candidate() -> String {
    let mut rng = rand::thread_rng();
    (0..SLUG_LEN)
        .map(|_| SLUG_ALPHABET[rng.gen_range(0..SLUG_ALPHABET.len())] as char)
        .collect()
}

/// Small integer tag for a Version's target platform. Kept as a plain
/// integer per the data model rather than a closed Rust enum, since the
/// set of supported platforms is a deployment concern, not a core one.
pub type PlatformTag = i32;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub repository_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Version {
    pub id: i64,
    pub project_id: i64,
    pub name: String,
    pub platform: PlatformTag,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectRow {
    pub id: i64,
    pub hash: String,
    pub storage_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub id: i64,
    pub slug: String,
    pub project_id: i64,
    pub object_id: i64,
    pub version_id: Option<i64>,
    pub name: String,
    pub upstream: Option<String>,
}

/// `SourceMeta` as exposed across the HTTP boundary (spec §6, `GET
/// /sources/{slug}`) -- denormalized with its owning Version/Project
/// context, mirroring how [`SymbolMeta`] is assembled for symbols.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMeta {
    pub slug: String,
    pub name: String,
    pub upstream: Option<String>,
    pub version_id: Option<i64>,
    pub version_name: Option<String>,
    pub project_id: i64,
    pub project_name: String,
    pub project_repo: Option<String>,
    pub platform: PlatformTag,
}

/// The three per-symbol whole-function fingerprints (spec §3/§4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprints {
    pub opcode: u64,
    pub equiv: u64,
    pub exact: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Symbol {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub len: i64,
    pub symbol_idx: i64,
    pub is_decompiled: bool,
    pub fingerprints: Fingerprints,
    pub source_id: i64,
}

/// `SymbolMeta` as exposed across the HTTP boundary (spec §6) — denormalized
/// with its owning Source/Version/Project context for display purposes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolMeta {
    pub slug: String,
    pub name: String,
    pub len: i64,
    pub source_id: i64,
    pub source_name: String,
    pub version_id: Option<i64>,
    pub version_name: Option<String>,
    pub project_id: i64,
    pub project_name: String,
    pub project_repo: Option<String>,
    pub platform: PlatformTag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub id: i64,
    pub symbol_id: i64,
    pub pos: i64,
    pub hash: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_has_expected_shape() {
        let slug = generate_slug_candidate();
        assert_eq!(slug.len(), SLUG_LEN);
        assert!(slug.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn slugs_vary_across_calls() {
        // Not a strict guarantee, but with a 62^5 space a collision across
        // a handful of calls would be exceptionally unlikely.
        let slugs: std::collections::HashSet<String> =
            (0..20).map(|_| generate_slug_candidate()).collect();
        assert!(slugs.len() > 1);
    }
}
