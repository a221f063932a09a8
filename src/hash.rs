//! Deterministic seeded 64-bit hashing (spec §4.1/§4.2).
//!
//! A single hash function is used everywhere a fingerprint or window hash
//! is produced, on both the ingestion and lookup paths — any divergence
//! here silently breaks every comparison in the system, so there is
//! exactly one place this happens.

use xxhash_rust::xxh3::xxh3_64_with_seed;

/// Hash a single canonical-form token.
pub fn hash_token(token: &str, seed: u64) -> u64 {
    xxh3_64_with_seed(token.as_bytes(), seed)
}

/// Fold an ordered sequence of canonical-form tokens into one 64-bit
/// fingerprint. Order-dependent: this is used for whole-symbol
/// fingerprints, where instruction order is part of the identity.
pub fn fold_sequence<S: AsRef<str>>(tokens: &[S], seed: u64) -> u64 {
    // Mix each token's hash with a running accumulator rather than
    // concatenating strings, so this stays O(n) in total token length
    // instead of O(n^2) from repeated reallocation.
    let mut acc = seed;
    for token in tokens {
        let h = hash_token(token.as_ref(), seed);
        acc = mix(acc, h);
    }
    acc
}

/// Combine two 64-bit values into one, order-sensitive.
#[inline]
fn mix(acc: u64, h: u64) -> u64 {
    // splitmix64-style avalanche after folding in the new value, so the
    // position of a token within the sequence affects the final digest.
    let mut z = acc.wrapping_mul(0x9E37_79B9_7F4A_7C15).wrapping_add(h);
    z ^= z >> 30;
    z = z.wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z ^= z >> 27;
    z = z.wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
