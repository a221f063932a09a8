//! Match Service (spec §5): the async wrapper around [`SqliteStore`] that
//! keeps blocking SQLite work off the tokio executor, runs CPU-bound
//! normalization/hashing on `rayon`, and makes `find_submatches`
//! cancelable without ever emitting a partial result.

use std::sync::Arc;

use rayon::prelude::*;
use tokio::sync::oneshot;

use crate::error::{Result, SymhoundError};
use crate::hash::fold_sequence;
use crate::instruction::SymbolStream;
use crate::model::Fingerprints;
use crate::normalize::{canonical_equivalence, canonical_exact, canonical_opcode};
use crate::store::sqlite::{FullMatches, NewSymbol, SqliteStore};
use crate::submatch::{self, SortDir, SortKey, SubmatchRow};

/// Positions of `Q`'s windows are drained in chunks so cancellation can be
/// observed between batches rather than only before/after the whole scan.
const ANCHOR_BATCH_WIDTH: i64 = 4096;

pub struct SubmatchResult {
    pub total: usize,
    pub rows: Vec<SubmatchRow>,
}

pub struct MatchService {
    store: Arc<SqliteStore>,
}

impl MatchService {
    pub fn new(store: Arc<SqliteStore>) -> Self {
        Self { store }
    }

    /// Fingerprint one disassembled symbol at all three fidelities and
    /// derive its equivalence-hash stream for window extraction, all on
    /// the current thread — callers batch this across `rayon::par_iter`
    /// (see [`Self::fingerprint_batch`]) to keep it off the tokio runtime.
    pub fn fingerprint_symbol(hash_seed: u64, stream: &SymbolStream) -> NewSymbol {
        let opcode_tokens: Vec<String> = stream
            .instructions
            .iter()
            .map(canonical_opcode)
            .collect();
        let equiv_tokens: Vec<String> = stream
            .instructions
            .iter()
            .map(canonical_equivalence)
            .collect();
        let exact_tokens: Vec<String> = stream
            .instructions
            .iter()
            .map(canonical_exact)
            .collect();

        let equiv_hashes: Vec<u64> = equiv_tokens
            .iter()
            .map(|t| crate::hash::hash_token(t, hash_seed))
            .collect();

        NewSymbol {
            name: stream.name.clone(),
            symbol_idx: stream.symbol_idx,
            is_decompiled: stream.is_decompiled,
            len: stream.len() as i64,
            fingerprints: Fingerprints {
                opcode: fold_sequence(&opcode_tokens, hash_seed),
                equiv: fold_sequence(&equiv_tokens, hash_seed),
                exact: fold_sequence(&exact_tokens, hash_seed),
            },
            equiv_hashes,
            instructions: stream.instructions.clone(),
        }
    }

    /// Fingerprint every symbol in a disassembled object in parallel
    /// (spec §5: "Normalization/hashing ... should run on a worker pool
    /// distinct from the I/O task set").
    pub fn fingerprint_batch(hash_seed: u64, streams: &[SymbolStream]) -> Vec<NewSymbol> {
        streams
            .par_iter()
            .map(|s| Self::fingerprint_symbol(hash_seed, s))
            .collect()
    }

    pub async fn full_matches(&self, slug: String) -> Result<FullMatches> {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || store.find_full_matches(&slug))
            .await
            .expect("find_full_matches task panicked")
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn find_submatches(
        &self,
        slug: String,
        start: Option<i64>,
        end: Option<i64>,
        min_len: i64,
        sort: SortKey,
        dir: SortDir,
        page: usize,
        page_size: usize,
        mut cancel: oneshot::Receiver<()>,
    ) -> Result<SubmatchResult> {
        let store = self.store.clone();

        tokio::task::spawn_blocking(move || -> Result<SubmatchResult> {
            let symbol_id = store.symbol_id(&slug)?;
            let len = store.symbol_len(&slug)?;
            let width = store.window_width() as i64;

            let start = start.unwrap_or(0);
            let end = end.unwrap_or(len - 1);
            if start > end {
                return Err(SymhoundError::InvalidRange { start, end });
            }

            let min_len = if min_len < width {
                tracing::warn!(
                    requested = min_len,
                    clamped_to = width,
                    "min_len below window width, clamping"
                );
                width
            } else {
                min_len
            };

            if len < width {
                return Ok(SubmatchResult { total: 0, rows: Vec::new() });
            }

            // spec §4.4: windows range over q in [start, end - W + 1], not
            // [start, end] -- a window starting beyond end - W + 1 would
            // cover instructions past the caller's requested boundary.
            let last_window_pos = (len - width).min(end - width + 1);
            let mut anchors = Vec::new();
            let mut pos = start;

            while pos <= last_window_pos {
                if cancel.try_recv() != Err(oneshot::error::TryRecvError::Empty) {
                    return Err(SymhoundError::Cancelled);
                }

                let batch_end = (pos + ANCHOR_BATCH_WIDTH - 1).min(last_window_pos);
                let mut batch = store.anchors_for_submatch(symbol_id, pos, batch_end)?;
                anchors.append(&mut batch);

                if anchors.len() > store.max_anchor_count() {
                    return Err(SymhoundError::ResourceExhausted {
                        message: format!(
                            "submatch anchor fan-out exceeded {} for symbol {slug}",
                            store.max_anchor_count()
                        ),
                    });
                }

                pos = batch_end + 1;
            }

            if cancel.try_recv() != Err(oneshot::error::TryRecvError::Empty) {
                return Err(SymhoundError::Cancelled);
            }

            let rows = submatch::reconstruct(&anchors, width as usize, min_len);
            let (total, rows) = submatch::paginate(rows, sort, dir, page, page_size);
            Ok(SubmatchResult { total, rows })
        })
        .await
        .expect("find_submatches task panicked")
    }
}
