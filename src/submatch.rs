//! Submatch reconstruction (spec §4.4): turning window-hash anchors into
//! maximal contiguous shared instruction runs.
//!
//! The anchor self-join itself (step 1 of the spec's algorithm) is done by
//! [`crate::store`] as one indexed SQL query; everything from diagonal
//! grouping onward happens here, in plain Rust, over the rows that query
//! returns — the engine's SQLite layer stays a plain store, not a query
//! engine (see DESIGN.md Open Question 1).

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// One raw anchor from the window self-join: `Q`'s window at `query_pos`
/// shares a hash with `other_symbol`'s window at `match_pos`.
#[derive(Debug, Clone, Copy)]
pub struct Anchor {
    pub other_symbol_id: i64,
    pub project_id: i64,
    pub source_id: i64,
    pub query_pos: i64,
    pub match_pos: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Length,
    QueryStart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDir {
    Asc,
    Desc,
}

/// One reconstructed maximal run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmatchRow {
    pub symbol_id: i64,
    pub project_id: i64,
    pub source_id: i64,
    pub query_start: i64,
    pub match_start: i64,
    pub len: i64,
}

/// Reconstruct every maximal run of length `>= min_len` from a flat list
/// of anchors, per spec §4.4 steps 2–4 (diagonal grouping, length
/// derivation, aggregation). `width` is the window width `W`; a run of
/// `k` consecutive anchors has instruction length `k + width - 1`.
///
/// Sorting and pagination (step 5) are applied by the caller
/// ([`paginate`]) so the full unpaginated set can be counted first.
pub fn reconstruct(anchors: &[Anchor], width: usize, min_len: i64) -> Vec<SubmatchRow> {
    // Group by (other_symbol_id, diagonal). diagonal = query_pos - match_pos.
    let mut groups: AHashMap<(i64, i64), Vec<&Anchor>> = AHashMap::new();
    for a in anchors {
        let diagonal = a.query_pos - a.match_pos;
        groups
            .entry((a.other_symbol_id, diagonal))
            .or_default()
            .push(a);
    }

    let mut rows = Vec::new();
    for ((symbol_id, diagonal), mut group) in groups {
        group.sort_by_key(|a| a.query_pos);

        // Partition the sorted, distinct query_pos values into maximal
        // runs of consecutive integers. Anchors can repeat a (q, m) pair
        // only if the index produced duplicate windows, which it never
        // does by construction, so a plain consecutive-run scan suffices.
        let mut run_start_idx = 0usize;
        for i in 1..=group.len() {
            let run_broken = i == group.len() || group[i].query_pos != group[i - 1].query_pos + 1;
            if run_broken {
                let run = &group[run_start_idx..i];
                let k = run.len() as i64;
                let len = k + width as i64 - 1;
                if len >= min_len {
                    let q0 = run[0].query_pos;
                    let m0 = q0 - diagonal;
                    let first = run[0];
                    rows.push(SubmatchRow {
                        symbol_id,
                        project_id: first.project_id,
                        source_id: first.source_id,
                        query_start: q0,
                        match_start: m0,
                        len,
                    });
                }
                run_start_idx = i;
            }
        }
    }

    rows
}

/// Sort the full reconstructed result set, then slice out one page
/// (spec §4.4 step 5, and §9's "sort the full result set, then paginate"
/// canonical contract).
pub fn paginate(
    mut rows: Vec<SubmatchRow>,
    sort: SortKey,
    dir: SortDir,
    page: usize,
    page_size: usize,
) -> (usize, Vec<SubmatchRow>) {
    rows.sort_by(|a, b| {
        let primary = match sort {
            SortKey::Length => a.len.cmp(&b.len),
            SortKey::QueryStart => a.query_start.cmp(&b.query_start),
        };
        let primary = match dir {
            SortDir::Asc => primary,
            SortDir::Desc => primary.reverse(),
        };
        primary
            .then_with(|| a.project_id.cmp(&b.project_id))
            .then_with(|| a.source_id.cmp(&b.source_id))
            .then_with(|| a.symbol_id.cmp(&b.symbol_id))
            .then_with(|| a.query_start.cmp(&b.query_start))
            .then_with(|| a.match_start.cmp(&b.match_start))
    });

    let total = rows.len();
    let start = page.saturating_mul(page_size).min(total);
    let end = start.saturating_add(page_size).min(total);
    (total, rows[start..end].to_vec())
}
