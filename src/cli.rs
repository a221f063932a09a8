//! Shared `clap` CLI surfaces for the `symhound` query binary.

use clap::{Parser, Subcommand, ValueEnum};

use crate::submatch::{SortDir, SortKey};

#[derive(Parser, Debug)]
#[command(name = "symhound")]
#[command(about = "Cross-binary symbol similarity and submatch reconstruction")]
#[command(version)]
pub struct Cli {
    /// Path to the SQLite index (defaults to `SYMHOUND_DB_PATH` / the
    /// platform cache dir).
    #[arg(long, env = "SYMHOUND_DB_PATH")]
    pub db_path: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Look up a symbol by slug.
    Get { slug: String },
    /// List full-match buckets (exact/equivalent/opcode) for a symbol.
    Match { slug: String },
    /// Reconstruct submatches against a symbol.
    Submatch {
        slug: String,
        #[arg(long)]
        start: Option<i64>,
        #[arg(long)]
        end: Option<i64>,
        #[arg(long, default_value_t = 8)]
        min_len: i64,
        #[arg(long, value_enum, default_value = "length")]
        sort: CliSortKey,
        #[arg(long, value_enum, default_value = "desc")]
        dir: CliSortDir,
        #[arg(long, default_value_t = 0)]
        page: usize,
        #[arg(long, default_value_t = 50)]
        page_size: usize,
    },
    /// Substring/prefix search over symbol names.
    Search { fragment: String },
    /// Look up a Source by slug or exact name.
    Source { slug_or_name: String },
    /// List known projects.
    Projects,
    /// Group a Source's symbols into exact-fingerprint clusters.
    Cluster {
        source_name: String,
        #[arg(long, default_value_t = 2)]
        min_size: usize,
        #[arg(long)]
        cross_source: bool,
    },
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum CliSortKey {
    Length,
    QueryStart,
}

impl From<CliSortKey> for SortKey {
    fn from(v: CliSortKey) -> Self {
        match v {
            CliSortKey::Length => SortKey::Length,
            CliSortKey::QueryStart => SortKey::QueryStart,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum CliSortDir {
    Asc,
    Desc,
}

impl From<CliSortDir> for SortDir {
    fn from(v: CliSortDir) -> Self {
        match v {
            CliSortDir::Asc => SortDir::Asc,
            CliSortDir::Desc => SortDir::Desc,
        }
    }
}
