//! symhound: cross-binary symbol similarity engine.
//!
//! Normalizes disassembled instruction streams into fingerprints at three
//! fidelities (opcode, equivalence-class, exact), indexes sliding windows
//! over the equivalence stream for sub-linear partial-match lookup, and
//! reconstructs maximal shared-instruction runs across a corpus of
//! ingested binaries for decompilation support work.
//!
//! # Example
//!
//! ```ignore
//! use symhound::store::{NewSource, SqliteStore};
//! use symhound::service::MatchService;
//!
//! let store = SqliteStore::open(db_path, blob_root, 8, seed, 1_000_000)?;
//! let service = MatchService::new(std::sync::Arc::new(store));
//! let matches = service.full_matches("ab3xQ".to_string()).await?;
//! ```

pub mod cli;
pub mod config;
pub mod disassembler;
pub mod error;
pub mod hash;
pub mod instruction;
pub mod model;
pub mod normalize;
pub mod service;
pub mod store;
pub mod submatch;
pub mod window;

pub use error::{Result, SymhoundError};
