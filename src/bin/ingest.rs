//! `symhound-ingest`: reads a YAML project descriptor, disassembles each
//! listed object, and ingests it into the index store (spec §6
//! "Ingestion CLI contract").

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use serde::Deserialize;

use symhound::config::EngineConfig;
use symhound::disassembler::{DisassemblerAdapter, StubAdapter};
use symhound::error::SymhoundError;
use symhound::service::MatchService;
use symhound::store::{NewSource, SqliteStore};

use symhound::Result;

#[derive(Parser, Debug)]
#[command(name = "symhound-ingest")]
#[command(about = "Ingest a project descriptor's objects into the symhound index")]
pub struct IngestArgs {
    /// Path to the YAML project descriptor.
    descriptor: PathBuf,

    #[arg(long, env = "SYMHOUND_DB_PATH")]
    db_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct ProjectDescriptor {
    name: String,
    repository: Option<String>,
    versions: Vec<VersionDescriptor>,
}

#[derive(Debug, Deserialize)]
struct VersionDescriptor {
    name: String,
    platform: i32,
    objects: Vec<ObjectDescriptor>,
}

#[derive(Debug, Deserialize)]
struct ObjectDescriptor {
    name: String,
    path: PathBuf,
    upstream: Option<String>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to start async runtime: {e}");
            return ExitCode::from(3);
        }
    };

    match runtime.block_on(run()) {
        Ok(summary) => {
            println!("{summary}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            e.exit_code()
        }
    }
}

async fn run() -> Result<String> {
    let args = IngestArgs::parse();
    let mut config = EngineConfig::from_env();
    if let Some(db_path) = args.db_path {
        config.db_path = db_path;
    }

    let descriptor_bytes = std::fs::read(&args.descriptor)?;
    let descriptor: ProjectDescriptor =
        serde_yaml::from_slice(&descriptor_bytes).map_err(|e| SymhoundError::InvalidArgument {
            message: format!("malformed project descriptor {}: {e}", args.descriptor.display()),
        })?;

    let store = Arc::new(SqliteStore::open(
        &config.db_path,
        config.blob_root,
        config.window_width,
        config.hash_seed,
        config.max_anchor_count,
    )?);

    let mut ingested_sources = 0usize;
    let mut ingested_symbols = 0usize;

    for version in &descriptor.versions {
        for object in &version.objects {
            let stream_count = ingest_object(&store, &descriptor, version, object, config.hash_seed)
                .await?;
            ingested_sources += 1;
            ingested_symbols += stream_count;
        }
    }

    Ok(format!(
        "ingested {ingested_sources} source(s), {ingested_symbols} symbol(s) from '{}'",
        descriptor.name
    ))
}

async fn ingest_object(
    store: &Arc<SqliteStore>,
    descriptor: &ProjectDescriptor,
    version: &VersionDescriptor,
    object: &ObjectDescriptor,
    hash_seed: u64,
) -> Result<usize> {
    if !object.path.exists() {
        return Err(SymhoundError::InvalidArgument {
            message: format!("object file not found: {}", object.path.display()),
        });
    }

    let object_bytes = std::fs::read(&object.path)?;
    let object_hash = content_hash(&object_bytes);

    let adapter = adapter_for(&object.path);
    let streams = adapter.disassemble(&object_bytes)?;
    let symbols = MatchService::fingerprint_batch(hash_seed, &streams);
    let symbol_count = symbols.len();

    let store = store.clone();
    let new_source = NewSource {
        project_name: descriptor.name.clone(),
        project_repository_url: descriptor.repository.clone(),
        version_name: Some(version.name.clone()),
        platform: Some(version.platform),
        object_hash,
        object_storage_path: object.path.display().to_string(),
        source_name: object.name.clone(),
        upstream: object.upstream.clone(),
        symbols,
    };

    tokio::task::spawn_blocking(move || store.insert_source(new_source))
        .await
        .expect("insert_source task panicked")?;

    Ok(symbol_count)
}

/// No production disassembler backend ships with this crate (Non-goal);
/// every object is read through the JSON-sidecar `StubAdapter` instead.
fn adapter_for(object_path: &Path) -> Box<dyn DisassemblerAdapter> {
    Box::new(StubAdapter::new(object_path.to_path_buf()))
}

fn content_hash(bytes: &[u8]) -> String {
    format!("{:016x}", xxhash_rust::xxh3::xxh3_64(bytes))
}
