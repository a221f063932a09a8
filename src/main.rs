//! `symhound` query CLI entry point.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use symhound::cli::{Cli, Command};
use symhound::config::EngineConfig;
use symhound::service::MatchService;
use symhound::store::SqliteStore;
use symhound::Result;

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
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            e.exit_code()
        }
    }
}

async fn run() -> Result<String> {
    let cli = Cli::parse();
    let mut config = EngineConfig::from_env();
    if let Some(db_path) = cli.db_path {
        config.db_path = db_path;
    }

    let store = Arc::new(SqliteStore::open(
        &config.db_path,
        config.blob_root,
        config.window_width,
        config.hash_seed,
        config.max_anchor_count,
    )?);
    let service = MatchService::new(store.clone());

    let output = match cli.command {
        Command::Get { slug } => {
            let meta = tokio::task::spawn_blocking({
                let store = store.clone();
                move || store.get_symbol(&slug)
            })
            .await
            .expect("get task panicked")?;
            serde_json::to_string_pretty(&meta).expect("SymbolMeta always serializes")
        }
        Command::Match { slug } => {
            let matches = service.full_matches(slug).await?;
            serde_json::to_string_pretty(&matches).expect("FullMatches always serializes")
        }
        Command::Submatch {
            slug,
            start,
            end,
            min_len,
            sort,
            dir,
            page,
            page_size,
        } => {
            let (_tx, rx) = tokio::sync::oneshot::channel();
            let result = service
                .find_submatches(slug, start, end, min_len, sort.into(), dir.into(), page, page_size, rx)
                .await?;
            serde_json::json!({
                "total_count": result.total,
                "submatches": result.rows,
            })
            .to_string()
        }
        Command::Search { fragment } => {
            let rows = tokio::task::spawn_blocking({
                let store = store.clone();
                move || store.find_by_name_prefix(&fragment)
            })
            .await
            .expect("search task panicked")?;
            serde_json::to_string_pretty(&rows).expect("rows always serialize")
        }
        Command::Source { slug_or_name } => {
            let meta = tokio::task::spawn_blocking({
                let store = store.clone();
                move || store.get_source(&slug_or_name)
            })
            .await
            .expect("source lookup task panicked")?;
            serde_json::to_string_pretty(&meta).expect("SourceMeta always serializes")
        }
        Command::Projects => {
            let rows = tokio::task::spawn_blocking({
                let store = store.clone();
                move || store.list_projects()
            })
            .await
            .expect("projects task panicked")?;
            serde_json::to_string_pretty(&rows).expect("rows always serialize")
        }
        Command::Cluster {
            source_name,
            min_size,
            cross_source,
        } => {
            let source_id = tokio::task::spawn_blocking({
                let store = store.clone();
                let source_name = source_name.clone();
                move || store.source_id_by_slug_or_name(&source_name)
            })
            .await
            .expect("source lookup task panicked")?;
            let clusters = tokio::task::spawn_blocking({
                let store = store.clone();
                move || store.cluster_source(source_id, min_size, cross_source)
            })
            .await
            .expect("cluster task panicked")?;
            serde_json::to_string_pretty(&clusters).expect("clusters always serialize")
        }
    };

    Ok(output)
}
