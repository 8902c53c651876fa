//! filedex: operator tool for the media catalog.
//!
//! Reads connection settings from the environment (and `.env`), runs one
//! catalog operation, and prints the result as JSON on stdout. Logs go to
//! stderr, or to `LOG_FILE` when set.

use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use filedex_db::{log_pool_metrics, CatalogConfig, Database};
use filedex_search::{Catalog, EntryFilter, FileType, DEFAULT_MAX_RESULTS};

#[derive(Parser, Debug)]
#[command(name = "filedex")]
#[command(author, version, about = "Media catalog search and maintenance")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the catalog's secondary indexes if missing
    EnsureIndexes,

    /// Search file names for terms, in order, case-insensitively
    Search {
        /// Free-text query; an empty query matches every entry
        query: String,

        /// Only match entries of this type (document, video, audio, ...)
        #[arg(short = 't', long = "type")]
        file_type: Option<FileType>,

        /// Maximum number of entries to return
        #[arg(short, long, default_value_t = DEFAULT_MAX_RESULTS)]
        limit: u32,

        /// Number of matches to skip
        #[arg(short, long, default_value_t = 0)]
        offset: u32,
    },

    /// Look up one entry by file id
    Get {
        file_id: String,
    },

    /// Count entries, optionally of one type
    Count {
        #[arg(short = 't', long = "type")]
        file_type: Option<FileType>,
    },

    /// Delete every entry of one type
    Delete {
        #[arg(short = 't', long = "type")]
        file_type: FileType,

        /// Confirm the deletion; it cannot be undone
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Serialize)]
struct CountOutput {
    count: u64,
}

#[derive(Serialize)]
struct DeleteOutput {
    file_type: FileType,
    deleted: u64,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let _guard = init_logging();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Initialize tracing.
///
/// Environment variables:
///   LOG_FORMAT  - "json" or "text" (default: "text")
///   LOG_FILE    - path to log file (optional, daily rotation)
///   LOG_ANSI    - "true"/"false" override ANSI colors
///   RUST_LOG    - standard env filter (default: "filedex=info,warn")
fn init_logging() -> Option<WorkerGuard> {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "filedex=info,filedex_db=info,filedex_search=info,warn".into());
    let registry = tracing_subscriber::registry().with(env_filter);

    let guard = if let Some(ref path) = log_file {
        let path = std::path::Path::new(path);
        let file_dir = path.parent().unwrap_or(std::path::Path::new("."));
        let file_name = path
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("filedex.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(non_blocking))
                .init();
        } else {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(log_ansi.unwrap_or(false));
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        // stdout carries command output
        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        subsystem = "cli",
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stderr)"),
        "Logging initialized"
    );
    guard
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    // Refuse before connecting so a missing flag never touches the store.
    if let Commands::Delete { yes: false, file_type } = &cli.command {
        bail!(
            "refusing to delete every {} entry without --yes",
            file_type
        );
    }

    let config = CatalogConfig::from_env().context("invalid catalog configuration")?;
    info!(
        subsystem = "cli",
        database = %config.redacted_uri(),
        collection = %config.collection_name,
        "Connecting to catalog"
    );
    let db = Database::connect(&config)
        .await
        .context("failed to connect to the catalog store")?;
    let catalog = Catalog::from_store(db.store.clone());

    let code = execute(&catalog, cli.command).await;
    log_pool_metrics(db.pool());
    code
}

async fn execute(catalog: &Catalog, command: Commands) -> anyhow::Result<ExitCode> {
    match command {
        Commands::EnsureIndexes => {
            let report = catalog.ensure_indexes().await;
            print_json(&report)?;
        }
        Commands::Search {
            query,
            file_type,
            limit,
            offset,
        } => {
            let page = catalog.search_page(&query, file_type, limit, offset).await?;
            print_json(&page)?;
        }
        Commands::Get { file_id } => match catalog.find_one(&file_id).await? {
            Some(entry) => print_json(&entry)?,
            None => {
                eprintln!("No entry with file id {}", file_id);
                return Ok(ExitCode::from(2));
            }
        },
        Commands::Count { file_type } => {
            let filter = file_type.map(EntryFilter::by_type).unwrap_or_default();
            let count = catalog.count_documents(&filter).await?;
            print_json(&CountOutput { count })?;
        }
        Commands::Delete { file_type, .. } => {
            let deleted = catalog.delete_many(&EntryFilter::by_type(file_type)).await?;
            print_json(&DeleteOutput { file_type, deleted })?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_search_defaults() {
        let cli = Cli::try_parse_from(["filedex", "search", "the matrix"]).unwrap();
        match cli.command {
            Commands::Search {
                query,
                file_type,
                limit,
                offset,
            } => {
                assert_eq!(query, "the matrix");
                assert_eq!(file_type, None);
                assert_eq!(limit, DEFAULT_MAX_RESULTS);
                assert_eq!(offset, 0);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_search_with_type_and_paging() {
        let cli = Cli::try_parse_from([
            "filedex", "search", "report", "--type", "Document", "--limit", "3", "--offset", "6",
        ])
        .unwrap();
        match cli.command {
            Commands::Search {
                file_type,
                limit,
                offset,
                ..
            } => {
                assert_eq!(file_type, Some(FileType::Document));
                assert_eq!(limit, 3);
                assert_eq!(offset, 6);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_unknown_type() {
        assert!(Cli::try_parse_from(["filedex", "count", "--type", "hologram"]).is_err());
    }

    #[test]
    fn test_delete_requires_type() {
        assert!(Cli::try_parse_from(["filedex", "delete", "--yes"]).is_err());
    }

    #[tokio::test]
    async fn test_delete_without_yes_is_refused_before_connecting() {
        let cli = Cli::try_parse_from(["filedex", "delete", "--type", "video"]).unwrap();
        let err = run(cli).await.unwrap_err();
        assert!(err.to_string().contains("--yes"));
    }

    #[tokio::test]
    async fn test_execute_against_memory_store() {
        use filedex_search::{CatalogEntry, MemoryCatalogStore};

        let catalog = Catalog::from_store(MemoryCatalogStore::new());
        catalog
            .save(&CatalogEntry::new("v1").with_file_type(FileType::Video))
            .await
            .unwrap();

        let count = Cli::try_parse_from(["filedex", "count", "--type", "video"]).unwrap();
        assert!(execute(&catalog, count.command).await.is_ok());

        let delete = Cli::try_parse_from(["filedex", "delete", "--type", "video", "--yes"]).unwrap();
        assert!(execute(&catalog, delete.command).await.is_ok());
        assert!(!catalog.exists("v1").await.unwrap());

        let get = Cli::try_parse_from(["filedex", "get", "v1"]).unwrap();
        let code = execute(&catalog, get.command).await.unwrap();
        assert_eq!(format!("{:?}", code), format!("{:?}", ExitCode::from(2)));
    }
}
