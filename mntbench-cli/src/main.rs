//! MNT Bench - browse, filter and download FCN layout benchmarks
//!
//! Main entry point: argument parsing, logging setup and corpus loading.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use mntbench_core::config::SyncConfig;
use mntbench_core::BenchContext;

mod catalog_cli;
mod sync_cli;

/// Log levels
#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Log output formats
#[derive(Debug, Clone, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[clap(
    name = "mntbench",
    about = "Benchmark suite for field-coupled nanocomputing layouts",
    version
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,

    /// Set log level
    #[clap(long, default_value = "warn", global = true)]
    log_level: LogLevel,

    /// Log output format
    #[clap(long, default_value = "text", global = true)]
    log_format: LogFormat,

    /// Override configuration file path
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    /// Use this corpus directory as-is instead of the synced one
    #[clap(long, global = true, conflicts_with = "offline")]
    corpus: Option<PathBuf>,

    /// Never contact the remote; use the installed corpus only
    #[clap(long, global = true)]
    offline: bool,
}

#[derive(Parser, Debug)]
enum Command {
    /// Check for a newer corpus release and install it
    Sync(sync_cli::SyncArgs),

    /// Show the installed corpus version and last sync result
    Status {
        /// Output as JSON
        #[clap(long)]
        json: bool,
    },

    /// List the distinct values of an attribute in the corpus
    Values(catalog_cli::ValuesArgs),

    /// List benchmark files matching filters
    Query(catalog_cli::QueryArgs),

    /// Write benchmark files matching filters into a zip archive
    Download(catalog_cli::DownloadArgs),
}

/// How the corpus should be made available before a command runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Readiness {
    /// Load what is installed; no network
    Installed,
    /// Load what is installed, then sync with the remote
    Synced,
}

/// Initialize tracing with CLI flags
///
/// Logs always go to stderr so that JSON output on stdout stays clean.
fn initialize_tracing(log_level: &LogLevel, log_format: &LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_filter_directive()));

    match log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init(),
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init(),
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<SyncConfig> {
    let config = match path {
        Some(path) => SyncConfig::load_from_path(path)?,
        None => SyncConfig::load()?,
    };
    Ok(config)
}

/// Build the context and load a corpus into it
async fn open_context(
    config: Option<&PathBuf>,
    corpus: Option<&PathBuf>,
    readiness: Readiness,
) -> Result<BenchContext> {
    if let Some(dir) = corpus {
        return BenchContext::open_local(dir)
            .with_context(|| format!("Failed to open corpus directory {}", dir.display()));
    }

    let context = BenchContext::from_config(&load_config(config)?)?;
    match readiness {
        Readiness::Synced => {
            context.ensure_ready().await?;
        }
        Readiness::Installed => {
            if !context.load_installed().await? {
                anyhow::bail!(
                    "No corpus installed yet. Run `mntbench sync` or pass --corpus <DIR>."
                );
            }
        }
    }
    Ok(context)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    initialize_tracing(&cli.log_level, &cli.log_format);

    let readiness = if cli.offline {
        Readiness::Installed
    } else {
        Readiness::Synced
    };
    let config = cli.config.as_ref();
    let corpus = cli.corpus.as_ref();

    match cli.command {
        Command::Sync(args) => {
            if corpus.is_some() {
                anyhow::bail!("--corpus cannot be combined with sync");
            }
            sync_cli::execute_sync(args, load_config(config)?).await
        }
        Command::Status { json } => sync_cli::execute_status(config, corpus, json).await,
        Command::Values(args) => {
            let context = open_context(config, corpus, readiness).await?;
            catalog_cli::execute_values(&context, args)
        }
        Command::Query(args) => {
            let context = open_context(config, corpus, readiness).await?;
            catalog_cli::execute_query(&context, args)
        }
        Command::Download(args) => {
            let context = open_context(config, corpus, readiness).await?;
            catalog_cli::execute_download(&context, args)
        }
    }
}
