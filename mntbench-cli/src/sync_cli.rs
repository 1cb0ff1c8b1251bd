//! Sync and status commands

use anyhow::Result;
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;

use mntbench_core::config::SyncConfig;
use mntbench_core::context::{CorpusStatus, LastSyncResult, SyncOutcome};
use mntbench_core::BenchContext;

#[derive(Parser, Debug)]
pub struct SyncArgs {
    /// Only report whether a newer release exists
    #[clap(long)]
    pub check_only: bool,

    /// Skip confirmation prompt
    #[clap(short, long)]
    pub yes: bool,
}

pub async fn execute_sync(args: SyncArgs, config: SyncConfig) -> Result<()> {
    let context = BenchContext::from_config(&config)?;
    if let Err(e) = context.load_installed().await {
        tracing::warn!("Ignoring installed corpus: {}", e);
    }

    let local = context.corpus_status().version;
    println!("Checking {} for corpus releases...", config.repository);
    let remote = context.check_remote_version().await?;

    if local.as_ref() == Some(&remote) {
        println!("Corpus {remote} is up to date.");
        return Ok(());
    }

    match &local {
        Some(local) => println!("New corpus version available: {local} -> {remote}"),
        None => println!("No corpus installed; latest release is {remote}"),
    }
    if args.check_only {
        return Ok(());
    }

    if !args.yes {
        print!("Download and install it? [y/N]: ");
        std::io::stdout().flush()?;
        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        if !matches!(input.trim().to_lowercase().as_str(), "y" | "yes") {
            println!("Keeping the installed corpus.");
            return Ok(());
        }
    }

    let report = context.sync().await?;
    match report.outcome {
        SyncOutcome::Updated => println!(
            "Installed corpus {} ({} benchmark files).",
            report
                .version
                .map(|v| v.to_string())
                .unwrap_or_default(),
            report.entry_count
        ),
        SyncOutcome::UpToDate => println!("Corpus is up to date."),
        SyncOutcome::Coalesced => println!("Another sync is already running."),
    }
    Ok(())
}

pub async fn execute_status(
    config: Option<&PathBuf>,
    corpus: Option<&PathBuf>,
    json_output: bool,
) -> Result<()> {
    let context = match corpus {
        Some(dir) => BenchContext::open_local(dir)?,
        None => {
            let context = BenchContext::from_config(&crate::load_config(config)?)?;
            context.load_installed().await?;
            context
        }
    };
    let status = context.corpus_status();

    if json_output {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        print_status(&status);
    }
    Ok(())
}

fn print_status(status: &CorpusStatus) {
    let Some(version) = &status.version else {
        println!("No corpus installed. Run `mntbench sync` to fetch one.");
        return;
    };

    println!("Corpus:    {version}");
    if let Some(root) = &status.corpus_root {
        println!("Location:  {}", root.display());
    }
    println!("Files:     {}", status.entry_count);
    println!("Size:      {} bytes", status.total_size);
    if status.skipped_count > 0 {
        println!("Skipped:   {} non-benchmark file(s)", status.skipped_count);
    }

    if let Some(last) = &status.last_sync {
        let result = match &last.result {
            LastSyncResult::UpToDate { version } => format!("up to date ({version})"),
            LastSyncResult::Updated { to, .. } => format!("updated to {to}"),
            LastSyncResult::Failed { state, .. } => state.to_string(),
        };
        println!("Last sync: {} at {}", result, last.finished_at);
    }
}
