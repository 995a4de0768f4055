use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use delve_core::journal::BUILD_ID;
use delve_core::{load_journal_from_file, replay_to_end};
use delve_tools::{init_tracing, load_config};
use tracing::{info, warn};

/// Replays a hash-chained input journal and prints where the run ends up.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSONL journal written by `JournalWriter`
    #[arg(short, long)]
    journal: PathBuf,
    /// TOML file overriding the default simulation constants
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    let loaded = load_journal_from_file(&args.journal)
        .with_context(|| format!("failed to load journal {}", args.journal.display()))?;
    if loaded.journal.build_id != BUILD_ID {
        warn!(recorded = %loaded.journal.build_id, current = BUILD_ID, "journal was recorded by another build");
    }
    info!(seed = loaded.journal.seed, inputs = loaded.journal.inputs.len(), "journal loaded");

    let result = replay_to_end(&config, &loaded.journal).context("replay diverged")?;

    println!("Replay complete.");
    match result.final_outcome {
        Some(outcome) => println!("Outcome: {outcome:?}"),
        None => println!("Outcome: in progress"),
    }
    println!("Floor: {}", result.final_floor);
    println!("Turn: {}", result.final_turn);
    println!("Inputs: {}", result.inputs_applied);
    println!("Events: {}", result.event_count);
    println!("Snapshot Hash: {:016x}", result.final_snapshot_hash);
    Ok(())
}
