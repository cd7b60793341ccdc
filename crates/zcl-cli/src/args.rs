//! Clap argument definitions. Kept separate from dispatch so the help
//! text and flag grammar can be read without the command bodies.

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};

/// `zcl` - harness for orchestrating AI-agent attempts and capturing
/// verifiable evidence.
#[derive(Parser)]
#[command(name = "zcl")]
#[command(about = "Orchestrate AI-agent attempts and capture verifiable evidence")]
#[command(version)]
pub struct Cli {
    /// Artifact tree root (overrides ZCL_OUT_ROOT / project / user config).
    #[arg(long, global = true)]
    pub out_root: Option<String>,

    /// Runtime strategy chain, comma-separated (overrides ZCL_RUNTIME_STRATEGIES).
    #[arg(long, global = true)]
    pub strategies: Option<String>,

    /// Enable debug-level logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Allocate a run (if needed) and a new attempt directory inside it.
    Start {
        /// Reuse an existing runId instead of allocating one.
        #[arg(long)]
        run_id: Option<String>,
        #[arg(long)]
        suite_id: String,
        #[arg(long)]
        mission_id: String,
        #[arg(long)]
        agent_id: Option<String>,
        /// `discovery` (default) or `ci`.
        #[arg(long, default_value = "discovery", value_parser = ["discovery", "ci"])]
        mode: String,
        #[arg(long, default_value_t = 1)]
        retry: u32,
        /// Prompt text, or read from stdin when `-`.
        #[arg(long)]
        prompt: Option<String>,
        #[arg(long)]
        timeout_ms: Option<u64>,
    },

    /// Validate an attempt or run directory against the artifact contract.
    Validate {
        /// Path to an attempt directory or a run directory.
        target: Utf8PathBuf,
        #[arg(long)]
        strict: bool,
    },

    /// Build (and persist) `attempt.report.json` for an attempt.
    Report {
        /// Path to an attempt directory.
        target: Utf8PathBuf,
        #[arg(long)]
        strict: bool,
    },

    /// Fan a suite document out into one attempt per mission.
    Plan {
        /// Path to the suite document (opaque JSON).
        suite: Utf8PathBuf,
        #[arg(long)]
        run_id: Option<String>,
        #[arg(long)]
        agent_id: Option<String>,
        #[arg(long, default_value_t = 1)]
        retry: u32,
    },

    /// Evict aged-out or over-budget unpinned runs.
    Gc {
        #[arg(long)]
        max_age_days: Option<u32>,
        #[arg(long)]
        max_total_bytes: Option<u64>,
        #[arg(long)]
        dry_run: bool,
    },

    /// Pin or unpin a run so GC always skips it.
    Pin {
        run_id: String,
        #[arg(long)]
        unpin: bool,
    },

    /// Run the non-destructive environment self-check.
    Doctor,
}
