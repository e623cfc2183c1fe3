use clap::{Parser, Subcommand};

use crate::harvest::DEFAULT_ENDPOINT;

#[derive(Parser)]
#[command(name = "hal-sync")]
#[command(about = "Harvest HAL cross-references and match them to local bibliographic records")]
#[command(version = "1.0.0")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full harvest -> classify -> match -> emit synchronization
    Sync(SyncArgs),

    /// Harvest HAL and report identifier map statistics
    Harvest(HarvestArgs),
}

#[derive(Parser, Clone)]
pub struct SyncArgs {
    /// Local records dump (JSONL, optionally gzipped)
    #[arg(short, long, required = true)]
    pub records: String,

    /// Replay a harvested docs dump instead of querying the HAL API
    #[arg(long)]
    pub docs: Option<String>,

    /// Output MARCXML patch batch file
    #[arg(short, long, default_value = "hal_patches.xml")]
    pub output: String,

    /// HAL search API endpoint
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Documents per page request
    #[arg(long, default_value = "5000")]
    pub page_size: usize,

    /// Timeout in seconds per harvest request
    #[arg(short, long, default_value = "60")]
    pub timeout: u64,

    /// Patches per upload batch
    #[arg(long, default_value = "1000")]
    pub chunk_size: usize,

    /// Records between cooperative checkpoints while scanning
    #[arg(long, default_value = "1000")]
    pub checkpoint_every: usize,

    /// Classify and match without writing patches
    #[arg(long, default_value = "false")]
    pub dry_run: bool,

    /// Logging level (DEBUG, INFO, WARN, ERROR)
    #[arg(short, long, default_value = "INFO")]
    pub log_level: String,
}

#[derive(Parser, Clone)]
pub struct HarvestArgs {
    /// Write harvested documents to this JSONL file for later replay
    #[arg(short, long)]
    pub output: Option<String>,

    /// HAL search API endpoint
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Documents per page request
    #[arg(long, default_value = "5000")]
    pub page_size: usize,

    /// Timeout in seconds per harvest request
    #[arg(short, long, default_value = "60")]
    pub timeout: u64,

    /// Stop after this many pages (exploratory runs)
    #[arg(long)]
    pub max_pages: Option<usize>,

    /// Logging level (DEBUG, INFO, WARN, ERROR)
    #[arg(short, long, default_value = "INFO")]
    pub log_level: String,
}
