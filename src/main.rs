use anyhow::Result;
use clap::Parser;

use hal_record_sync::cli::{Cli, Commands};
use hal_record_sync::commands::{run_harvest, run_sync};

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Sync(args) => {
            run_sync(args)?;
        }
        Commands::Harvest(args) => {
            run_harvest(args)?;
        }
    }

    Ok(())
}
