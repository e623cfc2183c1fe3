pub mod classify;
pub mod matcher;
pub mod runner;

pub use classify::{classify, Partition};
pub use matcher::{match_record, MatchOutcome};
pub use runner::{synchronize_records, SyncOptions};

use anyhow::Result;

/// Cooperative-yield hook for the external job scheduler: "may I pause
/// now". Called after the identifier maps are built and periodically while
/// scanning the to-check set. No execution state is persisted across
/// checkpoints; a killed-and-restarted run reclassifies from scratch and
/// stays convergent because patching is idempotent.
pub trait Scheduler {
    fn checkpoint(&mut self) -> Result<()>;
}

/// Scheduler for standalone CLI runs: never pauses
#[derive(Debug, Default)]
pub struct NoopScheduler;

impl Scheduler for NoopScheduler {
    fn checkpoint(&mut self) -> Result<()> {
        Ok(())
    }
}
