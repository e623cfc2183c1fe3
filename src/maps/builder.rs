use anyhow::Result;
use log::info;
use std::time::Instant;

use super::IdentifierMaps;
use crate::common::{format_elapsed, HalDoc};

/// Build the identifier maps by consuming a harvested document sequence
/// exactly once. The first harvest error aborts the build.
pub fn build_identifier_maps<I>(docs: I) -> Result<IdentifierMaps>
where
    I: IntoIterator<Item = Result<HalDoc>>,
{
    info!("Getting HAL records...");
    let start = Instant::now();

    let mut maps = IdentifierMaps::new();
    let mut processed = 0usize;

    for doc in docs {
        maps.insert(doc?);

        processed += 1;
        if processed % 100_000 == 0 {
            info!(
                "  Processed {} documents ({} recids, {} arXiv ids, {} DOIs indexed)...",
                processed,
                maps.recid_len(),
                maps.arxiv_len(),
                maps.doi_len()
            );
        }
    }

    info!(
        "Built identifier maps from {} documents ({} recids, {} arXiv ids, {} DOIs) in {}",
        processed,
        maps.recid_len(),
        maps.arxiv_len(),
        maps.doi_len(),
        format_elapsed(start.elapsed())
    );

    Ok(maps)
}
