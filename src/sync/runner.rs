use anyhow::{Context, Result};
use log::info;
use std::time::Instant;
use uuid::Uuid;

use super::{classify, match_record, MatchOutcome, Scheduler};
use crate::common::{format_elapsed, HalDoc, SyncStats, HAL_SOURCE_MARKER, TAG_HAL_SOURCE};
use crate::ingest::{ChunkedPatchUpload, Patch, PatchSink};
use crate::maps::build_identifier_maps;
use crate::store::RecordStore;

/// Tunables for one synchronization run
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Patches per upload batch
    pub chunk_size: usize,
    /// Records between cooperative checkpoints while scanning to-check
    pub checkpoint_every: usize,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            checkpoint_every: 1000,
        }
    }
}

/// Run the full harvest-classify-match-emit pipeline.
///
/// `docs` is the harvested document sequence (live harvester or dump
/// replay), consumed exactly once. The sink is handed back so the caller
/// can close it. Purely additive and idempotent: running twice against an
/// unchanged remote and local store emits nothing new the second time,
/// because every patched record joins the already-matched set.
pub fn synchronize_records<I, S, K, C>(
    docs: I,
    store: &S,
    sink: K,
    scheduler: &mut C,
    options: &SyncOptions,
) -> Result<(SyncStats, K)>
where
    I: IntoIterator<Item = Result<HalDoc>>,
    S: RecordStore,
    K: PatchSink,
    C: Scheduler + ?Sized,
{
    let start = Instant::now();
    let run_id = Uuid::new_v4();
    let mut stats = SyncStats::default();

    info!("Starting HAL synchronization run {}", run_id);

    let maps = build_identifier_maps(docs).context("Harvesting stage failed")?;
    stats.docs_harvested = maps.doc_count();
    stats.recid_map_size = maps.recid_len();
    stats.arxiv_map_size = maps.arxiv_len();
    stats.doi_map_size = maps.doi_len();

    scheduler
        .checkpoint()
        .context("Scheduler checkpoint after map construction failed")?;

    let universe = store
        .eligible_records()
        .context("Classifying stage failed: eligible-universe query")?;
    info!("Total matchable records: {}", universe.len());

    let already_matched = store
        .search_pattern(TAG_HAL_SOURCE, HAL_SOURCE_MARKER)
        .context("Classifying stage failed: already-matched query")?;
    info!("Already matched records: {}", already_matched.len());

    let partition = classify(&universe, &already_matched, &maps);
    stats.universe = universe.len();
    stats.already_matched = partition.already_matched.len();
    stats.newly_direct = partition.newly_direct.len();
    stats.to_check = partition.to_check.len();

    info!("New records pushed from the local repository: {}", stats.newly_direct);

    let mut upload = ChunkedPatchUpload::new(sink, options.chunk_size);

    let mut newly_direct: Vec<u32> = partition.newly_direct.iter().copied().collect();
    newly_direct.sort_unstable();
    for recid in newly_direct {
        if let Some(doc) = maps.recid_doc(recid) {
            info!("Record {} matched HAL document {}", recid, doc.hal_id);
            upload
                .add(Patch::new(recid, &doc.hal_id))
                .context("Emitting stage failed for directly-linked record")?;
            stats.patches_emitted += 1;
        }
    }
    info!("Added HAL ids to all records pushed from the local repository");

    let mut to_check: Vec<u32> = partition.to_check.iter().copied().collect();
    to_check.sort_unstable();
    info!("Additional records to be checked: {}", to_check.len());

    let cadence = options.checkpoint_every.max(1);
    for (i, &recid) in to_check.iter().enumerate() {
        if i % cadence == 0 {
            info!("{} records done out of {}", i, to_check.len());
            scheduler
                .checkpoint()
                .context("Scheduler checkpoint during matching failed")?;
        }

        match match_record(store, &maps, recid).context("Matching stage failed")? {
            MatchOutcome::Matched(matched) => {
                info!("Record {} matched HAL document {}", matched.recid, matched.hal_id);
                upload
                    .add(Patch::new(matched.recid, &matched.hal_id))
                    .context("Emitting stage failed for matched record")?;
                stats.matched_secondary += 1;
                stats.patches_emitted += 1;
            }
            MatchOutcome::Ambiguous => {
                stats.ambiguous_skipped += 1;
            }
            MatchOutcome::NoMatch => {}
        }
    }

    let sink = upload.finish().context("Emitting stage failed: final flush")?;

    info!("==================== FINAL SUMMARY ====================");
    info!("Run id: {}", run_id);
    info!("Harvested documents: {}", stats.docs_harvested);
    info!(
        "Identifier maps: {} recids, {} arXiv ids, {} DOIs",
        stats.recid_map_size, stats.arxiv_map_size, stats.doi_map_size
    );
    info!("Total matchable records: {}", stats.universe);
    info!("Already matched records: {}", stats.already_matched);
    info!("New records pushed from the local repository: {}", stats.newly_direct);
    info!("Records checked by secondary identifiers: {}", stats.to_check);
    info!("Matched by secondary identifiers: {}", stats.matched_secondary);
    info!("Ambiguous records skipped: {}", stats.ambiguous_skipped);
    info!("Patches emitted: {}", stats.patches_emitted);
    info!("Total execution time: {}", format_elapsed(start.elapsed()));
    info!("========================================================");

    Ok((stats, sink))
}
