use anyhow::{Context, Result};
use log::warn;
use std::collections::BTreeSet;

use crate::common::{MatchResult, TAG_DOI, TAG_REPORT_NUMBER};
use crate::maps::IdentifierMaps;
use crate::store::RecordStore;

/// What the secondary-identifier lookup decided for one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    Matched(MatchResult),
    /// The record's identifiers point at more than one distinct HAL
    /// document; skipped rather than tie-broken
    Ambiguous,
    /// No counterpart on the remote side yet
    NoMatch,
}

/// Resolve one to-check record against the secondary identifier maps.
///
/// The record's stored DOI and report-number values are fetched from the
/// local store and looked up in `by_doi` / `by_arxiv`. Candidates are
/// counted by distinct document identity: two lookups landing on the same
/// harvested document are one candidate, not two.
pub fn match_record<S: RecordStore>(
    store: &S,
    maps: &IdentifierMaps,
    recid: u32,
) -> Result<MatchOutcome> {
    let dois = store
        .field_values(recid, TAG_DOI)
        .with_context(|| format!("Failed to fetch DOI values for record {}", recid))?;
    let report_numbers = store
        .field_values(recid, TAG_REPORT_NUMBER)
        .with_context(|| format!("Failed to fetch report numbers for record {}", recid))?;

    let mut candidates: BTreeSet<usize> = BTreeSet::new();
    for doi in &dois {
        if let Some(idx) = maps.doi_index(doi) {
            candidates.insert(idx);
        }
    }
    for report_number in &report_numbers {
        if let Some(idx) = maps.arxiv_index(report_number) {
            candidates.insert(idx);
        }
    }

    if candidates.len() > 1 {
        let hal_ids: Vec<&str> = candidates
            .iter()
            .map(|&idx| maps.doc(idx).hal_id.as_str())
            .collect();
        warn!(
            "Record {} matches more than 1 HAL document: {}",
            recid,
            hal_ids.join(", ")
        );
        return Ok(MatchOutcome::Ambiguous);
    }

    Ok(match candidates.into_iter().next() {
        Some(idx) => MatchOutcome::Matched(MatchResult {
            recid,
            hal_id: maps.doc(idx).hal_id.clone(),
        }),
        None => MatchOutcome::NoMatch,
    })
}
