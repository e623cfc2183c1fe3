use crate::maps::IdentifierMaps;
use crate::store::RecordSet;

/// Three-way partition of the local records for one run
#[derive(Debug, Clone)]
pub struct Partition {
    /// Records already carrying the HAL annotation
    pub already_matched: RecordSet,
    /// Records the remote side already knows how to link, not yet annotated
    pub newly_direct: RecordSet,
    /// Everything else, requiring secondary-identifier matching
    pub to_check: RecordSet,
}

/// Classify the local records against the harvested maps.
///
/// The order of computation guarantees the three sets are disjoint, so no
/// record is matched twice and the Matcher never repeats work:
/// `newly_direct` removes already-annotated records from the direct-id keys,
/// and `to_check` removes both prior sets from the universe.
pub fn classify(
    universe: &RecordSet,
    already_matched: &RecordSet,
    maps: &IdentifierMaps,
) -> Partition {
    let newly_direct: RecordSet = maps
        .recid_keys()
        .filter(|recid| !already_matched.contains(recid))
        .collect();

    let to_check: RecordSet = universe
        .iter()
        .copied()
        .filter(|recid| !already_matched.contains(recid) && !newly_direct.contains(recid))
        .collect();

    Partition {
        already_matched: already_matched.clone(),
        newly_direct,
        to_check,
    }
}
