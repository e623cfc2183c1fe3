pub mod builder;
pub mod normalize;

pub use builder::build_identifier_maps;
pub use normalize::{normalize_arxiv_id, normalize_doi, parse_recid};

use log::warn;
use std::collections::HashMap;

use crate::common::HalDoc;

/// Lookup tables over harvested HAL documents, keyed by the three
/// identifier kinds.
///
/// Documents live in an arena; the maps hold arena indices, so two map
/// entries pointing at the same index are the same document. The Matcher's
/// distinct-candidate counting relies on this (identity, not value).
/// Built once per run; duplicate identifier values overwrite earlier
/// entries (last write wins).
#[derive(Debug, Clone, Default)]
pub struct IdentifierMaps {
    docs: Vec<HalDoc>,
    by_recid: HashMap<u32, usize>,
    by_arxiv: HashMap<String, usize>,
    by_doi: HashMap<String, usize>,
}

impl IdentifierMaps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert one harvested document, indexing whichever identifier kinds
    /// it carries. A `inspire_id` that does not parse as a positive integer
    /// is skipped with a warning; the document's other mappings are kept.
    pub fn insert(&mut self, doc: HalDoc) {
        let idx = self.docs.len();

        if let Some(raw) = &doc.inspire_id {
            match parse_recid(raw) {
                Some(recid) => {
                    self.by_recid.insert(recid, idx);
                }
                None => {
                    warn!("Invalid recid '{}' for HAL document {}", raw, doc.hal_id);
                }
            }
        }
        if let Some(raw) = &doc.arxiv_id {
            self.by_arxiv.insert(normalize_arxiv_id(raw), idx);
        }
        if let Some(raw) = &doc.doi {
            self.by_doi.insert(normalize_doi(raw), idx);
        }

        self.docs.push(doc);
    }

    /// The document behind an index previously returned by a lookup
    pub fn doc(&self, idx: usize) -> &HalDoc {
        &self.docs[idx]
    }

    pub fn recid_doc(&self, recid: u32) -> Option<&HalDoc> {
        self.by_recid.get(&recid).map(|&idx| &self.docs[idx])
    }

    /// Arena index of the document carrying this DOI, if any.
    /// DOIs are case-insensitive; lookup lowercases like insertion does.
    pub fn doi_index(&self, doi: &str) -> Option<usize> {
        self.by_doi.get(&normalize_doi(doi)).copied()
    }

    /// Arena index of the document carrying this arXiv identifier, if any.
    /// The stored local values are already canonical, so the lookup is exact.
    pub fn arxiv_index(&self, arxiv_id: &str) -> Option<usize> {
        self.by_arxiv.get(arxiv_id).copied()
    }

    /// Record ids the remote side already knows how to link
    pub fn recid_keys(&self) -> impl Iterator<Item = u32> + '_ {
        self.by_recid.keys().copied()
    }

    pub fn doc_count(&self) -> usize {
        self.docs.len()
    }

    pub fn recid_len(&self) -> usize {
        self.by_recid.len()
    }

    pub fn arxiv_len(&self) -> usize {
        self.by_arxiv.len()
    }

    pub fn doi_len(&self) -> usize {
        self.by_doi.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}
