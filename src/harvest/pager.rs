use anyhow::{Context, Result};
use log::{debug, info};
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};

use crate::common::HalDoc;

/// Sentinel cursor for the first page request
pub const INITIAL_CURSOR: &str = "*";

/// One page of the remote cursor-paginated result stream
#[derive(Debug, Clone)]
pub struct CursorPage {
    pub docs: Vec<serde_json::Value>,
    pub next_cursor: String,
    pub num_found: u64,
}

/// Narrow seam over the remote API: one cursor in, one page out.
/// Any transport or decode failure is fatal to the harvest.
pub trait PageFetcher {
    fn fetch_page(&mut self, cursor: &str) -> Result<CursorPage>;
}

/// Lazy, finite, non-restartable sequence of harvested documents.
///
/// Pages are fetched on demand and their documents emitted immediately.
/// Harvesting stops when the returned cursor equals the cursor used for the
/// just-completed request (no forward progress), not when a page is merely
/// short, since the remote may return a full page on the final request.
pub struct Harvester<F: PageFetcher> {
    fetcher: F,
    cursor: String,
    pending: VecDeque<HalDoc>,
    done: bool,
    pages_fetched: usize,
    page_limit: Option<usize>,
    docs_seen: u64,
    num_found: u64,
}

impl<F: PageFetcher> Harvester<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            cursor: INITIAL_CURSOR.to_string(),
            pending: VecDeque::new(),
            done: false,
            pages_fetched: 0,
            page_limit: None,
            docs_seen: 0,
            num_found: 0,
        }
    }

    /// Bound the harvest to at most `pages` page requests (exploratory runs)
    pub fn with_page_limit(mut self, pages: usize) -> Self {
        self.page_limit = Some(pages);
        self
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    pub fn docs_seen(&self) -> u64 {
        self.docs_seen
    }

    pub fn num_found(&self) -> u64 {
        self.num_found
    }

    fn fetch_next_page(&mut self) -> Result<()> {
        let page = self
            .fetcher
            .fetch_page(&self.cursor)
            .with_context(|| format!("Harvest failed at page {}", self.pages_fetched))?;
        self.pages_fetched += 1;
        self.num_found = page.num_found;

        if page.next_cursor == self.cursor {
            self.done = true;
        } else {
            self.cursor = page.next_cursor;
        }

        for value in &page.docs {
            match HalDoc::from_json(value) {
                Some(doc) => self.pending.push_back(doc),
                None => debug!("Skipping HAL document without halId_s: {}", value),
            }
        }
        self.docs_seen += page.docs.len() as u64;

        info!("{} out of {}", self.docs_seen, self.num_found);
        Ok(())
    }
}

impl<F: PageFetcher> Iterator for Harvester<F> {
    type Item = Result<HalDoc>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(doc) = self.pending.pop_front() {
                return Some(Ok(doc));
            }
            if self.done || self.page_limit.is_some_and(|limit| self.pages_fetched >= limit) {
                return None;
            }
            if let Err(e) = self.fetch_next_page() {
                self.done = true;
                return Some(Err(e));
            }
        }
    }
}

/// Replay a harvested docs dump (JSONL, one document per line) as the same
/// sequence shape the live harvester produces.
pub fn harvest_from_file(path: &str) -> Result<impl Iterator<Item = Result<HalDoc>>> {
    let file = File::open(path).with_context(|| format!("Failed to open docs dump: {}", path))?;
    let reader = BufReader::new(file);

    Ok(reader.lines().enumerate().filter_map(|(idx, line)| match line {
        Ok(line) if line.trim().is_empty() => None,
        Ok(line) => Some(
            serde_json::from_str::<HalDoc>(&line)
                .with_context(|| format!("Failed to parse harvested document at line {}", idx + 1)),
        ),
        Err(e) => Some(Err(anyhow::Error::new(e).context("Failed to read line from docs dump"))),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Scripted fetcher: pops one canned response per request
    struct FakeFetcher {
        responses: VecDeque<Result<CursorPage>>,
        cursors_seen: Vec<String>,
    }

    impl FakeFetcher {
        fn new(responses: Vec<Result<CursorPage>>) -> Self {
            Self {
                responses: responses.into(),
                cursors_seen: Vec::new(),
            }
        }
    }

    impl PageFetcher for FakeFetcher {
        fn fetch_page(&mut self, cursor: &str) -> Result<CursorPage> {
            self.cursors_seen.push(cursor.to_string());
            self.responses
                .pop_front()
                .unwrap_or_else(|| Err(anyhow!("no more scripted pages")))
        }
    }

    fn page(ids: &[&str], next_cursor: &str, num_found: u64) -> CursorPage {
        CursorPage {
            docs: ids.iter().map(|id| json!({"halId_s": id})).collect(),
            next_cursor: next_cursor.to_string(),
            num_found,
        }
    }

    #[test]
    fn test_termination_on_cursor_non_progress() {
        // "*" -> page 1 (next "A"), "A" -> page 2 (next "A" again): exactly
        // two pages' worth of documents, then stop.
        let fetcher = FakeFetcher::new(vec![
            Ok(page(&["hal-1", "hal-2"], "A", 4)),
            Ok(page(&["hal-3", "hal-4"], "A", 4)),
        ]);

        let harvester = Harvester::new(fetcher);
        let docs: Vec<HalDoc> = harvester.map(|d| d.unwrap()).collect();

        let ids: Vec<&str> = docs.iter().map(|d| d.hal_id.as_str()).collect();
        assert_eq!(ids, vec!["hal-1", "hal-2", "hal-3", "hal-4"]);
    }

    #[test]
    fn test_final_page_may_be_full() {
        // A full final page is not mistaken for more data to come
        let fetcher = FakeFetcher::new(vec![
            Ok(page(&["hal-1", "hal-2"], "A", 2)),
            Ok(page(&["hal-1", "hal-2"], "A", 2)),
        ]);

        let mut harvester = Harvester::new(fetcher);
        let count = harvester.by_ref().filter(|d| d.is_ok()).count();
        assert_eq!(count, 4);
        assert_eq!(harvester.pages_fetched(), 2);
    }

    #[test]
    fn test_cursor_threading() {
        let fetcher = FakeFetcher::new(vec![
            Ok(page(&["hal-1"], "A", 3)),
            Ok(page(&["hal-2"], "B", 3)),
            Ok(page(&["hal-3"], "B", 3)),
        ]);

        let mut harvester = Harvester::new(fetcher);
        assert_eq!(harvester.by_ref().count(), 3);
        assert_eq!(harvester.fetcher.cursors_seen, vec!["*", "A", "B"]);
    }

    #[test]
    fn test_transport_error_aborts() {
        let fetcher = FakeFetcher::new(vec![
            Ok(page(&["hal-1"], "A", 2)),
            Err(anyhow!("connection reset")),
        ]);

        let mut harvester = Harvester::new(fetcher);
        assert_eq!(harvester.next().unwrap().unwrap().hal_id, "hal-1");
        assert!(harvester.next().unwrap().is_err());
        // The sequence is not restartable after a failure
        assert!(harvester.next().is_none());
    }

    #[test]
    fn test_document_without_hal_id_skipped() {
        let fetcher = FakeFetcher::new(vec![Ok(CursorPage {
            docs: vec![json!({"doiId_s": "10.1/x"}), json!({"halId_s": "hal-1"})],
            next_cursor: INITIAL_CURSOR.to_string(),
            num_found: 2,
        })]);

        let docs: Vec<HalDoc> = Harvester::new(fetcher).map(|d| d.unwrap()).collect();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].hal_id, "hal-1");
    }

    #[test]
    fn test_page_limit() {
        let fetcher = FakeFetcher::new(vec![
            Ok(page(&["hal-1"], "A", 10)),
            Ok(page(&["hal-2"], "B", 10)),
            Ok(page(&["hal-3"], "C", 10)),
        ]);

        let harvester = Harvester::new(fetcher).with_page_limit(2);
        let count = harvester.filter(|d| d.is_ok()).count();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_harvest_from_file_roundtrip() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"inspire_id":"10","hal_id":"hal-010"}}"#).unwrap();
        writeln!(file).unwrap();
        writeln!(file, r#"{{"hal_id":"hal-011","doi":"10.1/x"}}"#).unwrap();
        file.flush().unwrap();

        let docs: Vec<HalDoc> = harvest_from_file(file.path().to_str().unwrap())
            .unwrap()
            .map(|d| d.unwrap())
            .collect();

        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].hal_id, "hal-010");
        assert_eq!(docs[1].doi.as_deref(), Some("10.1/x"));
    }

    #[test]
    fn test_harvest_from_file_malformed_line_is_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not json").unwrap();
        file.flush().unwrap();

        let mut docs = harvest_from_file(file.path().to_str().unwrap()).unwrap();
        assert!(docs.next().unwrap().is_err());
    }
}
