use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use log::{info, warn};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::time::Instant;

use super::{RecordSet, RecordStore};
use crate::common::format_elapsed;

/// One line of a records dump: a record id plus its stored fields
#[derive(Debug, Deserialize)]
struct RecordLine {
    recid: u32,
    #[serde(default)]
    fields: HashMap<String, Vec<String>>,
}

/// Record store backed by a JSONL dump (optionally gzipped) produced by the
/// upstream export-eligibility query. Every record in the dump is the
/// eligible universe.
#[derive(Debug, Default)]
pub struct JsonlStore {
    records: HashMap<u32, HashMap<String, Vec<String>>>,
}

impl JsonlStore {
    pub fn from_file(path: &str) -> Result<Self> {
        info!("Loading local records from: {}", path);
        let start = Instant::now();

        let file =
            File::open(path).with_context(|| format!("Failed to open records dump: {}", path))?;
        let reader: Box<dyn BufRead> = if path.ends_with(".gz") {
            Box::new(BufReader::new(GzDecoder::new(file)))
        } else {
            Box::new(BufReader::new(file))
        };

        let mut records = HashMap::new();
        let mut lines_processed = 0;
        let mut lines_failed = 0;

        for line_result in reader.lines() {
            let line = line_result.context("Failed to read line from records dump")?;

            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str::<RecordLine>(&line) {
                Ok(record) => {
                    records.insert(record.recid, record.fields);
                }
                Err(e) => {
                    if lines_failed < 5 {
                        warn!("Failed to parse record: {}", e);
                    }
                    lines_failed += 1;
                }
            }

            lines_processed += 1;
            if lines_processed % 500_000 == 0 {
                info!("  Loaded {} records...", records.len());
            }
        }

        info!(
            "Loaded {} records from {} lines in {}",
            records.len(),
            lines_processed,
            format_elapsed(start.elapsed())
        );

        if lines_failed > 0 {
            warn!("Failed to parse {} records", lines_failed);
        }

        Ok(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl RecordStore for JsonlStore {
    fn search_pattern(&self, tag: &str, value: &str) -> Result<RecordSet> {
        Ok(self
            .records
            .iter()
            .filter(|(_, fields)| {
                fields
                    .get(tag)
                    .is_some_and(|values| values.iter().any(|v| v == value))
            })
            .map(|(&recid, _)| recid)
            .collect())
    }

    fn eligible_records(&self) -> Result<RecordSet> {
        Ok(self.records.keys().copied().collect())
    }

    fn field_values(&self, recid: u32, tag: &str) -> Result<Vec<String>> {
        Ok(self
            .records
            .get(&recid)
            .and_then(|fields| fields.get(tag))
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{HAL_SOURCE_MARKER, TAG_DOI, TAG_HAL_SOURCE};
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_jsonl(lines: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_and_query() {
        let file = create_test_jsonl(&[
            r#"{"recid": 10, "fields": {"035__9": ["HAL"], "035__a": ["hal-010"]}}"#,
            r#"{"recid": 20, "fields": {"0247__a": ["10.1234/a"]}}"#,
            r#"{"recid": 30, "fields": {}}"#,
        ]);

        let store = JsonlStore::from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(store.len(), 3);

        let matched = store.search_pattern(TAG_HAL_SOURCE, HAL_SOURCE_MARKER).unwrap();
        assert_eq!(matched, RecordSet::from([10]));

        let universe = store.eligible_records().unwrap();
        assert_eq!(universe, RecordSet::from([10, 20, 30]));

        assert_eq!(store.field_values(20, TAG_DOI).unwrap(), vec!["10.1234/a"]);
        assert!(store.field_values(30, TAG_DOI).unwrap().is_empty());
        assert!(store.field_values(99, TAG_DOI).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let file = create_test_jsonl(&[
            r#"{"recid": 10, "fields": {}}"#,
            "not json at all",
            r#"{"recid": 20, "fields": {}}"#,
        ]);

        let store = JsonlStore::from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_load_gzipped_dump() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.jsonl.gz");
        let file = File::create(&path).unwrap();
        let mut encoder = GzEncoder::new(file, Compression::default());
        writeln!(encoder, r#"{{"recid": 7, "fields": {{"0247__a": ["10.1/z"]}}}}"#).unwrap();
        encoder.finish().unwrap();

        let store = JsonlStore::from_file(path.to_str().unwrap()).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.field_values(7, TAG_DOI).unwrap(), vec!["10.1/z"]);
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(JsonlStore::from_file("/nonexistent/records.jsonl").is_err());
    }
}
