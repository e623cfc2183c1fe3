use serde::{Deserialize, Serialize};
use serde_json::Value;

/// MARC tag holding a record's DOI values
pub const TAG_DOI: &str = "0247__a";
/// MARC tag holding a record's report numbers (arXiv identifiers included)
pub const TAG_REPORT_NUMBER: &str = "037__a";
/// MARC tag holding the HAL identifier annotation
pub const TAG_HAL_ID: &str = "035__a";
/// MARC tag holding the annotation source marker
pub const TAG_HAL_SOURCE: &str = "035__9";
/// Source marker distinguishing HAL annotations from other 035 entries
pub const HAL_SOURCE_MARKER: &str = "HAL";
/// Canonical namespace prefix for new-style arXiv identifiers
pub const ARXIV_PREFIX: &str = "arXiv:";

/// One cross-reference document harvested from HAL.
///
/// All identifier values are kept as harvested; normalization happens when
/// the document is inserted into the identifier maps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HalDoc {
    /// Local record id as HAL holds it (unparsed, may be malformed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inspire_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arxiv_id: Option<String>,
    /// HAL's own identifier for this document
    pub hal_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
}

impl HalDoc {
    /// Parse one document from a HAL response payload.
    ///
    /// HAL serves each field either as a plain string or as a singleton
    /// array; the first element wins. Documents without a `halId_s` cannot
    /// be matched to anything and yield `None`.
    pub fn from_json(value: &Value) -> Option<Self> {
        let hal_id = first_string(value, "halId_s")?;
        Some(Self {
            inspire_id: first_string(value, "inspireId_s"),
            arxiv_id: first_string(value, "arxivId_s"),
            hal_id,
            doi: first_string(value, "doiId_s"),
        })
    }
}

fn first_string(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => items.first().and_then(|v| v.as_str()).map(String::from),
        _ => None,
    }
}

/// Pairing of a local record with exactly one HAL document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    pub recid: u32,
    pub hal_id: String,
}

/// Counters reported in the sync run summary
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    pub docs_harvested: usize,
    pub recid_map_size: usize,
    pub arxiv_map_size: usize,
    pub doi_map_size: usize,
    pub universe: usize,
    pub already_matched: usize,
    pub newly_direct: usize,
    pub to_check: usize,
    pub matched_secondary: usize,
    pub ambiguous_skipped: usize,
    pub patches_emitted: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_doc_from_json_array_fields() {
        let value = json!({
            "inspireId_s": ["123456"],
            "arxivId_s": "1234.5678",
            "halId_s": ["hal-01234567"],
            "doiId_s": ["10.1234/Example"]
        });

        let doc = HalDoc::from_json(&value).unwrap();
        assert_eq!(doc.inspire_id.as_deref(), Some("123456"));
        assert_eq!(doc.arxiv_id.as_deref(), Some("1234.5678"));
        assert_eq!(doc.hal_id, "hal-01234567");
        assert_eq!(doc.doi.as_deref(), Some("10.1234/Example"));
    }

    #[test]
    fn test_doc_from_json_partial() {
        // A document with only a DOI is still valid
        let value = json!({"halId_s": "hal-000001", "doiId_s": "10.1/x"});
        let doc = HalDoc::from_json(&value).unwrap();
        assert_eq!(doc.inspire_id, None);
        assert_eq!(doc.arxiv_id, None);
        assert_eq!(doc.doi.as_deref(), Some("10.1/x"));
    }

    #[test]
    fn test_doc_from_json_missing_hal_id() {
        let value = json!({"doiId_s": "10.1/x"});
        assert!(HalDoc::from_json(&value).is_none());
    }

    #[test]
    fn test_doc_roundtrips_through_jsonl() {
        let doc = HalDoc {
            inspire_id: Some("42".to_string()),
            arxiv_id: None,
            hal_id: "hal-042".to_string(),
            doi: Some("10.1/y".to_string()),
        };
        let line = serde_json::to_string(&doc).unwrap();
        let parsed: HalDoc = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed, doc);
    }
}
