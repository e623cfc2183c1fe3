use anyhow::{Context, Result};
use log::error;
use std::time::Duration;

use super::pager::{CursorPage, PageFetcher};

pub const DEFAULT_ENDPOINT: &str = "http://api.archives-ouvertes.fr/search";
pub const DEFAULT_PAGE_SIZE: usize = 5000;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Select documents carrying at least one of the three identifier kinds
const HARVEST_QUERY: &str = "(inspireId_s:* OR arxivId_s:* OR doiId_s:*)";
/// Restrict the payload to the identifier fields
const HARVEST_FIELDS: &str = "inspireId_s,arxivId_s,halId_s,doiId_s";
/// Stable sort order required for cursor pagination correctness
const HARVEST_SORT: &str = "docid asc";
/// Bytes of a malformed body to log before aborting
const RAW_PREFIX_LEN: usize = 250;

/// Remote endpoint options, explicit per run rather than module globals
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    pub endpoint: String,
    pub page_size: usize,
    pub timeout: Duration,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Blocking HTTP client for the HAL search API
pub struct HalClient {
    client: reqwest::blocking::Client,
    config: HarvestConfig,
}

impl HalClient {
    pub fn new(config: HarvestConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .user_agent(format!("hal-record-sync/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HAL HTTP client")?;
        Ok(Self { client, config })
    }
}

impl PageFetcher for HalClient {
    fn fetch_page(&mut self, cursor: &str) -> Result<CursorPage> {
        let rows = self.config.page_size.to_string();
        let response = self
            .client
            .get(&self.config.endpoint)
            .query(&[
                ("q", HARVEST_QUERY),
                ("fl", HARVEST_FIELDS),
                ("rows", rows.as_str()),
                ("sort", HARVEST_SORT),
                ("cursorMark", cursor),
            ])
            .send()
            .context("HAL harvest request failed")?
            .error_for_status()
            .context("HAL harvest request returned an error status")?;

        let body = response.text().context("Failed to read HAL response body")?;

        // A body that fails to decode must abort, never read as end-of-stream:
        // silently treating it as "no more data" would under-harvest.
        let payload: serde_json::Value = match serde_json::from_str(&body) {
            Ok(payload) => payload,
            Err(e) => {
                let prefix: String = body.chars().take(RAW_PREFIX_LEN).collect();
                error!(
                    "Failed json parsing at cursor {} with response={}....",
                    cursor, prefix
                );
                return Err(e).context("Failed to decode HAL page payload");
            }
        };

        let next_cursor = payload
            .get("nextCursorMark")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        let docs = payload
            .get("response")
            .and_then(|r| r.get("docs"))
            .and_then(|d| d.as_array())
            .cloned()
            .unwrap_or_default();
        let num_found = payload
            .get("response")
            .and_then(|r| r.get("numFound"))
            .and_then(|v| v.as_u64())
            .unwrap_or(0);

        Ok(CursorPage {
            docs,
            next_cursor,
            num_found,
        })
    }
}
