pub mod client;
pub mod pager;

pub use client::{HalClient, HarvestConfig, DEFAULT_ENDPOINT, DEFAULT_PAGE_SIZE, DEFAULT_TIMEOUT_SECS};
pub use pager::{harvest_from_file, CursorPage, Harvester, PageFetcher, INITIAL_CURSOR};
