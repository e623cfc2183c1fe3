use anyhow::{Context, Result};
use log::info;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::time::{Duration, Instant};

use crate::cli::HarvestArgs;
use crate::common::{create_spinner, format_elapsed, setup_logging};
use crate::harvest::{HalClient, HarvestConfig, Harvester};
use crate::maps::build_identifier_maps;

pub fn run_harvest(args: HarvestArgs) -> Result<()> {
    let start = Instant::now();
    setup_logging(&args.log_level)?;

    info!("Starting HAL harvest");
    info!("Endpoint: {}", args.endpoint);
    info!("Page size: {}", args.page_size);
    info!("Timeout: {}s", args.timeout);
    if let Some(output) = &args.output {
        info!("Docs dump output: {}", output);
    }
    if let Some(max_pages) = args.max_pages {
        info!("Page limit: {}", max_pages);
    }

    let config = HarvestConfig {
        endpoint: args.endpoint.clone(),
        page_size: args.page_size,
        timeout: Duration::from_secs(args.timeout),
    };
    let mut harvester = Harvester::new(HalClient::new(config)?);
    if let Some(max_pages) = args.max_pages {
        harvester = harvester.with_page_limit(max_pages);
    }

    let mut writer = match &args.output {
        Some(path) => Some(BufWriter::new(File::create(path).with_context(|| {
            format!("Failed to create docs dump: {}", path)
        })?)),
        None => None,
    };

    let spinner = create_spinner("Harvesting HAL documents...");

    let maps = build_identifier_maps(harvester.by_ref().map(|result| {
        result.and_then(|doc| {
            if let Some(writer) = writer.as_mut() {
                let line = serde_json::to_string(&doc)
                    .context("Failed to serialize harvested document")?;
                writeln!(writer, "{}", line).context("Failed to write harvested document")?;
            }
            Ok(doc)
        })
    }))?;

    spinner.finish_with_message("Harvest complete");

    if let Some(writer) = writer.as_mut() {
        writer.flush().context("Failed to flush docs dump")?;
    }

    info!("==================== FINAL SUMMARY ====================");
    info!("Pages fetched: {}", harvester.pages_fetched());
    info!("Documents reported by HAL: {}", harvester.num_found());
    info!("Documents harvested: {}", maps.doc_count());
    info!("Indexed by local record id: {}", maps.recid_len());
    info!("Indexed by arXiv id: {}", maps.arxiv_len());
    info!("Indexed by DOI: {}", maps.doi_len());
    info!("Total execution time: {}", format_elapsed(start.elapsed()));
    info!("========================================================");

    Ok(())
}
