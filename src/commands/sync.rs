use anyhow::Result;
use log::info;
use std::time::Duration;

use crate::cli::SyncArgs;
use crate::common::{setup_logging, HalDoc, SyncStats};
use crate::harvest::{harvest_from_file, HalClient, HarvestConfig, Harvester};
use crate::ingest::{CountingSink, UploadOptions, XmlBatchWriter};
use crate::store::JsonlStore;
use crate::sync::{synchronize_records, NoopScheduler, SyncOptions};

pub fn run_sync(args: SyncArgs) -> Result<SyncStats> {
    setup_logging(&args.log_level)?;

    info!("Starting HAL record synchronization");
    info!("Records dump: {}", args.records);
    match &args.docs {
        Some(docs) => info!("Docs dump (offline replay): {}", docs),
        None => info!("Endpoint: {}", args.endpoint),
    }
    info!("Output: {}", args.output);
    info!("Page size: {}", args.page_size);
    info!("Timeout: {}s", args.timeout);
    info!("Chunk size: {}", args.chunk_size);
    info!("Dry run: {}", args.dry_run);

    let store = JsonlStore::from_file(&args.records)?;

    let docs: Box<dyn Iterator<Item = Result<HalDoc>>> = match &args.docs {
        Some(path) => Box::new(harvest_from_file(path)?),
        None => {
            let config = HarvestConfig {
                endpoint: args.endpoint.clone(),
                page_size: args.page_size,
                timeout: Duration::from_secs(args.timeout),
            };
            Box::new(Harvester::new(HalClient::new(config)?))
        }
    };

    let options = SyncOptions {
        chunk_size: args.chunk_size,
        checkpoint_every: args.checkpoint_every,
    };
    let mut scheduler = NoopScheduler;

    let stats = if args.dry_run {
        let (stats, sink) =
            synchronize_records(docs, &store, CountingSink::default(), &mut scheduler, &options)?;
        info!("Dry run: {} patches would have been written", sink.submitted());
        stats
    } else {
        let writer = XmlBatchWriter::create(&args.output, UploadOptions::default())?;
        let (stats, writer) =
            synchronize_records(docs, &store, writer, &mut scheduler, &options)?;
        writer.finish()?;
        stats
    };

    Ok(stats)
}
