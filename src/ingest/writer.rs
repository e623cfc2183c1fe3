use anyhow::{Context, Result};
use log::{debug, info};
use std::fs::File;
use std::io::{BufWriter, Write};

use super::{Patch, PatchSink, UploadOptions};

/// Batch sink writing a MARCXML `<collection>` file for the downstream
/// ingest pipeline. Each submitted batch is flushed to disk immediately so
/// partial progress survives an interruption.
pub struct XmlBatchWriter {
    writer: BufWriter<File>,
    path: String,
    options: UploadOptions,
    records_written: usize,
}

impl XmlBatchWriter {
    pub fn create(path: &str, options: UploadOptions) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create patch output file: {}", path))?;
        let mut writer = BufWriter::new(file);

        writeln!(writer, "<?xml version=\"1.0\" encoding=\"UTF-8\"?>")
            .context("Failed to write patch file header")?;
        writeln!(writer, "<collection xmlns=\"http://www.loc.gov/MARC21/slim\">")
            .context("Failed to write patch file header")?;

        Ok(Self {
            writer,
            path: path.to_string(),
            options,
            records_written: 0,
        })
    }

    pub fn records_written(&self) -> usize {
        self.records_written
    }

    /// Close the collection element and report what was written
    pub fn finish(mut self) -> Result<usize> {
        writeln!(self.writer, "</collection>").context("Failed to close patch file")?;
        self.writer.flush().context("Failed to flush patch file")?;

        info!(
            "Wrote {} patch records to {} ({:?} mode, notimechange={}, user={})",
            self.records_written,
            self.path,
            self.options.mode,
            self.options.no_time_change,
            self.options.user
        );
        Ok(self.records_written)
    }
}

impl PatchSink for XmlBatchWriter {
    fn submit(&mut self, batch: &[Patch]) -> Result<()> {
        for patch in batch {
            writeln!(self.writer, "{}", patch.to_xml())
                .with_context(|| format!("Failed to write patch for record {}", patch.recid))?;
        }
        self.writer.flush().context("Failed to flush patch batch")?;
        self.records_written += batch.len();
        Ok(())
    }
}

/// Dry-run sink: counts what would have been submitted, writes nothing
#[derive(Debug, Default)]
pub struct CountingSink {
    submitted: usize,
}

impl CountingSink {
    pub fn submitted(&self) -> usize {
        self.submitted
    }
}

impl PatchSink for CountingSink {
    fn submit(&mut self, batch: &[Patch]) -> Result<()> {
        for patch in batch {
            debug!("Would patch record {} with HAL id {}", patch.recid, patch.hal_id);
        }
        self.submitted += batch.len();
        Ok(())
    }
}
