pub mod writer;

pub use writer::{CountingSink, XmlBatchWriter};

use anyhow::{Context, Result};
use log::debug;

use crate::common::HAL_SOURCE_MARKER;

/// Minimal additive record fragment: the record control number plus one 035
/// entry carrying the matched HAL identifier and its source marker. Never
/// touches any other field of the target record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    pub recid: u32,
    pub hal_id: String,
}

impl Patch {
    pub fn new(recid: u32, hal_id: &str) -> Self {
        Self {
            recid,
            hal_id: hal_id.to_string(),
        }
    }

    /// Render the patch as a MARCXML record fragment
    pub fn to_xml(&self) -> String {
        format!(
            concat!(
                "<record>",
                "<controlfield tag=\"001\">{}</controlfield>",
                "<datafield tag=\"035\" ind1=\" \" ind2=\" \">",
                "<subfield code=\"a\">{}</subfield>",
                "<subfield code=\"9\">{}</subfield>",
                "</datafield>",
                "</record>"
            ),
            self.recid,
            escape_xml(&self.hal_id),
            HAL_SOURCE_MARKER
        )
    }
}

fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Upload run mode handed to the ingest pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadMode {
    /// Append fields only; never replace the record
    Append,
}

/// How the downstream uploader should apply a batch
#[derive(Debug, Clone)]
pub struct UploadOptions {
    pub mode: UploadMode,
    /// Do not alter record timestamps when applying the batch
    pub no_time_change: bool,
    pub user: String,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            mode: UploadMode::Append,
            no_time_change: true,
            user: "hal-sync".to_string(),
        }
    }
}

/// Hand-off point to the external ingest pipeline. A failed submission is
/// fatal to the run; no retry is attempted here.
pub trait PatchSink {
    fn submit(&mut self, batch: &[Patch]) -> Result<()>;
}

/// Buffered batcher in front of a sink: patches accumulate and are flushed
/// every `chunk_size` additions, bounding memory and making partial progress
/// durable before a possible interruption.
pub struct ChunkedPatchUpload<S: PatchSink> {
    sink: S,
    buffer: Vec<Patch>,
    chunk_size: usize,
    submitted: usize,
}

impl<S: PatchSink> ChunkedPatchUpload<S> {
    pub fn new(sink: S, chunk_size: usize) -> Self {
        Self {
            sink,
            buffer: Vec::new(),
            chunk_size: chunk_size.max(1),
            submitted: 0,
        }
    }

    pub fn add(&mut self, patch: Patch) -> Result<()> {
        self.buffer.push(patch);
        if self.buffer.len() >= self.chunk_size {
            self.flush()?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        self.sink
            .submit(&self.buffer)
            .context("Failed to submit patch batch")?;
        self.submitted += self.buffer.len();
        debug!(
            "Flushed {} patches ({} submitted so far)",
            self.buffer.len(),
            self.submitted
        );
        self.buffer.clear();
        Ok(())
    }

    pub fn submitted(&self) -> usize {
        self.submitted
    }

    /// Flush the remainder and hand the sink back
    pub fn finish(mut self) -> Result<S> {
        self.flush()?;
        Ok(self.sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        batches: Vec<Vec<Patch>>,
    }

    impl PatchSink for RecordingSink {
        fn submit(&mut self, batch: &[Patch]) -> Result<()> {
            self.batches.push(batch.to_vec());
            Ok(())
        }
    }

    #[test]
    fn test_patch_xml_is_additive_only() {
        let xml = Patch::new(20, "hal-01234567").to_xml();

        assert!(xml.contains("<controlfield tag=\"001\">20</controlfield>"));
        assert!(xml.contains("<subfield code=\"a\">hal-01234567</subfield>"));
        assert!(xml.contains("<subfield code=\"9\">HAL</subfield>"));
        // Exactly one controlfield and one datafield, nothing else
        assert_eq!(xml.matches("<controlfield").count(), 1);
        assert_eq!(xml.matches("<datafield").count(), 1);
        assert_eq!(xml.matches("<subfield").count(), 2);
        assert!(xml.contains("tag=\"035\""));
    }

    #[test]
    fn test_patch_xml_escapes_hal_id() {
        let xml = Patch::new(1, "hal-<1>&\"2\"").to_xml();
        assert!(xml.contains("hal-&lt;1&gt;&amp;&quot;2&quot;"));
    }

    #[test]
    fn test_chunked_upload_flushes_at_chunk_size() {
        let mut upload = ChunkedPatchUpload::new(RecordingSink::default(), 2);
        upload.add(Patch::new(1, "hal-1")).unwrap();
        upload.add(Patch::new(2, "hal-2")).unwrap();
        upload.add(Patch::new(3, "hal-3")).unwrap();

        assert_eq!(upload.submitted(), 2);
        let sink = upload.finish().unwrap();
        assert_eq!(sink.batches.len(), 2);
        assert_eq!(sink.batches[0].len(), 2);
        assert_eq!(sink.batches[1].len(), 1);
    }

    #[test]
    fn test_finish_without_patches_submits_nothing() {
        let upload = ChunkedPatchUpload::new(RecordingSink::default(), 10);
        let sink = upload.finish().unwrap();
        assert!(sink.batches.is_empty());
    }

    #[test]
    fn test_default_upload_options() {
        let options = UploadOptions::default();
        assert_eq!(options.mode, UploadMode::Append);
        assert!(options.no_time_change);
        assert_eq!(options.user, "hal-sync");
    }
}
