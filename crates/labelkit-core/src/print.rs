//! Export and print boundary.
//!
//! Rendered labels are handed to a [`LabelSink`] (a printer, a preview
//! service, a directory). Only one submission may be in flight at a time;
//! [`SubmissionGuard`] refuses overlapping requests.

use crate::media::Media;
use crate::storage::BoxFuture;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use thiserror::Error;

/// Most copies a single batch may print.
pub const MAX_BATCH_TOTAL: u32 = 100;
/// Most copies of one design in a batch.
pub const MAX_ITEM_QTY: u32 = 100;

/// A flattened label ready for a print or preview collaborator.
#[derive(Clone, PartialEq, Eq)]
pub struct ExportedLabel {
    /// PNG-encoded raster.
    pub png: Vec<u8>,
    /// Width in dots.
    pub width: u32,
    /// Height in dots.
    pub height: u32,
    pub media: Media,
}

impl std::fmt::Debug for ExportedLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportedLabel")
            .field("png", &format_args!("{} bytes", self.png.len()))
            .field("width", &self.width)
            .field("height", &self.height)
            .field("media", &self.media)
            .finish()
    }
}

/// Sink errors.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Another submission is still in progress")]
    Busy,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Rejected: {0}")]
    Rejected(String),
}

/// Receives rendered labels.
pub trait LabelSink {
    /// Hand over one label. Returns a short status line on success.
    fn submit(&self, label: &ExportedLabel) -> BoxFuture<'_, Result<String, SinkError>>;
}

/// Writes each submitted label as a numbered PNG into a directory.
pub struct DirectorySink {
    dir: PathBuf,
    prefix: String,
    counter: AtomicUsize,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, SinkError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            prefix: "label".to_string(),
            counter: AtomicUsize::new(0),
        })
    }

    /// File name prefix, `label` by default.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of labels written so far.
    pub fn written(&self) -> usize {
        self.counter.load(Ordering::SeqCst)
    }
}

impl LabelSink for DirectorySink {
    fn submit(&self, label: &ExportedLabel) -> BoxFuture<'_, Result<String, SinkError>> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let path = self.dir.join(format!("{}-{:03}.png", self.prefix, n));
        let png = label.png.clone();
        let (width, height) = (label.width, label.height);
        Box::pin(async move {
            std::fs::write(&path, png)?;
            log::info!("Wrote {}x{} label to {}", width, height, path.display());
            Ok(format!("Saved {}", path.display()))
        })
    }
}

/// Allows at most one outstanding submission.
#[derive(Debug, Clone, Default)]
pub struct SubmissionGuard {
    busy: Arc<AtomicBool>,
}

/// Proof that a submission is in flight. Releases the guard on drop.
#[derive(Debug)]
pub struct SubmissionTicket {
    busy: Arc<AtomicBool>,
}

impl Drop for SubmissionTicket {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::SeqCst);
    }
}

impl SubmissionGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the guard, or fail with [`SinkError::Busy`] while a ticket is alive.
    pub fn try_begin(&self) -> Result<SubmissionTicket, SinkError> {
        self.busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| SinkError::Busy)?;
        Ok(SubmissionTicket {
            busy: Arc::clone(&self.busy),
        })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Run one submission under the guard.
    pub async fn submit<K: LabelSink + ?Sized>(
        &self,
        sink: &K,
        label: &ExportedLabel,
    ) -> Result<String, SinkError> {
        let _ticket = self.try_begin()?;
        sink.submit(label).await
    }
}

/// One line of a batch print request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItem {
    pub design_id: String,
    pub qty: u32,
}

/// Clamp quantities to `[1, MAX_ITEM_QTY]` and trim later items so the
/// batch prints at most [`MAX_BATCH_TOTAL`] labels. Items left with nothing
/// to print are dropped.
pub fn plan_batch(items: &[BatchItem]) -> Vec<BatchItem> {
    let mut remaining = MAX_BATCH_TOTAL;
    let mut planned = Vec::new();
    for item in items {
        if remaining == 0 {
            log::warn!("Batch capped at {MAX_BATCH_TOTAL}; skipping {}", item.design_id);
            continue;
        }
        let qty = item.qty.clamp(1, MAX_ITEM_QTY).min(remaining);
        remaining -= qty;
        planned.push(BatchItem {
            design_id: item.design_id.clone(),
            qty,
        });
    }
    planned
}

#[cfg(test)]
mod tests {
    use super::*;
    use pollster::block_on;
    use tempfile::tempdir;

    fn label() -> ExportedLabel {
        ExportedLabel {
            png: vec![0x89, b'P', b'N', b'G'],
            width: 440,
            height: 240,
            media: Media::Label55x30,
        }
    }

    fn item(id: &str, qty: u32) -> BatchItem {
        BatchItem {
            design_id: id.into(),
            qty,
        }
    }

    #[test]
    fn test_plan_batch_clamps_quantities() {
        let planned = plan_batch(&[item("a", 0), item("b", 250)]);
        assert_eq!(planned, vec![item("a", 1), item("b", 99)]);
    }

    #[test]
    fn test_plan_batch_trims_later_items() {
        let planned = plan_batch(&[item("a", 60), item("b", 60), item("c", 5)]);
        assert_eq!(planned, vec![item("a", 60), item("b", 40)]);
        assert_eq!(planned.iter().map(|i| i.qty).sum::<u32>(), MAX_BATCH_TOTAL);
    }

    #[test]
    fn test_batch_item_wire_form() {
        let parsed: Vec<BatchItem> =
            serde_json::from_str(r#"[{"designId":"d1","qty":3}]"#).unwrap();
        assert_eq!(parsed, vec![item("d1", 3)]);
    }

    #[test]
    fn test_guard_refuses_overlap() {
        let guard = SubmissionGuard::new();
        let ticket = guard.try_begin().unwrap();
        assert!(guard.is_busy());
        assert!(matches!(guard.clone().try_begin(), Err(SinkError::Busy)));
        drop(ticket);
        assert!(!guard.is_busy());
        assert!(guard.try_begin().is_ok());
    }

    #[test]
    fn test_directory_sink_numbers_files() {
        let dir = tempdir().unwrap();
        let sink = DirectorySink::new(dir.path()).unwrap().with_prefix("tag");
        let guard = SubmissionGuard::new();

        let status = block_on(guard.submit(&sink, &label())).unwrap();
        assert!(status.contains("tag-001.png"));
        block_on(guard.submit(&sink, &label())).unwrap();

        assert_eq!(sink.written(), 2);
        assert_eq!(std::fs::read(dir.path().join("tag-002.png")).unwrap(), label().png);
        assert!(!guard.is_busy());
    }
}
