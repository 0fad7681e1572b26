//! Off-thread decoding of image sources.
//!
//! Decodes are requested per object and run in order on one worker thread.
//! Finished results are delivered by [`DecodeQueue::poll`] on the caller's
//! thread and are applied only if the object still exists and still points
//! at the same `src`; results for removed or replaced objects are dropped.

use crate::document::LabelDocument;
use crate::objects::{ImageFormat, ImageHandle, ObjectId, ObjectKind};
use base64::{Engine, engine::general_purpose::STANDARD};
use std::collections::{HashMap, HashSet};
use std::panic;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use thiserror::Error;

/// Image decode errors.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Unsupported image source: {0}")]
    UnsupportedSource(String),
    #[error("Unrecognized image format")]
    UnknownFormat,
    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("Image decode failed: {0}")]
    Image(#[from] ::image::ImageError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decoder panicked")]
    Panicked,
    #[error("Decode worker unavailable")]
    WorkerGone,
}

/// Read the raw bytes behind an image `src`: a base64 `data:` URL or a file path.
pub fn source_bytes(src: &str) -> Result<Vec<u8>, DecodeError> {
    if let Some(rest) = src.strip_prefix("data:") {
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| DecodeError::UnsupportedSource("data URL without payload".into()))?;
        if !header.ends_with(";base64") {
            return Err(DecodeError::UnsupportedSource(format!(
                "data URL is not base64 encoded ({header})"
            )));
        }
        return Ok(STANDARD.decode(payload.trim())?);
    }
    Ok(std::fs::read(src)?)
}

/// Decode PNG, JPEG or WebP bytes, sniffing the format from the header.
pub fn decode_bytes(bytes: &[u8]) -> Result<ImageHandle, DecodeError> {
    let format = ImageFormat::from_magic_bytes(bytes).ok_or(DecodeError::UnknownFormat)?;
    let pixels = ::image::load_from_memory_with_format(bytes, format.into())?.to_rgba8();
    Ok(ImageHandle::new(pixels))
}

/// Decode an image `src` into RGBA pixels.
pub fn decode_source(src: &str) -> Result<ImageHandle, DecodeError> {
    decode_bytes(&source_bytes(src)?)
}

struct DecodeJob {
    object_id: ObjectId,
    src: String,
}

struct DecodeOutcome {
    object_id: ObjectId,
    src: String,
    result: Result<ImageHandle, DecodeError>,
}

/// The decode thread and both ends of its channels.
struct Worker {
    jobs: Sender<DecodeJob>,
    results: Receiver<DecodeOutcome>,
}

impl Worker {
    fn spawn() -> std::io::Result<Self> {
        let (jobs, job_rx) = mpsc::channel::<DecodeJob>();
        let (result_tx, results) = mpsc::channel();
        thread::Builder::new()
            .name("labelkit-decode".into())
            .spawn(move || {
                for DecodeJob { object_id, src } in job_rx {
                    // A panicking decoder must still answer, or `wait` never returns.
                    let result = panic::catch_unwind(|| decode_source(&src))
                        .unwrap_or(Err(DecodeError::Panicked));
                    let outcome = DecodeOutcome {
                        object_id,
                        src,
                        result,
                    };
                    if result_tx.send(outcome).is_err() {
                        break;
                    }
                }
            })?;
        Ok(Self { jobs, results })
    }
}

/// Tracks in-flight image decodes keyed by object.
///
/// The worker thread is started on the first request and exits when the
/// queue is dropped.
#[derive(Default)]
pub struct DecodeQueue {
    worker: Option<Worker>,
    /// Requested `src` per object.
    pending: HashMap<ObjectId, String>,
    /// Sources that failed to decode, so they are not retried every frame.
    failed: HashSet<(ObjectId, String)>,
}

impl DecodeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a decode of `src` for `object_id`.
    ///
    /// Returns false if the same decode is already in flight or the worker
    /// could not take it; the latter counts as a failed decode.
    pub fn request(&mut self, object_id: ObjectId, src: &str) -> bool {
        if self.pending.get(&object_id).is_some_and(|s| s == src) {
            return false;
        }

        if self.worker.is_none() {
            match Worker::spawn() {
                Ok(worker) => self.worker = Some(worker),
                Err(e) => log::warn!("Failed to start image decoder: {e}"),
            }
        }
        let job = DecodeJob {
            object_id,
            src: src.to_string(),
        };
        let queued = self
            .worker
            .as_ref()
            .is_some_and(|worker| worker.jobs.send(job).is_ok());
        if !queued {
            log::warn!("Cannot decode image for object {object_id}: {}", DecodeError::WorkerGone);
            self.worker = None;
            self.failed.insert((object_id, src.to_string()));
            return false;
        }

        self.pending.insert(object_id, src.to_string());
        true
    }

    /// Request decodes for every image object that has no pixels yet.
    pub fn request_missing(&mut self, document: &LabelDocument) -> usize {
        let wanted: Vec<(ObjectId, String)> = document
            .objects
            .iter()
            .filter_map(|o| {
                let image = o.as_image()?;
                let key = (o.id(), image.src.clone());
                (image.handle().is_none() && !self.failed.contains(&key)).then_some(key)
            })
            .collect();
        wanted
            .into_iter()
            .filter(|(id, src)| self.request(*id, src))
            .count()
    }

    /// Abandon the decode for an object. A late result is discarded.
    pub fn cancel(&mut self, object_id: ObjectId) {
        self.pending.remove(&object_id);
    }

    /// Abandon all decodes.
    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    pub fn is_pending(&self, object_id: ObjectId) -> bool {
        self.pending.contains_key(&object_id)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Whether the last decode of this object's `src` failed.
    pub fn has_failed(&self, object_id: ObjectId, src: &str) -> bool {
        self.failed.contains(&(object_id, src.to_string()))
    }

    /// Apply finished decodes without blocking. Returns how many objects changed.
    pub fn poll(&mut self, document: &mut LabelDocument) -> usize {
        let outcomes: Vec<DecodeOutcome> = match &self.worker {
            Some(worker) => worker.results.try_iter().collect(),
            None => Vec::new(),
        };
        let mut applied = 0;
        for outcome in outcomes {
            if self.apply(document, outcome) {
                applied += 1;
            }
        }
        applied
    }

    /// Block until every pending decode has finished and been applied.
    pub fn wait(&mut self, document: &mut LabelDocument) -> usize {
        let mut applied = 0;
        while !self.pending.is_empty() {
            let next = match &self.worker {
                Some(worker) => worker.results.recv().ok(),
                None => None,
            };
            let Some(outcome) = next else {
                self.abandon_pending();
                break;
            };
            if self.apply(document, outcome) {
                applied += 1;
            }
        }
        applied
    }

    /// The worker is gone: everything still pending has failed.
    fn abandon_pending(&mut self) {
        log::warn!("Image decoder stopped with {} decodes pending", self.pending.len());
        self.worker = None;
        for (object_id, src) in self.pending.drain() {
            self.failed.insert((object_id, src));
        }
    }

    fn apply(&mut self, document: &mut LabelDocument, outcome: DecodeOutcome) -> bool {
        let DecodeOutcome {
            object_id,
            src,
            result,
        } = outcome;

        if self.pending.get(&object_id) == Some(&src) {
            self.pending.remove(&object_id);
        }

        let Some(object) = document.get_mut(object_id) else {
            log::debug!("Dropping decoded image for removed object {object_id}");
            return false;
        };
        let ObjectKind::Image(image) = &mut object.kind else {
            return false;
        };
        if image.src != src {
            log::debug!("Dropping stale decode for object {object_id}");
            return false;
        }

        match result {
            Ok(handle) => {
                log::debug!("Decoded image {object_id}: {handle:?}");
                image.handle = Some(handle);
                true
            }
            Err(e) => {
                log::warn!("Failed to decode image for object {object_id}: {e}");
                self.failed.insert((object_id, src));
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::{Geometry, ImageFormat, ImageObject, PlacedObject, data_url};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = ::image::RgbaImage::from_pixel(width, height, ::image::Rgba([255, 0, 0, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ::image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_decode_data_url() {
        let src = data_url(&png_bytes(3, 2), ImageFormat::Png);
        let handle = decode_source(&src).unwrap();
        assert_eq!((handle.width(), handle.height()), (3, 2));
        assert_eq!(&handle.rgba()[..4], &[255, 0, 0, 255]);
    }

    #[test]
    fn test_rejects_non_base64_data_url() {
        assert!(matches!(
            decode_source("data:image/png,abc"),
            Err(DecodeError::UnsupportedSource(_))
        ));
        assert!(decode_source("data:image/png;base64,!!!").is_err());
    }

    #[test]
    fn test_queue_applies_to_live_object() {
        let mut doc = LabelDocument::default();
        let src = data_url(&png_bytes(4, 4), ImageFormat::Png);
        let id = doc.add(PlacedObject::image(
            Geometry::new(0.0, 0.0, 4.0, 4.0),
            ImageObject::new(src),
        ));
        let mut queue = DecodeQueue::new();
        assert_eq!(queue.request_missing(&doc), 1);
        assert_eq!(queue.request_missing(&doc), 0);
        queue.wait(&mut doc);
        assert!(!queue.is_pending(id));
        assert!(doc.get(id).unwrap().as_image().unwrap().handle().is_some());
    }

    #[test]
    fn test_queue_drops_result_for_removed_object() {
        let mut doc = LabelDocument::default();
        let src = data_url(&png_bytes(2, 2), ImageFormat::Png);
        let id = doc.add(PlacedObject::image(
            Geometry::new(0.0, 0.0, 2.0, 2.0),
            ImageObject::new(src),
        ));
        let mut queue = DecodeQueue::new();
        queue.request_missing(&doc);
        doc.remove(id);
        assert_eq!(queue.wait(&mut doc), 0);
        assert!(doc.is_empty());
    }

    #[test]
    fn test_failed_decode_is_not_retried() {
        let mut doc = LabelDocument::default();
        let id = doc.add(PlacedObject::image(
            Geometry::new(0.0, 0.0, 2.0, 2.0),
            ImageObject::new("data:image/png;base64,AAAA"),
        ));
        let mut queue = DecodeQueue::new();
        queue.request_missing(&doc);
        queue.wait(&mut doc);
        assert!(queue.has_failed(id, "data:image/png;base64,AAAA"));
        assert_eq!(queue.request_missing(&doc), 0);
    }

    #[test]
    fn test_sniffs_format_from_bytes() {
        assert!(matches!(decode_bytes(b"GIF89a\x01\0"), Err(DecodeError::UnknownFormat)));
        // A PNG payload behind a mislabelled data URL still decodes.
        let src = format!("data:image/jpeg;base64,{}", STANDARD.encode(png_bytes(2, 2)));
        assert!(decode_source(&src).is_ok());
    }

    #[test]
    fn test_corrupt_sources_fail_without_blocking() {
        let mut truncated = png_bytes(8, 8);
        truncated.truncate(24);
        let corrupt = data_url(&truncated, ImageFormat::Png);
        let missing = "/nonexistent/labelkit/logo.png".to_string();

        let mut doc = LabelDocument::default();
        let a = doc.add(PlacedObject::image(Geometry::new(0.0, 0.0, 8.0, 8.0), ImageObject::new(corrupt.clone())));
        let b = doc.add(PlacedObject::image(Geometry::new(0.0, 0.0, 8.0, 8.0), ImageObject::new(missing.clone())));
        let mut queue = DecodeQueue::new();
        assert_eq!(queue.request_missing(&doc), 2);
        assert_eq!(queue.wait(&mut doc), 2);

        assert_eq!(queue.pending_len(), 0);
        assert!(queue.has_failed(a, &corrupt));
        assert!(queue.has_failed(b, &missing));
        assert!(doc.get(a).unwrap().as_image().unwrap().handle().is_none());
    }

    #[test]
    fn test_many_images_share_one_worker() {
        let mut doc = LabelDocument::default();
        for size in 1..=24 {
            let src = data_url(&png_bytes(size, 1), ImageFormat::Png);
            doc.add(PlacedObject::image(Geometry::new(0.0, 0.0, 4.0, 4.0), ImageObject::new(src)));
        }
        let mut queue = DecodeQueue::new();
        assert_eq!(queue.request_missing(&doc), 24);
        assert_eq!(queue.wait(&mut doc), 24);
        for (object, width) in doc.objects.iter().zip(1..) {
            assert_eq!(object.as_image().unwrap().handle().map(|h| h.width()), Some(width));
        }
    }

    #[test]
    fn test_poll_without_requests() {
        let mut doc = LabelDocument::default();
        let mut queue = DecodeQueue::new();
        assert_eq!(queue.poll(&mut doc), 0);
        assert_eq!(queue.wait(&mut doc), 0);
    }
}
