//! Storage abstraction for the design library.

mod file;
mod library;
mod memory;

pub use file::FileStorage;
pub use library::{Library, new_design_id};
pub use memory::MemoryStorage;

use crate::document::LabelDocument;
use crate::media::Media;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Design not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future for async operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// A design as kept in the library: the document plus library metadata.
///
/// On the wire this is the document's own JSON with `id`, `name` and
/// `updatedAt` added alongside `media` and `objects`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredDesign {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub document: LabelDocument,
}

impl StoredDesign {
    /// Wrap a document for storage. Decoded image data is dropped.
    pub fn new(id: impl Into<String>, name: impl Into<String>, document: &LabelDocument) -> Self {
        Self {
            id: Some(id.into()),
            name: Some(name.into()),
            updated_at: Some(Utc::now()),
            document: document.handle_free(),
        }
    }

    /// Listing entry for this design, stored under `id`.
    pub fn summary(&self, id: &str) -> DesignSummary {
        DesignSummary {
            id: id.to_string(),
            name: self.name.clone().unwrap_or_else(|| id.to_string()),
            media: self.document.media.clone(),
            updated_at: self.updated_at,
        }
    }
}

/// One row of the library listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignSummary {
    pub id: String,
    pub name: String,
    pub media: Media,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Order summaries newest first; undated entries go last.
pub(crate) fn sort_newest_first(summaries: &mut [DesignSummary]) {
    summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.id.cmp(&b.id)));
}

/// Trait for design storage backends.
///
/// Implementations can keep designs in memory, on the filesystem, or
/// behind a remote service.
pub trait Storage: Send + Sync {
    /// Save a design, replacing any design with the same id.
    fn save(&self, id: &str, design: &StoredDesign) -> BoxFuture<'_, StorageResult<()>>;

    /// Load a design, or `None` if there is no design with that id.
    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<Option<StoredDesign>>>;

    /// Delete a design. Deleting a missing design is not an error.
    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>>;

    /// List all designs, newest first.
    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<DesignSummary>>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::PlacedObject;
    use chrono::TimeZone;

    #[test]
    fn test_stored_design_wire_form() {
        let mut document = LabelDocument::new(Media::Label50x30);
        document.add(PlacedObject::default_rect());
        let mut design = StoredDesign::new("d1", "Shelf tag", &document);
        design.updated_at = Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());

        let value = serde_json::to_value(&design).unwrap();
        assert_eq!(value["id"], "d1");
        assert_eq!(value["name"], "Shelf tag");
        assert_eq!(value["media"], "label50x30");
        assert_eq!(value["widthDots"], 400);
        assert_eq!(value["objects"][0]["type"], "rect");
        assert!(value["updatedAt"].as_str().unwrap().starts_with("2024-05-01T12:00:00"));

        let back: StoredDesign = serde_json::from_value(value).unwrap();
        assert_eq!(back, design);
    }

    #[test]
    fn test_bare_document_is_a_stored_design() {
        let json = r#"{"version":1,"media":"label55x30","widthDots":440,"heightDots":240,"objects":[]}"#;
        let design: StoredDesign = serde_json::from_str(json).unwrap();
        assert_eq!(design.id, None);
        assert_eq!(design.name, None);
        assert_eq!(design.document.media, Media::Label55x30);
    }

    #[test]
    fn test_summaries_sort_newest_first() {
        let at = |h| Some(Utc.with_ymd_and_hms(2024, 1, 1, h, 0, 0).unwrap());
        let row = |id: &str, updated_at| DesignSummary {
            id: id.into(),
            name: id.into(),
            media: Media::default(),
            updated_at,
        };
        let mut rows = vec![row("a", at(1)), row("b", None), row("c", at(3))];
        sort_newest_first(&mut rows);
        let ids: Vec<_> = rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["c", "a", "b"]);
    }
}
