//! File-based storage: one JSON file per design in a directory.

use super::{BoxFuture, DesignSummary, Storage, StorageError, StorageResult, StoredDesign, sort_newest_first};
use std::fs;
use std::path::{Path, PathBuf};

/// File-based storage for native platforms.
///
/// Stores designs as JSON files in a specified directory.
pub struct FileStorage {
    /// Base directory for design storage.
    base_path: PathBuf,
}

impl FileStorage {
    /// Create a new file storage with the given base directory.
    ///
    /// Creates the directory if it doesn't exist.
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| {
                StorageError::Io(format!("Failed to create storage directory: {}", e))
            })?;
        }
        Ok(Self { base_path })
    }

    /// Create file storage in the default location.
    ///
    /// On Linux: `~/.local/share/labelkit/designs/`
    /// On Windows: `%LOCALAPPDATA%\labelkit\designs\`
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Io("Could not determine home directory".to_string()))?;

        Self::new(base.join("labelkit").join("designs"))
    }

    /// Get the file path for a design ID.
    fn design_path(&self, id: &str) -> PathBuf {
        // Sanitize ID to be safe for filenames
        let safe_id: String = id
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.base_path.join(format!("{}.json", safe_id))
    }

    /// Get the base path.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

fn read_design(path: &Path) -> StorageResult<StoredDesign> {
    let json = fs::read_to_string(path)
        .map_err(|e| StorageError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
    serde_json::from_str(&json).map_err(|e| {
        StorageError::Serialization(format!("Failed to parse {}: {}", path.display(), e))
    })
}

impl Storage for FileStorage {
    fn save(&self, id: &str, design: &StoredDesign) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.design_path(id);
        let mut design = design.clone();
        design.id = Some(id.to_string());
        let json = match serde_json::to_string_pretty(&design) {
            Ok(j) => j,
            Err(e) => return Box::pin(async move { Err(StorageError::Serialization(e.to_string())) }),
        };

        Box::pin(async move {
            fs::write(&path, json)
                .map_err(|e| StorageError::Io(format!("Failed to write {}: {}", path.display(), e)))
        })
    }

    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<Option<StoredDesign>>> {
        let path = self.design_path(id);

        Box::pin(async move {
            if !path.exists() {
                return Ok(None);
            }
            read_design(&path).map(Some)
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.design_path(id);

        Box::pin(async move {
            if path.exists() {
                fs::remove_file(&path).map_err(|e| {
                    StorageError::Io(format!("Failed to delete {}: {}", path.display(), e))
                })?;
            }
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<DesignSummary>>> {
        let base = self.base_path.clone();

        Box::pin(async move {
            if !base.exists() {
                return Ok(vec![]);
            }

            let entries = fs::read_dir(&base)
                .map_err(|e| StorageError::Io(format!("Failed to read directory: {}", e)))?;

            let mut summaries = Vec::new();
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().is_none_or(|e| e != "json") {
                    continue;
                }
                let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };
                match read_design(&path) {
                    Ok(design) => {
                        let id = design.id.clone().unwrap_or_else(|| stem.to_string());
                        summaries.push(design.summary(&id));
                    }
                    Err(e) => log::warn!("Skipping unreadable design: {}", e),
                }
            }
            sort_newest_first(&mut summaries);
            Ok(summaries)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::LabelDocument;
    use crate::media::Media;
    use crate::objects::PlacedObject;
    use pollster::block_on;
    use tempfile::tempdir;

    fn design(name: &str) -> StoredDesign {
        let mut doc = LabelDocument::new(Media::Label55x30);
        doc.add(PlacedObject::default_text());
        StoredDesign::new("unused", name, &doc)
    }

    #[test]
    fn test_file_storage_save_load() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();

        block_on(storage.save("test-doc", &design("Test Document"))).unwrap();
        let loaded = block_on(storage.load("test-doc")).unwrap().unwrap();

        assert_eq!(loaded.name.as_deref(), Some("Test Document"));
        assert_eq!(loaded.id.as_deref(), Some("test-doc"));
        assert_eq!(loaded.document.len(), 1);
    }

    #[test]
    fn test_file_storage_missing() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();

        assert_eq!(block_on(storage.load("nonexistent")).unwrap(), None);
    }

    #[test]
    fn test_file_storage_list() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();

        block_on(storage.save("doc1", &design("One"))).unwrap();
        block_on(storage.save("doc2", &design("Two"))).unwrap();
        fs::write(dir.path().join("broken.json"), "{").unwrap();
        fs::write(dir.path().join("notes.txt"), "hello").unwrap();

        let list = block_on(storage.list()).unwrap();
        assert_eq!(list.len(), 2);
        assert!(list.iter().any(|s| s.id == "doc1" && s.media == Media::Label55x30));
        assert!(list.iter().any(|s| s.id == "doc2"));
    }

    #[test]
    fn test_file_storage_delete() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();

        block_on(storage.save("test", &design("x"))).unwrap();
        block_on(storage.delete("test")).unwrap();
        assert_eq!(block_on(storage.load("test")).unwrap(), None);
    }

    #[test]
    fn test_file_storage_sanitizes_id() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();

        block_on(storage.save("test/doc:with*special", &design("x"))).unwrap();
        assert!(dir.path().join("test_doc_with_special.json").exists());

        let loaded = block_on(storage.load("test/doc:with*special")).unwrap();
        assert!(loaded.is_some());
    }

    #[test]
    fn test_creates_missing_directory() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let storage = FileStorage::new(nested.clone()).unwrap();
        assert_eq!(storage.base_path(), nested.as_path());
        assert!(nested.is_dir());
    }
}
