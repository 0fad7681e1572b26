//! Named designs on top of a storage backend.

use super::{DesignSummary, Storage, StorageError, StorageResult, StoredDesign};
use crate::document::LabelDocument;
use crate::error::{DesignError, DesignResult};
use chrono::Utc;
use rand::Rng;
use std::sync::Arc;

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}

/// Allocate a design id: `d`, the millisecond timestamp and a random suffix, in base 36.
pub fn new_design_id() -> String {
    let millis = u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default();
    let mut rng = rand::thread_rng();
    let suffix: String = (0..6)
        .map(|_| char::from(BASE36[rng.gen_range(0..BASE36.len())]))
        .collect();
    format!("d{}{}", to_base36(millis), suffix)
}

/// The design library: save, open, list and exchange designs.
pub struct Library<S: Storage> {
    storage: Arc<S>,
}

impl<S: Storage> Clone for Library<S> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
        }
    }
}

impl<S: Storage> Library<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    /// Store `document` under a fresh id. Returns the new id.
    pub async fn save_as(&self, name: &str, document: &LabelDocument) -> StorageResult<String> {
        let id = new_design_id();
        self.storage
            .save(&id, &StoredDesign::new(id.clone(), name, document))
            .await?;
        log::info!("Saved design {id} as {name:?}");
        Ok(id)
    }

    /// Overwrite the design stored under `id`.
    ///
    /// Without a `name` the stored name is kept.
    pub async fn save(&self, id: &str, name: Option<&str>, document: &LabelDocument) -> StorageResult<()> {
        let name = match name {
            Some(name) => name.to_string(),
            None => self
                .storage
                .load(id)
                .await?
                .and_then(|existing| existing.name)
                .unwrap_or_else(|| id.to_string()),
        };
        self.storage
            .save(id, &StoredDesign::new(id, name, document))
            .await?;
        log::info!("Saved design {id}");
        Ok(())
    }

    /// Load a design by id.
    pub async fn open(&self, id: &str) -> StorageResult<StoredDesign> {
        let design = self
            .storage
            .load(id)
            .await?
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;
        log::info!("Opened design {id}");
        Ok(design)
    }

    pub async fn delete(&self, id: &str) -> StorageResult<()> {
        self.storage.delete(id).await?;
        log::info!("Deleted design {id}");
        Ok(())
    }

    /// All designs, newest first.
    pub async fn list(&self) -> StorageResult<Vec<DesignSummary>> {
        self.storage.list().await
    }

    /// Add a design from exported JSON as a new library entry.
    ///
    /// The embedded name is kept; unnamed designs are called
    /// `Imported <timestamp>`. Nothing is stored when parsing fails.
    pub async fn import_json(&self, json: &str) -> DesignResult<String> {
        let design: StoredDesign =
            serde_json::from_str(json).map_err(|e| DesignError::ImportFailed(e.to_string()))?;
        let name = design
            .name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| format!("Imported {}", Utc::now().format("%Y-%m-%d %H:%M:%S")));
        let id = self.save_as(&name, &design.document).await?;
        Ok(id)
    }

    /// Serialize a document for exchange, optionally tagged with its library id and name.
    pub fn export_json(id: Option<&str>, name: Option<&str>, document: &LabelDocument) -> DesignResult<String> {
        let design = StoredDesign {
            id: id.map(str::to_string),
            name: name.map(str::to_string),
            updated_at: Some(Utc::now()),
            document: document.handle_free(),
        };
        Ok(serde_json::to_string_pretty(&design)?)
    }
}
