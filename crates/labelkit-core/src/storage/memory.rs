//! In-memory storage implementation.

use super::{BoxFuture, DesignSummary, Storage, StorageError, StorageResult, StoredDesign, sort_newest_first};
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory storage for testing and ephemeral use.
#[derive(Default)]
pub struct MemoryStorage {
    designs: RwLock<HashMap<String, StoredDesign>>,
}

impl MemoryStorage {
    /// Create a new empty memory storage.
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(e: impl std::fmt::Display) -> StorageError {
    StorageError::Other(format!("Lock error: {}", e))
}

impl Storage for MemoryStorage {
    fn save(&self, id: &str, design: &StoredDesign) -> BoxFuture<'_, StorageResult<()>> {
        let id = id.to_string();
        let design = design.clone();
        Box::pin(async move {
            let mut designs = self.designs.write().map_err(lock_error)?;
            designs.insert(id, design);
            Ok(())
        })
    }

    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<Option<StoredDesign>>> {
        let id = id.to_string();
        Box::pin(async move {
            let designs = self.designs.read().map_err(lock_error)?;
            Ok(designs.get(&id).cloned())
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let id = id.to_string();
        Box::pin(async move {
            let mut designs = self.designs.write().map_err(lock_error)?;
            designs.remove(&id);
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<DesignSummary>>> {
        Box::pin(async move {
            let designs = self.designs.read().map_err(lock_error)?;
            let mut summaries: Vec<DesignSummary> = designs
                .iter()
                .map(|(id, design)| design.summary(id))
                .collect();
            sort_newest_first(&mut summaries);
            Ok(summaries)
        })
    }
}
