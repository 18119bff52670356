use std::collections::HashMap;
use std::sync::RwLock;

use crate::enrollment::domain::identity_store::{IdentityRecord, IdentityStore};
use crate::shared::embedding::Embedding;
use crate::shared::error::RecognitionError;

/// Non-durable store backed by a `HashMap`, for tests and embedding.
///
/// `get_all` returns records sorted by id so iteration order is stable.
#[derive(Default)]
pub struct MemoryIdentityStore {
    records: RwLock<HashMap<String, Embedding>>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdentityStore for MemoryIdentityStore {
    fn put(&self, identity_id: &str, vector: &Embedding) -> Result<(), RecognitionError> {
        self.records
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(identity_id.to_string(), vector.clone());
        Ok(())
    }

    fn get_all(&self) -> Result<Vec<IdentityRecord>, RecognitionError> {
        let records = self.records.read().unwrap_or_else(|e| e.into_inner());
        let mut all: Vec<IdentityRecord> = records
            .iter()
            .map(|(id, vector)| IdentityRecord {
                identity_id: id.clone(),
                vector: vector.clone(),
            })
            .collect();
        all.sort_by(|a, b| a.identity_id.cmp(&b.identity_id));
        Ok(all)
    }

    fn delete(&self, identity_id: &str) -> Result<bool, RecognitionError> {
        Ok(self
            .records
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(identity_id)
            .is_some())
    }

    fn contains(&self, identity_id: &str) -> Result<bool, RecognitionError> {
        Ok(self
            .records
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(identity_id))
    }
}
