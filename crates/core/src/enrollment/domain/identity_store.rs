use crate::shared::embedding::Embedding;
use crate::shared::error::RecognitionError;

/// One enrolled identity and its reference vector.
#[derive(Clone, Debug, PartialEq)]
pub struct IdentityRecord {
    pub identity_id: String,
    pub vector: Embedding,
}

/// Persists reference embeddings keyed by identity id.
///
/// At most one vector exists per id: `put` overwrites. Shape validation is
/// the caller's job; implementations store what they are given.
pub trait IdentityStore: Send + Sync {
    fn put(&self, identity_id: &str, vector: &Embedding) -> Result<(), RecognitionError>;

    /// Every stored record, in no particular order.
    fn get_all(&self) -> Result<Vec<IdentityRecord>, RecognitionError>;

    /// Removes the record if present; `Ok(false)` when there was nothing to delete.
    fn delete(&self, identity_id: &str) -> Result<bool, RecognitionError>;

    fn contains(&self, identity_id: &str) -> Result<bool, RecognitionError> {
        Ok(self
            .get_all()?
            .iter()
            .any(|r| r.identity_id == identity_id))
    }

    fn len(&self) -> Result<usize, RecognitionError> {
        Ok(self.get_all()?.len())
    }

    fn is_empty(&self) -> Result<bool, RecognitionError> {
        Ok(self.len()? == 0)
    }
}

/// Rejects ids that cannot safely name a single record on disk.
pub fn validate_identity_id(identity_id: &str) -> Result<(), RecognitionError> {
    let invalid = identity_id.trim().is_empty()
        || identity_id == "."
        || identity_id == ".."
        || identity_id.contains(['/', '\\', '\0']);
    if invalid {
        Err(RecognitionError::InvalidIdentity {
            identity_id: identity_id.to_string(),
        })
    } else {
        Ok(())
    }
}
