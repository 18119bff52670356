use std::sync::Arc;

use crate::enrollment::domain::identity_store::IdentityStore;
use crate::shared::embedding::Embedding;
use crate::shared::error::RecognitionError;

/// Builds one reference vector per identity from several sample embeddings.
///
/// The reference is the plain element-wise mean of the samples. Enrolling an
/// identity again replaces its vector outright; earlier samples are not
/// blended in.
pub struct EnrollmentAggregator {
    store: Arc<dyn IdentityStore>,
    embedding_dimension: usize,
}

impl EnrollmentAggregator {
    pub fn new(store: Arc<dyn IdentityStore>, embedding_dimension: usize) -> Self {
        Self {
            store,
            embedding_dimension,
        }
    }

    /// Averages `samples` and writes the result under `identity_id`.
    ///
    /// Nothing is written when `samples` is empty or any sample has the
    /// wrong dimension.
    pub fn enroll(
        &self,
        identity_id: &str,
        samples: &[Embedding],
    ) -> Result<Embedding, RecognitionError> {
        for sample in samples {
            sample.check_dimension(self.embedding_dimension)?;
        }
        let reference =
            Embedding::mean(samples)?.ok_or_else(|| RecognitionError::NoValidSamples {
                identity_id: identity_id.to_string(),
            })?;

        self.store.put(identity_id, &reference)?;
        log::info!("Enrolled {identity_id} from {} sample(s)", samples.len());
        Ok(reference)
    }

    /// Removes an enrolled identity, reporting `NotFound` if it was never stored.
    pub fn remove(&self, identity_id: &str) -> Result<(), RecognitionError> {
        if self.store.delete(identity_id)? {
            log::info!("Removed {identity_id}");
            Ok(())
        } else {
            Err(RecognitionError::NotFound {
                identity_id: identity_id.to_string(),
            })
        }
    }
}
