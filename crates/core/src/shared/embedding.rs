use serde::{Deserialize, Serialize};

use crate::shared::error::RecognitionError;

/// Default ArcFace output dimension.
pub const DEFAULT_EMBEDDING_DIMENSION: usize = 512;

/// A face feature vector, L2-normalized by convention.
///
/// Values come from the embedding model and are never mutated here; the
/// core only averages and compares them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Embedding(Vec<f32>);

impl Embedding {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[f32] {
        &self.0
    }

    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    /// Fails with `DimensionMismatch` unless the vector has `expected` entries.
    pub fn check_dimension(&self, expected: usize) -> Result<(), RecognitionError> {
        if self.dimension() == expected {
            Ok(())
        } else {
            Err(RecognitionError::DimensionMismatch {
                expected,
                actual: self.dimension(),
            })
        }
    }

    /// Cosine similarity `(a·b)/(‖a‖‖b‖)`, accumulated in f64.
    ///
    /// Returns 0.0 when either vector has zero magnitude.
    pub fn cosine_similarity(&self, other: &Embedding) -> Result<f64, RecognitionError> {
        other.check_dimension(self.dimension())?;

        let mut dot = 0.0f64;
        let mut norm_a = 0.0f64;
        let mut norm_b = 0.0f64;
        for (a, b) in self.0.iter().zip(other.0.iter()) {
            let (a, b) = (*a as f64, *b as f64);
            dot += a * b;
            norm_a += a * a;
            norm_b += b * b;
        }

        let denom = norm_a.sqrt() * norm_b.sqrt();
        if denom > 0.0 {
            Ok(dot / denom)
        } else {
            Ok(0.0)
        }
    }

    /// Element-wise arithmetic mean. `None` for an empty input.
    pub fn mean(samples: &[Embedding]) -> Result<Option<Embedding>, RecognitionError> {
        let Some(first) = samples.first() else {
            return Ok(None);
        };
        let dim = first.dimension();

        let mut sums = vec![0.0f64; dim];
        for sample in samples {
            sample.check_dimension(dim)?;
            for (acc, v) in sums.iter_mut().zip(sample.0.iter()) {
                *acc += *v as f64;
            }
        }

        let n = samples.len() as f64;
        Ok(Some(Embedding(
            sums.into_iter().map(|s| (s / n) as f32).collect(),
        )))
    }
}

impl From<Vec<f32>> for Embedding {
    fn from(values: Vec<f32>) -> Self {
        Self::new(values)
    }
}

pub fn l2_normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}
