use std::fmt;

use crate::enrollment::domain::identity_store::IdentityRecord;
use crate::shared::config::DEFAULT_SIMILARITY_THRESHOLD;
use crate::shared::constants::UNKNOWN_IDENTITY;
use crate::shared::embedding::Embedding;
use crate::shared::error::RecognitionError;

/// Who a probe was matched to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Identity {
    Known(String),
    Unknown,
}

impl Identity {
    pub fn id(&self) -> Option<&str> {
        match self {
            Identity::Known(id) => Some(id),
            Identity::Unknown => None,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Identity::Known(_))
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id().unwrap_or(UNKNOWN_IDENTITY))
    }
}

/// Outcome of matching one probe taken from one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchResult {
    pub identity: Identity,
    pub score: f64,
    pub frame_index: usize,
}

/// Score returned when there is nothing to compare against.
pub const EMPTY_STORE_SCORE: f64 = -1.0;

/// Nearest-identity search by cosine similarity with an acceptance threshold.
pub struct SimilarityMatcher {
    threshold: f64,
}

impl SimilarityMatcher {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Finds the stored identity most similar to `probe`.
    ///
    /// Only a strictly greater score replaces the current best, so on ties
    /// the record that comes first in `snapshot` wins. The best score is
    /// returned even when it falls below the threshold and the identity is
    /// reported as `Unknown`.
    pub fn match_probe(
        &self,
        probe: &Embedding,
        snapshot: &[IdentityRecord],
    ) -> Result<(Identity, f64), RecognitionError> {
        if snapshot.is_empty() {
            return Ok((Identity::Unknown, EMPTY_STORE_SCORE));
        }

        let mut best: Option<&IdentityRecord> = None;
        let mut best_score = f64::NEG_INFINITY;
        for record in snapshot {
            let score = probe.cosine_similarity(&record.vector)?;
            log::trace!("  similarity with {}: {score:.4}", record.identity_id);
            if score > best_score {
                best_score = score;
                best = Some(record);
            }
        }

        match best {
            Some(record) if best_score >= self.threshold => {
                Ok((Identity::Known(record.identity_id.clone()), best_score))
            }
            // All scores NaN leaves `best` unset; report the sentinel score
            None => Ok((Identity::Unknown, EMPTY_STORE_SCORE)),
            Some(_) => Ok((Identity::Unknown, best_score)),
        }
    }

    /// [`match_probe`](Self::match_probe) tagged with the frame it came from.
    pub fn match_detection(
        &self,
        probe: &Embedding,
        snapshot: &[IdentityRecord],
        frame_index: usize,
    ) -> Result<MatchResult, RecognitionError> {
        let (identity, score) = self.match_probe(probe, snapshot)?;
        Ok(MatchResult {
            identity,
            score,
            frame_index,
        })
    }
}

impl Default for SimilarityMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_SIMILARITY_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn record(id: &str, values: &[f32]) -> IdentityRecord {
        IdentityRecord {
            identity_id: id.to_string(),
            vector: Embedding::new(values.to_vec()),
        }
    }

    /// Unit vector at `cos` similarity to `[1, 0]`.
    fn at_similarity(cos: f64) -> Vec<f32> {
        vec![cos as f32, (1.0 - cos * cos).sqrt() as f32]
    }

    #[test]
    fn test_identical_vector_matches_with_score_one() {
        let v = [0.6, 0.8];
        let snapshot = vec![record("alice", &[1.0, 0.0]), record("bob", &v)];
        let (identity, score) = SimilarityMatcher::default()
            .match_probe(&Embedding::new(v.to_vec()), &snapshot)
            .unwrap();
        assert_eq!(identity, Identity::Known("bob".to_string()));
        assert_relative_eq!(score, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_empty_snapshot_is_unknown_with_sentinel() {
        let (identity, score) = SimilarityMatcher::default()
            .match_probe(&Embedding::new(vec![1.0, 0.0]), &[])
            .unwrap();
        assert_eq!(identity, Identity::Unknown);
        assert_eq!(score, -1.0);
    }

    #[rstest]
    #[case(0.6, Identity::Known("near".to_string()))]
    #[case(0.95, Identity::Unknown)]
    fn test_threshold_gates_best_match(#[case] threshold: f64, #[case] expected: Identity) {
        let snapshot = vec![
            record("far", &at_similarity(0.3)),
            record("near", &at_similarity(0.9)),
        ];
        let (identity, score) = SimilarityMatcher::new(threshold)
            .match_probe(&Embedding::new(vec![1.0, 0.0]), &snapshot)
            .unwrap();
        assert_eq!(identity, expected);
        assert_relative_eq!(score, 0.9, epsilon = 1e-6);
    }

    #[test]
    fn test_score_equal_to_threshold_is_accepted() {
        let snapshot = vec![record("alice", &[1.0, 0.0])];
        let (identity, _) = SimilarityMatcher::new(1.0)
            .match_probe(&Embedding::new(vec![2.0, 0.0]), &snapshot)
            .unwrap();
        assert!(identity.is_known());
    }

    #[test]
    fn test_tie_keeps_first_encountered() {
        let snapshot = vec![
            record("first", &[1.0, 0.0]),
            record("second", &[1.0, 0.0]),
        ];
        let (identity, _) = SimilarityMatcher::default()
            .match_probe(&Embedding::new(vec![1.0, 0.0]), &snapshot)
            .unwrap();
        assert_eq!(identity.id(), Some("first"));
    }

    #[test]
    fn test_negative_best_score_is_still_reported() {
        let snapshot = vec![record("opposite", &[-1.0, 0.0])];
        let (identity, score) = SimilarityMatcher::default()
            .match_probe(&Embedding::new(vec![1.0, 0.0]), &snapshot)
            .unwrap();
        assert_eq!(identity, Identity::Unknown);
        assert_relative_eq!(score, -1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_dimension_mismatch_is_an_error() {
        let snapshot = vec![record("alice", &[1.0, 0.0, 0.0])];
        let err = SimilarityMatcher::default()
            .match_probe(&Embedding::new(vec![1.0, 0.0]), &snapshot)
            .unwrap_err();
        assert!(matches!(err, RecognitionError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_match_detection_carries_frame_index() {
        let snapshot = vec![record("alice", &[1.0, 0.0])];
        let result = SimilarityMatcher::default()
            .match_detection(&Embedding::new(vec![1.0, 0.0]), &snapshot, 40)
            .unwrap();
        assert_eq!(result.frame_index, 40);
        assert_eq!(result.identity.to_string(), "alice");
    }

    #[test]
    fn test_unknown_displays_as_unknown() {
        assert_eq!(Identity::Unknown.to_string(), "unknown");
    }
}
