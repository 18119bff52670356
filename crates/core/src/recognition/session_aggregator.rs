use std::collections::BTreeMap;

use serde::Serialize;

use crate::matching::similarity_matcher::{Identity, MatchResult};
use crate::recognition::display_name::DisplayNameStrategy;

/// Per-identity state accumulated over one analysis run.
#[derive(Clone, Debug, PartialEq)]
pub struct RecognitionEntry {
    pub identity_id: String,
    pub best_confidence: f64,
    pub first_detection_frame: usize,
}

/// One recognized identity in the final summary.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RecognizedIdentity {
    pub display_name: String,
    pub identity_id: String,
    pub confidence: f64,
    pub first_detection_frame: usize,
}

/// Terminal output of a recognition run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RecognitionSummary {
    pub total_detections: usize,
    pub processed_detections: usize,
    /// Sampled frames the analyzer failed on; their faces are not counted.
    pub failed_frames: usize,
    pub recognized_count: usize,
    pub recognized: Vec<RecognizedIdentity>,
}

impl RecognitionSummary {
    pub fn get(&self, identity_id: &str) -> Option<&RecognizedIdentity> {
        self.recognized.iter().find(|r| r.identity_id == identity_id)
    }
}

/// Deduplicates match results per identity for a single video.
///
/// Each identity keeps the frame it was first matched in and the highest
/// score seen so far. Unknown results only move the counters.
#[derive(Debug, Default)]
pub struct RecognitionSession {
    entries: BTreeMap<String, RecognitionEntry>,
    total_detections: usize,
    processed_detections: usize,
    failed_frames: usize,
}

impl RecognitionSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_match(&mut self, result: &MatchResult) {
        self.total_detections += 1;
        self.processed_detections += 1;

        let Identity::Known(identity_id) = &result.identity else {
            return;
        };
        match self.entries.get_mut(identity_id) {
            Some(entry) => {
                if result.score > entry.best_confidence {
                    entry.best_confidence = result.score;
                }
            }
            None => {
                log::info!(
                    "Found {identity_id} at frame {} (similarity {:.2})",
                    result.frame_index,
                    result.score
                );
                self.entries.insert(
                    identity_id.clone(),
                    RecognitionEntry {
                        identity_id: identity_id.clone(),
                        best_confidence: result.score,
                        first_detection_frame: result.frame_index,
                    },
                );
            }
        }
    }

    /// A detected face whose embedding could not be produced.
    pub fn record_failed_detection(&mut self) {
        self.total_detections += 1;
    }

    /// A sampled frame that could not be analyzed at all.
    pub fn record_failed_frame(&mut self) {
        self.failed_frames += 1;
    }

    pub fn entry(&self, identity_id: &str) -> Option<&RecognitionEntry> {
        self.entries.get(identity_id)
    }

    pub fn total_detections(&self) -> usize {
        self.total_detections
    }

    pub fn processed_detections(&self) -> usize {
        self.processed_detections
    }

    /// Closes the session. Identities are listed in id order.
    pub fn finish(self, naming: &dyn DisplayNameStrategy) -> RecognitionSummary {
        let recognized: Vec<RecognizedIdentity> = self
            .entries
            .into_values()
            .map(|entry| RecognizedIdentity {
                display_name: naming.display_name(&entry.identity_id),
                identity_id: entry.identity_id,
                confidence: entry.best_confidence,
                first_detection_frame: entry.first_detection_frame,
            })
            .collect();

        RecognitionSummary {
            total_detections: self.total_detections,
            processed_detections: self.processed_detections,
            failed_frames: self.failed_frames,
            recognized_count: recognized.len(),
            recognized,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognition::display_name::{IdentityNaming, RolePrefixNaming};

    fn result(id: Option<&str>, score: f64, frame_index: usize) -> MatchResult {
        MatchResult {
            identity: id.map_or(Identity::Unknown, |id| Identity::Known(id.to_string())),
            score,
            frame_index,
        }
    }

    #[test]
    fn test_aggregates_best_confidence_and_first_frame() {
        let mut session = RecognitionSession::new();
        for r in [
            result(Some("A"), 0.7, 0),
            result(Some("A"), 0.9, 5),
            result(Some("B"), 0.65, 10),
            result(None, -1.0, 15),
        ] {
            session.record_match(&r);
        }

        let summary = session.finish(&IdentityNaming);
        assert_eq!(summary.total_detections, 4);
        assert_eq!(summary.processed_detections, 4);
        assert_eq!(summary.recognized_count, 2);

        let a = summary.get("A").unwrap();
        assert_eq!(a.confidence, 0.9);
        assert_eq!(a.first_detection_frame, 0);
        let b = summary.get("B").unwrap();
        assert_eq!(b.confidence, 0.65);
        assert_eq!(b.first_detection_frame, 10);
    }

    #[test]
    fn test_confidence_never_decreases() {
        let mut session = RecognitionSession::new();
        session.record_match(&result(Some("A"), 0.9, 0));
        session.record_match(&result(Some("A"), 0.7, 20));
        session.record_match(&result(Some("A"), 0.8, 40));

        let entry = session.entry("A").unwrap();
        assert_eq!(entry.best_confidence, 0.9);
        assert_eq!(entry.first_detection_frame, 0);
    }

    #[test]
    fn test_unknown_results_create_no_entries() {
        let mut session = RecognitionSession::new();
        session.record_match(&result(None, 0.4, 0));
        session.record_match(&result(None, 0.5, 20));

        let summary = session.finish(&IdentityNaming);
        assert!(summary.recognized.is_empty());
        assert_eq!(summary.total_detections, 2);
        assert_eq!(summary.processed_detections, 2);
    }

    #[test]
    fn test_failed_detection_counts_only_toward_total() {
        let mut session = RecognitionSession::new();
        session.record_failed_detection();
        session.record_match(&result(Some("A"), 0.8, 20));

        assert_eq!(session.total_detections(), 2);
        assert_eq!(session.processed_detections(), 1);
    }

    #[test]
    fn test_failed_frame_leaves_detection_counters_alone() {
        let mut session = RecognitionSession::new();
        session.record_failed_frame();
        session.record_match(&result(Some("A"), 0.8, 20));

        let summary = session.finish(&IdentityNaming);
        assert_eq!(summary.failed_frames, 1);
        assert_eq!(summary.total_detections, 1);
        assert_eq!(summary.processed_detections, 1);
    }

    #[test]
    fn test_empty_session_summary() {
        let summary = RecognitionSession::new().finish(&IdentityNaming);
        assert_eq!(summary.total_detections, 0);
        assert_eq!(summary.recognized_count, 0);
    }

    #[test]
    fn test_summary_applies_naming_and_sorts_by_id() {
        let mut session = RecognitionSession::new();
        session.record_match(&result(Some("prof_ada_math"), 0.8, 40));
        session.record_match(&result(Some("grace_1042"), 0.7, 0));

        let summary = session.finish(&RolePrefixNaming::default());
        let names: Vec<(&str, &str)> = summary
            .recognized
            .iter()
            .map(|r| (r.identity_id.as_str(), r.display_name.as_str()))
            .collect();
        assert_eq!(
            names,
            vec![("grace_1042", "grace"), ("prof_ada_math", "ada_math")]
        );
    }

    #[test]
    fn test_summary_serializes_to_json() {
        let mut session = RecognitionSession::new();
        session.record_match(&result(Some("grace_1042"), 0.75, 20));
        let json = serde_json::to_value(session.finish(&RolePrefixNaming::default())).unwrap();

        assert_eq!(json["total_detections"], 1);
        assert_eq!(json["recognized"][0]["display_name"], "grace");
        assert_eq!(json["recognized"][0]["first_detection_frame"], 20);
    }
}
