use std::path::PathBuf;

use thiserror::Error;

/// Failures surfaced by enrollment and recognition operations.
///
/// Per-frame and per-image detector failures never reach this type; they are
/// logged and skipped by the use cases. Everything here aborts the operation
/// that raised it, except `NotFound`, which callers treat as a normal outcome.
#[derive(Error, Debug)]
pub enum RecognitionError {
    #[error("no valid face samples for identity '{identity_id}'")]
    NoValidSamples { identity_id: String },
    #[error("could not determine video frame rate (got {fps})")]
    UnknownFrameRate { fps: f64 },
    #[error("video source unreadable: {reason}")]
    SourceUnreadable { reason: String },
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("identity '{identity_id}' not found")]
    NotFound { identity_id: String },
    #[error("no enrolled identities in {path}")]
    EmptyDatabase { path: PathBuf },
    #[error("invalid identity id '{identity_id}'")]
    InvalidIdentity { identity_id: String },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("storage error at {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode record for {path}: {source}")]
    Serialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("cancelled")]
    Cancelled,
}

impl RecognitionError {
    pub(crate) fn unreadable(reason: impl std::fmt::Display) -> Self {
        Self::SourceUnreadable {
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_identity() {
        let err = RecognitionError::NotFound {
            identity_id: "alice_42".to_string(),
        };
        assert_eq!(err.to_string(), "identity 'alice_42' not found");

        let err = RecognitionError::NoValidSamples {
            identity_id: "bob".to_string(),
        };
        assert!(err.to_string().contains("bob"));
    }

    #[test]
    fn test_dimension_mismatch_message() {
        let err = RecognitionError::DimensionMismatch {
            expected: 512,
            actual: 128,
        };
        assert_eq!(
            err.to_string(),
            "embedding dimension mismatch: expected 512, got 128"
        );
    }

    #[test]
    fn test_unreadable_wraps_reason() {
        let err = RecognitionError::unreadable("No video stream found");
        assert!(matches!(err, RecognitionError::SourceUnreadable { .. }));
        assert!(err.to_string().contains("No video stream found"));
    }
}
