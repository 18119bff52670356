use std::path::PathBuf;

use crate::shared::embedding::DEFAULT_EMBEDDING_DIMENSION;
use crate::shared::error::RecognitionError;

pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.6;
pub const DEFAULT_SAMPLE_INTERVAL_SECONDS: f64 = 2.0;
pub const DEFAULT_DETECTOR_CONFIDENCE: f64 = 0.5;

/// Settings for one enrollment or recognition pipeline instance.
///
/// Passed explicitly into each entry point so independent pipelines (and
/// tests) can point at different databases in the same process.
#[derive(Clone, Debug, PartialEq)]
pub struct RecognitionConfig {
    pub database_dir: PathBuf,
    pub similarity_threshold: f64,
    pub sample_interval_seconds: f64,
    pub embedding_dimension: usize,
    pub detector_confidence: f64,
}

impl RecognitionConfig {
    pub fn new(database_dir: impl Into<PathBuf>) -> Self {
        Self {
            database_dir: database_dir.into(),
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            sample_interval_seconds: DEFAULT_SAMPLE_INTERVAL_SECONDS,
            embedding_dimension: DEFAULT_EMBEDDING_DIMENSION,
            detector_confidence: DEFAULT_DETECTOR_CONFIDENCE,
        }
    }

    pub fn validate(&self) -> Result<(), RecognitionError> {
        if !(-1.0..=1.0).contains(&self.similarity_threshold) {
            return Err(RecognitionError::InvalidConfig(format!(
                "similarity threshold must be between -1.0 and 1.0, got {}",
                self.similarity_threshold
            )));
        }
        if !self.sample_interval_seconds.is_finite() || self.sample_interval_seconds <= 0.0 {
            return Err(RecognitionError::InvalidConfig(format!(
                "sample interval must be a positive number of seconds, got {}",
                self.sample_interval_seconds
            )));
        }
        if self.embedding_dimension == 0 {
            return Err(RecognitionError::InvalidConfig(
                "embedding dimension must be non-zero".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.detector_confidence) {
            return Err(RecognitionError::InvalidConfig(format!(
                "detector confidence must be between 0.0 and 1.0, got {}",
                self.detector_confidence
            )));
        }
        Ok(())
    }
}

/// Platform data directory for the identity database.
///
/// - macOS: `~/Library/Application Support/facecheck/known_db/`
/// - Linux: `$XDG_DATA_HOME/facecheck/known_db/` or `~/.local/share/facecheck/known_db/`
/// - Windows: `%APPDATA%/facecheck/known_db/`
pub fn default_database_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join("facecheck").join("known_db"))
}
