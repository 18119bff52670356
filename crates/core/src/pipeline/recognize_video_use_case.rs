use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use crate::detection::domain::face_analyzer::FaceAnalyzer;
use crate::enrollment::domain::identity_store::{IdentityRecord, IdentityStore};
use crate::matching::similarity_matcher::SimilarityMatcher;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::recognition::display_name::DisplayNameStrategy;
use crate::recognition::session_aggregator::{RecognitionSession, RecognitionSummary};
use crate::sampling::frame_sampler::{FrameSampler, OpenedVideo};
use crate::shared::config::RecognitionConfig;
use crate::shared::error::RecognitionError;
use crate::video::domain::video_reader::VideoReader;

/// Produces a fresh reader for each run.
pub type ReaderFactory = Box<dyn Fn() -> Box<dyn VideoReader> + Send>;

/// Called after each sampled frame with `(sampled_so_far, estimated_total)`.
/// Returning `false` cancels the run.
pub type ProgressCallback = Box<dyn Fn(usize, usize) -> bool + Send>;

/// Reports which enrolled identities appear in a video.
///
/// Wires sampler, analyzer, matcher and session together. The store is read
/// again for every sampled frame, so enrollments made during a run are
/// picked up from the next frame on.
pub struct RecognizeVideoUseCase {
    store: Arc<dyn IdentityStore>,
    analyzer: Box<dyn FaceAnalyzer>,
    new_reader: ReaderFactory,
    naming: Box<dyn DisplayNameStrategy>,
    logger: Box<dyn PipelineLogger>,
    on_progress: Option<ProgressCallback>,
    sampler: FrameSampler,
    matcher: SimilarityMatcher,
    embedding_dimension: usize,
    database_dir: std::path::PathBuf,
}

impl RecognizeVideoUseCase {
    pub fn new(
        config: &RecognitionConfig,
        store: Arc<dyn IdentityStore>,
        analyzer: Box<dyn FaceAnalyzer>,
        new_reader: ReaderFactory,
        naming: Box<dyn DisplayNameStrategy>,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        Self {
            store,
            analyzer,
            new_reader,
            naming,
            logger,
            on_progress: None,
            sampler: FrameSampler::new(config.sample_interval_seconds),
            matcher: SimilarityMatcher::new(config.similarity_threshold),
            embedding_dimension: config.embedding_dimension,
            database_dir: config.database_dir.clone(),
        }
    }

    pub fn with_progress(mut self, on_progress: ProgressCallback) -> Self {
        self.on_progress = Some(on_progress);
        self
    }

    pub fn execute(&mut self, video_path: &Path) -> Result<RecognitionSummary, RecognitionError> {
        let mut skipped_records = HashSet::new();
        let initial = self.store.get_all()?;
        if initial.is_empty() {
            return Err(RecognitionError::EmptyDatabase {
                path: self.database_dir.clone(),
            });
        }
        if self.usable_records(initial, &mut skipped_records).is_empty() {
            return Err(RecognitionError::InvalidConfig(format!(
                "no enrolled vector in {} has {} values ({} skipped)",
                self.database_dir.display(),
                self.embedding_dimension,
                skipped_records.len()
            )));
        }

        let mut video = OpenedVideo::open((self.new_reader)(), video_path)?;
        let meta = video.metadata().clone();
        let frames = self.sampler.sample(&mut video)?;
        let expected = meta.total_frames.div_ceil(frames.stride());
        self.logger.info(&format!(
            "Analyzing {} ({}x{}, {:.1}s, every {} frame(s))",
            video_path.display(),
            meta.width,
            meta.height,
            meta.duration_seconds().unwrap_or(0.0),
            frames.stride()
        ));

        let mut session = RecognitionSession::new();
        let mut sampled = 0;
        for item in frames {
            let sampled_frame = item?;
            sampled += 1;

            let started = Instant::now();
            let faces = match self.analyzer.analyze(&sampled_frame.frame) {
                Ok(faces) => faces,
                Err(e) => {
                    log::warn!(
                        "Face analysis failed at frame {}: {e}",
                        sampled_frame.frame_index
                    );
                    session.record_failed_frame();
                    Vec::new()
                }
            };
            self.logger
                .timing("analyze", started.elapsed().as_secs_f64() * 1000.0);
            self.logger.metric("faces", faces.len() as f64);

            if !faces.is_empty() {
                let snapshot = self.usable_records(self.store.get_all()?, &mut skipped_records);
                for face in faces {
                    let Some(probe) = face.embedding else {
                        log::debug!(
                            "No embedding for face at frame {}",
                            sampled_frame.frame_index
                        );
                        session.record_failed_detection();
                        continue;
                    };
                    if let Err(e) = probe.check_dimension(self.embedding_dimension) {
                        log::warn!("Skipping face at frame {}: {e}", sampled_frame.frame_index);
                        session.record_failed_detection();
                        continue;
                    }
                    let result = self.matcher.match_detection(
                        &probe,
                        &snapshot,
                        sampled_frame.frame_index,
                    )?;
                    log::debug!(
                        "Frame {}: {} ({:.3})",
                        result.frame_index,
                        result.identity,
                        result.score
                    );
                    session.record_match(&result);
                }
            }

            self.logger.progress(sampled, expected);
            if let Some(cb) = &self.on_progress {
                if !cb(sampled, expected) {
                    self.logger.info("Recognition cancelled");
                    return Err(RecognitionError::Cancelled);
                }
            }
        }

        if !skipped_records.is_empty() {
            log::warn!(
                "Ignored {} stored vector(s) with the wrong dimension",
                skipped_records.len()
            );
        }
        self.logger.summary();
        let summary = session.finish(self.naming.as_ref());
        self.logger.info(&format!(
            "Recognized {} identit{} in {} detection(s)",
            summary.recognized_count,
            if summary.recognized_count == 1 { "y" } else { "ies" },
            summary.total_detections
        ));
        Ok(summary)
    }

    /// Drops stored vectors whose length differs from the configured
    /// dimension, warning once per identity.
    fn usable_records(
        &self,
        records: Vec<IdentityRecord>,
        skipped: &mut HashSet<String>,
    ) -> Vec<IdentityRecord> {
        records
            .into_iter()
            .filter(|record| {
                let usable = record.vector.dimension() == self.embedding_dimension;
                if !usable && skipped.insert(record.identity_id.clone()) {
                    log::warn!(
                        "Ignoring {}: stored vector has {} values, expected {}",
                        record.identity_id,
                        record.vector.dimension(),
                        self.embedding_dimension
                    );
                }
                usable
            })
            .collect()
    }
}
