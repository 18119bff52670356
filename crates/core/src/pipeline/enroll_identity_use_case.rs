use std::path::{Path, PathBuf};

use crate::detection::domain::face_analyzer::FaceAnalyzer;
use crate::enrollment::domain::enrollment_aggregator::EnrollmentAggregator;
use crate::enrollment::domain::identity_store::validate_identity_id;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::pipeline::recognize_video_use_case::ReaderFactory;
use crate::sampling::frame_sampler::OpenedVideo;
use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::shared::embedding::Embedding;
use crate::shared::error::RecognitionError;
use crate::shared::frame::Frame;

/// Outcome of enrolling one identity from a set of photos.
#[derive(Clone, Debug, PartialEq)]
pub struct EnrollmentReport {
    pub identity_id: String,
    pub images_seen: usize,
    pub images_used: usize,
    pub images_skipped: usize,
    pub reference: Embedding,
}

/// Outcome of enrolling every person in a directory tree.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchEnrollmentReport {
    pub enrolled: Vec<EnrollmentReport>,
    pub skipped: Vec<SkippedIdentity>,
}

/// A person directory that produced no enrollment.
#[derive(Clone, Debug, PartialEq)]
pub struct SkippedIdentity {
    pub identity_id: String,
    pub reason: String,
}

/// Enrolls an identity from photos: one face per photo, averaged.
///
/// Photos that cannot be read, or in which no face yields an embedding, are
/// logged and skipped. The run fails only if no photo contributes a sample.
pub struct EnrollIdentityUseCase {
    aggregator: EnrollmentAggregator,
    analyzer: Box<dyn FaceAnalyzer>,
    new_reader: ReaderFactory,
    logger: Box<dyn PipelineLogger>,
}

impl EnrollIdentityUseCase {
    pub fn new(
        aggregator: EnrollmentAggregator,
        analyzer: Box<dyn FaceAnalyzer>,
        new_reader: ReaderFactory,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        Self {
            aggregator,
            analyzer,
            new_reader,
            logger,
        }
    }

    pub fn execute(
        &mut self,
        identity_id: &str,
        photos: &[PathBuf],
    ) -> Result<EnrollmentReport, RecognitionError> {
        validate_identity_id(identity_id)?;
        self.logger.info(&format!(
            "Enrolling {identity_id} from {} photo(s)",
            photos.len()
        ));

        let mut samples = Vec::new();
        for (i, photo) in photos.iter().enumerate() {
            match self.sample_from(photo) {
                Ok(Some(embedding)) => samples.push(embedding),
                Ok(None) => log::warn!("No usable face in {}", photo.display()),
                Err(e) => log::warn!("Skipping {}: {e}", photo.display()),
            }
            self.logger.progress(i + 1, photos.len());
        }

        let reference = self.aggregator.enroll(identity_id, &samples)?;
        Ok(EnrollmentReport {
            identity_id: identity_id.to_string(),
            images_seen: photos.len(),
            images_used: samples.len(),
            images_skipped: photos.len() - samples.len(),
            reference,
        })
    }

    /// Enrolls one identity per subdirectory of `root`, named after the
    /// subdirectory and built from the photos directly inside it.
    ///
    /// People without a usable photo, or whose directory name is not a
    /// valid id, are skipped and reported. Storage failures abort the batch.
    pub fn execute_directory_tree(
        &mut self,
        root: &Path,
    ) -> Result<BatchEnrollmentReport, RecognitionError> {
        let entries = std::fs::read_dir(root).map_err(|source| RecognitionError::Storage {
            path: root.to_path_buf(),
            source,
        })?;
        let mut people: Vec<PathBuf> = entries
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.is_dir())
            .collect();
        people.sort();

        let mut report = BatchEnrollmentReport::default();
        for person_dir in people {
            let identity_id = person_dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let photos = collect_photos(std::slice::from_ref(&person_dir))?;
            match self.execute(&identity_id, &photos) {
                Ok(enrolled) => report.enrolled.push(enrolled),
                Err(
                    e @ (RecognitionError::NoValidSamples { .. }
                    | RecognitionError::InvalidIdentity { .. }),
                ) => {
                    log::warn!("Skipped {identity_id}: {e}");
                    report.skipped.push(SkippedIdentity {
                        identity_id,
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        self.logger.info(&format!(
            "Enrolled {} of {} people from {}",
            report.enrolled.len(),
            report.enrolled.len() + report.skipped.len(),
            root.display()
        ));
        Ok(report)
    }

    /// First face in the photo that produced an embedding.
    fn sample_from(
        &mut self,
        photo: &Path,
    ) -> Result<Option<Embedding>, Box<dyn std::error::Error>> {
        let frame = self.load(photo)?;
        let faces = self.analyzer.analyze(&frame)?;
        if faces.len() > 1 {
            log::debug!(
                "{} faces in {}, using the first",
                faces.len(),
                photo.display()
            );
        }
        Ok(faces.into_iter().find_map(|f| f.embedding))
    }

    fn load(&self, photo: &Path) -> Result<Frame, RecognitionError> {
        OpenedVideo::open((self.new_reader)(), photo)?.first_frame()
    }
}

/// Expands directories into the image files they directly contain.
///
/// Files given explicitly are kept as-is regardless of extension; directory
/// entries are filtered by extension and sorted for stable enrollment order.
pub fn collect_photos(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, RecognitionError> {
    let mut photos = Vec::new();
    for input in inputs {
        if !input.is_dir() {
            photos.push(input.clone());
            continue;
        }
        let entries = std::fs::read_dir(input).map_err(|source| RecognitionError::Storage {
            path: input.clone(),
            source,
        })?;
        let mut found: Vec<PathBuf> = entries
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && has_image_extension(p))
            .collect();
        found.sort();
        photos.extend(found);
    }
    Ok(photos)
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}
