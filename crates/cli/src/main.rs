use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};

use facecheck_core::detection::domain::face_analyzer::FaceAnalyzer;
use facecheck_core::detection::infrastructure::onnx_face_analyzer::OnnxFaceAnalyzer;
use facecheck_core::enrollment::domain::enrollment_aggregator::EnrollmentAggregator;
use facecheck_core::enrollment::domain::identity_store::IdentityStore;
use facecheck_core::enrollment::infrastructure::file_identity_store::FileIdentityStore;
use facecheck_core::pipeline::enroll_identity_use_case::{
    collect_photos, BatchEnrollmentReport, EnrollIdentityUseCase,
};
use facecheck_core::pipeline::pipeline_logger::LogPipelineLogger;
use facecheck_core::pipeline::recognize_video_use_case::RecognizeVideoUseCase;
use facecheck_core::recognition::display_name::{DisplayNameStrategy, RolePrefixNaming};
use facecheck_core::recognition::session_aggregator::RecognitionSummary;
use facecheck_core::shared::config::{
    default_database_dir, RecognitionConfig, DEFAULT_DETECTOR_CONFIDENCE,
    DEFAULT_SAMPLE_INTERVAL_SECONDS, DEFAULT_SIMILARITY_THRESHOLD,
};
use facecheck_core::shared::embedding::DEFAULT_EMBEDDING_DIMENSION;
use facecheck_core::shared::error::RecognitionError;
use facecheck_core::shared::model_resolver::{
    self, ModelSpec, FACE_DETECTION_MODEL, FACE_EMBEDDING_MODEL,
};
use facecheck_core::video::domain::video_reader::VideoReader;
use facecheck_core::video::infrastructure::ffmpeg_reader::FfmpegReader;
use facecheck_core::video::infrastructure::image_file_reader::ImageFileReader;

/// Enroll people from photos and find them in videos.
#[derive(Parser)]
#[command(name = "facecheck", version)]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct Settings {
    /// Identity database directory (defaults to the platform data dir).
    #[arg(long, global = true)]
    db_dir: Option<PathBuf>,

    /// Minimum cosine similarity for a match (-1.0 to 1.0).
    #[arg(long, global = true, default_value_t = DEFAULT_SIMILARITY_THRESHOLD)]
    threshold: f64,

    /// Seconds between analyzed video frames.
    #[arg(long, global = true, default_value_t = DEFAULT_SAMPLE_INTERVAL_SECONDS)]
    interval: f64,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long, global = true, default_value_t = DEFAULT_DETECTOR_CONFIDENCE)]
    confidence: f64,

    /// Embedding length produced by the face model.
    #[arg(long, global = true, default_value_t = DEFAULT_EMBEDDING_DIMENSION)]
    dimension: usize,
}

#[derive(Subcommand)]
enum Command {
    /// Enroll one person from photos (files or directories).
    Enroll {
        /// Person's name, used to build the identity id.
        #[arg(long, required_unless_present = "id")]
        name: Option<String>,

        /// Distinguishing suffix, e.g. a student number or subject.
        #[arg(long)]
        qualifier: Option<String>,

        /// Mark the identity as a professor.
        #[arg(long)]
        professor: bool,

        /// Use this identity id verbatim instead of composing one.
        #[arg(long, conflicts_with_all = ["name", "qualifier", "professor"])]
        id: Option<String>,

        #[arg(required = true)]
        photos: Vec<PathBuf>,
    },
    /// Enroll everyone in DIR: one identity per subdirectory of photos.
    EnrollAll { dir: PathBuf },
    /// Report which enrolled people appear in a video.
    Recognize {
        video: PathBuf,

        /// Print the summary as JSON on stdout.
        #[arg(long)]
        json: bool,
    },
    /// Remove an enrolled identity.
    Delete { id: String },
    /// List enrolled identities.
    List,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = build_config(&cli.settings)?;
    let naming = RolePrefixNaming::default();
    let store: Arc<dyn IdentityStore> = Arc::new(FileIdentityStore::new(&config.database_dir));

    match cli.command {
        Command::Enroll {
            name,
            qualifier,
            professor,
            id,
            photos,
        } => {
            let identity_id = match id {
                Some(id) => id,
                None => naming.compose(
                    name.as_deref().unwrap_or_default(),
                    qualifier.as_deref(),
                    professor,
                ),
            };
            run_enroll(&config, store, &identity_id, &photos)
        }
        Command::EnrollAll { dir } => run_enroll_all(&config, store, &dir),
        Command::Recognize { video, json } => run_recognize(&config, store, &video, json),
        Command::Delete { id } => run_delete(&config, store, &id),
        Command::List => run_list(store.as_ref(), &naming),
    }
}

fn run_enroll(
    config: &RecognitionConfig,
    store: Arc<dyn IdentityStore>,
    identity_id: &str,
    inputs: &[PathBuf],
) -> Result<(), Box<dyn std::error::Error>> {
    for input in inputs {
        if !input.exists() {
            return Err(format!("Photo not found: {}", input.display()).into());
        }
    }
    let photos = collect_photos(inputs)?;
    if store.contains(identity_id)? {
        log::warn!("{identity_id} is already enrolled; its reference vector will be replaced");
    }
    if photos.is_empty() {
        return Err("No photos found in the given paths".into());
    }

    let analyzer = build_analyzer(config)?;
    let mut use_case = EnrollIdentityUseCase::new(
        EnrollmentAggregator::new(store, config.embedding_dimension),
        analyzer,
        Box::new(|| Box::new(ImageFileReader::new()) as Box<dyn VideoReader>),
        Box::new(LogPipelineLogger::default()),
    );
    let report = use_case.execute(identity_id, &photos)?;
    println!(
        "Enrolled {} from {}/{} photo(s)",
        report.identity_id, report.images_used, report.images_seen
    );
    Ok(())
}

fn run_enroll_all(
    config: &RecognitionConfig,
    store: Arc<dyn IdentityStore>,
    dir: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    if !dir.is_dir() {
        return Err(format!("Not a directory: {}", dir.display()).into());
    }

    let analyzer = build_analyzer(config)?;
    let mut use_case = EnrollIdentityUseCase::new(
        EnrollmentAggregator::new(store, config.embedding_dimension),
        analyzer,
        Box::new(|| Box::new(ImageFileReader::new()) as Box<dyn VideoReader>),
        Box::new(LogPipelineLogger::default()),
    );
    let report = use_case.execute_directory_tree(dir)?;
    print!("{}", format_batch_report(&report));
    if report.enrolled.is_empty() {
        return Err("No identities enrolled".into());
    }
    Ok(())
}

fn format_batch_report(report: &BatchEnrollmentReport) -> String {
    let mut out = String::new();
    for r in &report.enrolled {
        out.push_str(&format!(
            "Enrolled {} from {}/{} photo(s)\n",
            r.identity_id, r.images_used, r.images_seen
        ));
    }
    for s in &report.skipped {
        out.push_str(&format!("Skipped {}: {}\n", s.identity_id, s.reason));
    }
    out
}

fn run_recognize(
    config: &RecognitionConfig,
    store: Arc<dyn IdentityStore>,
    video: &Path,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !video.exists() {
        return Err(format!("Video not found: {}", video.display()).into());
    }

    let analyzer = build_analyzer(config)?;
    let progress: Box<dyn Fn(usize, usize) -> bool + Send> = Box::new(|current, total| {
        eprint!("\rAnalyzing sample {current}/{total}");
        true
    });
    let mut use_case = RecognizeVideoUseCase::new(
        config,
        store,
        analyzer,
        Box::new(|| Box::new(FfmpegReader::new()) as Box<dyn VideoReader>),
        Box::new(RolePrefixNaming::default()),
        Box::new(LogPipelineLogger::default()),
    )
    .with_progress(progress);

    let summary = use_case.execute(video)?;
    eprintln!();
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", format_summary(&summary));
    }
    Ok(())
}

fn run_delete(
    config: &RecognitionConfig,
    store: Arc<dyn IdentityStore>,
    identity_id: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let aggregator = EnrollmentAggregator::new(store, config.embedding_dimension);
    match aggregator.remove(identity_id) {
        Ok(()) => println!("Deleted {identity_id}"),
        Err(RecognitionError::NotFound { .. }) => println!("{identity_id} is not enrolled"),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

fn run_list(
    store: &dyn IdentityStore,
    naming: &dyn DisplayNameStrategy,
) -> Result<(), Box<dyn std::error::Error>> {
    print!("{}", format_listing(store, naming)?);
    Ok(())
}

fn format_listing(
    store: &dyn IdentityStore,
    naming: &dyn DisplayNameStrategy,
) -> Result<String, RecognitionError> {
    let mut records = store.get_all()?;
    if records.is_empty() {
        return Ok("No identities enrolled\n".to_string());
    }
    records.sort_by(|a, b| a.identity_id.cmp(&b.identity_id));
    let mut out = String::new();
    for record in records {
        out.push_str(&format!(
            "{:24} {:16} ({} values)\n",
            record.identity_id,
            naming.display_name(&record.identity_id),
            record.vector.dimension()
        ));
    }
    Ok(out)
}

fn format_summary(summary: &RecognitionSummary) -> String {
    let mut out = format!(
        "Faces detected: {} ({} processed)\nIdentities recognized: {}\n",
        summary.total_detections, summary.processed_detections, summary.recognized_count
    );
    if summary.failed_frames > 0 {
        out.push_str(&format!(
            "Frames skipped after analysis errors: {}\n",
            summary.failed_frames
        ));
    }
    for r in &summary.recognized {
        out.push_str(&format!(
            "  {:16} {:24} similarity {:.2}  first seen at frame {}\n",
            r.display_name, r.identity_id, r.confidence, r.first_detection_frame
        ));
    }
    out
}

fn build_config(settings: &Settings) -> Result<RecognitionConfig, Box<dyn std::error::Error>> {
    let database_dir = match &settings.db_dir {
        Some(dir) => dir.clone(),
        None => default_database_dir().ok_or("Cannot determine a data directory; pass --db-dir")?,
    };
    let config = RecognitionConfig {
        database_dir,
        similarity_threshold: settings.threshold,
        sample_interval_seconds: settings.interval,
        embedding_dimension: settings.dimension,
        detector_confidence: settings.confidence,
    };
    config.validate()?;
    Ok(config)
}

fn build_analyzer(
    config: &RecognitionConfig,
) -> Result<Box<dyn FaceAnalyzer>, Box<dyn std::error::Error>> {
    let detection_model = resolve_model(FACE_DETECTION_MODEL)?;
    let embedding_model = resolve_model(FACE_EMBEDDING_MODEL)?;
    Ok(Box::new(OnnxFaceAnalyzer::from_models(
        &detection_model,
        &embedding_model,
        config.detector_confidence,
    )?))
}

fn resolve_model(model: ModelSpec) -> Result<PathBuf, Box<dyn std::error::Error>> {
    log::info!("Resolving model: {}", model.name);
    let name = model.name;
    let path = model_resolver::resolve(
        model,
        None,
        Some(Box::new(move |downloaded, total| {
            download_progress(name, downloaded, total)
        })),
    )?;
    Ok(path)
}

fn download_progress(name: &str, downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading {name}... {pct}%");
        if downloaded >= total {
            eprintln!();
        }
    } else {
        eprint!("\rDownloading {name}... {downloaded} bytes");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facecheck_core::pipeline::enroll_identity_use_case::SkippedIdentity;
    use facecheck_core::recognition::session_aggregator::RecognizedIdentity;
    use facecheck_core::shared::embedding::Embedding;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("facecheck").chain(args.iter().copied()))
    }

    #[test]
    fn test_global_flags_map_onto_config() {
        let cli = parse(&[
            "recognize",
            "lecture.mp4",
            "--db-dir",
            "/tmp/db",
            "--threshold",
            "0.7",
            "--interval",
            "1.5",
        ])
        .unwrap();
        let config = build_config(&cli.settings).unwrap();
        assert_eq!(config.database_dir, PathBuf::from("/tmp/db"));
        assert_eq!(config.similarity_threshold, 0.7);
        assert_eq!(config.sample_interval_seconds, 1.5);
        assert_eq!(config.embedding_dimension, DEFAULT_EMBEDDING_DIMENSION);
    }

    #[test]
    fn test_out_of_range_threshold_is_rejected() {
        let cli = parse(&["--db-dir", "/tmp/db", "--threshold", "1.5", "list"]).unwrap();
        assert!(build_config(&cli.settings).is_err());
    }

    #[test]
    fn test_enroll_requires_name_or_id() {
        assert!(parse(&["enroll", "a.jpg"]).is_err());
        assert!(parse(&["enroll", "--id", "x", "a.jpg"]).is_ok());
        assert!(parse(&["enroll", "--id", "x", "--name", "y", "a.jpg"]).is_err());
    }

    #[test]
    fn test_enroll_requires_photos() {
        assert!(parse(&["enroll", "--name", "grace"]).is_err());
    }

    #[test]
    fn test_enroll_all_takes_a_directory() {
        let cli = parse(&["enroll-all", "known_faces"]).unwrap();
        match cli.command {
            Command::EnrollAll { dir } => assert_eq!(dir, PathBuf::from("known_faces")),
            _ => panic!("expected enroll-all"),
        }
        assert!(parse(&["enroll-all"]).is_err());
    }

    #[test]
    fn test_batch_report_lists_enrolled_and_skipped() {
        let report = BatchEnrollmentReport {
            enrolled: vec![],
            skipped: vec![SkippedIdentity {
                identity_id: "ghost".to_string(),
                reason: "no valid face samples for identity 'ghost'".to_string(),
            }],
        };
        assert_eq!(
            format_batch_report(&report),
            "Skipped ghost: no valid face samples for identity 'ghost'\n"
        );
    }

    #[test]
    fn test_listing_shows_ids_and_display_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileIdentityStore::new(dir.path());
        store
            .put("prof_ada_math", &Embedding::new(vec![1.0, 0.0]))
            .unwrap();
        store.put("grace_1042", &Embedding::new(vec![0.0, 1.0])).unwrap();

        let listing = format_listing(&store, &RolePrefixNaming::default()).unwrap();
        let lines: Vec<&str> = listing.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("grace_1042"));
        assert!(lines[0].contains("grace "));
        assert!(lines[1].contains("ada_math"));
    }

    #[test]
    fn test_listing_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileIdentityStore::new(dir.path().join("missing"));
        let listing = format_listing(&store, &RolePrefixNaming::default()).unwrap();
        assert_eq!(listing, "No identities enrolled\n");
    }

    #[test]
    fn test_delete_missing_identity_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = RecognitionConfig::new(dir.path());
        let store: Arc<dyn IdentityStore> = Arc::new(FileIdentityStore::new(dir.path()));
        assert!(run_delete(&config, store, "nobody").is_ok());
    }

    #[test]
    fn test_summary_format_lists_each_identity() {
        let summary = RecognitionSummary {
            total_detections: 3,
            processed_detections: 2,
            failed_frames: 0,
            recognized_count: 1,
            recognized: vec![RecognizedIdentity {
                display_name: "grace".to_string(),
                identity_id: "grace_1042".to_string(),
                confidence: 0.8123,
                first_detection_frame: 40,
            }],
        };
        let text = format_summary(&summary);
        assert!(text.contains("Faces detected: 3 (2 processed)"));
        assert!(text.contains("similarity 0.81"));
        assert!(text.contains("frame 40"));
    }
}
