use std::path::Path;

use crate::detection::domain::face_analyzer::{DetectedFace, FaceAnalyzer};
use crate::detection::infrastructure::arcface_embedder::ArcFaceEmbedder;
use crate::detection::infrastructure::onnx_yolo_detector::OnnxYoloDetector;
use crate::shared::frame::Frame;

/// Detect-then-embed analyzer: YOLO boxes, square crops, ArcFace vectors.
///
/// A face whose crop is empty or whose embedding fails is still reported,
/// with `embedding: None`, so callers can count it.
pub struct OnnxFaceAnalyzer {
    detector: OnnxYoloDetector,
    embedder: ArcFaceEmbedder,
}

impl OnnxFaceAnalyzer {
    pub fn new(detector: OnnxYoloDetector, embedder: ArcFaceEmbedder) -> Self {
        Self { detector, embedder }
    }

    pub fn from_models(
        detection_model: &Path,
        embedding_model: &Path,
        confidence: f64,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self::new(
            OnnxYoloDetector::new(detection_model, confidence)?,
            ArcFaceEmbedder::new(embedding_model)?,
        ))
    }
}

impl FaceAnalyzer for OnnxFaceAnalyzer {
    fn analyze(&mut self, frame: &Frame) -> Result<Vec<DetectedFace>, Box<dyn std::error::Error>> {
        let boxes = self.detector.detect(frame)?;

        let mut faces = Vec::with_capacity(boxes.len());
        for bbox in boxes {
            let embedding = match frame.square_crop(bbox.x1, bbox.y1, bbox.x2, bbox.y2) {
                Some(crop) => match self.embedder.embed(&crop) {
                    Ok(embedding) => Some(embedding),
                    Err(e) => {
                        log::warn!("Frame {}: embedding failed: {e}", frame.index());
                        None
                    }
                },
                None => None,
            };
            faces.push(DetectedFace { bbox, embedding });
        }
        Ok(faces)
    }
}
