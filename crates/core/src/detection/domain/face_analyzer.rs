use crate::shared::embedding::Embedding;
use crate::shared::frame::Frame;

/// Axis-aligned face bounding box in frame pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub confidence: f64,
}

impl FaceBox {
    pub fn area(&self) -> f64 {
        (self.x2 - self.x1).max(0.0) * (self.y2 - self.y1).max(0.0)
    }

    pub fn iou(&self, other: &FaceBox) -> f64 {
        let x1 = self.x1.max(other.x1);
        let y1 = self.y1.max(other.y1);
        let x2 = self.x2.min(other.x2);
        let y2 = self.y2.min(other.y2);

        let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
        if inter == 0.0 {
            return 0.0;
        }
        inter / (self.area() + other.area() - inter)
    }
}

/// One face found in a frame.
///
/// `embedding` is `None` when the face was located but its feature vector
/// could not be extracted.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectedFace {
    pub bbox: FaceBox,
    pub embedding: Option<Embedding>,
}

/// Domain interface for locating faces and extracting their embeddings.
///
/// Each call is independent; no identity is carried between frames.
pub trait FaceAnalyzer: Send {
    fn analyze(&mut self, frame: &Frame) -> Result<Vec<DetectedFace>, Box<dyn std::error::Error>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn bbox(x1: f64, y1: f64, x2: f64, y2: f64) -> FaceBox {
        FaceBox {
            x1,
            y1,
            x2,
            y2,
            confidence: 0.9,
        }
    }

    #[test]
    fn test_iou_no_overlap() {
        assert_eq!(bbox(0.0, 0.0, 10.0, 10.0).iou(&bbox(20.0, 20.0, 30.0, 30.0)), 0.0);
    }

    #[test]
    fn test_iou_identical() {
        let a = bbox(0.0, 0.0, 10.0, 10.0);
        assert_relative_eq!(a.iou(&a), 1.0);
    }

    #[test]
    fn test_iou_partial_overlap() {
        let a = bbox(0.0, 0.0, 10.0, 10.0);
        let b = bbox(5.0, 5.0, 15.0, 15.0);
        assert_relative_eq!(a.iou(&b), 25.0 / 175.0, epsilon = 1e-9);
    }

    #[test]
    fn test_area_of_inverted_box_is_zero() {
        assert_eq!(bbox(10.0, 10.0, 0.0, 0.0).area(), 0.0);
    }
}
