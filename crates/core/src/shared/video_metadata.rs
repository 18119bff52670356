use std::path::PathBuf;

#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    /// Frames per second; 0.0 when the container does not report a rate.
    pub fps: f64,
    pub total_frames: usize,
    pub source_path: Option<PathBuf>,
}

impl VideoMetadata {
    /// Seconds covered by `total_frames`, if the frame rate is known.
    pub fn duration_seconds(&self) -> Option<f64> {
        if self.fps.is_finite() && self.fps > 0.0 {
            Some(self.total_frames as f64 / self.fps)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(fps: f64, total_frames: usize) -> VideoMetadata {
        VideoMetadata {
            width: 640,
            height: 480,
            fps,
            total_frames,
            source_path: None,
        }
    }

    #[test]
    fn test_duration_from_fps() {
        assert_eq!(meta(30.0, 900).duration_seconds(), Some(30.0));
    }

    #[test]
    fn test_duration_unknown_without_fps() {
        // Still images are represented as single-frame sources with fps=0
        assert_eq!(meta(0.0, 1).duration_seconds(), None);
        assert_eq!(meta(f64::NAN, 10).duration_seconds(), None);
    }
}
