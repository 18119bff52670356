use std::path::Path;

use crate::shared::config::DEFAULT_SAMPLE_INTERVAL_SECONDS;
use crate::shared::error::RecognitionError;
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;

/// A video reader held open for the lifetime of this guard.
///
/// Dropping the guard closes the reader, whether the frames were consumed
/// to the end or abandoned part-way.
pub struct OpenedVideo {
    reader: Box<dyn VideoReader>,
    metadata: VideoMetadata,
}

impl OpenedVideo {
    pub fn open(mut reader: Box<dyn VideoReader>, path: &Path) -> Result<Self, RecognitionError> {
        let metadata = reader
            .open(path)
            .map_err(|e| RecognitionError::unreadable(format!("{}: {e}", path.display())))?;
        Ok(Self { reader, metadata })
    }

    pub fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    /// Decodes only the first frame; used for single-image sources.
    pub fn first_frame(&mut self) -> Result<Frame, RecognitionError> {
        match self.reader.frames().next() {
            Some(frame) => frame.map_err(RecognitionError::unreadable),
            None => Err(RecognitionError::unreadable("source has no frames")),
        }
    }
}

impl Drop for OpenedVideo {
    fn drop(&mut self) {
        self.reader.close();
    }
}

/// A frame picked by the sampler, with its position in the source.
#[derive(Clone, Debug)]
pub struct SampledFrame {
    pub frame_index: usize,
    pub timestamp_seconds: f64,
    pub frame: Frame,
}

/// Picks every Nth frame, where N = round(interval × fps).
pub struct FrameSampler {
    interval_seconds: f64,
}

impl FrameSampler {
    pub fn new(interval_seconds: f64) -> Self {
        Self { interval_seconds }
    }

    /// Frames between samples. Never less than 1, so very low frame rates
    /// degrade to sampling every frame.
    pub fn stride(&self, fps: f64) -> Result<usize, RecognitionError> {
        if !fps.is_finite() || fps <= 0.0 {
            return Err(RecognitionError::UnknownFrameRate { fps });
        }
        Ok(((self.interval_seconds * fps).round() as usize).max(1))
    }

    /// Starts a single forward pass over `video`.
    ///
    /// Fails up front with `UnknownFrameRate` if the source has no usable
    /// frame rate; in that case no frame is decoded.
    pub fn sample<'a>(
        &self,
        video: &'a mut OpenedVideo,
    ) -> Result<SampledFrames<'a>, RecognitionError> {
        let fps = video.metadata.fps;
        let stride = self.stride(fps)?;
        log::debug!(
            "Sampling every {stride} frame(s) ({:.2}s at {fps:.2} fps)",
            self.interval_seconds
        );
        Ok(SampledFrames {
            frames: video.reader.frames(),
            stride,
            fps,
            done: false,
        })
    }
}

impl Default for FrameSampler {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_INTERVAL_SECONDS)
    }
}

/// Lazy iterator over the sampled frames of one pass.
///
/// Off-stride frames are decoded and dropped immediately. A decode error is
/// yielded once as `SourceUnreadable` and ends the sequence.
pub struct SampledFrames<'a> {
    frames: Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + 'a>,
    stride: usize,
    fps: f64,
    done: bool,
}

impl SampledFrames<'_> {
    pub fn stride(&self) -> usize {
        self.stride
    }
}

impl Iterator for SampledFrames<'_> {
    type Item = Result<SampledFrame, RecognitionError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            match self.frames.next() {
                None => {
                    self.done = true;
                    return None;
                }
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(RecognitionError::unreadable(e)));
                }
                Some(Ok(frame)) if frame.index() % self.stride == 0 => {
                    return Some(Ok(SampledFrame {
                        frame_index: frame.index(),
                        timestamp_seconds: frame.index() as f64 / self.fps,
                        frame,
                    }));
                }
                Some(Ok(_)) => continue,
            }
        }
    }
}
