//! Face recognition over video: enroll identities from photos, then report
//! which of them appear in a recording.
//!
//! Bounded contexts each split into `domain` (types and traits) and
//! `infrastructure` (ONNX, ffmpeg and filesystem adapters).

pub mod detection;
pub mod enrollment;
pub mod matching;
pub mod pipeline;
pub mod recognition;
pub mod sampling;
pub mod shared;
pub mod video;
