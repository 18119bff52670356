pub mod enroll_identity_use_case;
pub mod pipeline_logger;
pub mod recognize_video_use_case;
