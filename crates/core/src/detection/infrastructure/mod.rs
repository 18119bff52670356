pub mod arcface_embedder;
mod execution_provider;
pub mod onnx_face_analyzer;
pub mod onnx_yolo_detector;
