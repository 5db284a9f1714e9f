pub mod execution_provider;
pub mod onnx_segmenter;
pub mod skip_frame_segmenter;
