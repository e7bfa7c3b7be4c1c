pub mod execution_provider;
pub mod onnx_yolo_detector;
pub(crate) mod yolo_tensor;
