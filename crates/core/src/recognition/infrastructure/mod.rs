pub mod json_gallery_store;
pub mod onnx_arcface_encoder;
pub mod onnx_yolo_face_locator;
