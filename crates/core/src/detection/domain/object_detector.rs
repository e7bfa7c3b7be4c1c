use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// One raw box from the detector, before class filtering.
#[derive(Clone, Debug, PartialEq)]
pub struct RawDetection {
    pub class_id: u32,
    pub confidence: f64,
    pub region: Region,
}

/// Domain interface for the pretrained object detector.
///
/// Implementations may hold inference sessions, hence `&mut self`.
pub trait ObjectDetector: Send {
    fn infer(&mut self, frame: &Frame) -> Result<Vec<RawDetection>, Box<dyn std::error::Error>>;
}
