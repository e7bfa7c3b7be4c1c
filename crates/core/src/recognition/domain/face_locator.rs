use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// Domain interface for finding faces in a frame.
pub trait FaceLocator: Send {
    fn locate_faces(&mut self, frame: &Frame) -> Result<Vec<Region>, Box<dyn std::error::Error>>;
}
