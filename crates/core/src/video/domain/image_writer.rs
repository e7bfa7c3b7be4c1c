use std::path::Path;

use crate::shared::frame::Frame;

/// Writes a single frame to an image file; the format follows the extension.
pub trait ImageWriter: Send {
    fn write(&self, path: &Path, frame: &Frame) -> Result<(), Box<dyn std::error::Error>>;

    /// Deletes an image previously written to `path`.
    fn remove(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>>;
}
