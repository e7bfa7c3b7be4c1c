use thiserror::Error;

use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum FrameSourceError {
    #[error("capture device {device} unavailable: {reason}")]
    DeviceUnavailable { device: String, reason: String },
    #[error("failed to grab frame: {0}")]
    Capture(String),
    #[error("frame source not opened")]
    NotOpened,
}

/// Supplies successive frames from a camera or stream.
///
/// `read` blocks until the next frame is available. Once `read` fails the
/// source is considered exhausted; callers stop and `release`.
pub trait FrameSource: Send {
    fn open(&mut self) -> Result<(), FrameSourceError>;

    fn read(&mut self) -> Result<Frame, FrameSourceError>;

    /// Releases the device. Safe to call more than once.
    fn release(&mut self);
}
