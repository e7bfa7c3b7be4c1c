use std::path::Path;

use crate::shared::frame::Frame;
use crate::video::domain::image_writer::ImageWriter;

/// Writes frames to disk using the `image` crate (JPEG for `.jpg`).
pub struct ImageFileWriter;

impl ImageFileWriter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageFileWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageWriter for ImageFileWriter {
    fn write(&self, path: &Path, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        if frame.channels() != 3 {
            return Err(format!("expected RGB frame, got {} channels", frame.channels()).into());
        }
        let img = image::RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
            .ok_or("Failed to create image from frame data")?;
        img.save(path)?;
        Ok(())
    }

    fn remove(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        std::fs::remove_file(path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_frame(width: u32, height: u32, r: u8, g: u8, b: u8) -> Frame {
        let mut data = Vec::with_capacity((width * height * 3) as usize);
        for _ in 0..(width * height) {
            data.extend_from_slice(&[r, g, b]);
        }
        Frame::new(data, width, height, 3, 0)
    }

    #[test]
    fn test_write_jpeg_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dog_20240601_120000.jpg");
        let frame = make_frame(64, 48, 50, 100, 200);
        ImageFileWriter::new().write(&path, &frame).unwrap();
        assert!(path.exists());

        let img = image::open(&path).unwrap();
        assert_eq!(img.width(), 64);
        assert_eq!(img.height(), 48);
    }

    #[test]
    fn test_png_roundtrip_preserves_pixels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        let frame = make_frame(20, 20, 50, 100, 200);
        ImageFileWriter::new().write(&path, &frame).unwrap();

        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!(img.get_pixel(0, 0).0, [50, 100, 200]);
    }

    #[test]
    fn test_write_rejects_non_rgb_frame() {
        let dir = tempfile::tempdir().unwrap();
        let frame = Frame::new(vec![0u8; 16], 4, 4, 1, 0);
        assert!(ImageFileWriter::new()
            .write(&dir.path().join("gray.jpg"), &frame)
            .is_err());
    }

    #[test]
    fn test_remove_deletes_written_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alice.jpg");
        let writer = ImageFileWriter::new();
        writer.write(&path, &make_frame(8, 8, 0, 0, 0)).unwrap();

        writer.remove(&path).unwrap();
        assert!(!path.exists());
        assert!(writer.remove(&path).is_err());
    }

    #[test]
    fn test_write_invalid_path_returns_error() {
        let frame = make_frame(10, 10, 0, 0, 0);
        assert!(ImageFileWriter::new()
            .write(Path::new("/nonexistent/dir/out.jpg"), &frame)
            .is_err());
    }
}
