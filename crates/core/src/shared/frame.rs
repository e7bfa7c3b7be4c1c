use ndarray::ArrayView3;

use crate::shared::region::Region;

/// A single camera frame: contiguous RGB bytes in row-major order.
///
/// Pixel format conversion happens in the frame source; everything
/// downstream treats the data as packed `channels`-byte pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Sequence number assigned by the frame source.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Returns a horizontally flipped copy (selfie view).
    pub fn mirrored(&self) -> Frame {
        let row_len = self.width as usize * self.channels as usize;
        let px = self.channels as usize;
        let mut data = Vec::with_capacity(self.data.len());
        for row in self.data.chunks_exact(row_len.max(1)) {
            for pixel in row.chunks_exact(px.max(1)).rev() {
                data.extend_from_slice(pixel);
            }
        }
        Frame::new(data, self.width, self.height, self.channels, self.index)
    }

    /// Copies out the pixels covered by `region`, clamped to the frame.
    ///
    /// Returns `None` when the clamped region is empty.
    pub fn crop(&self, region: &Region) -> Option<Frame> {
        let clamped = region.clamped(self.width, self.height)?;
        let x1 = clamped.x as usize;
        let y1 = clamped.y as usize;
        let x2 = x1 + clamped.width as usize;
        let y2 = y1 + clamped.height as usize;
        let channels = self.channels as usize;

        let src = self.as_ndarray();
        let mut data = Vec::with_capacity((x2 - x1) * (y2 - y1) * channels);
        for row in y1..y2 {
            for col in x1..x2 {
                for c in 0..channels {
                    data.push(src[[row, col, c]]);
                }
            }
        }

        Some(Frame::new(
            data,
            clamped.width as u32,
            clamped.height as u32,
            self.channels,
            self.index,
        ))
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_and_accessors() {
        let data = vec![0u8; 12]; // 2x2x3
        let frame = Frame::new(data.clone(), 2, 2, 3, 5);
        assert_eq!(frame.width(), 2);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.channels(), 3);
        assert_eq!(frame.index(), 5);
        assert_eq!(frame.data(), &data[..]);
    }

    #[test]
    #[should_panic(expected = "data length must equal width * height * channels")]
    fn test_mismatched_data_length_panics_in_debug() {
        let data = vec![0u8; 10]; // wrong size for 2x2x3
        Frame::new(data, 2, 2, 3, 0);
    }

    #[test]
    fn test_as_ndarray_shape() {
        let frame = Frame::new(vec![0u8; 24], 4, 2, 3, 0);
        assert_eq!(frame.as_ndarray().shape(), &[2, 4, 3]); // (height, width, channels)
    }

    #[test]
    fn test_mirrored_reverses_each_row() {
        // 3x1 RGB: red, green, blue
        let data = vec![255, 0, 0, 0, 255, 0, 0, 0, 255];
        let frame = Frame::new(data, 3, 1, 3, 7);
        let flipped = frame.mirrored();
        assert_eq!(flipped.data(), &[0, 0, 255, 0, 255, 0, 255, 0, 0]);
        assert_eq!(flipped.index(), 7);
    }

    #[test]
    fn test_mirrored_twice_is_identity() {
        let data: Vec<u8> = (0..48).collect(); // 4x4x3
        let frame = Frame::new(data.clone(), 4, 4, 3, 0);
        assert_eq!(frame.mirrored().mirrored().data(), &data[..]);
    }

    #[test]
    fn test_crop_copies_region_pixels() {
        // 3x2 RGB, pixel value encodes (row, col)
        let mut data = Vec::new();
        for row in 0..2u8 {
            for col in 0..3u8 {
                data.extend_from_slice(&[row * 10 + col, 0, 0]);
            }
        }
        let frame = Frame::new(data, 3, 2, 3, 0);
        let crop = frame.crop(&Region::new(1, 0, 2, 2)).unwrap();
        assert_eq!(crop.width(), 2);
        assert_eq!(crop.height(), 2);
        let arr = crop.as_ndarray();
        assert_eq!(arr[[0, 0, 0]], 1);
        assert_eq!(arr[[1, 1, 0]], 12);
    }

    #[test]
    fn test_crop_clamps_to_frame() {
        let frame = Frame::new(vec![0u8; 10 * 10 * 3], 10, 10, 3, 0);
        let crop = frame.crop(&Region::new(-5, 5, 10, 10)).unwrap();
        assert_eq!(crop.width(), 5);
        assert_eq!(crop.height(), 5);
    }

    #[test]
    fn test_crop_outside_frame_is_none() {
        let frame = Frame::new(vec![0u8; 10 * 10 * 3], 10, 10, 3, 0);
        assert!(frame.crop(&Region::new(20, 20, 5, 5)).is_none());
    }
}
