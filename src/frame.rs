use crate::core::SurfaceSize;
use crate::error::{BridgeError, Result};

/// Bytes per packed RGBA pixel
pub const BYTES_PER_PIXEL: usize = 4;

/// Derive the row count of a packed RGBA buffer from its length and width.
///
/// The length must be an exact multiple of `width * 4`; a remainder is
/// never dropped and a zero width is never accepted.
pub fn infer_height(len: usize, width: u32) -> Result<u32> {
    let invalid = || BridgeError::InvalidBufferShape { len, width };

    let stride = (width as usize)
        .checked_mul(BYTES_PER_PIXEL)
        .filter(|stride| *stride > 0)
        .ok_or_else(invalid)?;

    if len % stride != 0 {
        return Err(invalid());
    }

    u32::try_from(len / stride).map_err(|_| invalid())
}

/// Borrowed, shape-checked view over a caller's RGBA buffer
///
/// Lives only as long as the borrow it was built from, so a surface can
/// never hold on to the producer's memory past a single blit.
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    pixels: &'a [u8],
    width: u32,
    height: u32,
}

impl<'a> FrameView<'a> {
    /// Validate `pixels` against `width` and infer the height
    pub fn new(pixels: &'a [u8], width: u32) -> Result<Self> {
        let height = infer_height(pixels.len(), width)?;
        Ok(Self { pixels, width, height })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> SurfaceSize {
        SurfaceSize::new(self.width, self.height)
    }

    pub fn pixels(&self) -> &'a [u8] {
        self.pixels
    }

    /// Bytes per row
    pub fn stride(&self) -> usize {
        self.width as usize * BYTES_PER_PIXEL
    }

    /// One row of RGBA bytes, or `None` past the last row
    pub fn row(&self, y: u32) -> Option<&'a [u8]> {
        if y >= self.height {
            return None;
        }
        let start = y as usize * self.stride();
        Some(&self.pixels[start..start + self.stride()])
    }

    /// RGBA value at `(x, y)`
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width {
            return None;
        }
        let row = self.row(y)?;
        let idx = x as usize * BYTES_PER_PIXEL;
        Some([row[idx], row[idx + 1], row[idx + 2], row[idx + 3]])
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Owned frame - a producer's finished buffer tagged with a frame number
#[derive(Debug, Clone)]
pub struct Frame {
    pub number: u64,
    width: u32,
    pixels: Vec<u8>,
}

impl Frame {
    /// Take ownership of `pixels` after checking its shape
    pub fn new(number: u64, pixels: Vec<u8>, width: u32) -> Result<Self> {
        infer_height(pixels.len(), width)?;
        Ok(Self { number, width, pixels })
    }

    /// Copy a borrowed buffer into an owned frame
    pub fn copy_from(number: u64, pixels: &[u8], width: u32) -> Result<Self> {
        Self::new(number, pixels.to_vec(), width)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn height(&self) -> u32 {
        (self.pixels.len() / (self.width as usize * BYTES_PER_PIXEL)) as u32
    }

    pub fn view(&self) -> FrameView<'_> {
        FrameView {
            pixels: &self.pixels,
            width: self.width,
            height: self.height(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_height_exact_multiple() {
        assert_eq!(infer_height(2 * 3 * 4, 2), Ok(3));
        assert_eq!(infer_height(640 * 480 * 4, 640), Ok(480));
    }

    #[test]
    fn test_infer_height_empty_buffer_is_zero_rows() {
        assert_eq!(infer_height(0, 16), Ok(0));
    }

    #[test]
    fn test_infer_height_rejects_remainder() {
        assert_eq!(
            infer_height(17, 2),
            Err(BridgeError::InvalidBufferShape { len: 17, width: 2 })
        );
        // A whole number of pixels is not enough, rows must be complete
        assert!(infer_height(3 * 4, 2).is_err());
    }

    #[test]
    fn test_infer_height_rejects_zero_width() {
        assert_eq!(
            infer_height(16, 0),
            Err(BridgeError::InvalidBufferShape { len: 16, width: 0 })
        );
        assert!(infer_height(0, 0).is_err());
    }

    #[test]
    fn test_view_rows_and_pixels() {
        let pixels = vec![
            1, 2, 3, 4, 5, 6, 7, 8, //
            9, 10, 11, 12, 13, 14, 15, 16,
        ];
        let view = FrameView::new(&pixels, 2).unwrap();

        assert_eq!(view.size(), SurfaceSize::new(2, 2));
        assert_eq!(view.row(1), Some(&pixels[8..16]));
        assert_eq!(view.row(2), None);
        assert_eq!(view.pixel(1, 0), Some([5, 6, 7, 8]));
        assert_eq!(view.pixel(2, 0), None);
    }

    #[test]
    fn test_frame_copy_does_not_alias() {
        let mut source = vec![255u8; 8];
        let frame = Frame::copy_from(7, &source, 1).unwrap();
        source[0] = 0;

        assert_eq!(frame.number, 7);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.view().pixel(0, 0), Some([255, 255, 255, 255]));
    }

    #[test]
    fn test_frame_rejects_bad_shape() {
        assert!(Frame::new(0, vec![0; 5], 1).is_err());
    }
}
