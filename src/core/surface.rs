use crate::error::Result;
use crate::frame::{FrameView, BYTES_PER_PIXEL};

/// Physical surface dimensions in device pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub const ZERO: Self = Self { width: 0, height: 0 };

    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Physical size for a logical drawing area at the given device pixel ratio.
    ///
    /// Each axis is rounded to the nearest pixel. Ratios that are not finite
    /// and positive fall back to 1.0.
    pub fn from_logical(width: f64, height: f64, device_pixel_ratio: f64) -> Self {
        let ratio = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
            device_pixel_ratio
        } else {
            1.0
        };
        Self {
            width: scale_axis(width, ratio),
            height: scale_axis(height, ratio),
        }
    }

    /// A zero on either axis means nothing is visible
    pub fn is_collapsed(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Total number of pixels
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Total size in bytes for RGBA buffer
    pub fn buffer_size(&self) -> usize {
        self.pixel_count() * BYTES_PER_PIXEL
    }

    /// Overlap of a frame placed at the origin with this surface
    pub fn clip(&self, other: SurfaceSize) -> SurfaceSize {
        SurfaceSize::new(self.width.min(other.width), self.height.min(other.height))
    }
}

fn scale_axis(logical: f64, ratio: f64) -> u32 {
    let physical = (logical * ratio).round();
    if physical.is_finite() && physical > 0.0 {
        physical.min(u32::MAX as f64) as u32
    } else {
        0
    }
}

/// Output target a bridge writes frames into
///
/// Implementations are configured once at construction (low latency,
/// opaque) and never reconfigure that contract afterwards.
pub trait DisplaySurface {
    /// Current physical dimensions
    fn size(&self) -> SurfaceSize;

    /// Overwrite the region `(0, 0)..frame.size()` with the frame's pixels.
    ///
    /// No blending against previous content. Frame pixels beyond the
    /// surface bounds are clipped.
    fn blit(&mut self, frame: &FrameView<'_>) -> Result<()>;

    /// Set the physical dimensions. Previous content becomes undefined.
    fn set_size(&mut self, size: SurfaceSize);

    /// Host-reported ratio of physical to logical pixels, read live
    fn device_pixel_ratio(&self) -> f64;
}
