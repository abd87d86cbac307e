use super::surface::{DisplaySurface, SurfaceSize};
use crate::error::Result;
use crate::frame::{FrameView, BYTES_PER_PIXEL};

/// Opaque black, the content of freshly allocated surface memory
const CLEAR: [u8; 4] = [0, 0, 0, 255];

/// Headless surface - RGBA pixel store with readback
///
/// Behaves like a real surface: frames overwrite the origin region,
/// resizing reallocates and discards content. Used for tests, benchmarks
/// and headless runs.
#[derive(Debug, Clone)]
pub struct MemorySurface {
    /// RGBA pixel buffer, row-major
    pixels: Vec<u8>,
    size: SurfaceSize,
    device_pixel_ratio: f64,
    /// Number of blits that touched at least one pixel
    blits: u64,
}

impl MemorySurface {
    /// Create new surface with dimensions, cleared to opaque black
    pub fn new(width: u32, height: u32) -> Self {
        let size = SurfaceSize::new(width, height);
        Self {
            pixels: Self::cleared(size),
            size,
            device_pixel_ratio: 1.0,
            blits: 0,
        }
    }

    /// Set the ratio reported to producers
    pub fn with_device_pixel_ratio(mut self, ratio: f64) -> Self {
        self.device_pixel_ratio = ratio;
        self
    }

    /// Simulate the host moving the surface to another display
    pub fn set_device_pixel_ratio(&mut self, ratio: f64) {
        self.device_pixel_ratio = ratio;
    }

    /// RGBA value at `(x, y)`
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }
        let idx = (y as usize * self.size.width as usize + x as usize) * BYTES_PER_PIXEL;
        let px = &self.pixels[idx..idx + BYTES_PER_PIXEL];
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Get pixel buffer
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn blit_count(&self) -> u64 {
        self.blits
    }

    fn cleared(size: SurfaceSize) -> Vec<u8> {
        CLEAR.repeat(size.pixel_count())
    }
}

impl DisplaySurface for MemorySurface {
    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn blit(&mut self, frame: &FrameView<'_>) -> Result<()> {
        let region = self.size.clip(frame.size());
        if region.is_collapsed() {
            return Ok(());
        }

        let surface_stride = self.size.width as usize * BYTES_PER_PIXEL;
        let copy_len = region.width as usize * BYTES_PER_PIXEL;

        for y in 0..region.height {
            let Some(src) = frame.row(y) else { break };
            let dst = y as usize * surface_stride;
            self.pixels[dst..dst + copy_len].copy_from_slice(&src[..copy_len]);
        }

        self.blits += 1;
        Ok(())
    }

    fn set_size(&mut self, size: SurfaceSize) {
        if size == self.size {
            return;
        }
        self.size = size;
        self.pixels = Self::cleared(size);
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.device_pixel_ratio
    }
}
