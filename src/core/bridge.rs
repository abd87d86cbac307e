use log::{debug, trace};

use super::surface::{DisplaySurface, SurfaceSize};
use crate::error::Result;
use crate::frame::FrameView;

/// Presentation bridge - owns one display surface and writes finished frames into it
///
/// Construct it once at startup and hand it to whichever component drives
/// presentation. Writes take `&mut self`, so there is exactly one writer at
/// a time and no call can re-enter another.
pub struct PresentationBridge<S: DisplaySurface> {
    surface: S,
}

impl<S: DisplaySurface> PresentationBridge<S> {
    /// Take ownership of a surface that is already configured
    pub fn new(surface: S) -> Self {
        Self { surface }
    }

    /// Write a packed RGBA buffer to the surface origin.
    ///
    /// The height is inferred as `buffer.len() / (width * 4)`. A buffer that
    /// is not a whole number of rows fails with `InvalidBufferShape` before
    /// the surface is touched. The buffer is only borrowed for the duration
    /// of the call.
    pub fn present(&mut self, buffer: &[u8], width: u32) -> Result<()> {
        let frame = FrameView::new(buffer, width)?;
        trace!("present {}x{} frame", frame.width(), frame.height());
        self.surface.blit(&frame)
    }

    /// Access the surface
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Access mutable surface
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Set the surface's physical size. Repeating the current size is a no-op.
    pub fn resize(&mut self, width: u32, height: u32) {
        let size = SurfaceSize::new(width, height);
        if self.surface.size() == size {
            return;
        }
        debug!("resize surface {:?} -> {}x{}", self.surface.size(), width, height);
        self.surface.set_size(size);
    }

    /// Current host device pixel ratio, never negative
    pub fn device_pixel_ratio(&self) -> f64 {
        let ratio = self.surface.device_pixel_ratio();
        if ratio.is_nan() || ratio < 0.0 {
            0.0
        } else {
            ratio
        }
    }

    /// Resize to fit a logical drawing area at the current device pixel ratio.
    ///
    /// Returns the physical size the producer should render at.
    pub fn fit_logical(&mut self, width: f64, height: f64) -> SurfaceSize {
        let size = SurfaceSize::from_logical(width, height, self.device_pixel_ratio());
        self.resize(size.width, size.height);
        size
    }

    /// Release the surface
    pub fn into_surface(self) -> S {
        self.surface
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MemorySurface;
    use crate::error::BridgeError;

    /// Surface that counts calls instead of storing pixels
    struct CountingSurface {
        size: SurfaceSize,
        ratio: f64,
        blits: usize,
        resizes: usize,
    }

    impl CountingSurface {
        fn new(width: u32, height: u32) -> Self {
            Self {
                size: SurfaceSize::new(width, height),
                ratio: 1.0,
                blits: 0,
                resizes: 0,
            }
        }
    }

    impl DisplaySurface for CountingSurface {
        fn size(&self) -> SurfaceSize {
            self.size
        }

        fn blit(&mut self, _frame: &FrameView<'_>) -> Result<()> {
            self.blits += 1;
            Ok(())
        }

        fn set_size(&mut self, size: SurfaceSize) {
            self.resizes += 1;
            self.size = size;
        }

        fn device_pixel_ratio(&self) -> f64 {
            self.ratio
        }
    }

    #[test]
    fn test_present_valid_buffer_blits_once() {
        let mut bridge = PresentationBridge::new(CountingSurface::new(4, 4));
        bridge.present(&[0u8; 4 * 4 * 4], 4).unwrap();
        assert_eq!(bridge.surface().blits, 1);
    }

    #[test]
    fn test_present_invalid_buffer_never_reaches_surface() {
        let mut bridge = PresentationBridge::new(CountingSurface::new(4, 4));

        let result = bridge.present(&[0u8; 15], 2);

        assert_eq!(result, Err(BridgeError::InvalidBufferShape { len: 15, width: 2 }));
        assert_eq!(bridge.surface().blits, 0);
    }

    #[test]
    fn test_present_zero_width_fails() {
        let mut bridge = PresentationBridge::new(CountingSurface::new(4, 4));
        assert!(bridge.present(&[], 0).is_err());
        assert_eq!(bridge.surface().blits, 0);
    }

    #[test]
    fn test_resize_same_size_skips_surface() {
        let mut bridge = PresentationBridge::new(CountingSurface::new(4, 4));

        bridge.resize(10, 10);
        bridge.resize(10, 10);
        bridge.resize(4, 4);

        assert_eq!(bridge.surface().resizes, 2);
        assert_eq!(bridge.surface().size(), SurfaceSize::new(4, 4));
    }

    #[test]
    fn test_device_pixel_ratio_clamps_bad_host_values() {
        let mut bridge = PresentationBridge::new(CountingSurface::new(1, 1));

        bridge.surface_mut().ratio = 2.0;
        assert_eq!(bridge.device_pixel_ratio(), 2.0);

        bridge.surface_mut().ratio = -1.0;
        assert_eq!(bridge.device_pixel_ratio(), 0.0);

        bridge.surface_mut().ratio = f64::NAN;
        assert_eq!(bridge.device_pixel_ratio(), 0.0);
    }

    #[test]
    fn test_fit_logical_uses_live_ratio() {
        let mut bridge = PresentationBridge::new(MemorySurface::new(0, 0).with_device_pixel_ratio(2.0));

        let size = bridge.fit_logical(320.0, 240.0);
        assert_eq!(size, SurfaceSize::new(640, 480));
        assert_eq!(bridge.surface().size(), size);

        bridge.surface_mut().set_device_pixel_ratio(1.0);
        assert_eq!(bridge.fit_logical(320.0, 240.0), SurfaceSize::new(320, 240));
    }
}
