use glam::{Vec2, Vec3};

use crate::core::SurfaceSize;
use crate::frame::Frame;

/// Test patterns the demo producer can render
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(not(target_arch = "wasm32"), derive(clap::ValueEnum))]
pub enum Pattern {
    /// Animated corner-color gradient
    #[default]
    Gradient,
    /// Scrolling checkerboard, useful for spotting tearing
    Checker,
    /// Opaque red everywhere
    Solid,
}

const CHECKER_CELL: u32 = 32;
const CHECKER_SPEED: f32 = 120.0;

const TOP_LEFT: Vec3 = Vec3::new(0.05, 0.10, 0.35);
const TOP_RIGHT: Vec3 = Vec3::new(0.85, 0.20, 0.45);
const BOTTOM: Vec3 = Vec3::new(0.95, 0.80, 0.25);

/// Stand-in pixel producer: renders finished frames for the bridge to present
#[derive(Debug, Clone)]
pub struct PatternProducer {
    pattern: Pattern,
    frame_number: u64,
}

impl PatternProducer {
    pub fn new(pattern: Pattern) -> Self {
        Self {
            pattern,
            frame_number: 0,
        }
    }

    pub fn pattern(&self) -> Pattern {
        self.pattern
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frame_number
    }

    /// Render one frame at `size`; nothing to render while collapsed
    pub fn render(&mut self, size: SurfaceSize, time: f32) -> Option<Frame> {
        if size.is_collapsed() {
            return None;
        }

        let mut pixels = vec![0u8; size.buffer_size()];
        let texels: &mut [[u8; 4]] = bytemuck::cast_slice_mut(&mut pixels[..]);

        for (i, texel) in texels.iter_mut().enumerate() {
            let x = (i % size.width as usize) as u32;
            let y = (i / size.width as usize) as u32;
            *texel = self.shade(x, y, size, time);
        }

        let frame = Frame::new(self.frame_number, pixels, size.width).ok()?;
        self.frame_number += 1;
        Some(frame)
    }

    fn shade(&self, x: u32, y: u32, size: SurfaceSize, time: f32) -> [u8; 4] {
        match self.pattern {
            Pattern::Gradient => {
                let uv = Vec2::new(
                    x as f32 / size.width.max(2).saturating_sub(1) as f32,
                    y as f32 / size.height.max(2).saturating_sub(1) as f32,
                );
                let sway = 0.5 + 0.5 * (time * 0.7).sin();
                let top = TOP_LEFT.lerp(TOP_RIGHT, (uv.x + sway * 0.25).min(1.0));
                to_rgba(top.lerp(BOTTOM, uv.y))
            }
            Pattern::Checker => {
                let offset = (time.max(0.0) * CHECKER_SPEED) as u32;
                let cell = (x.wrapping_add(offset) / CHECKER_CELL + y / CHECKER_CELL) % 2;
                if cell == 0 {
                    [230, 230, 230, 255]
                } else {
                    [25, 25, 25, 255]
                }
            }
            Pattern::Solid => [255, 0, 0, 255],
        }
    }
}

/// Linear color in `[0, 1]` to opaque RGBA bytes
fn to_rgba(color: Vec3) -> [u8; 4] {
    let c = (color.clamp(Vec3::ZERO, Vec3::ONE) * 255.0).round();
    [c.x as u8, c.y as u8, c.z as u8, 255]
}
