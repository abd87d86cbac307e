#[cfg(not(target_arch = "wasm32"))]
pub mod cli;
pub mod config;
pub mod core;
pub mod demo;
pub mod error;
pub mod frame;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use crate::core::{DisplaySurface, MemorySurface, PresentationBridge, SurfaceSize};
pub use crate::error::{BridgeError, Result};
pub use crate::frame::{infer_height, Frame, FrameView};
