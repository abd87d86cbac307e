pub mod bridge;
#[cfg(not(target_arch = "wasm32"))]
pub mod gpu_surface;
pub mod memory_surface;
pub mod presenter;
pub mod surface;

pub use bridge::PresentationBridge;
#[cfg(not(target_arch = "wasm32"))]
pub use gpu_surface::GpuSurface;
pub use memory_surface::MemorySurface;
pub use presenter::{Presenter, PresenterHandle, PumpStatus, SurfaceCommand};
pub use surface::{DisplaySurface, SurfaceSize};
