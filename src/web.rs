//! Browser host: a 2D canvas surface and the exported bridge functions.
//!
//! The host page must contain `<canvas id="canvas">` before the module
//! starts. The bridge over it is created once by the start function and
//! kept in a slot owned by the module's single thread.

use std::cell::RefCell;

use js_sys::{Object, Reflect};
use log::{info, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::{Clamped, JsCast};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, ImageData};

use crate::config::CANVAS_ID;
use crate::core::{DisplaySurface, PresentationBridge, SurfaceSize};
use crate::error::{BridgeError, Result};
use crate::frame::FrameView;

/// Canvas element with a low-latency, opaque 2D context
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
}

impl CanvasSurface {
    /// Look up the canvas once and configure its context
    pub fn from_element_id(id: &str) -> Result<Self> {
        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or_else(|| BridgeError::surface_unavailable("no document"))?;

        let canvas = document
            .get_element_by_id(id)
            .ok_or_else(|| BridgeError::surface_unavailable(format!("no element with id `{}`", id)))?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| BridgeError::surface_unavailable(format!("element `{}` is not a canvas", id)))?;

        Self::new(canvas)
    }

    pub fn new(canvas: HtmlCanvasElement) -> Result<Self> {
        let options = context_options()?;

        let context = canvas
            .get_context_with_context_options("2d", &options)
            .map_err(|e| BridgeError::surface_unavailable(format!("2d context rejected: {:?}", e)))?
            .ok_or_else(|| BridgeError::surface_unavailable("2d context unavailable"))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| BridgeError::surface_unavailable("unexpected context type"))?;

        Ok(Self { canvas, context })
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }
}

/// `{ alpha: false, desynchronized: true }`; web-sys has no setter for the latter
fn context_options() -> Result<JsValue> {
    let options = Object::new();
    for (key, value) in [("alpha", false), ("desynchronized", true)] {
        Reflect::set(&options, &JsValue::from_str(key), &JsValue::from_bool(value))
            .map_err(|e| BridgeError::surface_unavailable(format!("context option `{}`: {:?}", key, e)))?;
    }
    Ok(options.into())
}

impl DisplaySurface for CanvasSurface {
    fn size(&self) -> SurfaceSize {
        SurfaceSize::new(self.canvas.width(), self.canvas.height())
    }

    fn blit(&mut self, frame: &FrameView<'_>) -> Result<()> {
        // ImageData refuses zero-sized images; putImageData clips the rest
        if frame.is_empty() || self.size().is_collapsed() {
            return Ok(());
        }

        // The pixels are copied into the ImageData, nothing keeps the borrow
        let image = ImageData::new_with_u8_clamped_array_and_sh(
            Clamped(frame.pixels()),
            frame.width(),
            frame.height(),
        )
        .map_err(|e| BridgeError::backend(format!("ImageData: {:?}", e)))?;

        self.context
            .put_image_data(&image, 0.0, 0.0)
            .map_err(|e| BridgeError::backend(format!("putImageData: {:?}", e)))
    }

    fn set_size(&mut self, size: SurfaceSize) {
        self.canvas.set_width(size.width);
        self.canvas.set_height(size.height);
    }

    fn device_pixel_ratio(&self) -> f64 {
        web_sys::window().map_or(1.0, |window| window.device_pixel_ratio())
    }
}

impl From<BridgeError> for JsValue {
    fn from(err: BridgeError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

thread_local! {
    static BRIDGE: RefCell<Option<PresentationBridge<CanvasSurface>>> = const { RefCell::new(None) };
}

fn with_bridge<T>(f: impl FnOnce(&mut PresentationBridge<CanvasSurface>) -> Result<T>) -> Result<T> {
    BRIDGE.with(|slot| match slot.borrow_mut().as_mut() {
        Some(bridge) => f(bridge),
        None => Err(BridgeError::surface_unavailable("bridge not started")),
    })
}

/// Module start: bind the bridge to the host page's canvas
#[cfg_attr(not(test), wasm_bindgen(start))]
pub fn start() -> std::result::Result<(), JsValue> {
    console_error_panic_hook::set_once();
    if let Err(e) = console_log::init_with_level(log::Level::Info) {
        warn!("Console logger already installed: {}", e);
    }

    let surface = CanvasSurface::from_element_id(CANVAS_ID)?;
    info!("Bridge bound to #{}", CANVAS_ID);
    BRIDGE.with(|slot| *slot.borrow_mut() = Some(PresentationBridge::new(surface)));
    Ok(())
}

/// Write a packed RGBA frame of the given width at the canvas origin
#[wasm_bindgen]
pub fn present(buffer: &[u8], width: u32) -> std::result::Result<(), JsValue> {
    with_bridge(|bridge| bridge.present(buffer, width)).map_err(JsValue::from)
}

/// The canvas the bridge draws into
#[wasm_bindgen]
pub fn get_surface() -> std::result::Result<HtmlCanvasElement, JsValue> {
    with_bridge(|bridge| Ok(bridge.surface().canvas().clone())).map_err(JsValue::from)
}

/// Set the canvas backing store to `width` x `height` device pixels
#[wasm_bindgen]
pub fn resize(width: u32, height: u32) -> std::result::Result<(), JsValue> {
    with_bridge(|bridge| {
        bridge.resize(width, height);
        Ok(())
    })
    .map_err(JsValue::from)
}

/// Live `window.devicePixelRatio`
#[wasm_bindgen]
pub fn device_pixel_ratio() -> f64 {
    with_bridge(|bridge| Ok(bridge.device_pixel_ratio()))
        .unwrap_or_else(|_| web_sys::window().map_or(1.0, |window| window.device_pixel_ratio()))
}
