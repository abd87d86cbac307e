use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Fixed id of the host page's canvas element
pub const CANVAS_ID: &str = "canvas";

/// Surface settings, fixed when the surface is created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    /// Window title for native hosts
    pub title: String,
    /// Initial logical width
    pub width: u32,
    /// Initial logical height
    pub height: u32,
    /// Skip compositor queueing: mailbox/immediate presentation, one frame in flight
    pub low_latency: bool,
    /// Ignore alpha when compositing against the backdrop
    pub opaque: bool,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            title: "frame-bridge".to_string(),
            width: 800,
            height: 600,
            low_latency: true,
            opaque: true,
        }
    }
}

impl SurfaceConfig {
    /// Parse a JSON document; missing keys keep their defaults
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("Failed to parse surface config")
    }

    /// Load a JSON config file
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("Invalid config file: {}", path.display()))
    }
}
