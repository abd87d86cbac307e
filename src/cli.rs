// cli.rs - Command-line interface configuration
use std::path::PathBuf;

use clap::Parser;

use crate::config::SurfaceConfig;
use crate::demo::Pattern;

#[derive(Parser, Debug, Clone)]
#[command(name = "frame-bridge")]
#[command(about = "Present producer-rendered RGBA frames on a window surface", long_about = None)]
pub struct Cli {
    /// JSON surface config; flags below override it
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Logical width of the drawing area
    #[arg(long)]
    pub width: Option<u32>,

    /// Logical height of the drawing area
    #[arg(long)]
    pub height: Option<u32>,

    /// Test pattern the demo producer renders
    #[arg(long, value_enum, default_value_t = Pattern::Gradient)]
    pub pattern: Pattern,

    /// Present vsynced instead of low latency
    #[arg(long = "vsync", default_value = "false")]
    pub vsync: bool,

    /// Render this many frames into an in-memory surface instead of a window
    #[arg(long, value_name = "FRAMES")]
    pub headless: Option<u64>,

    /// Device pixel ratio reported by the headless surface
    #[arg(long, default_value_t = 1.0)]
    pub scale: f64,
}

impl Cli {
    /// Resolve the surface config: file (or defaults), then flag overrides
    pub fn surface_config(&self) -> anyhow::Result<SurfaceConfig> {
        let mut config = match &self.config {
            Some(path) => SurfaceConfig::load(path)?,
            None => SurfaceConfig::default(),
        };
        if let Some(width) = self.width {
            config.width = width;
        }
        if let Some(height) = self.height {
            config.height = height;
        }
        if self.vsync {
            config.low_latency = false;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["frame-bridge"]);
        assert_eq!(cli.pattern, Pattern::Gradient);
        assert!(cli.headless.is_none());
        assert_eq!(cli.surface_config().unwrap(), SurfaceConfig::default());
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::parse_from([
            "frame-bridge",
            "--width",
            "320",
            "--height",
            "200",
            "--vsync",
            "--pattern",
            "checker",
        ]);
        let config = cli.surface_config().unwrap();

        assert_eq!(config.width, 320);
        assert_eq!(config.height, 200);
        assert!(!config.low_latency);
        assert_eq!(cli.pattern, Pattern::Checker);
    }

    #[test]
    fn test_headless_frames() {
        let cli = Cli::parse_from(["frame-bridge", "--headless", "30", "--scale", "2"]);
        assert_eq!(cli.headless, Some(30));
        assert_eq!(cli.scale, 2.0);
    }
}
