//! Command-line configuration for the pyramid viewer.
//!
//! This module provides:
//! - Command-line arguments via clap
//! - Environment variables with `PYRAMID_` prefix
//! - Defaults matching the library defaults
//!
//! # Example
//!
//! ```ignore
//! use clap::Parser;
//! use pyramid_viewer::config::{Cli, Command};
//!
//! match Cli::parse().into_command() {
//!     Command::Build(config) => println!("Building {}", config.input.display()),
//!     Command::Inspect(config) => println!("Inspecting {}", config.dir.display()),
//!     Command::Render(config) => println!("Rendering {}", config.dir.display()),
//! }
//! ```
//!
//! # Environment Variables
//!
//! - `PYRAMID_INPUT` - Source image for `build`
//! - `PYRAMID_OUTPUT` - Output directory for `build`
//! - `PYRAMID_FILTER` - Downsampling filter (default: lanczos3)
//! - `PYRAMID_MAX_PIXELS` - Largest accepted source area
//! - `PYRAMID_MAX_DIMENSION` - Largest accepted source side
//! - `PYRAMID_DISPLAY` - Display area for `render` (default: 1280x800)

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use image::imageops::FilterType;

use crate::pyramid::{BuildOptions, Dimensions, DEFAULT_MAX_DIMENSION, DEFAULT_MAX_PIXELS};
use crate::viewport::{PanDirection, Point};

// =============================================================================
// Default Values
// =============================================================================

/// Default display area for `render`.
pub const DEFAULT_DISPLAY: &str = "1280x800";

/// Largest number of zoom-in clicks accepted by `render`.
pub const MAX_ZOOM_CLICKS: u32 = 32;

// =============================================================================
// CLI Arguments
// =============================================================================

/// Pyramid Viewer - tile pyramid builder and viewport renderer.
///
/// Builds a multi-resolution tile pyramid from a large image and renders
/// pan/zoom views of it from the tiles alone.
#[derive(Parser, Debug, Clone)]
#[command(name = "pyramid-viewer")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Unwrap the selected subcommand.
    pub fn into_command(self) -> Command {
        self.command
    }
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Build a tile pyramid from a source image.
    Build(BuildConfig),

    /// Print the manifest and level table of a tile set.
    Inspect(InspectConfig),

    /// Render one viewport frame from a tile set.
    Render(RenderConfig),
}

/// Downsampling filter choices.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResampleFilter {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    #[default]
    Lanczos3,
}

impl From<ResampleFilter> for FilterType {
    fn from(filter: ResampleFilter) -> Self {
        match filter {
            ResampleFilter::Nearest => FilterType::Nearest,
            ResampleFilter::Triangle => FilterType::Triangle,
            ResampleFilter::CatmullRom => FilterType::CatmullRom,
            ResampleFilter::Gaussian => FilterType::Gaussian,
            ResampleFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Pan step names accepted by `render --pan`.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanStep {
    Left,
    Right,
    Up,
    Down,
}

impl From<PanStep> for PanDirection {
    fn from(step: PanStep) -> Self {
        match step {
            PanStep::Left => PanDirection::Left,
            PanStep::Right => PanDirection::Right,
            PanStep::Up => PanDirection::Up,
            PanStep::Down => PanDirection::Down,
        }
    }
}

// =============================================================================
// Build Command
// =============================================================================

/// Arguments for `build`.
#[derive(Parser, Debug, Clone)]
pub struct BuildConfig {
    /// Source image (PNG or JPEG).
    #[arg(short, long, env = "PYRAMID_INPUT")]
    pub input: PathBuf,

    /// Directory to write `manifest.json` and `tiles/` into.
    #[arg(short, long, env = "PYRAMID_OUTPUT")]
    pub output: PathBuf,

    /// Filter used for each halving step.
    #[arg(long, value_enum, default_value_t = ResampleFilter::default(), env = "PYRAMID_FILTER")]
    pub filter: ResampleFilter,

    /// Largest accepted source area, in pixels.
    #[arg(long, default_value_t = DEFAULT_MAX_PIXELS, env = "PYRAMID_MAX_PIXELS")]
    pub max_pixels: u64,

    /// Largest accepted source side, in pixels.
    #[arg(long, default_value_t = DEFAULT_MAX_DIMENSION, env = "PYRAMID_MAX_DIMENSION")]
    pub max_dimension: u32,

    /// Hide the progress bar.
    #[arg(long, default_value_t = false)]
    pub no_progress: bool,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl BuildConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.input.as_os_str().is_empty() {
            return Err("Input image is required. Set --input or PYRAMID_INPUT".to_string());
        }
        if self.output.as_os_str().is_empty() {
            return Err("Output directory is required. Set --output or PYRAMID_OUTPUT".to_string());
        }
        if self.output.is_file() {
            return Err(format!(
                "Output path '{}' is a file, expected a directory",
                self.output.display()
            ));
        }
        if self.max_pixels == 0 {
            return Err("max_pixels must be greater than 0".to_string());
        }
        if self.max_dimension == 0 {
            return Err("max_dimension must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Builder options for this run.
    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            filter: self.filter.into(),
            max_pixels: self.max_pixels,
            max_dimension: self.max_dimension,
        }
    }
}

// =============================================================================
// Inspect Command
// =============================================================================

/// Arguments for `inspect`.
#[derive(Parser, Debug, Clone)]
pub struct InspectConfig {
    /// Tile set directory.
    pub dir: PathBuf,

    /// Also verify that every tile file exists.
    #[arg(long, default_value_t = false)]
    pub check_tiles: bool,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl InspectConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if !self.dir.is_dir() {
            return Err(format!("'{}' is not a directory", self.dir.display()));
        }
        Ok(())
    }
}

// =============================================================================
// Render Command
// =============================================================================

/// Arguments for `render`.
#[derive(Parser, Debug, Clone)]
pub struct RenderConfig {
    /// Tile set directory.
    pub dir: PathBuf,

    /// Available display area as WIDTHxHEIGHT; the frame is fitted inside it.
    #[arg(long, default_value = DEFAULT_DISPLAY, value_parser = parse_dimensions, env = "PYRAMID_DISPLAY")]
    pub display: Dimensions,

    /// Number of zoom-in clicks to apply.
    #[arg(long, default_value_t = 0)]
    pub zoom_in: u32,

    /// Screen point the clicks land on, as X,Y (default: frame center).
    #[arg(long, value_parser = parse_point)]
    pub at: Option<Point>,

    /// Pan steps applied after zooming (comma-separated).
    #[arg(long, value_enum, value_delimiter = ',')]
    pub pan: Vec<PanStep>,

    /// PNG file to write the frame to.
    #[arg(short, long)]
    pub output: PathBuf,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl RenderConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.display.is_empty() {
            return Err("display must be nonzero on both axes".to_string());
        }
        if self.zoom_in > MAX_ZOOM_CLICKS {
            return Err(format!("zoom_in must be at most {}", MAX_ZOOM_CLICKS));
        }
        let is_png = self
            .output
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("png"))
            .unwrap_or(false);
        if !is_png {
            return Err(format!(
                "Output '{}' must have a .png extension",
                self.output.display()
            ));
        }
        Ok(())
    }

    /// Click point, falling back to the center of `frame`.
    pub fn click_point(&self, frame: Dimensions) -> Point {
        self.at.unwrap_or_else(|| {
            Point::new(frame.width as f64 / 2.0, frame.height as f64 / 2.0)
        })
    }
}

// =============================================================================
// Value Parsers
// =============================================================================

/// Parse `WIDTHxHEIGHT`.
pub fn parse_dimensions(s: &str) -> Result<Dimensions, String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", s))?;
    let width = w
        .trim()
        .parse::<u32>()
        .map_err(|e| format!("invalid width '{}': {}", w, e))?;
    let height = h
        .trim()
        .parse::<u32>()
        .map_err(|e| format!("invalid height '{}': {}", h, e))?;
    Ok(Dimensions::new(width, height))
}

/// Parse `X,Y`.
pub fn parse_point(s: &str) -> Result<Point, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got '{}'", s))?;
    let x = x
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid x '{}': {}", x, e))?;
    let y = y
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid y '{}': {}", y, e))?;
    if !x.is_finite() || !y.is_finite() {
        return Err(format!("point '{}' must be finite", s));
    }
    Ok(Point::new(x, y))
}

// =============================================================================
// Tests
// =============================================================================
