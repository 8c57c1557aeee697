//! Renderer and player configuration.
//!
//! Both types deserialize from JSON with serde, using the same key names the
//! options object has always used (`pixfmt`, `align`, `flipY`, `mode`,
//! `aspect`). Every key is optional.
//!
//! ```
//! use yuvplay::config::{DisplayMode, RendererOptions};
//!
//! let opts = RendererOptions::from_json(r#"{ "pixfmt": "nv12", "flipY": true }"#).unwrap();
//! assert!(opts.flip_y);
//! assert_eq!(opts.mode, DisplayMode::Rgba);
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::pixel_format::PixelFormat;

/// Default aspect ratio for the view controller's base scale.
pub const DEFAULT_ASPECT: f32 = 16.0 / 9.0;

/// How decoded pixels are displayed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// Full colour.
    #[default]
    Rgba,
    /// Luma only.
    Gray,
}

/// A pixel format as written in configuration: its title or its tag.
///
/// Resolution to a [`PixelFormat`] is deferred until the renderer is built so
/// an unknown name fails construction with `UnsupportedFormat`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum FormatId {
    Tag(u32),
    Title(String),
}

impl FormatId {
    /// Resolve to a supported format.
    pub fn resolve(&self) -> Result<PixelFormat> {
        match self {
            FormatId::Tag(tag) => {
                PixelFormat::from_tag(*tag).ok_or_else(|| Error::UnsupportedFormat(tag.to_string()))
            }
            FormatId::Title(title) => PixelFormat::lookup(title),
        }
    }
}

impl Default for FormatId {
    fn default() -> Self {
        PixelFormat::Yuv420p.into()
    }
}

impl From<PixelFormat> for FormatId {
    fn from(format: PixelFormat) -> Self {
        FormatId::Title(format.title().to_owned())
    }
}

impl From<&str> for FormatId {
    fn from(title: &str) -> Self {
        FormatId::Title(title.to_owned())
    }
}

/// Options recognized at renderer construction.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RendererOptions {
    /// Pixel format of incoming frames.
    pub pixfmt: FormatId,
    /// Row alignment of incoming planes, in bytes.
    pub align: u32,
    /// Flip rows vertically on upload.
    pub flip_y: bool,
    pub mode: DisplayMode,
    /// Aspect ratio used for the view controller's base scale.
    pub aspect: f32,
}

impl Default for RendererOptions {
    fn default() -> Self {
        Self {
            pixfmt: FormatId::default(),
            align: 1,
            flip_y: false,
            mode: DisplayMode::Rgba,
            aspect: DEFAULT_ASPECT,
        }
    }
}

impl RendererOptions {
    /// Parse options from a JSON object.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::InvalidOption(e.to_string()))
    }

    /// Builder-style pixel format override.
    pub fn with_format(mut self, pixfmt: impl Into<FormatId>) -> Self {
        self.pixfmt = pixfmt.into();
        self
    }

    /// Builder-style display mode override.
    pub fn with_mode(mut self, mode: DisplayMode) -> Self {
        self.mode = mode;
        self
    }

    /// Builder-style vertical flip override.
    pub fn with_flip_y(mut self, flip_y: bool) -> Self {
        self.flip_y = flip_y;
        self
    }

    /// Check value ranges. Does not resolve the pixel format.
    pub fn validate(&self) -> Result<()> {
        if !matches!(self.align, 1 | 2 | 4 | 8) {
            return Err(Error::InvalidOption(format!(
                "align must be 1, 2, 4 or 8 (got {})",
                self.align
            )));
        }
        if !(self.aspect.is_finite() && self.aspect > 0.0) {
            return Err(Error::InvalidOption(format!(
                "aspect must be positive (got {})",
                self.aspect
            )));
        }
        Ok(())
    }
}

// ── Player ──────────────────────────────────────────────────────────────

static RESOLUTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)x(\d+)").expect("resolution pattern is valid")
});

/// A `width x height` pair, written as `"960x540"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl FromStr for Resolution {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let bad = || Error::InvalidOption(format!("resolution \"{s}\" is not WIDTHxHEIGHT"));
        let caps = RESOLUTION_RE.captures(s).ok_or_else(bad)?;
        let width = caps[1].parse().map_err(|_| bad())?;
        let height = caps[2].parse().map_err(|_| bad())?;
        Ok(Self { width, height })
    }
}

impl TryFrom<String> for Resolution {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Everything the player needs: frame geometry, pacing, and renderer options.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlayerConfig {
    /// Dimensions of each frame in the source.
    pub resolution: Resolution,
    /// Frames per second to read from the source.
    pub frame_rate: f64,
    /// Size of the presentation surface.
    pub surface_size: Resolution,
    /// Capacity of the queue between the source thread and the render loop.
    pub queue_depth: usize,
    pub renderer: RendererOptions,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            resolution: Resolution::new(960, 540),
            frame_rate: 25.0,
            surface_size: Resolution::new(960, 540),
            queue_depth: 4,
            renderer: RendererOptions::default().with_flip_y(true),
        }
    }
}

impl PlayerConfig {
    /// Parse a player config from a JSON object.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::InvalidOption(e.to_string()))
    }

    /// Bytes per frame for the configured resolution and renderer options.
    pub fn frame_len(&self) -> Result<usize> {
        let format = self.renderer.pixfmt.resolve()?;
        let Resolution { width, height } = self.resolution;
        Ok(format.frame_layout(width, height, self.renderer.align).required_len())
    }

    pub fn validate(&self) -> Result<()> {
        self.renderer.validate()?;
        if !(self.frame_rate.is_finite() && self.frame_rate > 0.0) {
            return Err(Error::InvalidOption(format!(
                "frame rate must be positive (got {})",
                self.frame_rate
            )));
        }
        if self.queue_depth == 0 {
            return Err(Error::InvalidOption("queue depth must be at least 1".into()));
        }
        Ok(())
    }
}
