//! Render modes and per-call options.

use crate::config::{ModeDefaults, RenderConfig};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Fidelity level of a render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    FastPreview,
    Thumbnail,
    HighQuality,
}

impl RenderMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderMode::FastPreview => "fast_preview",
            RenderMode::Thumbnail => "thumbnail",
            RenderMode::HighQuality => "high_quality",
        }
    }

    /// Samples per pixel edge.
    pub fn supersample(&self) -> u32 {
        match self {
            RenderMode::HighQuality => 2,
            RenderMode::FastPreview | RenderMode::Thumbnail => 1,
        }
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Encoded output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Png,
    Jpeg,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpeg",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Jpeg => "image/jpeg",
        }
    }
}

/// Options for one render call.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub mode: RenderMode,
    /// Output width; `None` follows the canvas (or the height's aspect).
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// 0.0 to 1.0; JPEG quality is `quality * 100`.
    pub quality: f32,
    pub format: OutputFormat,
    /// Object cap; `None` is unbounded.
    pub max_objects: Option<usize>,
    pub timeout: Duration,
}

impl RenderOptions {
    /// Built-in defaults for `mode`.
    pub fn for_mode(mode: RenderMode) -> Self {
        let config = RenderConfig::default();
        Self::from_defaults(mode, config.mode_defaults(mode), config.thumbnail_size)
    }

    /// Defaults for `mode` taken from `config`.
    pub fn from_config(mode: RenderMode, config: &RenderConfig) -> Self {
        Self::from_defaults(mode, config.mode_defaults(mode), config.thumbnail_size)
    }

    fn from_defaults(mode: RenderMode, defaults: &ModeDefaults, thumbnail_size: u32) -> Self {
        let size = (mode == RenderMode::Thumbnail).then_some(thumbnail_size);
        Self {
            mode,
            width: size,
            height: size,
            quality: defaults.quality,
            format: defaults.format,
            max_objects: defaults.max_objects,
            timeout: Duration::from_millis(defaults.timeout_ms),
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn with_quality(mut self, quality: f32) -> Self {
        self.quality = quality.clamp(0.0, 1.0);
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_max_objects(mut self, max_objects: Option<usize>) -> Self {
        self.max_objects = max_objects;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Pixel size of the output for a `canvas_width` x `canvas_height`
    /// canvas.
    ///
    /// Thumbnails fit inside the requested box keeping the canvas aspect;
    /// other modes use the explicit size, derive a missing side from the
    /// aspect, or fall back to the canvas size.
    pub fn output_size(&self, canvas_width: u32, canvas_height: u32) -> (u32, u32) {
        if canvas_width == 0 || canvas_height == 0 {
            return (0, 0);
        }
        let (cw, ch) = (canvas_width as f64, canvas_height as f64);
        let scaled = |v: f64| v.round().max(1.0) as u32;

        match (self.mode, self.width, self.height) {
            (RenderMode::Thumbnail, Some(w), Some(h)) => {
                let scale = (w as f64 / cw).min(h as f64 / ch);
                (scaled(cw * scale), scaled(ch * scale))
            }
            (_, Some(w), Some(h)) => (w, h),
            (_, Some(w), None) => (w, scaled(w as f64 * ch / cw)),
            (_, None, Some(h)) => (scaled(h as f64 * cw / ch), h),
            (_, None, None) => (canvas_width, canvas_height),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_defaults() {
        let fast = RenderOptions::for_mode(RenderMode::FastPreview);
        assert_eq!(fast.quality, 0.6);
        assert_eq!(fast.format, OutputFormat::Jpeg);
        assert_eq!(fast.max_objects, Some(50));
        assert_eq!(fast.timeout, Duration::from_secs(5));

        let thumb = RenderOptions::for_mode(RenderMode::Thumbnail);
        assert_eq!((thumb.width, thumb.height), (Some(300), Some(300)));
        assert_eq!(thumb.max_objects, Some(30));
        assert_eq!(thumb.timeout, Duration::from_secs(3));

        let hq = RenderOptions::for_mode(RenderMode::HighQuality);
        assert_eq!(hq.format, OutputFormat::Png);
        assert_eq!(hq.max_objects, None);
        assert_eq!(hq.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_thumbnail_fits_inside_box() {
        let thumb = RenderOptions::for_mode(RenderMode::Thumbnail);
        assert_eq!(thumb.output_size(1200, 600), (300, 150));
        assert_eq!(thumb.output_size(600, 1200), (150, 300));
    }

    #[test]
    fn test_output_size_follows_aspect() {
        let fast = RenderOptions::for_mode(RenderMode::FastPreview);
        assert_eq!(fast.output_size(800, 600), (800, 600));
        let mut half = fast.clone();
        half.width = Some(400);
        assert_eq!(half.output_size(800, 600), (400, 300));
        assert_eq!(fast.clone().with_size(10, 10).output_size(800, 600), (10, 10));
        assert_eq!(fast.output_size(0, 600), (0, 0));
    }
}
