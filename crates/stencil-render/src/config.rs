//! Renderer and cache configuration.

use crate::options::{OutputFormat, RenderMode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const MIB: usize = 1024 * 1024;
const MINUTE_MS: u64 = 60 * 1000;

/// Budget and expiry for one LRU+TTL cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CacheConfig {
    pub max_size_bytes: usize,
    pub max_entries: usize,
    pub ttl_ms: u64,
    /// Minimum time between proactive expiry sweeps.
    pub cleanup_interval_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::render_results()
    }
}

impl CacheConfig {
    pub fn new(max_size_bytes: usize, max_entries: usize, ttl: Duration, cleanup_interval: Duration) -> Self {
        Self {
            max_size_bytes,
            max_entries,
            ttl_ms: ttl.as_millis() as u64,
            cleanup_interval_ms: cleanup_interval.as_millis() as u64,
        }
    }

    /// Preview images: 50 MiB, 100 entries, 30 min TTL.
    pub fn previews() -> Self {
        Self {
            max_size_bytes: 50 * MIB,
            max_entries: 100,
            ttl_ms: 30 * MINUTE_MS,
            cleanup_interval_ms: 5 * MINUTE_MS,
        }
    }

    /// Thumbnails: 20 MiB, 200 entries, 60 min TTL.
    pub fn thumbnails() -> Self {
        Self {
            max_size_bytes: 20 * MIB,
            max_entries: 200,
            ttl_ms: 60 * MINUTE_MS,
            cleanup_interval_ms: 10 * MINUTE_MS,
        }
    }

    /// Generic render results: 100 MiB, 50 entries, 15 min TTL.
    pub fn render_results() -> Self {
        Self {
            max_size_bytes: 100 * MIB,
            max_entries: 50,
            ttl_ms: 15 * MINUTE_MS,
            cleanup_interval_ms: 5 * MINUTE_MS,
        }
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_millis(self.cleanup_interval_ms)
    }
}

/// Default settings of one render mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeDefaults {
    pub quality: f32,
    pub format: OutputFormat,
    /// `None` is unbounded.
    pub max_objects: Option<usize>,
    pub timeout_ms: u64,
}

/// Renderer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderConfig {
    pub previews: CacheConfig,
    pub thumbnails: CacheConfig,
    pub render_results: CacheConfig,
    pub fast_preview: ModeDefaults,
    pub thumbnail: ModeDefaults,
    pub high_quality: ModeDefaults,
    /// Edge of the box thumbnails are fitted into.
    pub thumbnail_size: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            previews: CacheConfig::previews(),
            thumbnails: CacheConfig::thumbnails(),
            render_results: CacheConfig::render_results(),
            fast_preview: ModeDefaults {
                quality: 0.6,
                format: OutputFormat::Jpeg,
                max_objects: Some(50),
                timeout_ms: 5_000,
            },
            thumbnail: ModeDefaults {
                quality: 0.8,
                format: OutputFormat::Jpeg,
                max_objects: Some(30),
                timeout_ms: 3_000,
            },
            high_quality: ModeDefaults {
                quality: 1.0,
                format: OutputFormat::Png,
                max_objects: None,
                timeout_ms: 30_000,
            },
            thumbnail_size: 300,
        }
    }
}

impl RenderConfig {
    /// Parse a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn mode_defaults(&self, mode: RenderMode) -> &ModeDefaults {
        match mode {
            RenderMode::FastPreview => &self.fast_preview,
            RenderMode::Thumbnail => &self.thumbnail,
            RenderMode::HighQuality => &self.high_quality,
        }
    }

    pub fn with_thumbnail_size(mut self, size: u32) -> Self {
        self.thumbnail_size = size;
        self
    }

    pub fn with_render_results(mut self, cache: CacheConfig) -> Self {
        self.render_results = cache;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        assert_eq!(CacheConfig::previews().ttl(), Duration::from_secs(30 * 60));
        assert_eq!(CacheConfig::thumbnails().max_entries, 200);
        assert_eq!(CacheConfig::render_results().max_size_bytes, 100 * MIB);
    }

    #[test]
    fn test_from_partial_json() {
        let config = RenderConfig::from_json(
            r#"{"thumbnailSize": 128, "previews": {"maxEntries": 5}, "highQuality": {"quality": 0.9, "format": "png", "maxObjects": 500, "timeoutMs": 1000}}"#,
        )
        .unwrap();
        assert_eq!(config.thumbnail_size, 128);
        assert_eq!(config.previews.max_entries, 5);
        // Missing keys inside a cache section come from the generic preset.
        assert_eq!(config.previews.max_size_bytes, CacheConfig::render_results().max_size_bytes);
        assert_eq!(config.high_quality.max_objects, Some(500));
        assert_eq!(config.fast_preview.max_objects, Some(50));
    }
}
