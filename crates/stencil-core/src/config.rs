//! Factory and engine configuration.
//!
//! Every struct has sensible defaults, `with_*` builders and can be read
//! from a JSON document (missing keys fall back to the defaults).

use crate::color::SerializableColor;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default image load timeout in milliseconds.
pub const DEFAULT_IMAGE_TIMEOUT_MS: u64 = 10_000;

/// Default edge length of synthesized placeholder art when a node has no size.
pub const DEFAULT_PLACEHOLDER_ART_SIZE: u32 = 200;

/// Muted grey used for placeholder hint text.
pub const DEFAULT_HINT_COLOR: SerializableColor = SerializableColor::new(156, 163, 175, 255);

/// Scene object factory settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FactoryConfig {
    /// Timeout for a single image load.
    pub image_timeout_ms: u64,
    /// Synthesize placeholder art for images without a usable source.
    pub enable_placeholders: bool,
    /// Colour of placeholder hint text.
    pub hint_color: SerializableColor,
    /// Edge length of placeholder art when the node carries no size.
    pub placeholder_art_size: u32,
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self {
            image_timeout_ms: DEFAULT_IMAGE_TIMEOUT_MS,
            enable_placeholders: true,
            hint_color: DEFAULT_HINT_COLOR,
            placeholder_art_size: DEFAULT_PLACEHOLDER_ART_SIZE,
        }
    }
}

impl FactoryConfig {
    pub fn image_timeout(&self) -> Duration {
        Duration::from_millis(self.image_timeout_ms)
    }

    pub fn with_image_timeout(mut self, timeout: Duration) -> Self {
        self.image_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_placeholders(mut self, enabled: bool) -> Self {
        self.enable_placeholders = enabled;
        self
    }

    pub fn with_hint_color(mut self, color: SerializableColor) -> Self {
        self.hint_color = color;
        self
    }
}

/// Template engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Skip nodes that fail to build instead of aborting the apply.
    pub enable_recovery: bool,
    /// Register placeholder state for nodes that carry a placeholder.
    pub enable_placeholders: bool,
    /// Run schema validation before touching the scene.
    pub validate_before_apply: bool,
    /// Settings forwarded to the object factory.
    pub factory: FactoryConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enable_recovery: true,
            enable_placeholders: true,
            validate_before_apply: true,
            factory: FactoryConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parse a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_recovery(mut self, enabled: bool) -> Self {
        self.enable_recovery = enabled;
        self
    }

    pub fn with_placeholders(mut self, enabled: bool) -> Self {
        self.enable_placeholders = enabled;
        self.factory.enable_placeholders = enabled;
        self
    }

    pub fn with_validation(mut self, enabled: bool) -> Self {
        self.validate_before_apply = enabled;
        self
    }

    pub fn with_factory(mut self, factory: FactoryConfig) -> Self {
        self.factory = factory;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert!(config.enable_recovery);
        assert!(config.validate_before_apply);
        assert_eq!(config.factory.image_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_from_partial_json() {
        let config =
            EngineConfig::from_json(r#"{"enableRecovery": false, "factory": {"imageTimeoutMs": 250}}"#)
                .unwrap();
        assert!(!config.enable_recovery);
        assert!(config.enable_placeholders);
        assert_eq!(config.factory.image_timeout_ms, 250);
        assert!(config.factory.enable_placeholders);
    }

    #[test]
    fn test_builders() {
        let config = EngineConfig::default().with_placeholders(false).with_recovery(false);
        assert!(!config.enable_placeholders);
        assert!(!config.factory.enable_placeholders);
        assert!(!config.enable_recovery);
    }
}
