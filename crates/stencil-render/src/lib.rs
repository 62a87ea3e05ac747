//! Stencil Render
//!
//! Fidelity-tiered rendering of templates: per-mode object selection, a
//! CPU rasterizer, PNG/JPEG encoding, bounded LRU+TTL caches and a
//! renderer that deduplicates identical in-flight requests. [`Session`]
//! bundles a live scene with its engine and renderer.

pub mod cache;
pub mod config;
pub mod error;
pub mod options;
pub mod raster;
pub mod renderer;
pub mod result;
pub mod select;
pub mod session;

pub use cache::{CacheStats, CacheWeight, LruCache, RenderCache, RenderCacheStats, generate_render_key};
pub use config::{CacheConfig, ModeDefaults, RenderConfig};
pub use error::RenderError;
pub use options::{OutputFormat, RenderMode, RenderOptions};
pub use raster::{encode, rasterize};
pub use renderer::TemplateRenderer;
pub use result::{EncodedImage, RenderResult};
pub use select::{MIN_MAIN_EXTENT, select_objects};
pub use session::Session;
