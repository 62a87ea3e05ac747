//! Image asset loading for image nodes and media placeholders.

mod placeholder_art;

pub use placeholder_art::placeholder_art;

use crate::error::{AssetError, AssetResult};
use crate::scene::ImageFormat;
use crate::storage::BoxFuture;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::RgbaImage;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

/// Extensions accepted as image paths.
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "gif", "svg", "bmp"];

/// Fetches raw image bytes for a source URI.
pub trait ImageLoader: Send + Sync {
    fn load(&self, uri: &str) -> BoxFuture<'_, AssetResult<Vec<u8>>>;
}

/// Decodes `data:image/...;base64,` URIs.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataUriLoader;

impl DataUriLoader {
    /// Decode a data URI synchronously.
    pub fn decode(uri: &str) -> AssetResult<Vec<u8>> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or_else(|| AssetError::InvalidDataUri("missing data: prefix".to_string()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| AssetError::InvalidDataUri("missing ',' separator".to_string()))?;
        if !header.ends_with(";base64") {
            return Err(AssetError::InvalidDataUri(
                "only base64 data URIs are supported".to_string(),
            ));
        }
        BASE64
            .decode(payload.trim())
            .map_err(|e| AssetError::InvalidDataUri(e.to_string()))
    }
}

impl ImageLoader for DataUriLoader {
    fn load(&self, uri: &str) -> BoxFuture<'_, AssetResult<Vec<u8>>> {
        let result = Self::decode(uri);
        Box::pin(async move { result })
    }
}

/// Reads images from the local filesystem (`file://` URIs and paths).
#[derive(Debug, Clone, Default)]
pub struct FileImageLoader {
    /// Directory relative paths are resolved against.
    base_dir: Option<PathBuf>,
}

impl FileImageLoader {
    pub fn new(base_dir: Option<PathBuf>) -> Self {
        Self { base_dir }
    }

    fn resolve(&self, uri: &str) -> PathBuf {
        let raw = PathBuf::from(uri.strip_prefix("file://").unwrap_or(uri));
        match &self.base_dir {
            Some(base) if raw.is_relative() => base.join(raw),
            _ => raw,
        }
    }
}

impl ImageLoader for FileImageLoader {
    fn load(&self, uri: &str) -> BoxFuture<'_, AssetResult<Vec<u8>>> {
        let path = self.resolve(uri);
        Box::pin(async move {
            fs::read(&path)
                .map_err(|e| AssetError::Io(format!("Failed to read {}: {}", path.display(), e)))
        })
    }
}

/// Dispatches by URI scheme. Remote URLs need an injected loader; without
/// one they are rejected as unsupported.
#[derive(Clone, Default)]
pub struct SourceLoader {
    data: DataUriLoader,
    file: FileImageLoader,
    remote: Option<Arc<dyn ImageLoader>>,
}

impl SourceLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_dir(mut self, base_dir: PathBuf) -> Self {
        self.file = FileImageLoader::new(Some(base_dir));
        self
    }

    /// Loader used for `http://` and `https://` sources.
    pub fn with_remote(mut self, remote: Arc<dyn ImageLoader>) -> Self {
        self.remote = Some(remote);
        self
    }
}

impl ImageLoader for SourceLoader {
    fn load(&self, uri: &str) -> BoxFuture<'_, AssetResult<Vec<u8>>> {
        let lower = uri.trim_start().to_ascii_lowercase();
        if lower.starts_with("data:") {
            self.data.load(uri)
        } else if lower.starts_with("http://") || lower.starts_with("https://") {
            match &self.remote {
                Some(remote) => remote.load(uri),
                None => {
                    let uri = uri.to_string();
                    Box::pin(async move { Err(AssetError::UnsupportedSource(uri)) })
                }
            }
        } else if lower.contains("://") && !lower.starts_with("file://") {
            let uri = uri.to_string();
            Box::pin(async move { Err(AssetError::UnsupportedSource(uri)) })
        } else {
            self.file.load(uri)
        }
    }
}

impl std::fmt::Debug for SourceLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceLoader")
            .field("file", &self.file)
            .field("remote", &self.remote.is_some())
            .finish()
    }
}

/// A decoded bitmap and the format it was stored in.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub pixels: Arc<RgbaImage>,
    pub format: ImageFormat,
}

/// Decode PNG, JPEG or WebP bytes into RGBA.
pub fn decode_image(bytes: &[u8]) -> AssetResult<DecodedImage> {
    let format = ImageFormat::from_magic_bytes(bytes)
        .ok_or_else(|| AssetError::Decode("unrecognized image format".to_string()))?;
    let codec = match format {
        ImageFormat::Png => image::ImageFormat::Png,
        ImageFormat::Jpeg => image::ImageFormat::Jpeg,
        ImageFormat::WebP => image::ImageFormat::WebP,
    };
    let decoded = image::load_from_memory_with_format(bytes, codec)
        .map_err(|e| AssetError::Decode(e.to_string()))?;
    Ok(DecodedImage {
        pixels: Arc::new(decoded.to_rgba8()),
        format,
    })
}

/// Whether `value` looks like a media reference: a URL, a file path with an
/// image extension, or an embedded `data:image/...;base64,` payload.
pub fn is_media_source(value: &str) -> bool {
    let value = value.trim();
    if value.is_empty() {
        return false;
    }
    let lower = value.to_ascii_lowercase();
    if lower.starts_with("data:") {
        return lower.starts_with("data:image/")
            && lower
                .split_once(',')
                .is_some_and(|(header, payload)| header.ends_with(";base64") && !payload.is_empty());
    }
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return lower.len() > lower.find("://").map_or(0, |i| i + 3);
    }
    let path = lower.strip_prefix("file://").unwrap_or(&lower);
    if path.chars().any(char::is_whitespace) && !path.contains('/') {
        return false;
    }
    path.rsplit_once('.')
        .is_some_and(|(stem, ext)| !stem.is_empty() && IMAGE_EXTENSIONS.contains(&ext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgba};
    use std::io::Cursor;

    fn tiny_png() -> Vec<u8> {
        let img: RgbaImage = ImageBuffer::from_pixel(3, 2, Rgba([255, 0, 0, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn data_uri(bytes: &[u8]) -> String {
        format!("data:image/png;base64,{}", BASE64.encode(bytes))
    }

    #[test]
    fn test_data_uri_roundtrip() {
        let png = tiny_png();
        let loaded = pollster::block_on(DataUriLoader.load(&data_uri(&png))).unwrap();
        assert_eq!(loaded, png);
        let decoded = decode_image(&loaded).unwrap();
        assert_eq!(decoded.format, ImageFormat::Png);
        assert_eq!(decoded.pixels.dimensions(), (3, 2));
    }

    #[test]
    fn test_invalid_data_uri() {
        assert!(matches!(
            DataUriLoader::decode("data:image/png,raw"),
            Err(AssetError::InvalidDataUri(_))
        ));
        assert!(DataUriLoader::decode("data:image/png;base64,@@@").is_err());
    }

    #[test]
    fn test_file_loader_relative_to_base() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("logo.png"), tiny_png()).unwrap();
        let loader = SourceLoader::new().with_base_dir(dir.path().to_path_buf());
        let bytes = pollster::block_on(loader.load("logo.png")).unwrap();
        assert!(decode_image(&bytes).is_ok());

        let missing = pollster::block_on(loader.load("missing.png"));
        assert!(matches!(missing, Err(AssetError::Io(_))));
    }

    #[test]
    fn test_remote_without_loader_is_unsupported() {
        let result = pollster::block_on(SourceLoader::new().load("https://example.com/a.png"));
        assert!(matches!(result, Err(AssetError::UnsupportedSource(_))));
    }

    #[test]
    fn test_decode_garbage() {
        assert!(matches!(decode_image(b"hello world"), Err(AssetError::Decode(_))));
    }

    #[test]
    fn test_is_media_source() {
        assert!(is_media_source("https://cdn.example.com/photo"));
        assert!(is_media_source("file:///tmp/logo.png"));
        assert!(is_media_source("assets/icon.svg"));
        assert!(is_media_source("data:image/png;base64,AAAA"));
        assert!(!is_media_source("data:text/plain;base64,AAAA"));
        assert!(!is_media_source("https://"));
        assert!(!is_media_source("just some words"));
        assert!(!is_media_source(""));
    }
}
