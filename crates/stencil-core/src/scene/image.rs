//! Raster image node content.

use image::RgbaImage;
use std::fmt;
use std::sync::Arc;

/// Encoded format of the bytes an image was decoded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    WebP,
}

impl ImageFormat {
    /// Get MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::WebP => "image/webp",
        }
    }

    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(ImageFormat::Png),
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "webp" => Some(ImageFormat::WebP),
            _ => None,
        }
    }

    /// Detect format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 4 {
            return None;
        }
        // PNG: 89 50 4E 47
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Some(ImageFormat::Png);
        }
        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(ImageFormat::Jpeg);
        }
        // WebP: RIFF....WEBP
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Some(ImageFormat::WebP);
        }
        None
    }
}

/// A decoded bitmap plus where it came from.
#[derive(Clone)]
pub struct ImageNode {
    source: Option<String>,
    pixels: Arc<RgbaImage>,
    format: Option<ImageFormat>,
    is_placeholder_art: bool,
}

impl ImageNode {
    /// Image decoded from `source`.
    pub fn loaded(source: impl Into<String>, pixels: Arc<RgbaImage>, format: ImageFormat) -> Self {
        Self {
            source: Some(source.into()),
            pixels,
            format: Some(format),
            is_placeholder_art: false,
        }
    }

    /// Synthesized placeholder raster; no source.
    pub fn placeholder_art(pixels: RgbaImage) -> Self {
        Self {
            source: None,
            pixels: Arc::new(pixels),
            format: None,
            is_placeholder_art: true,
        }
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn pixels(&self) -> &Arc<RgbaImage> {
        &self.pixels
    }

    pub fn format(&self) -> Option<ImageFormat> {
        self.format
    }

    pub fn is_placeholder_art(&self) -> bool {
        self.is_placeholder_art
    }

    /// Natural pixel size of the bitmap.
    pub fn natural_size(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }
}

impl fmt::Debug for ImageNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (w, h) = self.natural_size();
        f.debug_struct("ImageNode")
            .field("source", &self.source)
            .field("size", &format_args!("{w}x{h}"))
            .field("format", &self.format)
            .field("is_placeholder_art", &self.is_placeholder_art)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magic_bytes() {
        assert_eq!(
            ImageFormat::from_magic_bytes(&[0x89, 0x50, 0x4E, 0x47, 0x0D]),
            Some(ImageFormat::Png)
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(&[0xFF, 0xD8, 0xFF, 0xE0]),
            Some(ImageFormat::Jpeg)
        );
        assert_eq!(ImageFormat::from_magic_bytes(b"RIFF\0\0\0\0WEBPVP8 "), Some(ImageFormat::WebP));
        assert_eq!(ImageFormat::from_magic_bytes(b"GIF8"), None);
    }

    #[test]
    fn test_placeholder_art_has_no_source() {
        let node = ImageNode::placeholder_art(RgbaImage::new(4, 3));
        assert!(node.is_placeholder_art());
        assert_eq!(node.source(), None);
        assert_eq!(node.natural_size(), (4, 3));
    }
}
