//! Render output.

use crate::cache::CacheWeight;
use crate::options::{OutputFormat, RenderMode};
use base64::Engine;
use std::sync::Arc;

/// Encoded image bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedImage {
    pub format: OutputFormat,
    pub bytes: Vec<u8>,
}

impl EncodedImage {
    /// `data:<mime>;base64,<payload>`.
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.format.mime_type(),
            base64::engine::general_purpose::STANDARD.encode(&self.bytes)
        )
    }

    /// Length of [`to_data_url`](Self::to_data_url) without building it.
    pub fn data_url_len(&self) -> usize {
        "data:;base64,".len() + self.format.mime_type().len() + self.bytes.len().div_ceil(3) * 4
    }
}

/// One finished render.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderResult {
    pub template_id: String,
    pub encoded_image: EncodedImage,
    pub width: u32,
    pub height: u32,
    pub render_time_ms: u64,
    /// Nodes drawn.
    pub object_count: usize,
    pub mode: RenderMode,
    pub quality: f32,
}

impl RenderResult {
    pub fn to_data_url(&self) -> String {
        self.encoded_image.to_data_url()
    }
}

/// Room for the scalar fields and keys of a serialized result.
const RESULT_METADATA_BYTES: usize = 160;

impl CacheWeight for Arc<RenderResult> {
    /// Approximate JSON size: the data URL plus the metadata fields.
    fn weight(&self) -> usize {
        self.encoded_image.data_url_len() + self.template_id.len() + RESULT_METADATA_BYTES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_url_len_matches() {
        for len in [0, 1, 2, 3, 4, 100] {
            let image = EncodedImage {
                format: OutputFormat::Png,
                bytes: vec![7; len],
            };
            assert_eq!(image.data_url_len(), image.to_data_url().len());
        }
    }
}
