//! Renderer errors.

use thiserror::Error;

/// Render failure. `Clone` so one shared in-flight render can hand the
/// same error to every waiter.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    #[error("Render of {template_id} timed out after {timeout_ms} ms")]
    Timeout { template_id: String, timeout_ms: u64 },
    #[error("Scene error: {0}")]
    Scene(String),
    #[error("Encode failed: {0}")]
    Encode(String),
    #[error("Nothing to render: output size is {width}x{height}")]
    EmptyCanvas { width: u32, height: u32 },
}
