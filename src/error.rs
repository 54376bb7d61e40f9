use thiserror::Error;

use crate::device::BitDepth;

/// Failures surfaced by the renderer. Configuration problems stop the
/// device from starting; resource problems are recoverable at the call
/// site (typically by substituting a dirty texture).
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid back-buffer dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("unsupported display bit depth {0:?}")]
    UnsupportedBitDepth(BitDepth),

    #[error("resource i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("bitmap decode failed: {0}")]
    Image(#[from] image::ImageError),
}
