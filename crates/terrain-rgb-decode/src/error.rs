//! Decode error types.

/// Errors that can occur while turning a heightmap image into a mesh.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The fetched bytes are not a decodable image.
    #[error("failed to decode image: {0}")]
    Image(#[from] image::ImageError),

    /// The image is empty or not square.
    #[error("malformed heightmap image: {width}x{height} (expected non-zero square)")]
    MalformedImage { width: u32, height: u32 },

    /// A raw pixel buffer does not hold `size * size` RGBA pixels.
    #[error("pixel buffer has {actual} bytes, expected {expected}")]
    PixelBufferLength { expected: usize, actual: usize },

    /// The requested grid resolution cannot produce a mesh.
    #[error("invalid grid resolution: {0}")]
    InvalidResolution(usize),
}

/// Result type for decode operations.
pub type DecodeResult<T> = Result<T, DecodeError>;
