//! Client error types.

use terrain_rgb_decode::DecodeError;

/// Errors that can end a single tile request.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transport failure while fetching the tile image.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// The fetched bytes could not be turned into a mesh.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The request was dropped before it could run.
    #[error("tile request cancelled")]
    Cancelled,

    /// The request task ended without producing a result.
    #[error("tile task stopped without a result")]
    TaskFailed,
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;
