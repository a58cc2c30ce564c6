//! Controller and mesh configuration.

use serde::{Deserialize, Serialize};

/// Environment variable holding the tile server access token.
pub const ACCESS_TOKEN_ENV: &str = "TERRAIN_RGB_ACCESS_TOKEN";

/// How each tile is meshed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshOptions {
    /// Elevation samples (and vertices) per tile side.
    ///
    /// Tiles are 512 pixels at `@2x`, but a full-resolution grid is far more
    /// geometry than the relief needs. Up to 150 keeps frame times
    /// acceptable; lower suits slow devices.
    pub resolution: usize,
    /// Add a flat sea-level plane under the terrain.
    pub water_plane: bool,
    /// Largest angle, in degrees, a triangle may span on a globe.
    pub max_subdivision_angle_deg: f64,
}

impl Default for MeshOptions {
    fn default() -> Self {
        Self {
            resolution: 150,
            water_plane: false,
            max_subdivision_angle_deg: 10.0,
        }
    }
}

/// Pixel density requested from the tile server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TileResolution {
    /// 256 pixel tiles.
    Standard,
    /// 512 pixel tiles (`@2x`).
    #[default]
    HighDpi,
}

impl TileResolution {
    /// Suffix appended to the tile path.
    #[must_use]
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Standard => "",
            Self::HighDpi => "@2x",
        }
    }
}

/// Projection of the map the tiles are shown on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProjectionKind {
    #[default]
    Planar,
    /// Globe view; meshes are refined before use.
    Spherical,
}

/// Settings for a [`crate::TileController`].
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Tileset URL without the trailing slash.
    pub base_url: String,
    /// File extension requested from the server.
    pub format: String,
    pub resolution: TileResolution,
    pub access_token: String,
    pub projection: ProjectionKind,
    /// Lowest level that is fetched.
    pub min_level: u32,
    /// Highest level that is fetched.
    pub max_level: u32,
    /// Requests allowed to fetch and mesh at the same time.
    pub max_concurrent_fetches: usize,
    pub mesh: MeshOptions,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.mapbox.com/v4/mapbox.terrain-rgb".to_string(),
            format: "pngraw".to_string(),
            resolution: TileResolution::default(),
            access_token: String::new(),
            projection: ProjectionKind::default(),
            min_level: 1,
            max_level: 20,
            max_concurrent_fetches: 16,
            mesh: MeshOptions::default(),
        }
    }
}

impl ControllerConfig {
    /// Default settings with the given access token.
    #[must_use]
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            ..Self::default()
        }
    }

    /// Default settings with the token from [`ACCESS_TOKEN_ENV`], if set.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        std::env::var(ACCESS_TOKEN_ENV).ok().map(Self::new)
    }
}

impl std::fmt::Debug for ControllerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerConfig")
            .field("base_url", &self.base_url)
            .field("format", &self.format)
            .field("resolution", &self.resolution)
            .field("access_token", &"<redacted>")
            .field("projection", &self.projection)
            .field("min_level", &self.min_level)
            .field("max_level", &self.max_level)
            .field("max_concurrent_fetches", &self.max_concurrent_fetches)
            .field("mesh", &self.mesh)
            .finish()
    }
}
