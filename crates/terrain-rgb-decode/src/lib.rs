//! Decode Terrain-RGB heightmap tiles into terrain meshes.
//!
//! This crate provides pure synchronous functions for turning a fetched
//! Terrain-RGB image into a shaded grid mesh. All functions are designed
//! to be called from any threading context - the library user controls
//! parallelism.
//!
//! # Design principles
//!
//! - **Synchronous**: No async, no threading primitives
//! - **User-controlled parallelism**: Client decides how to parallelize
//! - **No drawing surface**: Pixels come straight from the decoded PNG
//!
//! # Key functions
//!
//! - [`decode_elevation`]: RGB triplet to elevation in meters
//! - [`sample_heightmap`]: Nearest-neighbor downsample into an [`ElevationGrid`]
//! - [`build_terrain_mesh`]: Grid mesh with heights and smooth normals
//! - [`build_water_plane`]: Flat sea-level accessory mesh
//! - [`SphericalSubdivision`]: Refine a mesh for display on a globe

mod error;

pub mod elevation;
pub mod mesh;
pub mod refine;
pub mod sampler;
pub mod source;

pub use elevation::decode_elevation;
pub use error::{DecodeError, DecodeResult};
pub use mesh::{TerrainMesh, build_terrain_mesh, build_water_plane};
pub use refine::{
    GeometryRefiner, SphereProjection, SphericalSubdivision, WebMercatorSphere,
    triangle_angular_extent,
};
pub use sampler::{ElevationGrid, sample_heightmap};
pub use source::SourceImage;

/// Equatorial radius of the WGS84 ellipsoid in meters.
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Length of the equator in meters; the side of the web-mercator world square.
pub const EQUATORIAL_CIRCUMFERENCE: f64 = 2.0 * std::f64::consts::PI * EARTH_RADIUS;

/// Base color of terrain meshes (a light, warm grey).
pub const TERRAIN_COLOR: u32 = 0x00c0_b3aa;

/// Base color of the sea-level water plane.
pub const WATER_COLOR: u32 = 0x003d_6f99;

/// Shading model a renderer should use for a mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Shading {
    /// Diffuse-only shading.
    #[default]
    Lambert,
}

/// Renderer-agnostic material descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Material {
    pub shading: Shading,
    /// Base color as `0xRRGGBB`.
    pub color: u32,
}

impl Material {
    /// Material used for terrain relief.
    #[must_use]
    pub const fn terrain() -> Self {
        Self {
            shading: Shading::Lambert,
            color: TERRAIN_COLOR,
        }
    }

    /// Material used for the sea-level water plane.
    #[must_use]
    pub const fn water() -> Self {
        Self {
            shading: Shading::Lambert,
            color: WATER_COLOR,
        }
    }
}
