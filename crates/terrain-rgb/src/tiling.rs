//! Tiling schemes: where a tile sits in world space.

use glam::DVec3;
use terrain_rgb_decode::{EQUATORIAL_CIRCUMFERENCE, SphereProjection, WebMercatorSphere};

use crate::TileKey;

/// World-space extent of a tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileBounds {
    pub width: f64,
    pub height: f64,
    pub center: DVec3,
}

/// Maps tile keys to world-space bounds.
pub trait TilingScheme {
    /// Projection used to bend this scheme's world space onto a globe.
    type Projection: SphereProjection + Clone + Send + Sync + 'static;

    fn tile_bounds(&self, key: TileKey) -> TileBounds;

    fn sphere_projection(&self) -> Self::Projection;
}

/// Square web-mercator quadtree with XYZ row order.
///
/// The world is a square of side [`EQUATORIAL_CIRCUMFERENCE`] meters with
/// `+Y` pointing north; row 0 of every level touches the northern edge.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebMercatorTilingScheme;

impl TilingScheme for WebMercatorTilingScheme {
    type Projection = WebMercatorSphere;

    fn tile_bounds(&self, key: TileKey) -> TileBounds {
        let side = EQUATORIAL_CIRCUMFERENCE / key.tiles_per_axis() as f64;
        let x = (f64::from(key.column) + 0.5) * side;
        let y = EQUATORIAL_CIRCUMFERENCE - (f64::from(key.row) + 0.5) * side;
        TileBounds {
            width: side,
            height: side,
            center: DVec3::new(x, y, 0.0),
        }
    }

    fn sphere_projection(&self) -> WebMercatorSphere {
        WebMercatorSphere::default()
    }
}
