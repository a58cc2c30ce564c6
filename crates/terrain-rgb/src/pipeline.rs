//! The decode-and-build pipeline for one tile.

use std::sync::Arc;

use terrain_rgb_decode::{
    DecodeResult, GeometryRefiner, SourceImage, SphereProjection, TerrainMesh,
    build_terrain_mesh, build_water_plane, sample_heightmap,
};

use crate::{MeshOptions, TileBounds};

/// Everything a finished tile request hands to its tile.
#[derive(Debug, Clone)]
pub struct TileMeshes {
    pub terrain: TerrainMesh,
    pub water: Option<TerrainMesh>,
    /// The decoded heightmap; shared with `terrain`.
    pub texture: Arc<SourceImage>,
    /// Lowest and highest sampled elevation in meters.
    pub elevation_range: Option<(f32, f32)>,
}

/// Decode, sample, mesh and (optionally) refine one tile image.
///
/// `refinement` is given only when the map uses a spherical projection; it
/// runs after heights and normals are final.
pub fn build_tile_meshes(
    encoded: &[u8],
    bounds: &TileBounds,
    options: &MeshOptions,
    refinement: Option<(&dyn GeometryRefiner, &dyn SphereProjection)>,
) -> DecodeResult<TileMeshes> {
    let texture = Arc::new(SourceImage::decode(encoded)?);
    let grid = sample_heightmap(&texture, options.resolution)?;
    let elevation_range = grid.min_max();

    let mut terrain = build_terrain_mesh(bounds.width, bounds.height, &grid, bounds.center)?
        .with_texture(Arc::clone(&texture));
    let mut water = options
        .water_plane
        .then(|| build_water_plane(bounds.width, bounds.height, bounds.center));

    if let Some((refiner, projection)) = refinement {
        refiner.refine(&mut terrain, projection);
        if let Some(water) = water.as_mut() {
            refiner.refine(water, projection);
        }
    }

    Ok(TileMeshes {
        terrain,
        water,
        texture,
        elevation_range,
    })
}
