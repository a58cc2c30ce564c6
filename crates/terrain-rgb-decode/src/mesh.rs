//! Terrain grid mesh construction.
//!
//! Meshes live in the tile's local frame: X east, Y north, Z up (elevation
//! in meters). The grid is placed in the world by [`TerrainMesh::center`].

use std::sync::Arc;

use glam::{DVec3, Vec3};

use crate::error::{DecodeError, DecodeResult};
use crate::{ElevationGrid, Material, SourceImage};

/// An indexed triangle mesh positioned at a tile center.
#[derive(Debug, Clone)]
pub struct TerrainMesh {
    pub(crate) positions: Vec<Vec3>,
    pub(crate) normals: Vec<Vec3>,
    pub(crate) indices: Vec<u32>,
    material: Material,
    center: DVec3,
    texture: Option<Arc<SourceImage>>,
}

impl TerrainMesh {
    /// Vertex positions relative to [`Self::center`].
    #[must_use]
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    /// Unit per-vertex normals, parallel to [`Self::positions`].
    #[must_use]
    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    /// Triangle list indices, counter-clockwise when seen from +Z.
    #[must_use]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    #[must_use]
    pub fn material(&self) -> Material {
        self.material
    }

    /// World-space translation of the mesh.
    #[must_use]
    pub fn center(&self) -> DVec3 {
        self.center
    }

    /// Heightmap this mesh was built from, if linked.
    #[must_use]
    pub fn texture(&self) -> Option<&Arc<SourceImage>> {
        self.texture.as_ref()
    }

    /// Link the heightmap so its lifetime follows the mesh.
    #[must_use]
    pub fn with_texture(mut self, texture: Arc<SourceImage>) -> Self {
        self.texture = Some(texture);
        self
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// World-space position of vertex `index`.
    #[must_use]
    pub fn world_position(&self, index: usize) -> DVec3 {
        self.center + self.positions[index].as_dvec3()
    }

    /// Bytes held by the vertex and index buffers.
    #[must_use]
    pub fn geometry_byte_len(&self) -> usize {
        (self.positions.len() + self.normals.len()) * size_of::<Vec3>()
            + self.indices.len() * size_of::<u32>()
    }

    /// Recompute smooth normals from the current positions.
    ///
    /// Each vertex normal is the normalized sum of the (area-weighted) face
    /// normals of every triangle that uses it.
    pub fn recompute_normals(&mut self) {
        let mut accumulated = vec![Vec3::ZERO; self.positions.len()];
        for tri in self.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let face = (self.positions[b] - self.positions[a])
                .cross(self.positions[c] - self.positions[a]);
            accumulated[a] += face;
            accumulated[b] += face;
            accumulated[c] += face;
        }
        self.normals = accumulated
            .into_iter()
            .map(|n| n.normalize_or(Vec3::Z))
            .collect();
    }
}

/// Build a terrain mesh from an elevation grid.
///
/// The grid covers `width x height` world units with `res - 1` segments per
/// axis, so there are exactly `res * res` vertices and vertex
/// `row * res + col` carries `grid.get(row, col)`. Row 0 is the northern
/// (`+Y`) edge, matching image row order. Normals are computed after all
/// heights are set.
pub fn build_terrain_mesh(
    width: f64,
    height: f64,
    grid: &ElevationGrid,
    center: DVec3,
) -> DecodeResult<TerrainMesh> {
    let res = grid.res();
    if res < 2 {
        return Err(DecodeError::InvalidResolution(res));
    }

    let segments = (res - 1) as f64;
    let step_x = width / segments;
    let step_y = height / segments;

    let mut positions = Vec::with_capacity(res * res);
    for row in 0..res {
        let y = height / 2.0 - row as f64 * step_y;
        for col in 0..res {
            let x = col as f64 * step_x - width / 2.0;
            positions.push(Vec3::new(x as f32, y as f32, grid.get(row, col)));
        }
    }

    let stride = res as u32;
    let mut indices = Vec::with_capacity((res - 1) * (res - 1) * 6);
    for row in 0..stride - 1 {
        for col in 0..stride - 1 {
            let top_left = row * stride + col;
            let top_right = top_left + 1;
            let bottom_left = top_left + stride;
            let bottom_right = bottom_left + 1;
            indices.extend_from_slice(&[top_left, bottom_left, top_right]);
            indices.extend_from_slice(&[top_right, bottom_left, bottom_right]);
        }
    }

    let mut mesh = TerrainMesh {
        positions,
        normals: Vec::new(),
        indices,
        material: Material::terrain(),
        center,
        texture: None,
    };
    mesh.recompute_normals();
    Ok(mesh)
}

/// Build a flat sea-level plane covering the tile.
#[must_use]
pub fn build_water_plane(width: f64, height: f64, center: DVec3) -> TerrainMesh {
    let (half_w, half_h) = ((width / 2.0) as f32, (height / 2.0) as f32);
    TerrainMesh {
        positions: vec![
            Vec3::new(-half_w, half_h, 0.0),
            Vec3::new(half_w, half_h, 0.0),
            Vec3::new(-half_w, -half_h, 0.0),
            Vec3::new(half_w, -half_h, 0.0),
        ],
        normals: vec![Vec3::Z; 4],
        indices: vec![0, 2, 1, 1, 2, 3],
        material: Material::water(),
        center,
        texture: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(res: usize) -> ElevationGrid {
        let heights = (0..res * res).map(|i| (i % res) as f32 * 10.0).collect();
        ElevationGrid::from_heights(res, heights).unwrap()
    }

    #[test]
    fn vertex_count_is_res_squared() {
        let grid = ElevationGrid::filled(150, 0.0);
        let mesh = build_terrain_mesh(1000.0, 1000.0, &grid, DVec3::ZERO).unwrap();
        assert_eq!(mesh.vertex_count(), 150 * 150);
        assert_eq!(mesh.triangle_count(), 2 * 149 * 149);
        assert_eq!(mesh.normals().len(), mesh.vertex_count());
    }

    #[test]
    fn grid_spans_full_extent() {
        let grid = ElevationGrid::filled(3, 0.0);
        let mesh = build_terrain_mesh(200.0, 100.0, &grid, DVec3::ZERO).unwrap();
        assert_eq!(mesh.positions()[0], Vec3::new(-100.0, 50.0, 0.0));
        assert_eq!(mesh.positions()[2], Vec3::new(100.0, 50.0, 0.0));
        assert_eq!(mesh.positions()[8], Vec3::new(100.0, -50.0, 0.0));
    }

    #[test]
    fn heights_follow_row_major_grid() {
        let grid = ramp(4);
        let mesh = build_terrain_mesh(30.0, 30.0, &grid, DVec3::ZERO).unwrap();
        for row in 0..4 {
            for col in 0..4 {
                assert_eq!(mesh.positions()[row * 4 + col].z, grid.get(row, col));
            }
        }
    }

    #[test]
    fn flat_grid_normals_point_up() {
        let grid = ElevationGrid::filled(10, -10_000.0);
        let mesh = build_terrain_mesh(500.0, 500.0, &grid, DVec3::ZERO).unwrap();
        assert!(mesh.normals().iter().all(|n| (*n - Vec3::Z).length() < 1e-6));
    }

    #[test]
    fn sloped_grid_normals_lean_downhill() {
        // Height rises toward +X, so normals tilt toward -X.
        let mesh = build_terrain_mesh(30.0, 30.0, &ramp(4), DVec3::ZERO).unwrap();
        for n in mesh.normals() {
            assert!(n.x < 0.0);
            assert!(n.z > 0.0);
            assert!((n.length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn triangles_face_up() {
        let grid = ElevationGrid::filled(3, 0.0);
        let mesh = build_terrain_mesh(10.0, 10.0, &grid, DVec3::ZERO).unwrap();
        for tri in mesh.indices().chunks_exact(3) {
            let p = |i: u32| mesh.positions()[i as usize];
            let n = (p(tri[1]) - p(tri[0])).cross(p(tri[2]) - p(tri[0]));
            assert!(n.z > 0.0);
        }
    }

    #[test]
    fn mesh_is_placed_at_center() {
        let center = DVec3::new(1.0e6, 2.0e6, 0.0);
        let grid = ElevationGrid::filled(2, 5.0);
        let mesh = build_terrain_mesh(10.0, 10.0, &grid, center).unwrap();
        assert_eq!(mesh.center(), center);
        assert_eq!(mesh.world_position(0), DVec3::new(1.0e6 - 5.0, 2.0e6 + 5.0, 5.0));
        assert_eq!(mesh.material(), Material::terrain());
    }

    #[test]
    fn single_cell_grid_is_rejected() {
        let grid = ElevationGrid::filled(1, 0.0);
        assert!(matches!(
            build_terrain_mesh(1.0, 1.0, &grid, DVec3::ZERO),
            Err(DecodeError::InvalidResolution(1))
        ));
    }

    #[test]
    fn texture_link_is_shared() {
        let texture = Arc::new(SourceImage::from_rgba(1, vec![0; 4]).unwrap());
        let grid = ElevationGrid::filled(2, 0.0);
        let mesh = build_terrain_mesh(1.0, 1.0, &grid, DVec3::ZERO)
            .unwrap()
            .with_texture(Arc::clone(&texture));
        assert_eq!(Arc::strong_count(&texture), 2);
        drop(mesh);
        assert_eq!(Arc::strong_count(&texture), 1);
    }

    #[test]
    fn water_plane_sits_at_sea_level() {
        let plane = build_water_plane(100.0, 50.0, DVec3::new(3.0, 4.0, 0.0));
        assert_eq!(plane.vertex_count(), 4);
        assert_eq!(plane.triangle_count(), 2);
        assert!(plane.positions().iter().all(|p| p.z == 0.0));
        assert_eq!(plane.material(), Material::water());
        assert!(plane.texture().is_none());
    }
}
