//! Subdivision of flat tile meshes for display on a globe.
//!
//! A tile mesh is built flat in projected (web-mercator) space. When the map
//! shows a globe, each vertex is later bent onto the sphere and long
//! triangles become visible facets. Refinement splits triangles until none
//! spans more than a given angle as seen from the sphere's center.

use std::collections::HashMap;

use glam::DVec3;

use crate::{EARTH_RADIUS, EQUATORIAL_CIRCUMFERENCE, TerrainMesh};

/// Maps world-space points onto positions around a sphere at the origin.
pub trait SphereProjection {
    fn to_sphere(&self, world: DVec3) -> DVec3;
}

/// Web-mercator world meters to Earth-centered coordinates.
///
/// World X runs east from the antimeridian over `[0, C)` and world Y runs
/// north from the southern mercator limit over `[0, C)`, where `C` is the
/// equatorial circumference. World Z is elevation above the sphere.
#[derive(Debug, Clone, Copy)]
pub struct WebMercatorSphere {
    pub radius: f64,
}

impl Default for WebMercatorSphere {
    fn default() -> Self {
        Self {
            radius: EARTH_RADIUS,
        }
    }
}

impl SphereProjection for WebMercatorSphere {
    fn to_sphere(&self, world: DVec3) -> DVec3 {
        use std::f64::consts::{PI, TAU};

        let longitude = world.x / EQUATORIAL_CIRCUMFERENCE * TAU - PI;
        let latitude = (world.y / EQUATORIAL_CIRCUMFERENCE * TAU - PI).sinh().atan();
        let r = self.radius + world.z;
        DVec3::new(
            r * latitude.cos() * longitude.cos(),
            r * latitude.cos() * longitude.sin(),
            r * latitude.sin(),
        )
    }
}

/// Something that can refine a mesh for a sphere projection.
pub trait GeometryRefiner {
    fn refine(&self, mesh: &mut TerrainMesh, projection: &dyn SphereProjection);
}

/// Longest-edge bisection until every triangle is within `max_angle`.
///
/// New vertices are appended after the original ones and interpolate
/// position (and therefore height) and normal from the edge they split.
/// Midpoints are shared between the two triangles of an edge, so the
/// result has no cracks. Original vertices keep their index and values.
///
/// Splitting stops once the mesh holds `max_triangles` triangles; the
/// triangles not yet split are kept as they are.
#[derive(Debug, Clone, Copy)]
pub struct SphericalSubdivision {
    /// Maximum angle, in radians, between any two vertices of a triangle.
    pub max_angle: f64,
    /// Triangle count at which splitting stops.
    pub max_triangles: usize,
}

impl SphericalSubdivision {
    /// Default triangle budget per mesh.
    pub const DEFAULT_MAX_TRIANGLES: usize = 1 << 20;

    #[must_use]
    pub fn from_degrees(degrees: f64) -> Self {
        Self {
            max_angle: degrees.to_radians(),
            max_triangles: Self::DEFAULT_MAX_TRIANGLES,
        }
    }

    #[must_use]
    pub fn with_max_triangles(mut self, max_triangles: usize) -> Self {
        self.max_triangles = max_triangles;
        self
    }
}

impl Default for SphericalSubdivision {
    fn default() -> Self {
        Self::from_degrees(10.0)
    }
}

impl GeometryRefiner for SphericalSubdivision {
    fn refine(&self, mesh: &mut TerrainMesh, projection: &dyn SphereProjection) {
        // A non-positive tolerance would never terminate.
        if self.max_angle.is_nan() || self.max_angle <= 0.0 {
            return;
        }

        let mut on_sphere: Vec<DVec3> = (0..mesh.vertex_count())
            .map(|i| projection.to_sphere(mesh.world_position(i)))
            .collect();
        let mut midpoints: HashMap<(u32, u32), u32> = HashMap::new();

        let mut pending: Vec<[u32; 3]> = mesh
            .indices
            .chunks_exact(3)
            .rev()
            .map(|tri| [tri[0], tri[1], tri[2]])
            .collect();
        let mut indices = Vec::with_capacity(mesh.indices.len());

        while let Some(tri) = pending.pop() {
            let angles = [0, 1, 2].map(|e| {
                let (i, j) = (tri[e], tri[(e + 1) % 3]);
                on_sphere[i as usize].angle_between(on_sphere[j as usize])
            });
            let (edge, &widest) = angles
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.total_cmp(b.1))
                .unwrap_or((0, &0.0));

            // Each split adds one triangle.
            let triangles = indices.len() / 3 + pending.len() + 1;
            if widest.is_nan() || widest <= self.max_angle || triangles >= self.max_triangles {
                indices.extend_from_slice(&tri);
                continue;
            }

            let (i, j) = (tri[edge], tri[(edge + 1) % 3]);
            let opposite = tri[(edge + 2) % 3];
            let key = (i.min(j), i.max(j));
            let mid = *midpoints.entry(key).or_insert_with(|| {
                let (a, b) = (i as usize, j as usize);
                let position = (mesh.positions[a] + mesh.positions[b]) * 0.5;
                let normal = (mesh.normals[a] + mesh.normals[b]).normalize_or(mesh.normals[a]);
                mesh.positions.push(position);
                mesh.normals.push(normal);
                let index = mesh.positions.len() - 1;
                on_sphere.push(projection.to_sphere(mesh.world_position(index)));
                index as u32
            });

            // Both halves keep the winding of the parent triangle.
            pending.push([mid, j, opposite]);
            pending.push([i, mid, opposite]);
        }

        mesh.indices = indices;
    }
}

/// Largest angle, in radians, between two vertices of triangle `tri` once
/// projected onto the sphere.
#[must_use]
pub fn triangle_angular_extent(
    mesh: &TerrainMesh,
    tri: usize,
    projection: &dyn SphereProjection,
) -> f64 {
    let corners = [0, 1, 2].map(|k| {
        let index = mesh.indices()[tri * 3 + k] as usize;
        projection.to_sphere(mesh.world_position(index))
    });
    [(0, 1), (1, 2), (2, 0)]
        .into_iter()
        .map(|(a, b)| corners[a].angle_between(corners[b]))
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ElevationGrid, build_terrain_mesh};
    use glam::Vec3;

    /// Level-1 north-west tile of the web-mercator world.
    fn level_one_mesh(res: usize) -> TerrainMesh {
        let side = EQUATORIAL_CIRCUMFERENCE / 2.0;
        let center = DVec3::new(side / 2.0, side * 1.5, 0.0);
        let heights = (0..res * res).map(|i| i as f32 * 3.0).collect();
        let grid = ElevationGrid::from_heights(res, heights).unwrap();
        build_terrain_mesh(side, side, &grid, center).unwrap()
    }

    #[test]
    fn projection_lands_on_sphere() {
        let sphere = WebMercatorSphere::default();
        let c = EQUATORIAL_CIRCUMFERENCE;

        let origin = sphere.to_sphere(DVec3::new(c / 2.0, c / 2.0, 0.0));
        assert!((origin - DVec3::new(EARTH_RADIUS, 0.0, 0.0)).length() < 1e-6);

        let raised = sphere.to_sphere(DVec3::new(c / 4.0, c * 0.9, 100.0));
        assert!((raised.length() - (EARTH_RADIUS + 100.0)).abs() < 1e-6);
    }

    #[test]
    fn triangles_end_within_tolerance() {
        let sphere = WebMercatorSphere::default();
        let refiner = SphericalSubdivision::default();
        let mut mesh = level_one_mesh(4);
        refiner.refine(&mut mesh, &sphere);

        assert!(mesh.triangle_count() > 2 * 9);
        for tri in 0..mesh.triangle_count() {
            assert!(triangle_angular_extent(&mesh, tri, &sphere) <= refiner.max_angle + 1e-9);
        }
    }

    #[test]
    fn original_vertices_are_preserved() {
        let sphere = WebMercatorSphere::default();
        let original = level_one_mesh(5);
        let mut refined = original.clone();
        SphericalSubdivision::from_degrees(5.0).refine(&mut refined, &sphere);

        assert!(refined.vertex_count() > original.vertex_count());
        assert_eq!(
            &refined.positions()[..original.vertex_count()],
            original.positions()
        );
        assert_eq!(
            &refined.normals()[..original.vertex_count()],
            original.normals()
        );
        assert_eq!(refined.normals().len(), refined.vertex_count());
    }

    #[test]
    fn new_vertices_interpolate_height() {
        let sphere = WebMercatorSphere::default();
        let original = level_one_mesh(2);
        let mut refined = original.clone();
        SphericalSubdivision::default().refine(&mut refined, &sphere);

        let (lo, hi) = original
            .positions()
            .iter()
            .fold((f32::MAX, f32::MIN), |(lo, hi), p| (lo.min(p.z), hi.max(p.z)));
        for p in &refined.positions()[original.vertex_count()..] {
            assert!(p.z >= lo && p.z <= hi);
        }
    }

    #[test]
    fn small_tiles_are_untouched() {
        let sphere = WebMercatorSphere::default();
        let side = EQUATORIAL_CIRCUMFERENCE / 1024.0;
        let center = DVec3::new(side * 300.5, side * 600.5, 0.0);
        let grid = ElevationGrid::filled(8, 0.0);
        let original = build_terrain_mesh(side, side, &grid, center).unwrap();
        let mut refined = original.clone();
        SphericalSubdivision::default().refine(&mut refined, &sphere);

        assert_eq!(refined.indices(), original.indices());
        assert_eq!(refined.vertex_count(), original.vertex_count());
    }

    #[test]
    fn tiny_tolerance_stops_at_triangle_budget() {
        let sphere = WebMercatorSphere::default();
        let mut mesh = level_one_mesh(3);
        SphericalSubdivision::from_degrees(1e-9)
            .with_max_triangles(500)
            .refine(&mut mesh, &sphere);

        assert!(mesh.triangle_count() <= 500);
        assert!(mesh.triangle_count() > 2 * 2 * 2);
        assert_eq!(mesh.normals().len(), mesh.vertex_count());
        assert!(mesh.indices().iter().all(|&i| (i as usize) < mesh.vertex_count()));
    }

    #[test]
    fn refined_mesh_keeps_facing_outward() {
        let sphere = WebMercatorSphere::default();
        let mut mesh = level_one_mesh(3);
        SphericalSubdivision::default().refine(&mut mesh, &sphere);

        for tri in mesh.indices().chunks_exact(3) {
            let p = |i: u32| mesh.positions()[i as usize];
            let n: Vec3 = (p(tri[1]) - p(tri[0])).cross(p(tri[2]) - p(tri[0]));
            assert!(n.z > 0.0);
        }
    }
}
