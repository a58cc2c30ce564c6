//! Tile containers.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use terrain_rgb_decode::{SourceImage, TerrainMesh};

use crate::{TileBounds, TileKey};

/// Shared handle to a tile owned by the scene thread.
///
/// Tiles are not `Send`: they are created, filled and read on the thread
/// that owns the [`crate::TileController`].
pub type TileHandle = Rc<RefCell<Tile>>;

/// Memory and geometry totals of a tile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceInfo {
    pub geometry_bytes: usize,
    pub texture_bytes: usize,
    pub vertex_count: usize,
}

/// Meshes and resources for one tile.
///
/// A tile is usable right away. It stays empty until its request finishes,
/// and stays empty for good if the request fails.
#[derive(Debug)]
pub struct Tile {
    key: TileKey,
    bounds: TileBounds,
    objects: Vec<TerrainMesh>,
    owned_texture: Option<Arc<SourceImage>>,
    resource_info: Option<ResourceInfo>,
}

impl Tile {
    #[must_use]
    pub fn new(key: TileKey, bounds: TileBounds) -> Self {
        Self {
            key,
            bounds,
            objects: Vec::new(),
            owned_texture: None,
            resource_info: None,
        }
    }

    #[must_use]
    pub fn key(&self) -> TileKey {
        self.key
    }

    #[must_use]
    pub fn bounds(&self) -> &TileBounds {
        &self.bounds
    }

    /// Meshes to render for this tile.
    #[must_use]
    pub fn objects(&self) -> &[TerrainMesh] {
        &self.objects
    }

    #[must_use]
    pub fn owned_texture(&self) -> Option<&Arc<SourceImage>> {
        self.owned_texture.as_ref()
    }

    /// Whether any terrain has been attached.
    #[must_use]
    pub fn has_content(&self) -> bool {
        !self.objects.is_empty()
    }

    pub fn add_object(&mut self, mesh: TerrainMesh) {
        self.objects.push(mesh);
    }

    /// Make this tile responsible for releasing `texture`.
    ///
    /// Replaces any texture the tile held before.
    pub fn add_owned_texture(&mut self, texture: Arc<SourceImage>) {
        self.owned_texture = Some(texture);
    }

    /// Drop cached resource totals after the tile's contents changed.
    pub fn invalidate_resource_info(&mut self) {
        self.resource_info = None;
    }

    /// Resource totals, computed on first use after an invalidation.
    pub fn resource_info(&mut self) -> ResourceInfo {
        if let Some(info) = self.resource_info {
            return info;
        }
        let info = ResourceInfo {
            geometry_bytes: self.objects.iter().map(TerrainMesh::geometry_byte_len).sum(),
            texture_bytes: self.owned_texture.as_ref().map_or(0, |t| t.byte_len()),
            vertex_count: self.objects.iter().map(TerrainMesh::vertex_count).sum(),
        };
        self.resource_info = Some(info);
        info
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;
    use terrain_rgb_decode::{ElevationGrid, build_terrain_mesh};

    fn bounds() -> TileBounds {
        TileBounds {
            width: 10.0,
            height: 10.0,
            center: DVec3::ZERO,
        }
    }

    #[test]
    fn new_tile_is_empty() {
        let mut tile = Tile::new(TileKey::new(1, 0, 0), bounds());
        assert!(!tile.has_content());
        assert!(tile.owned_texture().is_none());
        assert_eq!(tile.resource_info(), ResourceInfo::default());
    }

    #[test]
    fn resource_info_is_cached_until_invalidated() {
        let mut tile = Tile::new(TileKey::new(1, 0, 0), bounds());
        assert_eq!(tile.resource_info().vertex_count, 0);

        let grid = ElevationGrid::filled(3, 0.0);
        tile.add_object(build_terrain_mesh(10.0, 10.0, &grid, DVec3::ZERO).unwrap());
        assert_eq!(tile.resource_info().vertex_count, 0);

        tile.invalidate_resource_info();
        assert_eq!(tile.resource_info().vertex_count, 9);
    }

    #[test]
    fn texture_is_released_with_tile() {
        let texture = Arc::new(SourceImage::from_rgba(2, vec![0; 16]).unwrap());
        let weak = Arc::downgrade(&texture);

        let mut tile = Tile::new(TileKey::new(1, 0, 0), bounds());
        tile.add_owned_texture(texture);
        tile.invalidate_resource_info();
        assert_eq!(tile.resource_info().texture_bytes, 16);

        drop(tile);
        assert!(weak.upgrade().is_none());
    }
}
