//! Tile keys.

use std::fmt;

/// Identifies one tile of a quadtree tiling scheme.
///
/// Rows are counted from the north edge, as in XYZ tile URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileKey {
    pub level: u32,
    pub column: u32,
    pub row: u32,
}

impl TileKey {
    /// Deepest level whose morton code still fits in a `u64`.
    pub const MAX_LEVEL: u32 = 31;

    #[must_use]
    pub const fn new(level: u32, column: u32, row: u32) -> Self {
        Self { level, column, row }
    }

    /// Number of tiles along each axis at this level.
    #[must_use]
    pub fn tiles_per_axis(self) -> u64 {
        1u64 << self.level.min(Self::MAX_LEVEL)
    }

    /// Whether column and row exist at this level.
    #[must_use]
    pub fn is_valid(self) -> bool {
        self.level <= Self::MAX_LEVEL
            && u64::from(self.column) < self.tiles_per_axis()
            && u64::from(self.row) < self.tiles_per_axis()
    }

    /// Interleaved column/row bits under a leading level marker.
    ///
    /// Column bits take the even positions and row bits the odd ones. The
    /// marker bit at `2 * level` keeps keys of different levels distinct.
    #[must_use]
    pub fn morton_code(self) -> u64 {
        let level = self.level.min(Self::MAX_LEVEL);
        let mut code = 1u64 << (2 * level);
        for bit in 0..level {
            code |= u64::from((self.column >> bit) & 1) << (2 * bit);
            code |= u64::from((self.row >> bit) & 1) << (2 * bit + 1);
        }
        code
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.level, self.column, self.row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validity_follows_level() {
        assert!(TileKey::new(0, 0, 0).is_valid());
        assert!(TileKey::new(2, 3, 3).is_valid());
        assert!(!TileKey::new(2, 4, 0).is_valid());
        assert!(!TileKey::new(2, 0, 4).is_valid());
        assert!(!TileKey::new(32, 0, 0).is_valid());
    }

    #[test]
    fn morton_code_interleaves_bits() {
        assert_eq!(TileKey::new(0, 0, 0).morton_code(), 1);
        // Level 1: marker 0b100, column -> bit 0, row -> bit 1.
        assert_eq!(TileKey::new(1, 1, 0).morton_code(), 0b101);
        assert_eq!(TileKey::new(1, 0, 1).morton_code(), 0b110);
        assert_eq!(TileKey::new(2, 3, 1).morton_code(), 0b1_0111);
    }

    #[test]
    fn morton_codes_are_unique_across_levels() {
        let mut codes = std::collections::HashSet::new();
        for level in 0..4 {
            let n = 1u32 << level;
            for column in 0..n {
                for row in 0..n {
                    assert!(codes.insert(TileKey::new(level, column, row).morton_code()));
                }
            }
        }
    }

    #[test]
    fn displays_as_url_path() {
        assert_eq!(TileKey::new(12, 1234, 2345).to_string(), "12/1234/2345");
    }
}
