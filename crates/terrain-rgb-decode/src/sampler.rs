//! Nearest-neighbor heightmap sampling.

use crate::SourceImage;
use crate::elevation::decode_elevation;
use crate::error::{DecodeError, DecodeResult};

/// A `res x res` grid of elevations in meters, stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct ElevationGrid {
    res: usize,
    heights: Vec<f32>,
}

impl ElevationGrid {
    /// Grid with every cell at `elevation`.
    #[must_use]
    pub fn filled(res: usize, elevation: f32) -> Self {
        Self {
            res,
            heights: vec![elevation; res * res],
        }
    }

    /// Wrap row-major heights; `heights` must hold `res * res` cells.
    pub fn from_heights(res: usize, heights: Vec<f32>) -> DecodeResult<Self> {
        if heights.len() != res * res {
            return Err(DecodeError::InvalidResolution(res));
        }
        Ok(Self { res, heights })
    }

    /// Cells per side.
    #[must_use]
    pub fn res(&self) -> usize {
        self.res
    }

    /// Elevation at `(row, col)`.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.heights[row * self.res + col]
    }

    /// All cells, row-major.
    #[must_use]
    pub fn heights(&self) -> &[f32] {
        &self.heights
    }

    /// Lowest and highest elevation, or `None` for an empty grid.
    #[must_use]
    pub fn min_max(&self) -> Option<(f32, f32)> {
        self.heights.iter().fold(None, |acc, &h| match acc {
            None => Some((h, h)),
            Some((lo, hi)) => Some((lo.min(h), hi.max(h))),
        })
    }
}

/// Downsample a heightmap into a `res x res` elevation grid.
///
/// Output cell `(row, col)` reads source pixel
/// `(floor(row / res * size), floor(col / res * size))`. No interpolation
/// happens between pixels. The index is computed in integer arithmetic so
/// large sizes cannot round up onto the next pixel, and the image clamps any
/// read past its last row or column.
pub fn sample_heightmap(image: &SourceImage, res: usize) -> DecodeResult<ElevationGrid> {
    if res == 0 {
        return Err(DecodeError::InvalidResolution(res));
    }

    let size = image.size() as usize;
    let mut heights = Vec::with_capacity(res * res);

    for row in 0..res {
        let src_row = (row * size / res) as u32;
        for col in 0..res {
            let src_col = (col * size / res) as u32;
            let [r, g, b, _] = image.pixel(src_row, src_col);
            heights.push(decode_elevation(r, g, b) as f32);
        }
    }

    Ok(ElevationGrid { res, heights })
}
