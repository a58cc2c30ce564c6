//! Heightmap source images.

use crate::error::{DecodeError, DecodeResult};

/// A square RGBA8 heightmap as fetched from the tile server.
///
/// The side length is whatever the server returned (256 for standard
/// tiles, 512 for `@2x` tiles); nothing infers it from the request.
#[derive(Clone, PartialEq, Eq)]
pub struct SourceImage {
    size: u32,
    pixels: Vec<u8>,
}

impl SourceImage {
    /// Wrap a raw row-major RGBA8 buffer of `size * size` pixels.
    pub fn from_rgba(size: u32, pixels: Vec<u8>) -> DecodeResult<Self> {
        if size == 0 {
            return Err(DecodeError::MalformedImage {
                width: 0,
                height: 0,
            });
        }
        let expected = size as usize * size as usize * 4;
        if pixels.len() != expected {
            return Err(DecodeError::PixelBufferLength {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self { size, pixels })
    }

    /// Decode an encoded image (PNG) into RGBA8.
    ///
    /// Fails fast on non-square or empty images rather than letting the
    /// sampler index into a buffer of the wrong shape.
    pub fn decode(bytes: &[u8]) -> DecodeResult<Self> {
        let rgba = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = rgba.dimensions();
        if width == 0 || width != height {
            return Err(DecodeError::MalformedImage { width, height });
        }
        Ok(Self {
            size: width,
            pixels: rgba.into_raw(),
        })
    }

    /// Side length in pixels.
    #[must_use]
    pub fn size(&self) -> u32 {
        self.size
    }

    /// RGBA value at `(row, col)`.
    ///
    /// Coordinates past the last row or column are clamped to the edge, so
    /// reading index `size` returns the last pixel instead of panicking.
    #[must_use]
    pub fn pixel(&self, row: u32, col: u32) -> [u8; 4] {
        let last = self.size - 1;
        let row = row.min(last) as usize;
        let col = col.min(last) as usize;
        let offset = (row * self.size as usize + col) * 4;
        [
            self.pixels[offset],
            self.pixels[offset + 1],
            self.pixels[offset + 2],
            self.pixels[offset + 3],
        ]
    }

    /// Raw RGBA bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    /// Memory held by the pixel buffer.
    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.pixels.len()
    }
}

impl std::fmt::Debug for SourceImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceImage")
            .field("size", &self.size)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn encode_png(image: &RgbaImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn decodes_png_and_reads_size_from_image() {
        let mut img = RgbaImage::from_pixel(512, 512, Rgba([0, 0, 0, 255]));
        img.put_pixel(3, 2, Rgba([1, 2, 3, 255]));

        let source = SourceImage::decode(&encode_png(&img)).unwrap();
        assert_eq!(source.size(), 512);
        assert_eq!(source.pixel(2, 3), [1, 2, 3, 255]);
    }

    #[test]
    fn rejects_non_square_image() {
        let img = RgbaImage::new(256, 128);
        let err = SourceImage::decode(&encode_png(&img)).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::MalformedImage {
                width: 256,
                height: 128
            }
        ));
    }

    #[test]
    fn rejects_garbage_bytes() {
        let err = SourceImage::decode(b"not a png").unwrap_err();
        assert!(matches!(err, DecodeError::Image(_)));
    }

    #[test]
    fn rejects_short_buffer() {
        let err = SourceImage::from_rgba(4, vec![0; 10]).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::PixelBufferLength {
                expected: 64,
                actual: 10
            }
        ));
        assert!(SourceImage::from_rgba(0, Vec::new()).is_err());
    }

    #[test]
    fn pixel_reads_past_edge_are_clamped() {
        let mut pixels = vec![0; 2 * 2 * 4];
        // Bottom-right pixel.
        pixels[12..16].copy_from_slice(&[9, 8, 7, 255]);
        let source = SourceImage::from_rgba(2, pixels).unwrap();

        assert_eq!(source.pixel(1, 2), [9, 8, 7, 255]);
        assert_eq!(source.pixel(2, 2), [9, 8, 7, 255]);
    }
}
