//! Terrain-RGB elevation decoding.

/// Elevation of the `(0, 0, 0)` color in meters.
pub const ELEVATION_OFFSET: f64 = -10_000.0;

/// Meters per step of the 24-bit color value.
pub const ELEVATION_SCALE: f64 = 0.1;

/// Decode a Terrain-RGB color into elevation in meters.
///
/// The three channels form a big-endian 24-bit integer which is scaled to
/// 0.1 m steps above a -10,000 m floor:
///
/// ```text
/// elevation = -10000 + (R * 65536 + G * 256 + B) * 0.1
/// ```
#[must_use]
pub fn decode_elevation(r: u8, g: u8, b: u8) -> f64 {
    let value = (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b);
    ELEVATION_OFFSET + f64::from(value) * ELEVATION_SCALE
}
