//! Signed distance field glyph generation.
//!
//! Distance fields store, per pixel, the distance to the nearest outline edge
//! instead of coverage, so a single bitmap renders sharply across a wide range
//! of sizes.
//!
//! # Encoding
//!
//! Distances are normalized by the configured spread and quantized to 8 bits:
//! - Inside the glyph: above 127
//! - Outside the glyph: below 127
//! - On the edge: 128
//!
//! # Modes
//!
//! - [`SdfMode::Sdf`]: one channel holding the true distance.
//! - [`SdfMode::Msdf`]: three channels of per-color pseudo distance; the median
//!   reconstructs sharp corners.
//! - [`SdfMode::Mtsdf`]: MSDF plus the true distance in alpha.
//!
//! # Example
//!
//! ```ignore
//! use lumina_font::*;
//!
//! let generator = SdfGenerator::new(SdfConfig::new().with_mode(SdfMode::Msdf).spread(4.0));
//! let bitmap = generator.generate(&outline, 48.0, font.units_per_em());
//! ```

pub mod coloring;
pub mod distance;
pub mod shape;

use lumina_core::math::{Vec2, vec2};
use lumina_core::profiling::profile_function;

use crate::outline::GlyphOutline;

pub use coloring::{DEFAULT_ANGLE_THRESHOLD, EdgeColor, color_edges};
pub use distance::{EdgeDistance, channel_distances, median, signed_distance};
pub use shape::{Curve, EdgeContour, EdgeSegment, Shape, outline_to_shape};

/// Pixel size glyphs are rendered at for atlas storage.
pub const SDF_BASE_SIZE: f32 = 48.0;

/// Distance field spread used when none is configured.
pub const SDF_DEFAULT_SPREAD: f32 = 4.0;

/// Distance field flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SdfMode {
    /// Single-channel true distance.
    #[default]
    Sdf,
    /// Multi-channel pseudo distance (RGB).
    Msdf,
    /// Multi-channel pseudo distance plus true distance (RGBA).
    Mtsdf,
}

impl SdfMode {
    /// Bytes per pixel.
    pub fn channels(&self) -> u32 {
        match self {
            Self::Sdf => 1,
            Self::Msdf => 3,
            Self::Mtsdf => 4,
        }
    }

    /// Check if this mode uses edge coloring.
    pub fn is_multichannel(&self) -> bool {
        !matches!(self, Self::Sdf)
    }
}

/// SDF generation configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SdfConfig {
    /// Field flavour
    pub mode: SdfMode,
    /// Distance in pixels mapped onto the full 0..255 range on each side of the edge.
    /// Typical values: 2.0 to 8.0
    pub spread: f32,
    /// Turn angle in radians above which a join is treated as a corner (MSDF only)
    pub angle_threshold: f32,
    /// Pixel size used when rendering glyphs for the atlas
    pub base_size: f32,
}

impl Default for SdfConfig {
    fn default() -> Self {
        Self {
            mode: SdfMode::Sdf,
            spread: SDF_DEFAULT_SPREAD,
            angle_threshold: DEFAULT_ANGLE_THRESHOLD,
            base_size: SDF_BASE_SIZE,
        }
    }
}

impl SdfConfig {
    /// Create a new SDF config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Multi-channel preset for crisp corners at large sizes.
    pub fn msdf() -> Self {
        Self {
            mode: SdfMode::Msdf,
            ..Default::default()
        }
    }

    /// MSDF with a true-distance alpha channel, for outlines and glow effects.
    pub fn mtsdf() -> Self {
        Self {
            mode: SdfMode::Mtsdf,
            spread: 6.0,
            ..Default::default()
        }
    }

    pub fn with_mode(mut self, mode: SdfMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the spread in pixels. Non-positive values fall back to the default.
    pub fn spread(mut self, spread: f32) -> Self {
        self.spread = if spread > 0.0 && spread.is_finite() {
            spread
        } else {
            SDF_DEFAULT_SPREAD
        };
        self
    }

    pub fn angle_threshold(mut self, radians: f32) -> Self {
        self.angle_threshold = radians.clamp(0.0, std::f32::consts::PI);
        self
    }

    pub fn base_size(mut self, size: f32) -> Self {
        self.base_size = size.max(1.0);
        self
    }

    /// Padding added on every side of a glyph bitmap.
    pub fn padding(&self) -> u32 {
        self.spread.ceil() as u32
    }
}

/// A rendered distance field for one glyph.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SdfGlyphBitmap {
    /// Row-major pixels, top row first, channels interleaved.
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// 1 (SDF), 3 (MSDF) or 4 (MTSDF)
    pub channels: u32,
    /// Pixels from the pen position to the left edge of the bitmap.
    pub bearing_x: f32,
    /// Pixels from the baseline up to the top edge of the bitmap.
    pub bearing_y: f32,
    pub advance: f32,
    /// Pixels of padding around the glyph on every side.
    pub padding: u32,
}

impl SdfGlyphBitmap {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Channel values of the pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let start = ((y * self.width + x) * self.channels) as usize;
        self.data.get(start..start + self.channels as usize)
    }
}

/// Map a signed pixel distance onto `0..=255`, inside above 127.
pub fn quantize(distance: f32, spread: f32) -> u8 {
    let value = (0.5 - distance / (2.0 * spread)).clamp(0.0, 1.0);
    (value * 255.0).round() as u8
}

/// Converts outlines into distance field bitmaps.
#[derive(Debug, Clone, Default)]
pub struct SdfGenerator {
    config: SdfConfig,
}

impl SdfGenerator {
    pub fn new(config: SdfConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SdfConfig {
        &self.config
    }

    /// Render `outline` at `font_size` pixels per em.
    pub fn generate(&self, outline: &GlyphOutline, font_size: f32, units_per_em: u16) -> SdfGlyphBitmap {
        profile_function!();

        let mode = self.config.mode;
        let spread = self.config.spread;
        let padding = self.config.padding();

        let scale = if units_per_em > 0 && font_size.is_finite() && font_size > 0.0 {
            font_size / units_per_em as f32
        } else {
            0.0
        };
        let advance = outline.advance_width * scale;

        let empty = SdfGlyphBitmap {
            channels: mode.channels(),
            advance,
            padding,
            ..Default::default()
        };
        if outline.is_empty() || scale == 0.0 {
            return empty;
        }

        let mut shape = outline_to_shape(outline, scale);
        if shape.is_empty() {
            return empty;
        }
        if mode.is_multichannel() {
            color_edges(&mut shape, self.config.angle_threshold);
        }

        let bounds = outline.bounds;
        let width = (bounds.width() * scale).round() as u32 + 2 * padding;
        let height = (bounds.height() * scale).round() as u32 + 2 * padding;
        let left = bounds.x_min * scale - padding as f32;
        let top = bounds.y_max * scale + padding as f32;

        let channels = mode.channels() as usize;
        let mut data = Vec::with_capacity(width as usize * height as usize * channels);

        for row in 0..height {
            for col in 0..width {
                let point = vec2(left + col as f32 + 0.5, top - row as f32 - 0.5);
                let true_distance = signed_distance(&shape, point);
                match mode {
                    SdfMode::Sdf => data.push(quantize(true_distance, spread)),
                    SdfMode::Msdf | SdfMode::Mtsdf => {
                        let [r, g, b] = corrected_channels(&shape, point, true_distance);
                        data.extend([r, g, b].map(|d| quantize(d, spread)));
                        if mode == SdfMode::Mtsdf {
                            data.push(quantize(true_distance, spread));
                        }
                    }
                }
            }
        }

        tracing::trace!(
            "Generated {:?} bitmap {}x{} (scale {:.4})",
            mode,
            width,
            height,
            scale
        );

        SdfGlyphBitmap {
            data,
            width,
            height,
            channels: mode.channels(),
            bearing_x: left,
            bearing_y: top,
            advance,
            padding,
        }
    }
}

/// Channel distances, replaced by the true distance when their median
/// disagrees with it about which side of the outline the pixel is on.
fn corrected_channels(shape: &Shape, point: Vec2, true_distance: f32) -> [f32; 3] {
    let channels = channel_distances(shape, point);
    let [r, g, b] = channels;
    let m = median(r, g, b);
    if (m < 0.0) != (true_distance < 0.0) {
        [true_distance; 3]
    } else {
        channels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outline::{Contour, OutlinePoint};

    // ========================================
    // Config Tests
    // ========================================

    #[test]
    fn test_sdf_config_default() {
        let config = SdfConfig::default();
        assert_eq!(config.mode, SdfMode::Sdf);
        assert_eq!(config.spread, SDF_DEFAULT_SPREAD);
        assert_eq!(config.base_size, SDF_BASE_SIZE);
        assert_eq!(config.padding(), 4);
    }

    #[test]
    fn test_sdf_config_builder() {
        let config = SdfConfig::new()
            .with_mode(SdfMode::Mtsdf)
            .spread(2.5)
            .angle_threshold(10.0)
            .base_size(0.0);
        assert_eq!(config.mode, SdfMode::Mtsdf);
        assert_eq!(config.padding(), 3);
        assert_eq!(config.angle_threshold, std::f32::consts::PI);
        assert_eq!(config.base_size, 1.0);
        assert_eq!(SdfConfig::new().spread(-1.0).spread, SDF_DEFAULT_SPREAD);
    }

    #[test]
    fn test_mode_channels() {
        assert_eq!(SdfMode::Sdf.channels(), 1);
        assert_eq!(SdfMode::Msdf.channels(), 3);
        assert_eq!(SdfMode::Mtsdf.channels(), 4);
        assert!(SdfConfig::msdf().mode.is_multichannel());
    }

    // ========================================
    // Generation Tests
    // ========================================

    fn square(side: f32) -> GlyphOutline {
        let mut outline = GlyphOutline {
            contours: vec![Contour {
                points: vec![
                    OutlinePoint::on(0.0, 0.0),
                    OutlinePoint::on(0.0, side),
                    OutlinePoint::on(side, side),
                    OutlinePoint::on(side, 0.0),
                ],
            }],
            advance_width: side + 100.0,
            ..Default::default()
        };
        outline.recompute_bounds();
        outline
    }

    #[test]
    fn test_quantize() {
        assert_eq!(quantize(0.0, 4.0), 128);
        assert_eq!(quantize(-4.0, 4.0), 255);
        assert_eq!(quantize(4.0, 4.0), 0);
        assert_eq!(quantize(100.0, 4.0), 0);
        assert!(quantize(-0.5, 4.0) > 127);
    }

    #[test]
    fn test_square_dimensions() {
        let generator = SdfGenerator::default();
        let bitmap = generator.generate(&square(500.0), 32.0, 1000);
        let padding = generator.config().padding();
        assert_eq!(bitmap.width - 2 * padding, 16);
        assert_eq!(bitmap.height - 2 * padding, 16);
        assert_eq!(bitmap.data.len(), (bitmap.width * bitmap.height) as usize);
        assert_eq!(bitmap.advance, 600.0 * 0.032);
        assert_eq!(bitmap.bearing_x, -(padding as f32));
        assert!((bitmap.bearing_y - (16.0 + padding as f32)).abs() < 1e-4);
    }

    #[test]
    fn test_center_inside_corner_outside() {
        let bitmap = SdfGenerator::default().generate(&square(500.0), 32.0, 1000);
        let center = bitmap.pixel(bitmap.width / 2, bitmap.height / 2).unwrap()[0];
        let corner = bitmap.pixel(0, 0).unwrap()[0];
        assert!(center > 127);
        assert!(corner < 127);
    }

    #[test]
    fn test_msdf_and_mtsdf_channels() {
        for mode in [SdfMode::Msdf, SdfMode::Mtsdf] {
            let generator = SdfGenerator::new(SdfConfig::new().with_mode(mode));
            let bitmap = generator.generate(&square(500.0), 32.0, 1000);
            assert_eq!(bitmap.channels, mode.channels());
            assert_eq!(
                bitmap.data.len(),
                (bitmap.width * bitmap.height * mode.channels()) as usize
            );
            let center = bitmap.pixel(bitmap.width / 2, bitmap.height / 2).unwrap();
            let m = median(center[0] as f32, center[1] as f32, center[2] as f32);
            assert!(m > 127.0);
            let corner = bitmap.pixel(0, 0).unwrap();
            let m = median(corner[0] as f32, corner[1] as f32, corner[2] as f32);
            assert!(m < 127.0);
        }
    }

    #[test]
    fn test_empty_outline_has_advance_only() {
        let outline = GlyphOutline::empty(250.0, 0.0, Default::default());
        let bitmap = SdfGenerator::default().generate(&outline, 20.0, 1000);
        assert!(bitmap.is_empty());
        assert!(bitmap.data.is_empty());
        assert_eq!(bitmap.advance, 5.0);
    }

    #[test]
    fn test_zero_units_per_em_is_empty() {
        let bitmap = SdfGenerator::default().generate(&square(500.0), 32.0, 0);
        assert!(bitmap.is_empty());
        assert_eq!(bitmap.advance, 0.0);
    }
}
