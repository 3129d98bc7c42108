//! Text shaping seam.
//!
//! Full OpenType shaping lives outside this crate; the run cache reaches it
//! only through [`TextShaper`]. [`NominalShaper`] covers simple scripts with
//! a plain `cmap` lookup and `hmtx` advances.

use lumina_core::profiling::profile_function;

use crate::error::FontResult;
use crate::font::Font;

/// One glyph produced by shaping, in font units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapedGlyph {
    pub glyph_id: u16,
    /// Byte offset of the source character in the shaped text
    pub cluster: u32,
    pub x_advance: f32,
    pub y_advance: f32,
    pub x_offset: f32,
    pub y_offset: f32,
}

/// Converts text into positioned glyph ids.
pub trait TextShaper: Send + Sync {
    fn shape(&mut self, font: &Font, text: &str) -> FontResult<Vec<ShapedGlyph>>;
}

/// One glyph per character, no substitution or kerning.
#[derive(Debug, Clone, Copy, Default)]
pub struct NominalShaper;

impl TextShaper for NominalShaper {
    fn shape(&mut self, font: &Font, text: &str) -> FontResult<Vec<ShapedGlyph>> {
        profile_function!();

        Ok(text
            .char_indices()
            .map(|(cluster, ch)| {
                let glyph_id = font.glyph_id(ch as u32);
                ShapedGlyph {
                    glyph_id,
                    cluster: cluster as u32,
                    x_advance: font.glyph_metrics(glyph_id).advance_width as f32,
                    y_advance: 0.0,
                    x_offset: 0.0,
                    y_offset: 0.0,
                }
            })
            .collect())
    }
}
