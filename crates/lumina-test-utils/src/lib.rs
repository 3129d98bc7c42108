//! Test utilities for Lumina font crates.
//!
//! Real font files are large and licensed, so tests build their fonts byte by
//! byte. The table builders here write exactly the layouts `lumina-font`
//! parses, and [`TrueTypeFontBuilder`] / [`CffFontBuilder`] assemble them into
//! complete sfnt files.
//!
//! # Example
//!
//! ```rust
//! use lumina_test_utils::{TestGlyph, TrueTypeFontBuilder};
//!
//! let bytes = TrueTypeFontBuilder::new()
//!     .glyph(TestGlyph::Empty, 500)
//!     .glyph(TestGlyph::rect(100, 0, 600, 700), 700)
//!     .map('A', 1)
//!     .build();
//! assert_eq!(&bytes[0..4], &[0, 1, 0, 0]);
//! ```
//!
//! # Fixtures
//!
//! [`fixtures`] has ready-made fonts for the common cases: a square, a
//! variable font with a weight axis, a CFF font with subroutines.

pub mod cff;
pub mod fixtures;
pub mod glyf;
pub mod sfnt;
pub mod tables;
pub mod variation;

mod write;

pub use cff::{CffBuilder, Charstring};
pub use glyf::{Component, Point, TestGlyph};
pub use sfnt::SfntBuilder;
pub use tables::FontBox;
pub use variation::{Axis, Instance, Tuple};

/// Metadata shared by both outline flavours.
#[derive(Debug, Clone, PartialEq)]
struct Common {
    units_per_em: u16,
    ascender: i16,
    descender: i16,
    line_gap: i16,
    family: String,
    subfamily: String,
    cmap: Vec<(u32, u16)>,
    extra_tables: Vec<([u8; 4], Vec<u8>)>,
}

impl Default for Common {
    fn default() -> Self {
        Self {
            units_per_em: 1000,
            ascender: 800,
            descender: -200,
            line_gap: 0,
            family: "Lumina Test".to_string(),
            subfamily: "Regular".to_string(),
            cmap: Vec::new(),
            extra_tables: Vec::new(),
        }
    }
}

impl Common {
    fn write(&self, mut sfnt: SfntBuilder, bbox: FontBox, metrics: &[(u16, i16)], long_loca: bool) -> SfntBuilder {
        let advance_max = metrics.iter().map(|m| m.0).max().unwrap_or(0);
        sfnt = sfnt
            .table(b"head", tables::head_table(self.units_per_em, bbox, long_loca))
            .table(
                b"hhea",
                tables::hhea_table(
                    self.ascender,
                    self.descender,
                    self.line_gap,
                    advance_max,
                    metrics.len() as u16,
                ),
            )
            .table(b"maxp", tables::maxp_table(metrics.len() as u16))
            .table(b"hmtx", tables::hmtx_table(metrics))
            .table(b"cmap", tables::cmap_table(&self.cmap))
            .table(b"name", tables::name_table(&self.family, &self.subfamily, &[]));
        for (tag, data) in &self.extra_tables {
            sfnt = sfnt.table(tag, data.clone());
        }
        sfnt
    }
}

fn union(a: FontBox, b: FontBox) -> FontBox {
    FontBox {
        x_min: a.x_min.min(b.x_min),
        y_min: a.y_min.min(b.y_min),
        x_max: a.x_max.max(b.x_max),
        y_max: a.y_max.max(b.y_max),
    }
}

/// Builds a `glyf`-flavoured font, optionally variable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrueTypeFontBuilder {
    common: Common,
    glyphs: Vec<(TestGlyph, u16)>,
    long_loca: bool,
    axes: Vec<Axis>,
    instances: Vec<Instance>,
    avar: Option<Vec<Vec<(f32, f32)>>>,
    variations: Vec<(u16, Vec<Tuple>)>,
}

impl TrueTypeFontBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn units_per_em(mut self, units_per_em: u16) -> Self {
        self.common.units_per_em = units_per_em;
        self
    }

    pub fn vertical_metrics(mut self, ascender: i16, descender: i16, line_gap: i16) -> Self {
        self.common.ascender = ascender;
        self.common.descender = descender;
        self.common.line_gap = line_gap;
        self
    }

    pub fn family(mut self, family: &str, subfamily: &str) -> Self {
        self.common.family = family.to_string();
        self.common.subfamily = subfamily.to_string();
        self
    }

    /// Append a glyph with its advance width; ids are assigned in order.
    pub fn glyph(mut self, glyph: TestGlyph, advance: u16) -> Self {
        self.glyphs.push((glyph, advance));
        self
    }

    pub fn map(self, ch: char, glyph_id: u16) -> Self {
        self.map_codepoint(ch as u32, glyph_id)
    }

    pub fn map_codepoint(mut self, codepoint: u32, glyph_id: u16) -> Self {
        self.common.cmap.push((codepoint, glyph_id));
        self
    }

    pub fn long_loca(mut self) -> Self {
        self.long_loca = true;
        self
    }

    pub fn axis(mut self, axis: Axis) -> Self {
        self.axes.push(axis);
        self
    }

    pub fn instance(mut self, instance: Instance) -> Self {
        self.instances.push(instance);
        self
    }

    pub fn avar(mut self, maps: Vec<Vec<(f32, f32)>>) -> Self {
        self.avar = Some(maps);
        self
    }

    pub fn variation(mut self, glyph_id: u16, tuples: Vec<Tuple>) -> Self {
        self.variations.push((glyph_id, tuples));
        self
    }

    /// Add or replace an arbitrary table.
    pub fn table(mut self, tag: &[u8; 4], data: Vec<u8>) -> Self {
        self.common.extra_tables.push((*tag, data));
        self
    }

    /// The assembled sfnt before serialization, for dropping tables.
    pub fn sfnt(&self) -> SfntBuilder {
        let metrics: Vec<(u16, i16)> = self
            .glyphs
            .iter()
            .map(|(glyph, advance)| (*advance, glyph.bounds().x_min))
            .collect();
        let bbox = self
            .glyphs
            .iter()
            .map(|(glyph, _)| glyph.bounds())
            .reduce(union)
            .unwrap_or_default();

        let glyphs: Vec<TestGlyph> = self.glyphs.iter().map(|(g, _)| g.clone()).collect();
        let glyf = glyf::glyf_tables(&glyphs, self.long_loca);

        let mut sfnt = SfntBuilder::truetype()
            .table(b"glyf", glyf.glyf)
            .table(b"loca", glyf.loca);
        if !self.axes.is_empty() {
            sfnt = sfnt.table(b"fvar", variation::fvar_table(&self.axes, &self.instances));
            if let Some(maps) = &self.avar {
                sfnt = sfnt.table(b"avar", variation::avar_table(maps));
            }
            if !self.variations.is_empty() {
                sfnt = sfnt.table(
                    b"gvar",
                    variation::gvar_table(self.axes.len() as u16, glyphs.len() as u16, &self.variations),
                );
            }
        }
        self.common.write(sfnt, bbox, &metrics, self.long_loca)
    }

    pub fn build(&self) -> Vec<u8> {
        self.sfnt().build()
    }
}

/// Builds an `OTTO` font with CFF outlines.
#[derive(Debug, Clone, PartialEq)]
pub struct CffFontBuilder {
    common: Common,
    cff: CffBuilder,
    advances: Vec<u16>,
}

impl Default for CffFontBuilder {
    fn default() -> Self {
        Self {
            common: Common::default(),
            cff: CffBuilder::new("LuminaTest-Regular"),
            advances: Vec::new(),
        }
    }
}

impl CffFontBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn units_per_em(mut self, units_per_em: u16) -> Self {
        self.common.units_per_em = units_per_em;
        self
    }

    /// Append a charstring with its `hmtx` advance width.
    pub fn glyph(mut self, charstring: Vec<u8>, advance: u16) -> Self {
        self.cff = self.cff.glyph(charstring);
        self.advances.push(advance);
        self
    }

    pub fn global_subr(mut self, subr: Vec<u8>) -> Self {
        self.cff = self.cff.global_subr(subr);
        self
    }

    pub fn local_subr(mut self, subr: Vec<u8>) -> Self {
        self.cff = self.cff.local_subr(subr);
        self
    }

    pub fn map(mut self, ch: char, glyph_id: u16) -> Self {
        self.common.cmap.push((ch as u32, glyph_id));
        self
    }

    pub fn sfnt(&self) -> SfntBuilder {
        let metrics: Vec<(u16, i16)> = self.advances.iter().map(|&a| (a, 0)).collect();
        let sfnt = SfntBuilder::opentype().table(b"CFF ", self.cff.build());
        self.common.write(sfnt, FontBox::default(), &metrics, false)
    }

    pub fn build(&self) -> Vec<u8> {
        self.sfnt().build()
    }
}
