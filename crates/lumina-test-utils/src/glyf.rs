//! `glyf`/`loca` builders.

use crate::tables::FontBox;
use crate::write::{PutBe, pad_to};

/// A point of a simple glyph contour in font units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: i16,
    pub y: i16,
    pub on_curve: bool,
}

impl Point {
    pub const fn on(x: i16, y: i16) -> Self {
        Self { x, y, on_curve: true }
    }

    pub const fn off(x: i16, y: i16) -> Self {
        Self {
            x,
            y,
            on_curve: false,
        }
    }
}

/// One reference of a composite glyph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Component {
    pub glyph_id: u16,
    pub dx: i16,
    pub dy: i16,
    /// Uniform scale written as F2Dot14.
    pub scale: Option<f32>,
    pub use_my_metrics: bool,
}

impl Component {
    pub fn new(glyph_id: u16, dx: i16, dy: i16) -> Self {
        Self {
            glyph_id,
            dx,
            dy,
            scale: None,
            use_my_metrics: false,
        }
    }

    pub fn scaled(mut self, scale: f32) -> Self {
        self.scale = Some(scale);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TestGlyph {
    /// No outline data (zero-length `loca` entry), like a space.
    Empty,
    Simple(Vec<Vec<Point>>),
    Composite(Vec<Component>),
}

impl TestGlyph {
    /// Axis-aligned rectangle, wound clockwise as TrueType expects.
    pub fn rect(x_min: i16, y_min: i16, x_max: i16, y_max: i16) -> Self {
        TestGlyph::Simple(vec![vec![
            Point::on(x_min, y_min),
            Point::on(x_min, y_max),
            Point::on(x_max, y_max),
            Point::on(x_max, y_min),
        ]])
    }

    /// Bounds of the simple outline; components are not resolved.
    pub fn bounds(&self) -> FontBox {
        match self {
            TestGlyph::Simple(contours) => {
                let mut points = contours.iter().flatten();
                let Some(first) = points.next() else {
                    return FontBox::default();
                };
                points.fold(
                    FontBox {
                        x_min: first.x,
                        y_min: first.y,
                        x_max: first.x,
                        y_max: first.y,
                    },
                    |b, p| FontBox {
                        x_min: b.x_min.min(p.x),
                        y_min: b.y_min.min(p.y),
                        x_max: b.x_max.max(p.x),
                        y_max: b.y_max.max(p.y),
                    },
                )
            }
            _ => FontBox::default(),
        }
    }

    /// Encoded glyph record; empty for [`TestGlyph::Empty`].
    pub fn encode(&self) -> Vec<u8> {
        match self {
            TestGlyph::Empty => Vec::new(),
            TestGlyph::Simple(contours) => encode_simple(contours, self.bounds()),
            TestGlyph::Composite(components) => encode_composite(components),
        }
    }
}

const ON_CURVE_POINT: u8 = 0x01;

const ARG_1_AND_2_ARE_WORDS: u16 = 0x0001;
const ARGS_ARE_XY_VALUES: u16 = 0x0002;
const WE_HAVE_A_SCALE: u16 = 0x0008;
const MORE_COMPONENTS: u16 = 0x0020;
const USE_MY_METRICS: u16 = 0x0200;

// Coordinates are always written as signed word deltas, which keeps the
// encoder trivial while exercising the general decoding path.
fn encode_simple(contours: &[Vec<Point>], bounds: FontBox) -> Vec<u8> {
    let mut out = Vec::new();
    out.put_i16(contours.len() as i16);
    out.put_i16(bounds.x_min);
    out.put_i16(bounds.y_min);
    out.put_i16(bounds.x_max);
    out.put_i16(bounds.y_max);

    let mut end = 0usize;
    for contour in contours {
        end += contour.len();
        out.put_u16(end as u16 - 1);
    }
    out.put_u16(0); // instructionLength

    let points: Vec<&Point> = contours.iter().flatten().collect();
    for p in &points {
        out.put_u8(if p.on_curve { ON_CURVE_POINT } else { 0 });
    }
    let mut prev = 0i16;
    for p in &points {
        out.put_i16(p.x - prev);
        prev = p.x;
    }
    prev = 0;
    for p in &points {
        out.put_i16(p.y - prev);
        prev = p.y;
    }
    out
}

fn encode_composite(components: &[Component]) -> Vec<u8> {
    let mut out = Vec::new();
    out.put_i16(-1);
    out.extend_from_slice(&[0; 8]); // bounds are recomputed by the parser
    for (i, component) in components.iter().enumerate() {
        let mut flags = ARG_1_AND_2_ARE_WORDS | ARGS_ARE_XY_VALUES;
        if i + 1 < components.len() {
            flags |= MORE_COMPONENTS;
        }
        if component.scale.is_some() {
            flags |= WE_HAVE_A_SCALE;
        }
        if component.use_my_metrics {
            flags |= USE_MY_METRICS;
        }
        out.put_u16(flags);
        out.put_u16(component.glyph_id);
        out.put_i16(component.dx);
        out.put_i16(component.dy);
        if let Some(scale) = component.scale {
            out.put_f2dot14(scale);
        }
    }
    out
}

/// Encoded `glyf` and `loca` tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyfTables {
    pub glyf: Vec<u8>,
    pub loca: Vec<u8>,
}

/// Concatenate glyph records and write their offsets, short or long.
pub fn glyf_tables(glyphs: &[TestGlyph], long_loca: bool) -> GlyfTables {
    let mut glyf = Vec::new();
    let mut offsets = Vec::with_capacity(glyphs.len() + 1);
    for glyph in glyphs {
        offsets.push(glyf.len());
        glyf.extend_from_slice(&glyph.encode());
        pad_to(&mut glyf, 4);
    }
    offsets.push(glyf.len());

    let mut loca = Vec::new();
    for offset in offsets {
        if long_loca {
            loca.put_u32(offset as u32);
        } else {
            loca.put_u16((offset / 2) as u16);
        }
    }
    GlyfTables { glyf, loca }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_record() {
        let bytes = TestGlyph::rect(100, 0, 600, 700).encode();
        // numberOfContours, bbox, one endPt, instructionLength
        assert_eq!(&bytes[0..2], &[0, 1]);
        assert_eq!(&bytes[2..4], &100i16.to_be_bytes());
        assert_eq!(&bytes[10..12], &[0, 3]);
        assert_eq!(bytes.len(), 14 + 4 + 4 * 2 * 2);
    }

    #[test]
    fn test_loca_short_offsets_are_halved() {
        let tables = glyf_tables(&[TestGlyph::Empty, TestGlyph::rect(0, 0, 10, 10)], false);
        assert_eq!(tables.loca.len(), 6);
        assert_eq!(&tables.loca[0..4], &[0, 0, 0, 0]);
        let end = u16::from_be_bytes([tables.loca[4], tables.loca[5]]) as usize * 2;
        assert_eq!(end, tables.glyf.len());
    }
}
