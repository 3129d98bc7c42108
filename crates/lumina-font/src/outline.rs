//! Glyph outlines in font units.
//!
//! Both outline formats produce a [`GlyphOutline`]: TrueType contours with
//! quadratic off-curve points, CFF contours with pairs of cubic control points.
//! [`OutlineSource`] is the seam the rest of the crate uses to reach either parser.

use std::sync::Arc;

use crate::error::FontResult;
use crate::tables::{GlyphMetrics, SfntTables, TableProvider};
use crate::variation::VariationEngine;

/// A point in a contour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutlinePoint {
    pub x: f32,
    pub y: f32,
    pub on_curve: bool,
}

impl OutlinePoint {
    pub fn on(x: f32, y: f32) -> Self {
        Self { x, y, on_curve: true }
    }

    pub fn off(x: f32, y: f32) -> Self {
        Self { x, y, on_curve: false }
    }
}

/// A closed contour.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Contour {
    pub points: Vec<OutlinePoint>,
}

/// How off-curve points are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CurveKind {
    /// One off-curve point per segment; consecutive off-curve points imply an
    /// on-curve midpoint (`glyf`).
    #[default]
    Quadratic,
    /// Two off-curve points per segment (CFF).
    Cubic,
}

/// Axis-aligned bounding box in font units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoundingBox {
    pub x_min: f32,
    pub y_min: f32,
    pub x_max: f32,
    pub y_max: f32,
}

impl BoundingBox {
    pub fn width(&self) -> f32 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f32 {
        self.y_max - self.y_min
    }

    /// Bounding box of every point, or the empty box at the origin.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a OutlinePoint>) -> Self {
        let mut iter = points.into_iter();
        let Some(first) = iter.next() else {
            return Self::default();
        };
        iter.fold(
            Self {
                x_min: first.x,
                y_min: first.y,
                x_max: first.x,
                y_max: first.y,
            },
            |b, p| Self {
                x_min: b.x_min.min(p.x),
                y_min: b.y_min.min(p.y),
                x_max: b.x_max.max(p.x),
                y_max: b.y_max.max(p.y),
            },
        )
    }
}

/// A parsed glyph outline with its horizontal metrics.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GlyphOutline {
    pub contours: Vec<Contour>,
    pub bounds: BoundingBox,
    pub advance_width: f32,
    pub left_side_bearing: f32,
    pub curve_kind: CurveKind,
    /// Set for outlines assembled from composite `glyf` components.
    pub is_composite: bool,
}

impl GlyphOutline {
    /// An outline with no contours, such as a space.
    pub fn empty(advance_width: f32, left_side_bearing: f32, curve_kind: CurveKind) -> Self {
        Self {
            advance_width,
            left_side_bearing,
            curve_kind,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.contours.iter().all(|c| c.points.is_empty())
    }

    pub fn point_count(&self) -> usize {
        self.contours.iter().map(|c| c.points.len()).sum()
    }

    pub fn points(&self) -> impl Iterator<Item = &OutlinePoint> {
        self.contours.iter().flat_map(|c| c.points.iter())
    }

    /// Recompute [`Self::bounds`] from the current points.
    pub fn recompute_bounds(&mut self) {
        self.bounds = BoundingBox::from_points(self.contours.iter().flat_map(|c| c.points.iter()));
    }

    /// Index one past the last point of each contour, in outline point order.
    pub fn contour_ends(&self) -> Vec<usize> {
        self.contours
            .iter()
            .scan(0usize, |end, c| {
                *end += c.points.len();
                Some(*end)
            })
            .collect()
    }
}

/// A parsed face that can produce glyph outlines.
///
/// Implemented by [`crate::truetype::TrueTypeParser`] and
/// [`crate::cff::OpenTypeParser`]. Outlines are parsed lazily and cached by the
/// implementor for as long as it lives.
pub trait OutlineSource: TableProvider {
    /// Shared sfnt metadata tables.
    fn sfnt(&self) -> &SfntTables;

    /// Outline of a glyph in font units.
    fn glyph_outline(&mut self, glyph_id: u16) -> FontResult<Arc<GlyphOutline>>;

    /// Outline of a glyph at the variation state of `engine`.
    ///
    /// Not cached; [`crate::Font`] keeps varied outlines per variation state.
    fn varied_outline(&mut self, glyph_id: u16, engine: &VariationEngine) -> FontResult<GlyphOutline> {
        let base = self.glyph_outline(glyph_id)?;
        engine.interpolated_outline(glyph_id, &base)
    }

    fn curve_kind(&self) -> CurveKind;

    /// Glyph for a codepoint, 0 when unmapped.
    fn glyph_id(&self, codepoint: u32) -> u16 {
        self.sfnt().glyph_id(codepoint)
    }

    fn glyph_metrics(&self, glyph_id: u16) -> GlyphMetrics {
        self.sfnt().glyph_metrics(glyph_id)
    }

    fn glyph_count(&self) -> u16 {
        self.sfnt().glyph_count()
    }

    fn units_per_em(&self) -> u16 {
        self.sfnt().units_per_em()
    }

    fn ascender(&self) -> i16 {
        self.sfnt().hhea.ascender
    }

    fn descender(&self) -> i16 {
        self.sfnt().hhea.descender
    }

    fn line_gap(&self) -> i16 {
        self.sfnt().hhea.line_gap
    }

    fn family_name(&self) -> &str {
        self.sfnt().names.family_name()
    }

    fn full_name(&self) -> &str {
        self.sfnt().names.full_name()
    }
}
