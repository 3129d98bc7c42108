//! Variable font support: axis state, normalization and outline interpolation.

pub mod avar;
pub mod fvar;
pub mod gvar;

use std::hash::Hasher;

use lumina_core::profiling::profile_function;

use crate::error::{FontError, FontResult};
use crate::outline::{Contour, GlyphOutline, OutlinePoint};
use crate::tables::{TableProvider, Tag};

pub use avar::{AvarTable, AxisValueMap};
pub use fvar::{FontAxis, FontInstance, FvarTable};
pub use gvar::{GlyphVariation, GvarTable};

/// Number of phantom points appended to every glyph in `gvar`.
const PHANTOM_POINT_COUNT: usize = 4;

/// Current position in a font's design space.
///
/// A font without `fvar` yields an engine with no axes that reports
/// [`Self::is_variable`] as false and returns base outlines unchanged.
#[derive(Debug, Clone, Default)]
pub struct VariationEngine {
    axes: Vec<FontAxis>,
    instances: Vec<FontInstance>,
    avar: Option<AvarTable>,
    gvar: Option<GvarTable>,
    /// User-space value per axis.
    values: Vec<f32>,
}

impl VariationEngine {
    /// Read `fvar`, `avar` and `gvar` from a font.
    ///
    /// A malformed `fvar` fails the load. `avar` and `gvar` are optional and
    /// degrade to identity mapping and no deltas.
    pub fn load(font: &(impl TableProvider + ?Sized)) -> FontResult<Self> {
        profile_function!();

        let Some(fvar_data) = font.table_data(Tag::FVAR) else {
            return Ok(Self::default());
        };
        let fvar = FvarTable::parse(fvar_data)?;

        let avar = font
            .table_data(Tag::AVAR)
            .and_then(|data| match AvarTable::parse(data) {
                Ok(table) => Some(table),
                Err(e) => {
                    tracing::warn!("Ignoring malformed avar table: {}", e);
                    None
                }
            });
        let gvar = font
            .table_data(Tag::GVAR)
            .and_then(|data| match GvarTable::parse(data) {
                Ok(table) if table.axis_count() == fvar.axes.len() => Some(table),
                Ok(table) => {
                    tracing::warn!(
                        "Ignoring gvar table with {} axes (fvar has {})",
                        table.axis_count(),
                        fvar.axes.len()
                    );
                    None
                }
                Err(e) => {
                    tracing::warn!("Ignoring malformed gvar table: {}", e);
                    None
                }
            });

        tracing::debug!(
            "Loaded variation axes [{}], {} named instances",
            fvar.axes
                .iter()
                .map(|a| a.tag.to_string())
                .collect::<Vec<_>>()
                .join(", "),
            fvar.instances.len()
        );

        let values = fvar.axes.iter().map(|a| a.default_value).collect();
        Ok(Self {
            axes: fvar.axes,
            instances: fvar.instances,
            avar,
            gvar,
            values,
        })
    }

    pub fn is_variable(&self) -> bool {
        !self.axes.is_empty()
    }

    pub fn axes(&self) -> &[FontAxis] {
        &self.axes
    }

    pub fn instances(&self) -> &[FontInstance] {
        &self.instances
    }

    pub fn has_glyph_variations(&self) -> bool {
        self.gvar.is_some()
    }

    fn axis_index(&self, tag: Tag) -> FontResult<usize> {
        self.axes
            .iter()
            .position(|a| a.tag == tag)
            .ok_or(FontError::UnknownAxis(tag))
    }

    /// Set an axis, clamping to its range.
    pub fn set_axis_value(&mut self, tag: Tag, value: f32) -> FontResult<()> {
        let i = self.axis_index(tag)?;
        let clamped = self.axes[i].clamp(value);
        if clamped != value {
            tracing::trace!("Clamped axis '{}' from {} to {}", tag, value, clamped);
        }
        self.values[i] = clamped;
        Ok(())
    }

    /// Current user-space value of an axis.
    pub fn axis_value(&self, tag: Tag) -> FontResult<f32> {
        let i = self.axis_index(tag)?;
        Ok(self.values[i])
    }

    /// Move to a named instance.
    pub fn apply_instance(&mut self, index: usize) -> FontResult<()> {
        let instance = self
            .instances
            .get(index)
            .ok_or(FontError::InvalidInstance(index))?;
        for (i, axis) in self.axes.iter().enumerate() {
            let value = instance.coordinates.get(i).copied().unwrap_or(axis.default_value);
            self.values[i] = axis.clamp(value);
        }
        Ok(())
    }

    /// Every axis back to its default.
    pub fn reset(&mut self) {
        for (value, axis) in self.values.iter_mut().zip(&self.axes) {
            *value = axis.default_value;
        }
    }

    /// Map a user-space value to `[-1, 1]`, then through `avar`.
    pub fn normalize_axis_value(&self, axis_index: usize, value: f32) -> f32 {
        let Some(axis) = self.axes.get(axis_index) else {
            return 0.0;
        };
        let value = axis.clamp(value);
        let normalized = if value < axis.default_value {
            let range = axis.default_value - axis.min_value;
            if range == 0.0 { 0.0 } else { (value - axis.default_value) / range }
        } else if value > axis.default_value {
            let range = axis.max_value - axis.default_value;
            if range == 0.0 { 0.0 } else { (value - axis.default_value) / range }
        } else {
            0.0
        };
        self.apply_avar_mapping(axis_index, normalized)
    }

    /// Remap a normalized coordinate through `avar`, identity when absent.
    pub fn apply_avar_mapping(&self, axis_index: usize, normalized: f32) -> f32 {
        match &self.avar {
            Some(avar) => avar.map(axis_index, normalized).clamp(-1.0, 1.0),
            None => normalized,
        }
    }

    /// Normalized coordinate of every axis at the current state.
    pub fn normalized_coords(&self) -> Vec<f32> {
        self.values
            .iter()
            .enumerate()
            .map(|(i, &v)| self.normalize_axis_value(i, v))
            .collect()
    }

    /// True when every axis normalizes to zero.
    pub fn is_default(&self) -> bool {
        self.normalized_coords().iter().all(|&c| c == 0.0)
    }

    /// Stable hash of the current axis values; 0 for non-variable fonts.
    pub fn variation_hash(&self) -> u64 {
        if !self.is_variable() {
            return 0;
        }
        let mut hasher = fxhash::FxHasher64::default();
        for (axis, value) in self.axes.iter().zip(&self.values) {
            hasher.write(&axis.tag.0);
            hasher.write_u32(value.to_bits());
        }
        hasher.finish()
    }

    /// Apply `gvar` deltas for the current coordinates to a simple glyph.
    ///
    /// Returns `base` unchanged at default coordinates and for fonts without
    /// glyph variations. Composites are varied per component while they are
    /// flattened (see [`crate::outline::OutlineSource::varied_outline`]), so an
    /// already flattened composite is returned as is.
    pub fn interpolated_outline(&self, glyph_id: u16, base: &GlyphOutline) -> FontResult<GlyphOutline> {
        let Some(gvar) = &self.gvar else {
            return Ok(base.clone());
        };
        let coords = self.normalized_coords();
        if coords.iter().all(|&c| c == 0.0) || base.is_composite {
            return Ok(base.clone());
        }

        profile_function!();

        let point_count = base.point_count();
        let total = point_count + PHANTOM_POINT_COUNT;
        let variations = gvar.glyph_variations(glyph_id, total)?;
        if variations.is_empty() {
            return Ok(base.clone());
        }

        let base_points: Vec<(f32, f32)> = base.points().map(|p| (p.x, p.y)).collect();
        let contour_ends = base.contour_ends();
        let mut dx = vec![0.0f32; total];
        let mut dy = vec![0.0f32; total];

        for variation in &variations {
            let scalar = variation.scalar(&coords);
            if scalar == 0.0 {
                continue;
            }
            match &variation.points {
                None => {
                    if variation.x_deltas.len() != total {
                        return Err(delta_count_error(glyph_id, variation.x_deltas.len(), total));
                    }
                    for i in 0..total {
                        dx[i] += scalar * variation.x_deltas[i];
                        dy[i] += scalar * variation.y_deltas[i];
                    }
                }
                Some(points) => {
                    let mut touched: Vec<Option<(f32, f32)>> = vec![None; total];
                    for (k, &p) in points.iter().enumerate() {
                        // Out-of-range point numbers are ignored.
                        if let Some(slot) = touched.get_mut(p as usize) {
                            *slot = Some((variation.x_deltas[k], variation.y_deltas[k]));
                        }
                    }
                    let inferred = infer_deltas(&base_points, &contour_ends, &touched[..point_count]);
                    for (i, (ix, iy)) in inferred.into_iter().enumerate() {
                        dx[i] += scalar * ix;
                        dy[i] += scalar * iy;
                    }
                    for i in point_count..total {
                        if let Some((x, y)) = touched[i] {
                            dx[i] += scalar * x;
                            dy[i] += scalar * y;
                        }
                    }
                }
            }
        }

        let deltas: Vec<(f32, f32)> = dx.iter().zip(&dy).map(|(&x, &y)| (x, y)).collect();
        let mut outline = apply_deltas(base, &deltas[..point_count]);
        apply_phantom_deltas(base, &mut outline, &deltas[point_count..]);
        Ok(outline)
    }

    /// Offset deltas for each component of a composite glyph, followed by the
    /// four phantom points.
    ///
    /// Components have no contours to interpolate along, so a component a
    /// sparse tuple leaves out gets no delta from it. Returns `None` when
    /// nothing varies at the current coordinates.
    pub fn composite_deltas(
        &self,
        glyph_id: u16,
        component_count: usize,
    ) -> FontResult<Option<Vec<(f32, f32)>>> {
        let Some(gvar) = &self.gvar else {
            return Ok(None);
        };
        let coords = self.normalized_coords();
        if coords.iter().all(|&c| c == 0.0) {
            return Ok(None);
        }

        let total = component_count + PHANTOM_POINT_COUNT;
        let variations = gvar.glyph_variations(glyph_id, total)?;
        if variations.is_empty() {
            return Ok(None);
        }

        let mut deltas = vec![(0.0f32, 0.0f32); total];
        for variation in &variations {
            let scalar = variation.scalar(&coords);
            if scalar == 0.0 {
                continue;
            }
            let targets: Vec<usize> = match &variation.points {
                None if variation.x_deltas.len() != total => {
                    return Err(delta_count_error(glyph_id, variation.x_deltas.len(), total));
                }
                None => (0..total).collect(),
                Some(points) => points.iter().map(|&p| p as usize).collect(),
            };
            for (k, target) in targets.into_iter().enumerate() {
                if let Some(delta) = deltas.get_mut(target) {
                    delta.0 += scalar * variation.x_deltas[k];
                    delta.1 += scalar * variation.y_deltas[k];
                }
            }
        }
        Ok(Some(deltas))
    }
}

fn delta_count_error(glyph_id: u16, deltas: usize, points: usize) -> FontError {
    FontError::malformed(
        Tag::GVAR,
        format!("glyph {} has {} deltas for {} points", glyph_id, deltas, points),
    )
}

/// Move the advance and left side bearing of `outline` by the phantom deltas.
///
/// Phantom points 0 and 1 carry the left edge and the advance. `outline`
/// already holds the varied contours of `base`.
pub(crate) fn apply_phantom_deltas(base: &GlyphOutline, outline: &mut GlyphOutline, phantom: &[(f32, f32)]) {
    let (left, right) = match phantom {
        [left, right, ..] => (left.0, right.0),
        _ => (0.0, 0.0),
    };
    let left_origin = base.bounds.x_min - base.left_side_bearing;
    outline.advance_width = base.advance_width + right - left;
    if !outline.is_empty() {
        outline.left_side_bearing = outline.bounds.x_min - (left_origin + left);
    }
}

/// Fill in deltas for points a sparse tuple does not reference.
///
/// Within each contour an untouched point takes its delta from the nearest
/// touched points before and after it (wrapping around the contour). A point
/// between them on an axis is interpolated, one outside takes the delta of the
/// nearer reference. A contour with a single touched point shifts as a whole;
/// one with none is left alone.
pub fn infer_deltas(
    points: &[(f32, f32)],
    contour_ends: &[usize],
    touched: &[Option<(f32, f32)>],
) -> Vec<(f32, f32)> {
    let mut out: Vec<(f32, f32)> = touched.iter().map(|t| t.unwrap_or((0.0, 0.0))).collect();

    let mut start = 0;
    for &end in contour_ends {
        let range = start..end;
        start = end;

        let refs: Vec<usize> = range.clone().filter(|&i| touched[i].is_some()).collect();
        match refs.len() {
            0 => continue,
            1 => {
                let delta = out[refs[0]];
                for i in range {
                    out[i] = delta;
                }
                continue;
            }
            _ => {}
        }

        for (k, &r1) in refs.iter().enumerate() {
            let r2 = refs[(k + 1) % refs.len()];
            // Walk the untouched points after r1, wrapping to the contour start.
            let mut i = r1;
            loop {
                i = if i + 1 == range.end { range.start } else { i + 1 };
                if i == r2 {
                    break;
                }
                out[i] = (
                    interpolate_axis(points[i].0, points[r1].0, points[r2].0, out[r1].0, out[r2].0),
                    interpolate_axis(points[i].1, points[r1].1, points[r2].1, out[r1].1, out[r2].1),
                );
            }
        }
    }
    out
}

fn interpolate_axis(p: f32, c1: f32, c2: f32, d1: f32, d2: f32) -> f32 {
    // References sharing a coordinate but not a delta leave the point alone.
    if c1 == c2 {
        return if d1 == d2 { d1 } else { 0.0 };
    }
    let (c1, c2, d1, d2) = if c1 < c2 { (c1, c2, d1, d2) } else { (c2, c1, d2, d1) };
    if p <= c1 {
        d1
    } else if p >= c2 {
        d2
    } else {
        d1 + (p - c1) / (c2 - c1) * (d2 - d1)
    }
}

/// Offset every outline point by its delta, in outline point order.
fn apply_deltas(base: &GlyphOutline, deltas: &[(f32, f32)]) -> GlyphOutline {
    let mut outline = base.clone();
    outline.contours = base
        .contours
        .iter()
        .scan(0usize, |index, contour| {
            let points = contour
                .points
                .iter()
                .map(|p| {
                    let (dx, dy) = deltas.get(*index).copied().unwrap_or((0.0, 0.0));
                    *index += 1;
                    OutlinePoint {
                        x: p.x + dx,
                        y: p.y + dy,
                        on_curve: p.on_curve,
                    }
                })
                .collect();
            Some(Contour { points })
        })
        .collect();
    outline.recompute_bounds();
    outline
}
