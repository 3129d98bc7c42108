//! TrueType (`glyf`/`loca`) outline parser.

pub mod glyf;

use std::ops::Range;
use std::sync::Arc;

use lumina_core::alloc::{HashMap, HashSet};
use lumina_core::profiling::profile_function;

use crate::error::{FontError, FontResult};
use crate::outline::{BoundingBox, Contour, CurveKind, GlyphOutline, OutlinePoint, OutlineSource};
use crate::tables::{SfntTables, TableProvider, Tag};
use crate::variation::{VariationEngine, apply_phantom_deltas};

use glyf::{Component, ComponentAnchor, CompositeGlyphFlags, GlyphRecord, parse_loca};

/// Maximum nesting of composite glyphs.
pub const MAX_COMPONENT_DEPTH: usize = 64;

/// Parser for fonts with TrueType outlines.
///
/// Owns the font bytes. Outlines are decoded on first request and cached for
/// the lifetime of the parser.
pub struct TrueTypeParser {
    sfnt: SfntTables,
    loca: Vec<u32>,
    glyf: Range<usize>,
    cache: HashMap<u16, Arc<GlyphOutline>>,
}

impl TrueTypeParser {
    /// Parse the table directory and every table needed for outline access.
    pub fn load(data: Vec<u8>) -> FontResult<Self> {
        profile_function!();

        let sfnt = SfntTables::parse(data)?;
        let glyf = sfnt.require_range(Tag::GLYF)?;
        let loca = parse_loca(
            sfnt.require(Tag::LOCA)?,
            sfnt.glyph_count(),
            sfnt.head.uses_long_offsets(),
            glyf.len(),
        )?;

        tracing::debug!(
            "Loaded TrueType font '{}' ({} glyphs)",
            sfnt.names.family_name(),
            sfnt.glyph_count()
        );

        Ok(Self {
            sfnt,
            loca,
            glyf,
            cache: HashMap::default(),
        })
    }

    /// Decode the raw `glyf` record of a glyph without resolving components.
    pub fn glyph_record(&self, glyph_id: u16) -> FontResult<GlyphRecord> {
        self.sfnt.check_glyph(glyph_id)?;
        let id = glyph_id as usize;
        let start = self.glyf.start + self.loca[id] as usize;
        let end = self.glyf.start + self.loca[id + 1] as usize;
        GlyphRecord::parse(&self.sfnt.data()[start..end])
    }

    /// Number of outlines currently cached.
    pub fn cached_outlines(&self) -> usize {
        self.cache.len()
    }

    fn build_outline(&self, glyph_id: u16) -> FontResult<GlyphOutline> {
        let metrics = self.sfnt.glyph_metrics(glyph_id);
        let advance_width = metrics.advance_width as f32;
        let left_side_bearing = metrics.left_side_bearing as f32;

        match self.glyph_record(glyph_id)? {
            GlyphRecord::Empty => Ok(GlyphOutline::empty(
                advance_width,
                left_side_bearing,
                CurveKind::Quadratic,
            )),
            GlyphRecord::Simple { contours, bounds } => Ok(GlyphOutline {
                contours,
                bounds,
                advance_width,
                left_side_bearing,
                curve_kind: CurveKind::Quadratic,
                is_composite: false,
            }),
            GlyphRecord::Composite { components, .. } => {
                let (contours, metrics_glyph) = self.resolve_composite(glyph_id, components, None)?;
                let metrics = metrics_glyph
                    .map(|id| self.sfnt.glyph_metrics(id))
                    .unwrap_or(metrics);
                let mut outline = GlyphOutline {
                    contours,
                    advance_width: metrics.advance_width as f32,
                    left_side_bearing: metrics.left_side_bearing as f32,
                    curve_kind: CurveKind::Quadratic,
                    is_composite: true,
                    ..Default::default()
                };
                outline.recompute_bounds();
                Ok(outline)
            }
        }
    }

    /// Flatten a composite glyph into contours.
    ///
    /// Walks the component tree with an explicit stack. `path` holds the glyphs
    /// on the current reference chain, so revisiting one is a cycle. Returns the
    /// glyph whose metrics the composite adopts through `USE_MY_METRICS`.
    ///
    /// With a `variation`, simple components are interpolated and nested
    /// composites have their offset deltas applied before placement. The root's
    /// own offset deltas are the caller's to apply.
    fn resolve_composite(
        &self,
        root: u16,
        components: Vec<Component>,
        variation: Option<&VariationEngine>,
    ) -> FontResult<(Vec<Contour>, Option<u16>)> {
        struct Frame {
            glyph_id: u16,
            components: Vec<Component>,
            next: usize,
            contours: Vec<Contour>,
        }

        let mut stack = vec![Frame {
            glyph_id: root,
            components,
            next: 0,
            contours: Vec::new(),
        }];
        let mut path = HashSet::default();
        path.insert(root);
        let mut metrics_glyph = None;

        while let Some(frame) = stack.last_mut() {
            if let Some(&component) = frame.components.get(frame.next) {
                frame.next += 1;
                let child = component.glyph_id;
                self.sfnt.check_glyph(child)?;
                if path.contains(&child) {
                    return Err(FontError::CyclicComposite { glyph_id: child });
                }
                if frame.glyph_id == root
                    && component.flags.contains(CompositeGlyphFlags::USE_MY_METRICS)
                {
                    metrics_glyph = Some(child);
                }

                match self.glyph_record(child)? {
                    GlyphRecord::Empty => {}
                    GlyphRecord::Simple { contours, bounds } => {
                        let contours = match variation {
                            Some(engine) => self.varied_contours(child, contours, bounds, engine)?,
                            None => contours,
                        };
                        place_component(&mut frame.contours, &component, contours)?;
                    }
                    GlyphRecord::Composite { mut components, .. } => {
                        if stack.len() >= MAX_COMPONENT_DEPTH {
                            return Err(FontError::ComponentDepthExceeded { glyph_id: root });
                        }
                        if let Some(engine) = variation {
                            vary_components(engine, child, &mut components)?;
                        }
                        path.insert(child);
                        stack.push(Frame {
                            glyph_id: child,
                            components,
                            next: 0,
                            contours: Vec::new(),
                        });
                    }
                }
                continue;
            }

            // Every component of the top frame is placed; hand it to its parent.
            let Some(done) = stack.pop() else { break };
            path.remove(&done.glyph_id);
            match stack.last_mut() {
                Some(parent) => {
                    let component = parent.components[parent.next - 1];
                    place_component(&mut parent.contours, &component, done.contours)?;
                }
                None => return Ok((done.contours, metrics_glyph)),
            }
        }

        Ok((Vec::new(), metrics_glyph))
    }

    /// Interpolated contours of a simple component glyph.
    fn varied_contours(
        &self,
        glyph_id: u16,
        contours: Vec<Contour>,
        bounds: BoundingBox,
        engine: &VariationEngine,
    ) -> FontResult<Vec<Contour>> {
        let metrics = self.sfnt.glyph_metrics(glyph_id);
        let base = GlyphOutline {
            contours,
            bounds,
            advance_width: metrics.advance_width as f32,
            left_side_bearing: metrics.left_side_bearing as f32,
            curve_kind: CurveKind::Quadratic,
            is_composite: false,
        };
        Ok(engine.interpolated_outline(glyph_id, &base)?.contours)
    }
}

/// Shift every offset-anchored component by its `gvar` delta.
///
/// Returns the deltas, phantom points last, when any apply. Point-anchored
/// components follow their anchor points instead.
fn vary_components(
    engine: &VariationEngine,
    glyph_id: u16,
    components: &mut [Component],
) -> FontResult<Option<Vec<(f32, f32)>>> {
    let Some(deltas) = engine.composite_deltas(glyph_id, components.len())? else {
        return Ok(None);
    };
    for (component, &(delta_x, delta_y)) in components.iter_mut().zip(&deltas) {
        if let ComponentAnchor::Offset { dx, dy } = &mut component.anchor {
            *dx += delta_x;
            *dy += delta_y;
        }
    }
    Ok(Some(deltas))
}

/// Transform a component's contours and append them to its parent.
fn place_component(
    parent: &mut Vec<Contour>,
    component: &Component,
    child: Vec<Contour>,
) -> FontResult<()> {
    let t = component.transform;
    let mut child: Vec<Contour> = child
        .into_iter()
        .map(|contour| Contour {
            points: contour
                .points
                .into_iter()
                .map(|p| {
                    let (x, y) = t.apply(p.x, p.y);
                    OutlinePoint { x, y, on_curve: p.on_curve }
                })
                .collect(),
        })
        .collect();

    let (dx, dy) = match component.anchor {
        ComponentAnchor::Offset { dx, dy } => {
            let scaled = component.flags.contains(CompositeGlyphFlags::SCALED_COMPONENT_OFFSET)
                && !component.flags.contains(CompositeGlyphFlags::UNSCALED_COMPONENT_OFFSET);
            if scaled { t.apply(dx, dy) } else { (dx, dy) }
        }
        ComponentAnchor::Points { parent: p, child: c } => {
            let anchor = nth_point(parent, p as usize);
            let target = nth_point(&child, c as usize);
            match (anchor, target) {
                (Some(a), Some(b)) => (a.x - b.x, a.y - b.y),
                _ => {
                    return Err(FontError::malformed(
                        Tag::GLYF,
                        format!(
                            "component {} anchors points {}/{} which do not exist",
                            component.glyph_id, p, c
                        ),
                    ));
                }
            }
        }
    };

    if dx != 0.0 || dy != 0.0 {
        for p in child.iter_mut().flat_map(|c| c.points.iter_mut()) {
            p.x += dx;
            p.y += dy;
        }
    }
    parent.extend(child);
    Ok(())
}

fn nth_point(contours: &[Contour], index: usize) -> Option<OutlinePoint> {
    contours.iter().flat_map(|c| c.points.iter()).nth(index).copied()
}

impl TableProvider for TrueTypeParser {
    fn table_data(&self, tag: Tag) -> Option<&[u8]> {
        self.sfnt.table_data(tag)
    }
}

impl OutlineSource for TrueTypeParser {
    fn sfnt(&self) -> &SfntTables {
        &self.sfnt
    }

    fn glyph_outline(&mut self, glyph_id: u16) -> FontResult<Arc<GlyphOutline>> {
        if let Some(outline) = self.cache.get(&glyph_id) {
            return Ok(Arc::clone(outline));
        }

        profile_function!();
        let outline = Arc::new(self.build_outline(glyph_id)?);
        self.cache.insert(glyph_id, Arc::clone(&outline));
        Ok(outline)
    }

    fn varied_outline(&mut self, glyph_id: u16, engine: &VariationEngine) -> FontResult<GlyphOutline> {
        let base = self.glyph_outline(glyph_id)?;
        if !base.is_composite {
            return engine.interpolated_outline(glyph_id, &base);
        }
        let GlyphRecord::Composite { mut components, .. } = self.glyph_record(glyph_id)? else {
            return Ok(base.as_ref().clone());
        };

        profile_function!();
        let component_count = components.len();
        let deltas = vary_components(engine, glyph_id, &mut components)?;
        let (contours, metrics_glyph) = self.resolve_composite(glyph_id, components, Some(engine))?;

        let mut outline = GlyphOutline {
            contours,
            ..base.as_ref().clone()
        };
        outline.recompute_bounds();
        match metrics_glyph {
            Some(child) => {
                let child = self.varied_outline(child, engine)?;
                outline.advance_width = child.advance_width;
                outline.left_side_bearing = child.left_side_bearing;
            }
            None => {
                let phantom = deltas
                    .as_deref()
                    .map(|d| &d[component_count..])
                    .unwrap_or(&[]);
                apply_phantom_deltas(&base, &mut outline, phantom);
            }
        }
        Ok(outline)
    }

    fn curve_kind(&self) -> CurveKind {
        CurveKind::Quadratic
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glyf::ComponentTransform;

    fn square(size: f32) -> Vec<Contour> {
        vec![Contour {
            points: vec![
                OutlinePoint::on(0.0, 0.0),
                OutlinePoint::on(size, 0.0),
                OutlinePoint::on(size, size),
                OutlinePoint::on(0.0, size),
            ],
        }]
    }

    #[test]
    fn test_place_component_offset_and_scale() {
        let component = Component {
            glyph_id: 1,
            flags: CompositeGlyphFlags::ARGS_ARE_XY_VALUES,
            transform: ComponentTransform {
                xx: 0.5,
                yy: 0.5,
                ..ComponentTransform::IDENTITY
            },
            anchor: ComponentAnchor::Offset { dx: 10.0, dy: 20.0 },
        };
        let mut parent = Vec::new();
        place_component(&mut parent, &component, square(100.0)).unwrap();
        assert_eq!(parent[0].points[2], OutlinePoint::on(60.0, 70.0));
    }

    #[test]
    fn test_place_component_point_anchor() {
        let mut parent = square(100.0);
        let component = Component {
            glyph_id: 2,
            flags: CompositeGlyphFlags::empty(),
            transform: ComponentTransform::IDENTITY,
            // Align the child's origin with the parent's top-right corner.
            anchor: ComponentAnchor::Points { parent: 2, child: 0 },
        };
        place_component(&mut parent, &component, square(10.0)).unwrap();
        assert_eq!(parent.len(), 2);
        assert_eq!(parent[1].points[0], OutlinePoint::on(100.0, 100.0));
        assert_eq!(parent[1].points[2], OutlinePoint::on(110.0, 110.0));
    }

    #[test]
    fn test_place_component_bad_anchor() {
        let mut parent = square(100.0);
        let component = Component {
            glyph_id: 2,
            flags: CompositeGlyphFlags::empty(),
            transform: ComponentTransform::IDENTITY,
            anchor: ComponentAnchor::Points { parent: 9, child: 0 },
        };
        assert!(place_component(&mut parent, &component, square(10.0)).is_err());
    }
}
