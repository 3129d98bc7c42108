//! Edge-segment shapes in pixel space.

use lumina_core::math::{Vec2, vec2};

use super::coloring::EdgeColor;
use crate::outline::{Contour, CurveKind, GlyphOutline, OutlinePoint};

/// Edges shorter than this (in pixels) are dropped.
const DEGENERATE_EPSILON: f32 = 1e-4;

/// Geometry of a single edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Curve {
    Linear([Vec2; 2]),
    Quadratic([Vec2; 3]),
    Cubic([Vec2; 4]),
}

impl Curve {
    pub fn start(&self) -> Vec2 {
        match self {
            Curve::Linear(p) => p[0],
            Curve::Quadratic(p) => p[0],
            Curve::Cubic(p) => p[0],
        }
    }

    pub fn end(&self) -> Vec2 {
        match self {
            Curve::Linear(p) => p[1],
            Curve::Quadratic(p) => p[2],
            Curve::Cubic(p) => p[3],
        }
    }

    /// Point at parameter `t` in `[0, 1]`.
    pub fn point(&self, t: f32) -> Vec2 {
        match self {
            Curve::Linear([p0, p1]) => p0.lerp(*p1, t),
            Curve::Quadratic([p0, p1, p2]) => {
                let a = p0.lerp(*p1, t);
                let b = p1.lerp(*p2, t);
                a.lerp(b, t)
            }
            Curve::Cubic([p0, p1, p2, p3]) => {
                let a = p0.lerp(*p1, t);
                let b = p1.lerp(*p2, t);
                let c = p2.lerp(*p3, t);
                let ab = a.lerp(b, t);
                let bc = b.lerp(c, t);
                ab.lerp(bc, t)
            }
        }
    }

    /// First derivative at `t`.
    pub fn direction(&self, t: f32) -> Vec2 {
        let d = match self {
            Curve::Linear([p0, p1]) => *p1 - *p0,
            Curve::Quadratic([p0, p1, p2]) => {
                2.0 * ((*p1 - *p0).lerp(*p2 - *p1, t))
            }
            Curve::Cubic([p0, p1, p2, p3]) => {
                let a = *p1 - *p0;
                let b = *p2 - *p1;
                let c = *p3 - *p2;
                3.0 * a.lerp(b, t).lerp(b.lerp(c, t), t)
            }
        };
        if d.length_squared() > 0.0 {
            return d;
        }
        // Control point coincides with an endpoint; fall back to the chord.
        match (self, t <= 0.5) {
            (Curve::Quadratic([p0, _, p2]), _) => *p2 - *p0,
            (Curve::Cubic([p0, _, p2, _]), true) => *p2 - *p0,
            (Curve::Cubic([_, p1, _, p3]), false) => *p3 - *p1,
            _ => d,
        }
    }

    /// Second derivative at `t`.
    pub fn second_derivative(&self, t: f32) -> Vec2 {
        match self {
            Curve::Linear(_) => Vec2::ZERO,
            Curve::Quadratic([p0, p1, p2]) => 2.0 * (*p2 - 2.0 * *p1 + *p0),
            Curve::Cubic([p0, p1, p2, p3]) => {
                let a = *p2 - 2.0 * *p1 + *p0;
                let b = *p3 - 2.0 * *p2 + *p1;
                6.0 * a.lerp(b, t)
            }
        }
    }

    /// Length of the control polygon, an upper bound on arc length.
    pub fn hull_length(&self) -> f32 {
        match self {
            Curve::Linear([p0, p1]) => p0.distance(*p1),
            Curve::Quadratic([p0, p1, p2]) => p0.distance(*p1) + p1.distance(*p2),
            Curve::Cubic([p0, p1, p2, p3]) => {
                p0.distance(*p1) + p1.distance(*p2) + p2.distance(*p3)
            }
        }
    }

    /// Twice the signed area swept from the origin, exact for every degree.
    pub fn signed_area(&self) -> f32 {
        match self {
            Curve::Linear([p0, p1]) => p0.perp_dot(*p1),
            Curve::Quadratic([p0, p1, p2]) => {
                (2.0 * p0.perp_dot(*p1) + 2.0 * p1.perp_dot(*p2) + p0.perp_dot(*p2)) / 3.0
            }
            Curve::Cubic([p0, p1, p2, p3]) => {
                (6.0 * p0.perp_dot(*p1)
                    + 3.0 * p0.perp_dot(*p2)
                    + p0.perp_dot(*p3)
                    + 3.0 * p1.perp_dot(*p2)
                    + 3.0 * p1.perp_dot(*p3)
                    + 6.0 * p2.perp_dot(*p3))
                    / 10.0
            }
        }
    }

    pub fn reversed(&self) -> Self {
        match *self {
            Curve::Linear([p0, p1]) => Curve::Linear([p1, p0]),
            Curve::Quadratic([p0, p1, p2]) => Curve::Quadratic([p2, p1, p0]),
            Curve::Cubic([p0, p1, p2, p3]) => Curve::Cubic([p3, p2, p1, p0]),
        }
    }

    /// Split into three pieces of equal parameter span.
    pub fn split_in_thirds(&self) -> [Curve; 3] {
        let (a, rest) = self.split_at(1.0 / 3.0);
        let (b, c) = rest.split_at(0.5);
        [a, b, c]
    }

    fn split_at(&self, t: f32) -> (Curve, Curve) {
        match *self {
            Curve::Linear([p0, p1]) => {
                let m = p0.lerp(p1, t);
                (Curve::Linear([p0, m]), Curve::Linear([m, p1]))
            }
            Curve::Quadratic([p0, p1, p2]) => {
                let a = p0.lerp(p1, t);
                let b = p1.lerp(p2, t);
                let m = a.lerp(b, t);
                (Curve::Quadratic([p0, a, m]), Curve::Quadratic([m, b, p2]))
            }
            Curve::Cubic([p0, p1, p2, p3]) => {
                let a = p0.lerp(p1, t);
                let b = p1.lerp(p2, t);
                let c = p2.lerp(p3, t);
                let ab = a.lerp(b, t);
                let bc = b.lerp(c, t);
                let m = ab.lerp(bc, t);
                (Curve::Cubic([p0, a, ab, m]), Curve::Cubic([m, bc, c, p3]))
            }
        }
    }

    /// Line segments approximating the curve, for winding queries.
    pub(crate) fn flatten(&self, out: &mut Vec<(Vec2, Vec2)>) {
        let steps = match self {
            Curve::Linear(_) => 1,
            Curve::Quadratic(_) => 8,
            Curve::Cubic(_) => 12,
        };
        let mut prev = self.start();
        for i in 1..=steps {
            let next = if i == steps {
                self.end()
            } else {
                self.point(i as f32 / steps as f32)
            };
            out.push((prev, next));
            prev = next;
        }
    }
}

/// An edge with its MSDF channel assignment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeSegment {
    pub curve: Curve,
    pub color: EdgeColor,
}

impl EdgeSegment {
    pub fn new(curve: Curve) -> Self {
        Self {
            curve,
            color: EdgeColor::WHITE,
        }
    }
}

/// A closed loop of edges.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EdgeContour {
    pub edges: Vec<EdgeSegment>,
    /// `1` for counter-clockwise (filled on the left), `-1` for clockwise.
    pub winding: i32,
}

impl EdgeContour {
    /// Twice the signed area enclosed by the contour.
    pub fn signed_area(&self) -> f32 {
        self.edges.iter().map(|e| e.curve.signed_area()).sum()
    }

    fn reverse(&mut self) {
        self.edges.reverse();
        for edge in &mut self.edges {
            edge.curve = edge.curve.reversed();
        }
        self.winding = -self.winding;
    }
}

/// Every contour of one glyph at one scale, in pixel units with y up.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Shape {
    contours: Vec<EdgeContour>,
    /// Flattened edges for winding queries.
    segments: Vec<(Vec2, Vec2)>,
}

impl Shape {
    pub fn new(contours: Vec<EdgeContour>) -> Self {
        let mut segments = Vec::new();
        for edge in contours.iter().flat_map(|c| c.edges.iter()) {
            edge.curve.flatten(&mut segments);
        }
        Self { contours, segments }
    }

    pub fn contours(&self) -> &[EdgeContour] {
        &self.contours
    }

    /// Contours for recoloring. Splitting an edge is fine; moving one leaves
    /// the flattened winding segments stale.
    pub(crate) fn contours_mut(&mut self) -> &mut [EdgeContour] {
        &mut self.contours
    }

    pub fn is_empty(&self) -> bool {
        self.contours.iter().all(|c| c.edges.is_empty())
    }

    pub fn edge_count(&self) -> usize {
        self.contours.iter().map(|c| c.edges.len()).sum()
    }

    pub fn edges(&self) -> impl Iterator<Item = &EdgeSegment> {
        self.contours.iter().flat_map(|c| c.edges.iter())
    }

    /// Non-zero winding number of `point` with respect to every contour.
    pub fn winding_number(&self, point: Vec2) -> i32 {
        self.segments
            .iter()
            .map(|&(a, b)| {
                if a.y <= point.y {
                    if b.y > point.y && (b - a).perp_dot(point - a) > 0.0 {
                        return 1;
                    }
                } else if b.y <= point.y && (b - a).perp_dot(point - a) < 0.0 {
                    return -1;
                }
                0
            })
            .sum()
    }

}

/// Flip every contour when the outline as a whole winds clockwise, so that
/// filled area lies to the left of each edge while holes keep the opposite
/// winding.
fn orient(contours: &mut [EdgeContour]) {
    let total: f32 = contours.iter().map(EdgeContour::signed_area).sum();
    if total < 0.0 {
        for contour in contours {
            contour.reverse();
        }
    }
}

/// Convert an outline in font units into a pixel-space [`Shape`].
pub fn outline_to_shape(outline: &GlyphOutline, scale: f32) -> Shape {
    let mut contours = Vec::with_capacity(outline.contours.len());
    for contour in &outline.contours {
        let edges = match outline.curve_kind {
            CurveKind::Quadratic => quadratic_edges(contour, scale),
            CurveKind::Cubic => cubic_edges(contour, scale),
        };
        let edges: Vec<EdgeSegment> = edges
            .into_iter()
            .filter(|c| c.hull_length() > DEGENERATE_EPSILON)
            .map(EdgeSegment::new)
            .collect();
        if edges.is_empty() {
            continue;
        }
        let mut contour = EdgeContour { edges, winding: 1 };
        if contour.signed_area() < 0.0 {
            contour.winding = -1;
        }
        contours.push(contour);
    }
    orient(&mut contours);
    Shape::new(contours)
}

fn scaled(p: &OutlinePoint, scale: f32) -> Vec2 {
    vec2(p.x * scale, p.y * scale)
}

fn quadratic_edges(contour: &Contour, scale: f32) -> Vec<Curve> {
    let points = &contour.points;
    let n = points.len();
    if n < 2 {
        return Vec::new();
    }

    // Start on an on-curve point, or on the midpoint of the first two
    // off-curve points when the contour has none.
    let start_index = points.iter().position(|p| p.on_curve);
    let (start, first) = match start_index {
        Some(i) => (scaled(&points[i], scale), i),
        None => (
            scaled(&points[0], scale).lerp(scaled(&points[1], scale), 0.5),
            0,
        ),
    };

    let mut curves = Vec::new();
    let mut current = start;
    let mut control: Option<Vec2> = None;
    for step in 1..=n {
        let p = &points[(first + step) % n];
        let v = scaled(p, scale);
        match (p.on_curve, control) {
            (true, None) => {
                curves.push(Curve::Linear([current, v]));
                current = v;
            }
            (true, Some(c)) => {
                curves.push(Curve::Quadratic([current, c, v]));
                current = v;
                control = None;
            }
            (false, None) => control = Some(v),
            (false, Some(c)) => {
                let mid = c.lerp(v, 0.5);
                curves.push(Curve::Quadratic([current, c, mid]));
                current = mid;
                control = Some(v);
            }
        }
    }
    if let Some(c) = control {
        curves.push(Curve::Quadratic([current, c, start]));
    } else if current != start {
        curves.push(Curve::Linear([current, start]));
    }
    curves
}

fn cubic_edges(contour: &Contour, scale: f32) -> Vec<Curve> {
    let points = &contour.points;
    let Some(first) = points.first() else {
        return Vec::new();
    };
    let start = scaled(first, scale);

    let mut curves = Vec::new();
    let mut current = start;
    let mut controls: Vec<Vec2> = Vec::with_capacity(2);
    for p in points[1..].iter() {
        let v = scaled(p, scale);
        if !p.on_curve {
            controls.push(v);
            continue;
        }
        curves.push(match controls.as_slice() {
            [] => Curve::Linear([current, v]),
            [c] => Curve::Quadratic([current, *c, v]),
            [c0, c1, ..] => Curve::Cubic([current, *c0, *c1, v]),
        });
        controls.clear();
        current = v;
    }
    curves.push(match controls.as_slice() {
        [] => Curve::Linear([current, start]),
        [c] => Curve::Quadratic([current, *c, start]),
        [c0, c1, ..] => Curve::Cubic([current, *c0, *c1, start]),
    });
    curves
}
