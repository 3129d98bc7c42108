//! Distance queries against a [`Shape`].

use lumina_core::math::Vec2;

use super::coloring::EdgeColor;
use super::shape::{Curve, EdgeSegment, Shape};

const NEWTON_ITERATIONS: usize = 4;

/// Distance from a point to one edge.
///
/// `distance` is negative when the point lies left of the edge (the filled
/// side). `dot` orders ties between edges sharing an endpoint: the edge the
/// point is more perpendicular to wins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeDistance {
    pub distance: f32,
    pub dot: f32,
    /// Parameter of the closest point, before clamping to `[0, 1]`.
    pub param: f32,
}

impl EdgeDistance {
    pub const INFINITE: Self = Self {
        distance: f32::MAX,
        dot: 1.0,
        param: 0.0,
    };

    pub fn is_closer_than(&self, other: &Self) -> bool {
        let a = self.distance.abs();
        let b = other.distance.abs();
        a < b || (a == b && self.dot < other.dot)
    }
}

fn side(direction: Vec2, offset: Vec2) -> f32 {
    if direction.perp_dot(offset) > 0.0 { -1.0 } else { 1.0 }
}

/// Dot product of the normalized edge direction and point offset, in `[0, 1]`.
fn orthogonality(direction: Vec2, offset: Vec2) -> f32 {
    direction
        .normalize_or_zero()
        .dot(offset.normalize_or_zero())
        .abs()
}

/// Closest distance from `point` to `curve`.
pub fn edge_distance(curve: &Curve, point: Vec2) -> EdgeDistance {
    match curve {
        Curve::Linear([p0, p1]) => {
            let ab = *p1 - *p0;
            let len_sq = ab.length_squared();
            let param = if len_sq > 0.0 {
                (point - *p0).dot(ab) / len_sq
            } else {
                0.0
            };
            let t = param.clamp(0.0, 1.0);
            let closest = p0.lerp(*p1, t);
            let offset = point - closest;
            // Endpoint hits compare by how square-on the point sits.
            let dot = if (0.0..=1.0).contains(&param) {
                0.0
            } else {
                orthogonality(ab, offset)
            };
            EdgeDistance {
                distance: side(ab, offset) * offset.length(),
                dot,
                param,
            }
        }
        _ => curve_distance(curve, point),
    }
}

/// Sample the curve, then refine the best sample with Newton steps on
/// `(B(t) - p) · B'(t) = 0`.
fn curve_distance(curve: &Curve, point: Vec2) -> EdgeDistance {
    let samples = match curve {
        Curve::Cubic(_) => 12,
        _ => 8,
    };

    let mut best_t = 0.0f32;
    let mut best_sq = f32::MAX;
    for i in 0..=samples {
        let t = i as f32 / samples as f32;
        let d = curve.point(t).distance_squared(point);
        if d < best_sq {
            best_sq = d;
            best_t = t;
        }
    }

    let mut t = best_t;
    for _ in 0..NEWTON_ITERATIONS {
        let offset = curve.point(t) - point;
        let d1 = curve.direction(t);
        let d2 = curve.second_derivative(t);
        let numerator = offset.dot(d1);
        let denominator = d1.dot(d1) + offset.dot(d2);
        if denominator.abs() <= f32::EPSILON {
            break;
        }
        let next = (t - numerator / denominator).clamp(0.0, 1.0);
        if !next.is_finite() {
            break;
        }
        t = next;
    }
    if curve.point(t).distance_squared(point) > best_sq {
        t = best_t;
    }

    let closest = curve.point(t);
    let offset = point - closest;
    let direction = curve.direction(t);

    // Distinguish a hit beyond an endpoint from an interior one for ties.
    let param = if t <= 0.0 && offset.dot(direction) < 0.0 {
        offset.dot(direction) / direction.length_squared().max(f32::EPSILON)
    } else if t >= 1.0 && offset.dot(direction) > 0.0 {
        1.0 + offset.dot(direction) / direction.length_squared().max(f32::EPSILON)
    } else {
        t
    };
    let dot = if (0.0..=1.0).contains(&param) {
        0.0
    } else {
        orthogonality(direction, offset)
    };

    EdgeDistance {
        distance: side(direction, offset) * offset.length(),
        dot,
        param,
    }
}

/// Distance to the edge extended along its end tangents, used for MSDF channels.
///
/// Points past an endpoint measure against the tangent line there instead of
/// the endpoint itself, which keeps corners sharp after the median.
pub fn pseudo_distance(curve: &Curve, point: Vec2, distance: &EdgeDistance) -> f32 {
    let (anchor, direction) = if distance.param < 0.0 {
        (curve.start(), curve.direction(0.0))
    } else if distance.param > 1.0 {
        (curve.end(), curve.direction(1.0))
    } else {
        return distance.distance;
    };

    let direction = direction.normalize_or_zero();
    let offset = point - anchor;
    let along = offset.dot(direction);
    let beyond = if distance.param < 0.0 { along < 0.0 } else { along > 0.0 };
    if !beyond {
        return distance.distance;
    }
    let perpendicular = direction.perp_dot(offset);
    if perpendicular.abs() <= distance.distance.abs() {
        -perpendicular
    } else {
        distance.distance
    }
}

fn closest_edge<'a>(
    edges: impl Iterator<Item = &'a EdgeSegment>,
    point: Vec2,
) -> Option<(&'a EdgeSegment, EdgeDistance)> {
    let mut best: Option<(&EdgeSegment, EdgeDistance)> = None;
    for edge in edges {
        let d = edge_distance(&edge.curve, point);
        if best.as_ref().is_none_or(|(_, b)| d.is_closer_than(b)) {
            best = Some((edge, d));
        }
    }
    best
}

/// True signed distance from `point` to `shape` in pixels, negative inside.
///
/// Magnitude is the minimum over every edge; the sign comes from the
/// non-zero winding number, so overlapping contours are handled. An empty
/// shape is infinitely far away.
pub fn signed_distance(shape: &Shape, point: Vec2) -> f32 {
    let Some((_, closest)) = closest_edge(shape.edges(), point) else {
        return f32::MAX;
    };
    let magnitude = closest.distance.abs();
    if shape.winding_number(point) != 0 {
        -magnitude
    } else {
        magnitude
    }
}

/// Per-channel pseudo distances for MSDF, in red, green, blue order.
///
/// Each channel takes the closest edge carrying that color.
pub fn channel_distances(shape: &Shape, point: Vec2) -> [f32; 3] {
    [EdgeColor::RED, EdgeColor::GREEN, EdgeColor::BLUE].map(|channel| {
        let edges = shape.edges().filter(|e| e.color.contains(channel));
        match closest_edge(edges, point) {
            Some((edge, d)) => pseudo_distance(&edge.curve, point, &d),
            None => f32::MAX,
        }
    })
}

pub fn median(a: f32, b: f32, c: f32) -> f32 {
    a.min(b).max(a.max(b).min(c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outline::{Contour, GlyphOutline, OutlinePoint};
    use crate::sdf::shape::outline_to_shape;
    use lumina_core::math::vec2;

    fn square_shape() -> Shape {
        let outline = GlyphOutline {
            contours: vec![Contour {
                points: vec![
                    OutlinePoint::on(0.0, 0.0),
                    OutlinePoint::on(0.0, 10.0),
                    OutlinePoint::on(10.0, 10.0),
                    OutlinePoint::on(10.0, 0.0),
                ],
            }],
            ..Default::default()
        };
        outline_to_shape(&outline, 1.0)
    }

    #[test]
    fn test_inside_negative_outside_positive() {
        let shape = square_shape();
        assert!((signed_distance(&shape, vec2(5.0, 5.0)) + 5.0).abs() < 1e-4);
        assert!((signed_distance(&shape, vec2(5.0, 12.0)) - 2.0).abs() < 1e-4);
        assert!((signed_distance(&shape, vec2(13.0, 14.0)) - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_edge_sign_matches_fill_side() {
        let shape = square_shape();
        // After orientation the fill lies on the left of every edge.
        for edge in shape.edges() {
            let d = edge_distance(&edge.curve, vec2(5.0, 5.0));
            assert!(d.distance < 0.0);
        }
    }

    #[test]
    fn test_quadratic_distance_refined() {
        let curve = Curve::Quadratic([vec2(0.0, 0.0), vec2(5.0, 10.0), vec2(10.0, 0.0)]);
        // The apex of this parabola is (5, 5).
        let d = edge_distance(&curve, vec2(5.0, 8.0));
        assert!((d.distance.abs() - 3.0).abs() < 1e-3);
        assert!((d.param - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_cubic_distance_at_endpoint() {
        let curve = Curve::Cubic([vec2(0.0, 0.0), vec2(0.0, 5.0), vec2(10.0, 5.0), vec2(10.0, 0.0)]);
        let d = edge_distance(&curve, vec2(-3.0, 0.0));
        assert!((d.distance.abs() - 3.0).abs() < 1e-3);
    }

    #[test]
    fn test_never_nan() {
        let shape = square_shape();
        for p in [vec2(0.0, 0.0), vec2(10.0, 10.0), vec2(5.0, 0.0), vec2(-1e6, 1e6)] {
            assert!(!signed_distance(&shape, p).is_nan());
            assert!(channel_distances(&shape, p).iter().all(|d| !d.is_nan()));
        }
        let degenerate = Curve::Quadratic([vec2(1.0, 1.0); 3]);
        assert!(!edge_distance(&degenerate, vec2(0.0, 0.0)).distance.is_nan());
    }

    #[test]
    fn test_pseudo_distance_extends_tangent() {
        let line = Curve::Linear([vec2(0.0, 0.0), vec2(10.0, 0.0)]);
        let p = vec2(13.0, 1.0);
        let d = edge_distance(&line, p);
        assert!(d.param > 1.0);
        let pseudo = pseudo_distance(&line, p, &d);
        assert!((pseudo.abs() - 1.0).abs() < 1e-5);
        assert!(pseudo.abs() < d.distance.abs());
    }

    #[test]
    fn test_median() {
        assert_eq!(median(1.0, 3.0, 2.0), 2.0);
        assert_eq!(median(-1.0, -3.0, 5.0), -1.0);
    }

    #[test]
    fn test_empty_shape_is_far() {
        assert_eq!(signed_distance(&Shape::default(), vec2(0.0, 0.0)), f32::MAX);
    }
}
