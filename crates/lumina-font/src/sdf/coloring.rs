//! MSDF edge coloring.
//!
//! Each edge is assigned two of the three channels so that the two edges
//! meeting at a sharp corner never share the same pair. The median of the
//! channels then reconstructs the corner exactly.

use bitflags::bitflags;
use lumina_core::math::Vec2;

use super::shape::{EdgeContour, EdgeSegment, Shape};

bitflags! {
    /// Channels an edge contributes to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EdgeColor: u8 {
        const RED = 1 << 0;
        const GREEN = 1 << 1;
        const BLUE = 1 << 2;
        const CYAN = Self::GREEN.bits() | Self::BLUE.bits();
        const MAGENTA = Self::RED.bits() | Self::BLUE.bits();
        const YELLOW = Self::RED.bits() | Self::GREEN.bits();
        const WHITE = Self::RED.bits() | Self::GREEN.bits() | Self::BLUE.bits();
    }
}

const CYCLE: [EdgeColor; 3] = [EdgeColor::CYAN, EdgeColor::MAGENTA, EdgeColor::YELLOW];

/// Default corner angle threshold in radians.
pub const DEFAULT_ANGLE_THRESHOLD: f32 = 3.0;

fn is_corner(a: Vec2, b: Vec2, cross_threshold: f32) -> bool {
    let a = a.normalize_or_zero();
    let b = b.normalize_or_zero();
    a.dot(b) <= 0.0 || a.perp_dot(b).abs() > cross_threshold
}

/// Indices of edges whose start is a corner with the previous edge.
fn corners(contour: &EdgeContour, cross_threshold: f32) -> Vec<usize> {
    let Some(last) = contour.edges.last() else {
        return Vec::new();
    };
    let mut prev_direction = last.curve.direction(1.0);
    let mut corners = Vec::new();
    for (i, edge) in contour.edges.iter().enumerate() {
        if is_corner(prev_direction, edge.curve.direction(0.0), cross_threshold) {
            corners.push(i);
        }
        prev_direction = edge.curve.direction(1.0);
    }
    corners
}

/// Maps `position` of `n` evenly onto `-1`, `0`, `1`.
fn symmetrical_trichotomy(position: usize, n: usize) -> i32 {
    if n <= 1 {
        return 0;
    }
    (3.0 + 2.875 * position as f32 / (n - 1) as f32 - 1.4375 + 0.5) as i32 - 3
}

/// Assign MSDF channels to every edge of `shape`.
///
/// A join counts as a corner when the turn between edges exceeds
/// `angle_threshold` radians (or reverses direction).
pub fn color_edges(shape: &mut Shape, angle_threshold: f32) {
    let cross_threshold = angle_threshold.sin();
    for contour in shape.contours_mut() {
        let corners = corners(contour, cross_threshold);
        match corners.len() {
            0 => {
                for edge in &mut contour.edges {
                    edge.color = EdgeColor::WHITE;
                }
            }
            1 => color_teardrop(contour, corners[0]),
            _ => color_splines(contour, &corners),
        }
    }
}

/// A contour with a single corner: spread three colors across it, splitting
/// edges when there are too few to go around.
fn color_teardrop(contour: &mut EdgeContour, corner: usize) {
    let colors = [EdgeColor::MAGENTA, EdgeColor::WHITE, EdgeColor::YELLOW];
    let m = contour.edges.len();

    if m >= 3 {
        for i in 0..m {
            let edge = &mut contour.edges[(corner + i) % m];
            edge.color = colors[(1 + symmetrical_trichotomy(i, m)) as usize];
        }
        return;
    }

    let mut parts: Vec<EdgeSegment> = Vec::with_capacity(3 * m);
    for i in 0..m {
        let edge = contour.edges[(corner + i) % m];
        parts.extend(edge.curve.split_in_thirds().map(EdgeSegment::new));
    }
    let n = parts.len();
    for (i, part) in parts.iter_mut().enumerate() {
        part.color = colors[(1 + symmetrical_trichotomy(i, n)) as usize];
    }
    contour.edges = parts;
}

/// Switch color at every corner; the last spline avoids the first one's color
/// since they meet at the first corner.
fn color_splines(contour: &mut EdgeContour, corners: &[usize]) {
    let m = contour.edges.len();
    let spline_count = corners.len();
    let start = corners[0];

    let mut spline = 0usize;
    let mut color = CYCLE[0];
    for i in 0..m {
        let index = (start + i) % m;
        if i > 0 && corners.contains(&index) {
            spline += 1;
            color = spline_color(spline, spline_count);
        }
        contour.edges[index].color = color;
    }
}

fn spline_color(spline: usize, spline_count: usize) -> EdgeColor {
    let color = CYCLE[spline % 3];
    if spline + 1 == spline_count && color == CYCLE[0] {
        // Neither the first spline's color nor the previous one's.
        return remaining(CYCLE[(spline + 2) % 3], CYCLE[0]);
    }
    color
}

/// The cycle color that is neither `a` nor `b`.
fn remaining(a: EdgeColor, b: EdgeColor) -> EdgeColor {
    CYCLE
        .into_iter()
        .find(|&c| c != a && c != b)
        .unwrap_or(EdgeColor::WHITE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdf::shape::Curve;
    use lumina_core::math::vec2;

    fn polygon(points: &[(f32, f32)]) -> EdgeContour {
        let n = points.len();
        EdgeContour {
            edges: (0..n)
                .map(|i| {
                    let (x0, y0) = points[i];
                    let (x1, y1) = points[(i + 1) % n];
                    EdgeSegment::new(Curve::Linear([vec2(x0, y0), vec2(x1, y1)]))
                })
                .collect(),
            winding: 1,
        }
    }

    fn shape_of(contour: EdgeContour) -> Shape {
        Shape::new(vec![contour])
    }

    #[test]
    fn test_adjacent_corner_edges_differ() {
        for sides in [3usize, 4, 5, 7] {
            let points: Vec<(f32, f32)> = (0..sides)
                .map(|i| {
                    let a = i as f32 / sides as f32 * std::f32::consts::TAU;
                    (a.cos() * 10.0, a.sin() * 10.0)
                })
                .collect();
            let mut shape = shape_of(polygon(&points));
            color_edges(&mut shape, DEFAULT_ANGLE_THRESHOLD);
            let edges = &shape.contours()[0].edges;
            for i in 0..edges.len() {
                let next = &edges[(i + 1) % edges.len()];
                assert_ne!(edges[i].color, next.color, "{} sides, edge {}", sides, i);
                assert_eq!(edges[i].color.bits().count_ones(), 2);
            }
        }
    }

    #[test]
    fn test_smooth_contour_is_white() {
        let circle = EdgeContour {
            edges: vec![
                EdgeSegment::new(Curve::Quadratic([vec2(10.0, 0.0), vec2(10.0, 10.0), vec2(0.0, 10.0)])),
                EdgeSegment::new(Curve::Quadratic([vec2(0.0, 10.0), vec2(-10.0, 10.0), vec2(-10.0, 0.0)])),
                EdgeSegment::new(Curve::Quadratic([vec2(-10.0, 0.0), vec2(-10.0, -10.0), vec2(0.0, -10.0)])),
                EdgeSegment::new(Curve::Quadratic([vec2(0.0, -10.0), vec2(10.0, -10.0), vec2(10.0, 0.0)])),
            ],
            winding: 1,
        };
        let mut shape = shape_of(circle);
        color_edges(&mut shape, DEFAULT_ANGLE_THRESHOLD);
        assert!(shape.edges().all(|e| e.color == EdgeColor::WHITE));
    }

    #[test]
    fn test_teardrop_split_into_three_colors() {
        // One sharp corner at the origin, closed by a single curve.
        let teardrop = EdgeContour {
            edges: vec![
                EdgeSegment::new(Curve::Cubic([
                    vec2(0.0, 0.0),
                    vec2(20.0, 10.0),
                    vec2(20.0, -10.0),
                    vec2(0.0, 0.0),
                ])),
            ],
            winding: 1,
        };
        let mut shape = shape_of(teardrop);
        color_edges(&mut shape, DEFAULT_ANGLE_THRESHOLD);
        let colors: Vec<EdgeColor> = shape.edges().map(|e| e.color).collect();
        assert_eq!(colors, vec![EdgeColor::MAGENTA, EdgeColor::WHITE, EdgeColor::YELLOW]);
    }

    #[test]
    fn test_trichotomy() {
        let n = 5;
        let picks: Vec<i32> = (0..n).map(|i| symmetrical_trichotomy(i, n)).collect();
        assert_eq!(picks.first(), Some(&-1));
        assert_eq!(picks.last(), Some(&1));
        assert!(picks.contains(&0));
    }
}
