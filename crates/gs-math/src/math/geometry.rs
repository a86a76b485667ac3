//! Planar geometry for boundary curves and segment intersections.

use serde::{Deserialize, Serialize};

/// A point in the (total gift, value) plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }
}

/// 2D cross product of `b - a` and `q - a`.
///
/// Positive when `q` lies to the left of the directed line `a -> b`, which for
/// a left-to-right line means above it; zero when collinear.
pub fn cross(a: Point, b: Point, q: Point) -> f64 {
    (b.x - a.x) * (q.y - a.y) - (b.y - a.y) * (q.x - a.x)
}

/// Whether `q` lies on or above every edge of a left-to-right polyline.
///
/// Each edge is treated as its full supporting line, so the test is a
/// conjunction of half-planes. Stops at the first edge with `q` strictly
/// below. A polyline with fewer than two vertices has no edges and accepts
/// every point.
pub fn on_or_above_polyline(vertices: &[Point], q: Point) -> bool {
    vertices.windows(2).all(|w| cross(w[0], w[1], q) >= 0.0)
}

/// Intersection of `y = a1 x + b1` and `y = a2 x + b2`; `None` when parallel.
pub fn line_intersection(a1: f64, b1: f64, a2: f64, b2: f64) -> Option<Point> {
    if a1 == a2 {
        return None;
    }
    let x = (b2 - b1) / (a1 - a2);
    Some(Point::new(x, a1 * x + b1))
}
