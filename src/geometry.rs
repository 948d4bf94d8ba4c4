//! Planar primitives shared by graph construction and query snapping.
//!
//! The tolerances below are part of the routing contract: changing one
//! changes which segments split, which nodes bridge and which points collapse.

use crate::Point;

/// Parallel/collinear detection and interior-split bounds.
pub const EPS_DEGENERATE: f64 = 1e-9;
/// General coordinate comparisons and consecutive-point collapsing.
pub const EPS_COORD: f64 = 1e-6;
/// Perpendicular distance under which a node counts as lying on a segment.
pub const EPS_ON_SEGMENT: f64 = 1e-4;

pub fn distance(a: Point, b: Point) -> f64 {
    (b.x - a.x).hypot(b.y - a.y)
}

/// Closest point to `p` on segment `[a, b]` and its parameter, clamped to `[0, 1]`.
///
/// A zero-length segment yields `(a, 0.0)`.
pub fn project_point_to_segment(p: Point, a: Point, b: Point) -> (Point, f64) {
    let abx = b.x - a.x;
    let aby = b.y - a.y;
    let ab2 = abx * abx + aby * aby;

    if ab2 == 0.0 {
        return (a, 0.0);
    }

    let t = ((p.x - a.x) * abx + (p.y - a.y) * aby) / ab2;
    let t = t.clamp(0.0, 1.0);

    (Point::new(a.x + t * abx, a.y + t * aby), t)
}

/// Parametric intersection of `[p1, p2]` and `[q1, q2]`.
///
/// Returns the crossing point with the raw parameters `t` (along `p`) and
/// `u` (along `q`). Parallel and collinear pairs return `None`; overlapping
/// collinear segments are never subdivided.
pub fn segment_intersection(
    p1: Point,
    p2: Point,
    q1: Point,
    q2: Point,
) -> Option<(Point, f64, f64)> {
    let r = (p2.x - p1.x, p2.y - p1.y);
    let s = (q2.x - q1.x, q2.y - q1.y);
    let rxs = cross(r, s);

    if rxs.abs() < EPS_DEGENERATE {
        return None;
    }

    let qp = (q1.x - p1.x, q1.y - p1.y);
    let t = cross(qp, s) / rxs;
    let u = cross(qp, r) / rxs;

    let within = |v: f64| (-EPS_DEGENERATE..=1.0 + EPS_DEGENERATE).contains(&v);
    if !within(t) || !within(u) {
        return None;
    }

    let tc = t.clamp(0.0, 1.0);
    Some((Point::new(p1.x + r.0 * tc, p1.y + r.1 * tc), t, u))
}

/// Point at parameter `t` along `[a, b]`.
pub fn lerp(a: Point, b: Point, t: f64) -> Point {
    Point::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
}

/// True when `t` lies strictly inside `(0, 1)` by more than [`EPS_DEGENERATE`].
pub fn is_interior(t: f64) -> bool {
    t > EPS_DEGENERATE && t < 1.0 - EPS_DEGENERATE
}

#[inline]
fn cross(a: (f64, f64), b: (f64, f64)) -> f64 {
    a.0 * b.1 - a.1 * b.0
}
