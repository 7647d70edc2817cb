//! Point/segment/circle primitives used by sensing and placement.

use serde::{Deserialize, Serialize};

/// Axis-aligned 2-D point in normalized arena units.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    /// Construct a new point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance_to(self, other: Self) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Directed line segment from `start` to `end`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Segment {
    pub start: Vec2,
    pub end: Vec2,
}

impl Segment {
    /// Construct a new segment.
    #[must_use]
    pub const fn new(start: Vec2, end: Vec2) -> Self {
        Self { start, end }
    }
}

/// Distance from `point` to the closest point on `seg`.
///
/// The projection parameter is clamped to [0, 1], so points projecting past
/// an endpoint measure against that endpoint.
#[must_use]
pub fn distance_point_to_segment(point: Vec2, seg: Segment) -> f32 {
    let cx = seg.end.x - seg.start.x;
    let cy = seg.end.y - seg.start.y;
    let len_sq = cx * cx + cy * cy;
    if len_sq <= f32::EPSILON {
        return point.distance_to(seg.start);
    }
    let ax = point.x - seg.start.x;
    let ay = point.y - seg.start.y;
    let param = ((ax * cx + ay * cy) / len_sq).clamp(0.0, 1.0);
    let nearest = Vec2::new(seg.start.x + param * cx, seg.start.y + param * cy);
    point.distance_to(nearest)
}

/// Whether `seg` passes through the circle at `center` with `radius`.
#[must_use]
pub fn segment_sees_circle(seg: Segment, center: Vec2, radius: f32) -> bool {
    distance_point_to_segment(center, seg) < radius
}

/// Distance along an eye ray at which it crosses the arena boundary.
///
/// The arena spans `[0, bound]` on both axes and the ray has length
/// `view_distance`. Exactly one boundary is evaluated, in fixed priority
/// order: left, right, bottom, top. A ray that exits through a corner
/// therefore reports only the first-checked side; this bias is deliberate
/// and covered by tests. Returns `None` while the far endpoint stays inside
/// bounds.
#[must_use]
pub fn wall_crossing_distance(eye: Segment, bound: f32, view_distance: f32) -> Option<f32> {
    let tip = eye.end;
    if tip.x < 0.0 {
        let ratio = ((tip.x - eye.start.x).abs() / view_distance).clamp(-1.0, 1.0);
        let angle = ratio.asin();
        if angle == 0.0 {
            Some(view_distance - tip.x.abs())
        } else {
            Some(view_distance - tip.x.abs() / angle.sin())
        }
    } else if tip.x > bound {
        let ratio = ((tip.x - eye.start.x) / view_distance).clamp(-1.0, 1.0);
        let angle = ratio.asin();
        if angle == 0.0 {
            Some(view_distance - (tip.x - bound))
        } else {
            Some(view_distance - (tip.x - bound) / angle.sin())
        }
    } else if tip.y < 0.0 {
        let ratio = ((tip.y - eye.start.y).abs() / view_distance).clamp(-1.0, 1.0);
        let angle = ratio.acos();
        if angle == std::f32::consts::FRAC_PI_2 {
            Some(view_distance - tip.y.abs())
        } else {
            Some(view_distance - tip.y.abs() / angle.cos())
        }
    } else if tip.y > bound {
        let ratio = ((tip.y - eye.start.y) / view_distance).clamp(-1.0, 1.0);
        let angle = ratio.acos();
        if angle == std::f32::consts::FRAC_PI_2 {
            Some(view_distance - (tip.y - bound))
        } else {
            Some(view_distance - (tip.y - bound) / angle.cos())
        }
    } else {
        None
    }
}
