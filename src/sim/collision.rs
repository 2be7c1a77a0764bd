//! Discrete narrow-phase collision tests
//!
//! Every function here is pure: plain geometry in, `CollisionResult` out.
//! Normals always point toward the first argument, i.e. the direction the
//! first shape has to move to separate.

use serde::{Deserialize, Serialize};

use super::geometry::{Circle, Rect};
use crate::Vector2;

/// Result of a collision check
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollisionResult {
    /// Whether a collision occurred
    pub collided: bool,
    /// Unit surface normal (pointing toward the first shape)
    pub normal: Vector2,
    /// Penetration depth along the normal (for position correction)
    pub penetration: f64,
    /// Contact point on the surface that was hit
    pub contact_point: Vector2,
    /// Fraction of the motion segment at first contact (1.0 for discrete tests)
    pub time_of_impact: f64,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            collided: false,
            normal: Vector2::ZERO,
            penetration: 0.0,
            contact_point: Vector2::ZERO,
            time_of_impact: 1.0,
        }
    }

    pub fn hit(normal: Vector2, penetration: f64, contact_point: Vector2) -> Self {
        Self {
            collided: true,
            normal,
            penetration: penetration.max(0.0),
            contact_point,
            time_of_impact: 1.0,
        }
    }
}

impl Default for CollisionResult {
    fn default() -> Self {
        Self::miss()
    }
}

/// Rectangle edge, listed in tie-break priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edge {
    Left,
    Right,
    Top,
    Bottom,
}

impl Edge {
    const ALL: [Edge; 4] = [Edge::Left, Edge::Right, Edge::Top, Edge::Bottom];

    /// Outward normal of the edge
    fn normal(self) -> Vector2 {
        match self {
            Edge::Left => Vector2::new(-1.0, 0.0),
            Edge::Right => Vector2::new(1.0, 0.0),
            Edge::Top => Vector2::new(0.0, -1.0),
            Edge::Bottom => Vector2::new(0.0, 1.0),
        }
    }

    /// Distance from an interior point to this edge
    fn distance(self, rect: &Rect, p: Vector2) -> f64 {
        match self {
            Edge::Left => p.x - rect.left(),
            Edge::Right => rect.right() - p.x,
            Edge::Top => p.y - rect.top(),
            Edge::Bottom => rect.bottom() - p.y,
        }
    }

    /// Point on the edge closest to `p`
    fn project(self, rect: &Rect, p: Vector2) -> Vector2 {
        match self {
            Edge::Left => Vector2::new(rect.left(), p.y),
            Edge::Right => Vector2::new(rect.right(), p.y),
            Edge::Top => Vector2::new(p.x, rect.top()),
            Edge::Bottom => Vector2::new(p.x, rect.bottom()),
        }
    }
}

/// Check collision between a circle and an axis-aligned rectangle
///
/// The nearest point of the rectangle to the circle center decides the
/// contact. When the center is inside (or on the border of) the rectangle the
/// normal is taken from the closest edge, ties broken left, right, top, bottom.
pub fn check_circle_rect(circle: &Circle, rect: &Rect) -> CollisionResult {
    let center = circle.center();
    let nearest = rect.clamp_point(center);
    let delta = center - nearest;
    let dist_sq = delta.length_squared();

    if dist_sq > circle.radius * circle.radius {
        return CollisionResult::miss();
    }

    if dist_sq == 0.0 {
        // Center inside: push out through the shallowest edge
        let mut best = Edge::Left;
        let mut best_dist = Edge::Left.distance(rect, center);
        for edge in Edge::ALL.into_iter().skip(1) {
            let d = edge.distance(rect, center);
            if d < best_dist {
                best = edge;
                best_dist = d;
            }
        }
        return CollisionResult::hit(
            best.normal(),
            circle.radius + best_dist,
            best.project(rect, center),
        );
    }

    let distance = dist_sq.sqrt();
    CollisionResult::hit(delta / distance, circle.radius - distance, nearest)
}

/// Check collision between two circles
///
/// Touching circles (distance == r1 + r2) count as collided with zero
/// penetration. Coincident centers use normal (1, 0).
pub fn check_circle_circle(c1: &Circle, c2: &Circle) -> CollisionResult {
    let delta = c1.center() - c2.center();
    let dist_sq = delta.length_squared();
    let radius_sum = c1.radius + c2.radius;

    if dist_sq > radius_sum * radius_sum {
        return CollisionResult::miss();
    }

    let distance = dist_sq.sqrt();
    let normal = if distance == 0.0 {
        Vector2::X
    } else {
        delta / distance
    };
    // Point on circle 1 facing circle 2
    let contact_point = c1.center() - normal * c1.radius;
    CollisionResult::hit(normal, radius_sum - distance, contact_point)
}

/// Check overlap between two axis-aligned rectangles
///
/// Penetration is the smaller of the two axis overlaps; the normal lies along
/// that axis and pushes `a` away from `b`.
pub fn check_aabb(a: &Rect, b: &Rect) -> CollisionResult {
    if !a.overlaps(b) {
        return CollisionResult::miss();
    }

    let overlap_x = a.right().min(b.right()) - a.left().max(b.left());
    let overlap_y = a.bottom().min(b.bottom()) - a.top().max(b.top());
    let (ca, cb) = (a.center(), b.center());

    let (normal, penetration) = if overlap_x <= overlap_y {
        let sign = if ca.x < cb.x { -1.0 } else { 1.0 };
        (Vector2::new(sign, 0.0), overlap_x)
    } else {
        let sign = if ca.y < cb.y { -1.0 } else { 1.0 };
        (Vector2::new(0.0, sign), overlap_y)
    };

    // Middle of the overlap region
    let overlap = Rect::from_corners(a.min().max(b.min()), a.max().min(b.max()));
    CollisionResult::hit(normal, penetration, overlap.center())
}

/// Check whether a point lies inside (or on) a rectangle
pub fn check_point_rect(point: Vector2, rect: &Rect) -> CollisionResult {
    check_circle_rect(&Circle::at(point, 0.0), rect)
}
