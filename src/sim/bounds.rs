//! Play-field boundary collisions
//!
//! The field is the rectangle `[0, width] x [0, height]`. Bodies stay inside
//! it; with `open_bottom` the bottom edge lets them leave (ball lost).

use serde::{Deserialize, Serialize};

use super::collision::CollisionResult;
use super::geometry::{Circle, Rect};
use crate::Vector2;

/// One edge of the play field, in tie-break priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
    Top,
    Bottom,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::Left, Side::Right, Side::Top, Side::Bottom];

    /// Normal pointing back into the field
    pub fn inward_normal(self) -> Vector2 {
        match self {
            Side::Left => Vector2::new(1.0, 0.0),
            Side::Right => Vector2::new(-1.0, 0.0),
            Side::Top => Vector2::new(0.0, 1.0),
            Side::Bottom => Vector2::new(0.0, -1.0),
        }
    }

    /// Signed distance from `p` to this edge, positive inside the field
    fn inside_distance(self, field: &Rect, p: Vector2) -> f64 {
        match self {
            Side::Left => p.x - field.left(),
            Side::Right => field.right() - p.x,
            Side::Top => p.y - field.top(),
            Side::Bottom => field.bottom() - p.y,
        }
    }

    /// Point on the edge line closest to `p`
    fn project(self, field: &Rect, p: Vector2) -> Vector2 {
        match self {
            Side::Left => Vector2::new(field.left(), p.y),
            Side::Right => Vector2::new(field.right(), p.y),
            Side::Top => Vector2::new(p.x, field.top()),
            Side::Bottom => Vector2::new(p.x, field.bottom()),
        }
    }
}

/// The sides that reflect bodies
pub fn closed_sides(open_bottom: bool) -> impl Iterator<Item = Side> {
    Side::ALL
        .into_iter()
        .filter(move |side| !(open_bottom && *side == Side::Bottom))
}

/// Discrete test of a circle against the closed field edges
///
/// Returns one result per edge the circle touches or crosses, in side order.
pub fn check_bounds(circle: &Circle, field: &Rect, open_bottom: bool) -> Vec<(Side, CollisionResult)> {
    let center = circle.center();
    closed_sides(open_bottom)
        .filter_map(|side| {
            let penetration = circle.radius - side.inside_distance(field, center);
            (penetration >= 0.0).then(|| {
                (
                    side,
                    CollisionResult::hit(side.inward_normal(), penetration, side.project(field, center)),
                )
            })
        })
        .collect()
}

/// Swept test of a moving circle against the closed field edges
///
/// A side is hit when the center's path crosses the line one radius inside
/// that edge. Paths that start beyond the line are left to `check_bounds`.
pub fn sweep_bounds(
    prev_pos: Vector2,
    velocity: Vector2,
    dt: f64,
    radius: f64,
    field: &Rect,
    open_bottom: bool,
) -> Vec<(Side, CollisionResult)> {
    if !dt.is_finite() || dt <= 0.0 {
        return Vec::new();
    }
    let end = prev_pos + velocity * dt;

    closed_sides(open_bottom)
        .filter_map(|side| {
            let start_gap = side.inside_distance(field, prev_pos) - radius;
            let end_gap = side.inside_distance(field, end) - radius;
            if start_gap < 0.0 || end_gap >= 0.0 {
                return None;
            }
            let t = start_gap / (start_gap - end_gap);
            let hit = prev_pos + (end - prev_pos) * t;
            Some((
                side,
                CollisionResult {
                    collided: true,
                    normal: side.inward_normal(),
                    penetration: -end_gap,
                    contact_point: side.project(field, hit),
                    time_of_impact: t,
                },
            ))
        })
        .collect()
}

/// True when the circle lies entirely outside the field
pub fn is_outside(circle: &Circle, field: &Rect) -> bool {
    let center = circle.center();
    Side::ALL
        .into_iter()
        .any(|side| side.inside_distance(field, center) < -circle.radius)
}
