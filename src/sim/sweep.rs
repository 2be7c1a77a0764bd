//! Continuous (swept) collision detection
//!
//! Fast balls can cover more than their own radius in one tick and pass
//! straight through a thin block between two discrete checks. These tests
//! look at the whole motion segment instead of its end point.

use super::collision::CollisionResult;
use super::geometry::{Circle, Rect};
use crate::consts::EDGE_EPSILON;
use crate::{Vector2, normalize_or};

/// Axis deltas below this are treated as parallel to the slab
const PARALLEL_EPSILON: f64 = 1e-12;

/// Parametric interval where a segment lies inside a rectangle (slab method)
///
/// Returns `(t_min, t_max)` along `origin + delta * t`, or `None` when the
/// segment's supporting line misses the rectangle.
pub fn segment_slab_interval(origin: Vector2, delta: Vector2, rect: &Rect) -> Option<(f64, f64)> {
    let mut t_min = f64::NEG_INFINITY;
    let mut t_max = f64::INFINITY;

    for (o, d, lo, hi) in [
        (origin.x, delta.x, rect.left(), rect.right()),
        (origin.y, delta.y, rect.top(), rect.bottom()),
    ] {
        if d.abs() < PARALLEL_EPSILON {
            if o < lo || o > hi {
                return None;
            }
            continue;
        }
        let inv = 1.0 / d;
        let t1 = (lo - o) * inv;
        let t2 = (hi - o) * inv;
        t_min = t_min.max(t1.min(t2));
        t_max = t_max.min(t1.max(t2));
        if t_min > t_max {
            return None;
        }
    }

    Some((t_min, t_max))
}

/// Swept circle vs rectangle over the segment `[prev_pos, prev_pos + velocity * dt]`
///
/// Only `circle.radius` is used; the circle's own center is ignored. The
/// rectangle is expanded by the radius and the center's path is intersected
/// with it. Starting inside the expanded rectangle is not a swept hit (the
/// discrete test covers that case).
///
/// Hits near a corner of the expanded rectangle take their normal from the
/// un-expanded rectangle center toward the hit point. This approximates the
/// rounded corner of the true swept shape.
pub fn check_continuous_circle_rect(
    circle: &Circle,
    prev_pos: Vector2,
    velocity: Vector2,
    rect: &Rect,
    dt: f64,
) -> CollisionResult {
    if !dt.is_finite() || dt <= 0.0 {
        return CollisionResult::miss();
    }
    let delta = velocity * dt;
    if delta == Vector2::ZERO {
        return CollisionResult::miss();
    }

    let expanded = rect.expand(circle.radius);
    let Some((t_min, t_max)) = segment_slab_interval(prev_pos, delta, &expanded) else {
        return CollisionResult::miss();
    };
    if t_min > t_max || !(0.0..=1.0).contains(&t_min) {
        return CollisionResult::miss();
    }

    let hit = prev_pos + delta * t_min;
    let normal = classify_hit_normal(hit, &expanded, rect, delta);
    let end = prev_pos + delta;

    CollisionResult {
        collided: true,
        normal,
        penetration: (hit - end).dot(normal).max(0.0),
        contact_point: rect.clamp_point(hit),
        time_of_impact: t_min,
    }
}

/// Normal for a swept hit on the expanded rectangle
fn classify_hit_normal(hit: Vector2, expanded: &Rect, rect: &Rect, delta: Vector2) -> Vector2 {
    let candidates = [
        ((hit.x - expanded.left()).abs() < EDGE_EPSILON, Vector2::new(-1.0, 0.0)),
        ((hit.x - expanded.right()).abs() < EDGE_EPSILON, Vector2::new(1.0, 0.0)),
        ((hit.y - expanded.top()).abs() < EDGE_EPSILON, Vector2::new(0.0, -1.0)),
        ((hit.y - expanded.bottom()).abs() < EDGE_EPSILON, Vector2::new(0.0, 1.0)),
    ];

    let mut matched = candidates.iter().filter(|(on_edge, _)| *on_edge);
    match (matched.next(), matched.next()) {
        (Some((_, normal)), None) => *normal,
        // Corner (or no clean edge): direction from the true center
        _ => normalize_or(hit - rect.center(), normalize_or(-delta, Vector2::X)),
    }
}

/// Position of the swept center at fraction `t` of the tick
#[inline]
pub fn position_at(prev_pos: Vector2, velocity: Vector2, dt: f64, t: f64) -> Vector2 {
    prev_pos + velocity * dt * t
}
