//! Collision response helpers and same-tick priority rules

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::bounds::Side;
use super::collision::CollisionResult;
use crate::consts::EDGE_EPSILON;
use crate::{Vector2, normalize_or};

/// Largest tangential kick from paddle english, as a fraction of speed
pub const MAX_ENGLISH: f64 = 0.75;

/// What a body ran into. Variants are listed in response priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColliderKind {
    /// The player's paddle
    Paddle,
    /// An obstacle that can move during play
    Obstacle,
    /// Static geometry: blocks and the field boundary
    Wall,
}

impl ColliderKind {
    /// Lower value wins when several contacts happen in one tick
    pub fn priority(self) -> u8 {
        match self {
            ColliderKind::Paddle => 0,
            ColliderKind::Obstacle => 1,
            ColliderKind::Wall => 2,
        }
    }
}

/// Identity of the thing that was hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Target {
    /// Caller-supplied obstacle id
    Obstacle(u32),
    /// Field edge
    Boundary(Side),
}

impl Target {
    /// Stable ordering: obstacles by id, then boundary sides
    fn sort_key(self) -> (u8, u32) {
        match self {
            Target::Obstacle(id) => (0, id),
            Target::Boundary(side) => (1, side as u32),
        }
    }
}

/// A possible response for one body this tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub kind: ColliderKind,
    pub target: Target,
    pub result: CollisionResult,
    /// Found by the swept test (result holds a time of impact)
    pub swept: bool,
}

impl Candidate {
    pub fn new(kind: ColliderKind, target: Target, result: CollisionResult) -> Self {
        Self {
            kind,
            target,
            result,
            swept: false,
        }
    }

    pub fn swept(mut self, swept: bool) -> Self {
        self.swept = swept;
        self
    }

    /// Total order: kind priority, earliest impact, deepest penetration, target
    pub fn priority_cmp(&self, other: &Self) -> Ordering {
        self.kind
            .priority()
            .cmp(&other.kind.priority())
            .then_with(|| self.result.time_of_impact.total_cmp(&other.result.time_of_impact))
            .then_with(|| other.result.penetration.total_cmp(&self.result.penetration))
            .then_with(|| self.target.sort_key().cmp(&other.target.sort_key()))
    }
}

/// Sort candidates so the one that should respond comes first
pub fn sort_by_priority(candidates: &mut [Candidate]) {
    candidates.sort_by(Candidate::priority_cmp);
}

/// Pick the single collision to respond to from this tick's candidates
///
/// Misses are dropped. Only contacts within [`EDGE_EPSILON`] of the earliest
/// swept contact compete, so a body never skips past a surface it reached
/// first. Among those, paddle beats obstacle beats wall and one physical event
/// never counts twice.
pub fn resolve_priority_collisions(candidates: &[Candidate]) -> Option<Candidate> {
    let earliest_swept = candidates
        .iter()
        .filter(|c| c.result.collided && c.swept)
        .map(|c| c.result.time_of_impact)
        .min_by(f64::total_cmp);

    candidates
        .iter()
        .filter(|c| c.result.collided)
        .filter(|c| earliest_swept.is_none_or(|t| c.result.time_of_impact <= t + EDGE_EPSILON))
        .min_by(|a, b| a.priority_cmp(b))
        .copied()
}

/// Separate overlapping shapes along the collision normal
///
/// The normal points toward `pos_a`. A single dynamic body moves by the full
/// penetration; two dynamic bodies split it evenly.
pub fn resolve_collision(result: &CollisionResult, pos_a: &mut Vector2, pos_b: Option<&mut Vector2>) {
    if !result.collided || result.penetration <= 0.0 {
        return;
    }
    match pos_b {
        Some(pos_b) => {
            let half = result.normal * (result.penetration / 2.0);
            *pos_a += half;
            *pos_b -= half;
        }
        None => *pos_a += result.normal * result.penetration,
    }
}

/// Tilt a bounced velocity by where the ball struck the paddle
///
/// `offset` runs from -1 (left end) to 1 (right end). The tangential kick is
/// clamped to [`MAX_ENGLISH`] of the speed, and the speed is preserved.
pub fn reflect_with_english(velocity: Vector2, normal: Vector2, offset: f64, english_factor: f64) -> Vector2 {
    let speed = velocity.length();
    if speed == 0.0 || !offset.is_finite() || !english_factor.is_finite() {
        return velocity;
    }
    let tangent = Vector2::new(-normal.y, normal.x);
    let max_english = speed * MAX_ENGLISH;
    let english = (offset.clamp(-1.0, 1.0) * english_factor * speed).clamp(-max_english, max_english);

    let direction = normalize_or(velocity + tangent * english, velocity / speed);
    direction * speed
}
