//! Arcade Physics - 2D ball-and-paddle physics core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (bodies, collision detection, broad phase, world)
//! - `config`: Data-driven world and body configuration
//!
//! Rendering, input, audio and scoring live outside this crate. They read
//! body state and collision events after each `PhysicsWorld::step`.

pub mod config;
pub mod sim;

pub use config::{BodyConfig, WorldConfig};
pub use sim::{
    Candidate, Circle, ColliderKind, CollisionEvent, CollisionResult, MovingBody, Obstacle,
    PhysicsWorld, Rect, Side, SpatialIndex, Target,
};

/// Double precision 2D vector used throughout the physics core
pub type Vector2 = glam::DVec2;

/// Physics configuration constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz for smooth physics)
    pub const SIM_DT: f64 = 1.0 / 120.0;
    /// Largest dt callers should hand to `step` (clamp before calling)
    pub const MAX_DT: f64 = 1.0 / 30.0;

    /// Play-field dimensions
    pub const FIELD_WIDTH: f64 = 800.0;
    pub const FIELD_HEIGHT: f64 = 600.0;
    /// Broad-phase cell size (roughly one block)
    pub const CELL_SIZE: f64 = 64.0;

    /// Ball defaults
    pub const BALL_RADIUS: f64 = 8.0;
    pub const BALL_START_SPEED: f64 = 300.0;
    /// Minimum ball speed (damping can't slow it below this)
    pub const BALL_MIN_SPEED: f64 = 150.0;
    /// Maximum ball speed
    pub const BALL_MAX_SPEED: f64 = 900.0;
    /// Fraction of speed kept after a bounce
    pub const BOUNCE_DAMPING: f64 = 0.98;
    /// Bounces never leave the ball slower than this
    pub const MIN_BOUNCE_SPEED: f64 = 200.0;

    /// Tangential deflection factor for paddle hits
    pub const PADDLE_ENGLISH: f64 = 0.5;

    /// Edge classification tolerance for swept hits (world units)
    pub const EDGE_EPSILON: f64 = 1e-3;
}

/// Squared-length threshold below which a vector is treated as zero
pub(crate) const ZERO_LENGTH_SQ: f64 = 1e-18;

/// True when both components are finite
#[inline]
pub fn is_finite_vec(v: Vector2) -> bool {
    v.x.is_finite() && v.y.is_finite()
}

/// Normalize `v`, falling back to `fallback` for zero or non-finite input
#[inline]
pub fn normalize_or(v: Vector2, fallback: Vector2) -> Vector2 {
    if !is_finite_vec(v) || v.length_squared() <= ZERO_LENGTH_SQ {
        return fallback;
    }
    v / v.length()
}
