//! Ball-and-paddle physics core
//!
//! Bodies are kept in id order and advanced only when the caller steps the
//! world. Launch angles come from a caller-seeded RNG. Same inputs, same
//! outputs: collision winners are picked by a total order, never by iteration
//! luck.

pub mod body;
pub mod bounds;
pub mod collision;
pub mod geometry;
pub mod resolve;
pub mod spatial;
pub mod sweep;
pub mod world;

pub use body::{DEFAULT_DIRECTION, MovingBody, launch_direction};
pub use bounds::{Side, check_bounds, sweep_bounds};
pub use collision::{CollisionResult, check_aabb, check_circle_circle, check_circle_rect, check_point_rect};
pub use geometry::{Circle, Rect};
pub use resolve::{
    Candidate, ColliderKind, Target, reflect_with_english, resolve_collision,
    resolve_priority_collisions, sort_by_priority,
};
pub use spatial::{GridStats, SpatialIndex};
pub use sweep::check_continuous_circle_rect;
pub use world::{CollisionEvent, Obstacle, PhysicsWorld};
