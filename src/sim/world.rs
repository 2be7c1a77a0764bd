//! Physics world: advances bodies one tick and resolves their contacts
//!
//! The world owns the bodies, never the obstacles. Obstacle rectangles (paddle
//! included) are handed in every tick, optionally pre-registered in a
//! caller-owned [`SpatialIndex`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::body::MovingBody;
use super::bounds::{self, Side};
use super::collision::{CollisionResult, check_circle_rect};
use super::geometry::Rect;
use super::resolve::{
    Candidate, ColliderKind, Target, reflect_with_english, resolve_collision,
    resolve_priority_collisions,
};
use super::spatial::SpatialIndex;
use super::sweep::{check_continuous_circle_rect, position_at};
use crate::Vector2;
use crate::config::WorldConfig;

/// A rectangle bodies bounce off
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: u32,
    pub rect: Rect,
    pub kind: ColliderKind,
}

impl Obstacle {
    pub fn new(id: u32, rect: Rect, kind: ColliderKind) -> Self {
        Self { id, rect, kind }
    }

    pub fn paddle(id: u32, rect: Rect) -> Self {
        Self::new(id, rect, ColliderKind::Paddle)
    }

    pub fn movable(id: u32, rect: Rect) -> Self {
        Self::new(id, rect, ColliderKind::Obstacle)
    }

    /// Static block
    pub fn wall(id: u32, rect: Rect) -> Self {
        Self::new(id, rect, ColliderKind::Wall)
    }
}

/// One collision response applied during a step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollisionEvent {
    pub body_id: u32,
    pub kind: ColliderKind,
    pub target: Target,
    pub result: CollisionResult,
    /// Resolved by the swept (continuous) test
    pub swept: bool,
}

impl CollisionEvent {
    /// Obstacle id, if the event was not a boundary bounce
    pub fn obstacle_id(&self) -> Option<u32> {
        match self.target {
            Target::Obstacle(id) => Some(id),
            Target::Boundary(_) => None,
        }
    }
}

/// Owns the moving bodies and the world configuration
#[derive(Debug, Clone)]
pub struct PhysicsWorld {
    config: WorldConfig,
    /// Sorted by id for deterministic iteration
    bodies: Vec<MovingBody>,
    /// Steps taken so far
    ticks: u64,
}

impl PhysicsWorld {
    pub fn new(config: WorldConfig) -> Self {
        let config = config.validated();
        log::info!(
            "Physics world {}x{} (gravity {}, min bounce {})",
            config.field_width,
            config.field_height,
            config.gravity,
            config.min_bounce_speed
        );
        Self {
            config,
            bodies: Vec::new(),
            ticks: 0,
        }
    }

    #[inline]
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Live reconfiguration; bodies are kept as they are
    pub fn update(&mut self, config: WorldConfig) {
        let config = config.validated();
        if config != self.config {
            log::info!(
                "Physics world reconfigured: {}x{} (gravity {})",
                config.field_width,
                config.field_height,
                config.gravity
            );
        }
        self.config = config;
    }

    /// The play field rectangle
    pub fn field(&self) -> Rect {
        Rect::new(0.0, 0.0, self.config.field_width, self.config.field_height)
    }

    #[inline]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Add a body; a body with the same id already present is left untouched
    pub fn add_body(&mut self, body: MovingBody) -> bool {
        match self.bodies.binary_search_by_key(&body.id, |b| b.id) {
            Ok(_) => {
                log::debug!("Body {} already in world", body.id);
                false
            }
            Err(pos) => {
                self.bodies.insert(pos, body);
                true
            }
        }
    }

    /// Remove a body by id; absent ids are a no-op
    pub fn remove_body(&mut self, id: u32) -> Option<MovingBody> {
        self.bodies
            .binary_search_by_key(&id, |b| b.id)
            .ok()
            .map(|pos| self.bodies.remove(pos))
    }

    pub fn body(&self, id: u32) -> Option<&MovingBody> {
        self.bodies
            .binary_search_by_key(&id, |b| b.id)
            .ok()
            .map(|pos| &self.bodies[pos])
    }

    pub fn body_mut(&mut self, id: u32) -> Option<&mut MovingBody> {
        self.bodies
            .binary_search_by_key(&id, |b| b.id)
            .ok()
            .map(|pos| &mut self.bodies[pos])
    }

    /// All bodies in id order
    pub fn bodies(&self) -> &[MovingBody] {
        &self.bodies
    }

    pub fn active_count(&self) -> usize {
        self.bodies.iter().filter(|b| b.active).count()
    }

    /// True when the body has fully left the play field
    ///
    /// The world never removes such bodies; the game decides (e.g. ball lost).
    pub fn is_out_of_bounds(&self, body: &MovingBody) -> bool {
        bounds::is_outside(&body.circle(), &self.field())
    }

    /// Earliest closed field edge crossed by a swept circle, if any
    pub fn sweep_boundaries(
        &self,
        prev_pos: Vector2,
        velocity: Vector2,
        dt: f64,
        radius: f64,
    ) -> Option<(Side, CollisionResult)> {
        bounds::sweep_bounds(
            prev_pos,
            velocity,
            dt,
            radius,
            &self.field(),
            self.config.open_bottom,
        )
        .into_iter()
        .min_by(|(sa, a), (sb, b)| {
            a.time_of_impact
                .total_cmp(&b.time_of_impact)
                .then_with(|| sa.cmp(sb))
        })
    }

    /// Advance every active body by `dt`, testing against all `obstacles`
    pub fn step(&mut self, dt: f64, obstacles: &[Obstacle]) -> Vec<CollisionEvent> {
        self.step_inner(dt, obstacles, None)
    }

    /// Like [`PhysicsWorld::step`], with `index` as broad phase
    ///
    /// Obstacles registered in the index are only tested when the index
    /// reports them near the body's path. Obstacles missing from the index
    /// (typically the paddle) are always tested.
    pub fn step_indexed(
        &mut self,
        dt: f64,
        index: &SpatialIndex,
        obstacles: &[Obstacle],
    ) -> Vec<CollisionEvent> {
        self.step_inner(dt, obstacles, Some(index))
    }

    fn step_inner(
        &mut self,
        dt: f64,
        obstacles: &[Obstacle],
        index: Option<&SpatialIndex>,
    ) -> Vec<CollisionEvent> {
        if !dt.is_finite() || dt <= 0.0 {
            log::warn!("Ignoring step with invalid dt {}", dt);
            return Vec::new();
        }
        self.ticks += 1;

        let broad_phase = index.map(|index| BroadPhase::new(index, obstacles));
        let field = self.field();
        let config = &self.config;
        let mut events = Vec::new();

        for body in self.bodies.iter_mut().filter(|b| b.active) {
            let prev_pos = body.position;
            if config.gravity != 0.0 {
                body.apply_acceleration(Vector2::new(0.0, config.gravity), dt);
            }
            body.integrate(dt);

            let nearby: Vec<&Obstacle> = match &broad_phase {
                Some(broad_phase) => broad_phase.candidates(prev_pos, body.position, body.radius()),
                None => obstacles.iter().collect(),
            };

            if let Some(event) = collide_body(body, prev_pos, dt, config, &field, &nearby) {
                log::trace!(
                    "tick {}: body {} hit {:?} (swept: {})",
                    self.ticks,
                    event.body_id,
                    event.target,
                    event.swept
                );
                events.push(event);
            }
        }

        events
    }
}

/// Per-step split of obstacles into indexed and always-tested
struct BroadPhase<'a> {
    index: &'a SpatialIndex,
    indexed: HashMap<u32, &'a Obstacle>,
    unindexed: Vec<&'a Obstacle>,
}

impl<'a> BroadPhase<'a> {
    fn new(index: &'a SpatialIndex, obstacles: &'a [Obstacle]) -> Self {
        let mut indexed = HashMap::new();
        let mut unindexed = Vec::new();
        for obstacle in obstacles {
            if index.contains(obstacle.id) {
                indexed.insert(obstacle.id, obstacle);
            } else {
                unindexed.push(obstacle);
            }
        }
        Self {
            index,
            indexed,
            unindexed,
        }
    }

    /// Obstacles worth a narrow-phase test for a body moving `prev -> end`
    fn candidates(&self, prev: Vector2, end: Vector2, radius: f64) -> Vec<&'a Obstacle> {
        let region = Rect::from_corners(prev, end).expand(radius);
        let mut nearby = self.unindexed.clone();
        nearby.extend(
            self.index
                .query(&region)
                .into_iter()
                .filter_map(|id| self.indexed.get(&id).copied()),
        );
        nearby
    }
}

/// Test one integrated body against boundaries and obstacles, then apply the
/// winning response
fn collide_body(
    body: &mut MovingBody,
    prev_pos: Vector2,
    dt: f64,
    config: &WorldConfig,
    field: &Rect,
    obstacles: &[&Obstacle],
) -> Option<CollisionEvent> {
    let velocity = body.velocity();
    let circle = body.circle();
    // Discrete checks can miss a thin surface once a tick moves farther than the radius
    let swept = (body.position - prev_pos).length() > body.radius();

    let mut candidates = Vec::new();
    for obstacle in obstacles {
        let target = Target::Obstacle(obstacle.id);
        if swept {
            let result = check_continuous_circle_rect(&circle, prev_pos, velocity, &obstacle.rect, dt);
            if result.collided {
                candidates.push(Candidate::new(obstacle.kind, target, result).swept(true));
                continue;
            }
        }
        let result = check_circle_rect(&circle, &obstacle.rect);
        if result.collided {
            candidates.push(Candidate::new(obstacle.kind, target, result));
        }
    }

    let swept_walls = if swept {
        bounds::sweep_bounds(prev_pos, velocity, dt, body.radius(), field, config.open_bottom)
    } else {
        Vec::new()
    };
    let (walls, walls_swept) = if swept_walls.is_empty() {
        (bounds::check_bounds(&circle, field, config.open_bottom), false)
    } else {
        (swept_walls, true)
    };
    candidates.extend(walls.into_iter().map(|(side, result)| {
        Candidate::new(ColliderKind::Wall, Target::Boundary(side), result).swept(walls_swept)
    }));

    let winner = resolve_priority_collisions(&candidates)?;
    let result = winner.result;

    if winner.swept {
        body.position = position_at(prev_pos, velocity, dt, result.time_of_impact);
    } else {
        resolve_collision(&result, &mut body.position, None);
    }

    // Moving away already: separate only
    if body.velocity().dot(result.normal) >= 0.0 {
        return None;
    }

    body.reflect(result.normal);

    if winner.kind == ColliderKind::Paddle && config.paddle_english != 0.0 && result.normal.y < 0.0 {
        let paddle = obstacles
            .iter()
            .find(|o| winner.target == Target::Obstacle(o.id))
            .map(|o| o.rect);
        if let Some(paddle) = paddle {
            let half_width = paddle.width / 2.0;
            let offset = if half_width > 0.0 {
                (result.contact_point.x - paddle.center().x) / half_width
            } else {
                0.0
            };
            body.set_velocity(reflect_with_english(
                body.velocity(),
                result.normal,
                offset,
                config.paddle_english,
            ));
        }
    }

    if body.speed() < config.min_bounce_speed {
        body.set_speed_preserving_direction(config.min_bounce_speed);
    }

    Some(CollisionEvent {
        body_id: body.id,
        kind: winner.kind,
        target: winner.target,
        result,
        swept: winner.swept,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BodyConfig;
    use crate::consts::SIM_DT;

    fn config() -> WorldConfig {
        WorldConfig {
            field_width: 800.0,
            field_height: 600.0,
            gravity: 0.0,
            min_bounce_speed: 0.0,
            cell_size: 64.0,
            open_bottom: true,
            paddle_english: 0.0,
        }
    }

    fn ball(id: u32, pos: Vector2, vel: Vector2) -> MovingBody {
        let body_config = BodyConfig {
            position: pos,
            speed: vel.length(),
            radius: 8.0,
            bounce_damping: 1.0,
            min_speed: 50.0,
            max_speed: 5000.0,
        };
        MovingBody::with_direction(id, &body_config, vel)
    }

    #[test]
    fn test_add_remove_idempotent() {
        let mut world = PhysicsWorld::new(config());
        assert!(world.add_body(ball(2, Vector2::new(100.0, 100.0), Vector2::new(100.0, 0.0))));
        assert!(world.add_body(ball(1, Vector2::new(200.0, 100.0), Vector2::new(100.0, 0.0))));
        assert!(!world.add_body(ball(1, Vector2::new(0.0, 0.0), Vector2::new(100.0, 0.0))));

        let ids: Vec<u32> = world.bodies().iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(world.body(1).unwrap().position, Vector2::new(200.0, 100.0));

        assert!(world.remove_body(1).is_some());
        assert!(world.remove_body(1).is_none());
        assert_eq!(world.bodies().len(), 1);
    }

    #[test]
    fn test_step_moves_bodies() {
        let mut world = PhysicsWorld::new(config());
        world.add_body(ball(1, Vector2::new(400.0, 300.0), Vector2::new(120.0, 0.0)));
        let events = world.step(0.5, &[]);
        assert!(events.is_empty());
        assert_eq!(world.body(1).unwrap().position, Vector2::new(460.0, 300.0));
        assert_eq!(world.ticks(), 1);
    }

    #[test]
    fn test_inactive_bodies_are_skipped() {
        let mut world = PhysicsWorld::new(config());
        let mut body = ball(1, Vector2::new(400.0, 300.0), Vector2::new(120.0, 0.0));
        body.active = false;
        world.add_body(body);
        world.step(0.5, &[]);
        assert_eq!(world.body(1).unwrap().position, Vector2::new(400.0, 300.0));
        assert_eq!(world.active_count(), 0);
    }

    #[test]
    fn test_invalid_dt_is_ignored() {
        let mut world = PhysicsWorld::new(config());
        world.add_body(ball(1, Vector2::new(400.0, 300.0), Vector2::new(120.0, 0.0)));
        assert!(world.step(f64::NAN, &[]).is_empty());
        assert!(world.step(-1.0, &[]).is_empty());
        assert_eq!(world.ticks(), 0);
        assert_eq!(world.body(1).unwrap().position, Vector2::new(400.0, 300.0));
    }

    #[test]
    fn test_discrete_wall_bounce() {
        let mut world = PhysicsWorld::new(config());
        world.add_body(ball(1, Vector2::new(10.0, 300.0), Vector2::new(-300.0, 0.0)));

        // Moves 2.5 < radius: discrete path
        let events = world.step(SIM_DT, &[]);
        assert_eq!(events.len(), 1);
        let event = events[0];
        assert_eq!(event.target, Target::Boundary(Side::Left));
        assert_eq!(event.kind, ColliderKind::Wall);
        assert!(!event.swept);

        let body = world.body(1).unwrap();
        assert!((body.position.x - 8.0).abs() < 1e-9);
        assert!(body.velocity().x > 0.0);
    }

    #[test]
    fn test_fast_body_stops_at_first_contact_with_boundary() {
        let mut world = PhysicsWorld::new(config());
        world.add_body(ball(1, Vector2::new(400.0, 50.0), Vector2::new(0.0, -4000.0)));

        let events = world.step(1.0 / 40.0, &[]);
        assert_eq!(events.len(), 1);
        assert!(events[0].swept);
        assert_eq!(events[0].target, Target::Boundary(Side::Top));

        let body = world.body(1).unwrap();
        assert!((body.position.y - 8.0).abs() < 1e-9);
        assert!(body.velocity().y > 0.0);
    }

    #[test]
    fn test_fast_body_does_not_tunnel_through_thin_block() {
        let mut world = PhysicsWorld::new(config());
        world.add_body(ball(1, Vector2::new(400.0, 400.0), Vector2::new(0.0, -6000.0)));
        let block = Obstacle::wall(10, Rect::new(350.0, 340.0, 100.0, 4.0));

        let events = world.step(1.0 / 60.0, &[block]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].obstacle_id(), Some(10));
        assert!(events[0].swept);

        let body = world.body(1).unwrap();
        // Bottom of block at 344, plus radius
        assert!((body.position.y - 352.0).abs() < 1e-6);
        assert!(body.velocity().y > 0.0);
    }

    #[test]
    fn test_fast_body_stops_at_block_in_front_of_paddle() {
        let mut world = PhysicsWorld::new(config());
        world.add_body(ball(1, Vector2::new(400.0, 400.0), Vector2::new(0.0, 4000.0)));
        let block = Obstacle::wall(2, Rect::new(350.0, 420.0, 100.0, 4.0));
        let paddle = Obstacle::paddle(1, Rect::new(350.0, 480.0, 100.0, 12.0));

        // 100 units this tick: block face at t = 0.12, paddle at t = 0.72
        let events = world.step(1.0 / 40.0, &[paddle, block]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, ColliderKind::Wall);
        assert_eq!(events[0].obstacle_id(), Some(2));
        assert!(events[0].swept);
        assert!((events[0].result.time_of_impact - 0.12).abs() < 1e-9);

        let body = world.body(1).unwrap();
        assert!((body.position.y - 412.0).abs() < 1e-9);
        assert!(body.velocity().y < 0.0);
    }

    #[test]
    fn test_paddle_wins_over_wall_in_same_tick() {
        let mut world = PhysicsWorld::new(config());
        world.add_body(ball(1, Vector2::new(400.0, 500.0), Vector2::new(0.0, 120.0)));
        let paddle = Obstacle::paddle(1, Rect::new(350.0, 505.0, 100.0, 10.0));
        let block = Obstacle::wall(2, Rect::new(380.0, 495.0, 40.0, 2.0));

        let events = world.step(SIM_DT, &[block, paddle]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, ColliderKind::Paddle);
        assert_eq!(events[0].obstacle_id(), Some(1));
    }

    #[test]
    fn test_min_bounce_speed_boost() {
        let mut world = PhysicsWorld::new(WorldConfig {
            min_bounce_speed: 300.0,
            ..config()
        });
        let mut body = ball(1, Vector2::new(8.5, 300.0), Vector2::new(-100.0, 0.0));
        body.set_bounce_damping(0.5);
        world.add_body(body);

        world.step(SIM_DT, &[]);
        let body = world.body(1).unwrap();
        assert!((body.speed() - 300.0).abs() < 1e-9);
        assert!(body.velocity().x > 0.0);
    }

    #[test]
    fn test_no_double_reflect_when_leaving() {
        let mut world = PhysicsWorld::new(config());
        // Overlapping the left wall but already moving away
        world.add_body(ball(1, Vector2::new(5.0, 300.0), Vector2::new(100.0, 0.0)));
        let events = world.step(SIM_DT, &[]);
        assert!(events.is_empty());
        let body = world.body(1).unwrap();
        assert!(body.velocity().x > 0.0);
        assert!((body.position.x - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_open_bottom_and_out_of_bounds() {
        let mut world = PhysicsWorld::new(config());
        world.add_body(ball(1, Vector2::new(400.0, 590.0), Vector2::new(0.0, 600.0)));

        for _ in 0..10 {
            assert!(world.step(SIM_DT, &[]).is_empty());
        }
        let body = world.body(1).unwrap();
        assert!(world.is_out_of_bounds(body));
        // World leaves the decision to the caller
        assert_eq!(world.bodies().len(), 1);
    }

    #[test]
    fn test_closed_bottom_reflects() {
        let mut world = PhysicsWorld::new(WorldConfig {
            open_bottom: false,
            ..config()
        });
        world.add_body(ball(1, Vector2::new(400.0, 590.0), Vector2::new(0.0, 600.0)));
        let events = world.step(SIM_DT, &[]);
        assert_eq!(events[0].target, Target::Boundary(Side::Bottom));
    }

    #[test]
    fn test_gravity_pulls_down() {
        let mut world = PhysicsWorld::new(WorldConfig {
            gravity: 500.0,
            ..config()
        });
        world.add_body(ball(1, Vector2::new(400.0, 300.0), Vector2::new(100.0, 0.0)));
        world.step(SIM_DT, &[]);
        assert!(world.body(1).unwrap().velocity().y > 0.0);
    }

    #[test]
    fn test_paddle_english_tilts_bounce() {
        let mut world = PhysicsWorld::new(WorldConfig {
            paddle_english: 0.5,
            ..config()
        });
        // Straight down onto the right half of the paddle
        world.add_body(ball(1, Vector2::new(440.0, 498.0), Vector2::new(0.0, 120.0)));
        let paddle = Obstacle::paddle(1, Rect::new(350.0, 505.0, 100.0, 10.0));

        let events = world.step(SIM_DT, &[paddle]);
        assert_eq!(events.len(), 1);
        let v = world.body(1).unwrap().velocity();
        assert!(v.y < 0.0);
        assert!(v.x > 0.0);
    }

    #[test]
    fn test_update_keeps_bodies() {
        let mut world = PhysicsWorld::new(config());
        world.add_body(ball(1, Vector2::new(400.0, 300.0), Vector2::new(100.0, 0.0)));
        world.update(WorldConfig {
            field_width: 1024.0,
            ..config()
        });
        assert_eq!(world.field().width, 1024.0);
        assert_eq!(world.bodies().len(), 1);
    }

    #[test]
    fn test_sweep_boundaries_picks_earliest() {
        let world = PhysicsWorld::new(config());
        // Heading up-left into the corner: top line reached first
        let (side, result) = world
            .sweep_boundaries(Vector2::new(30.0, 20.0), Vector2::new(-100.0, -100.0), 1.0, 8.0)
            .unwrap();
        assert_eq!(side, Side::Top);
        assert!((result.time_of_impact - 0.12).abs() < 1e-12);
    }

    #[test]
    fn test_indexed_step_matches_brute_force() {
        let blocks: Vec<Obstacle> = (0..40)
            .map(|i| {
                let col = (i % 10) as f64;
                let row = (i / 10) as f64;
                Obstacle::wall(100 + i, Rect::new(40.0 + col * 72.0, 60.0 + row * 30.0, 64.0, 24.0))
            })
            .collect();
        let paddle = Obstacle::paddle(1, Rect::new(350.0, 560.0, 100.0, 12.0));
        let mut obstacles = blocks.clone();
        obstacles.push(paddle);

        let mut index = SpatialIndex::for_config(&config());
        for block in &blocks {
            index.insert(block.id, block.rect);
        }

        let mut brute = PhysicsWorld::new(WorldConfig {
            paddle_english: 0.5,
            ..config()
        });
        brute.add_body(ball(1, Vector2::new(400.0, 540.0), Vector2::new(180.0, -420.0)));
        brute.add_body(ball(2, Vector2::new(200.0, 300.0), Vector2::new(-900.0, 1300.0)));
        let mut indexed = brute.clone();

        for _ in 0..600 {
            let a = brute.step(SIM_DT, &obstacles);
            let b = indexed.step_indexed(SIM_DT, &index, &obstacles);
            assert_eq!(a, b);
        }
        assert_eq!(brute.bodies(), indexed.bodies());
    }
}
