//! Moving bodies (balls) and their kinematics
//!
//! A body keeps its speed inside `[min_speed, max_speed]` after every velocity
//! mutation. The only exception is an explicit `stop()`.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::geometry::Circle;
use crate::config::BodyConfig;
use crate::{Vector2, ZERO_LENGTH_SQ, is_finite_vec, normalize_or};

/// Direction used whenever a velocity has no direction of its own
pub const DEFAULT_DIRECTION: Vector2 = Vector2::X;

/// Half-angle of the upward launch cone (radians)
pub const LAUNCH_CONE_HALF_ANGLE: f64 = std::f64::consts::FRAC_PI_4;

/// A circular moving body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovingBody {
    pub id: u32,
    pub position: Vector2,
    velocity: Vector2,
    radius: f64,
    min_speed: f64,
    max_speed: f64,
    bounce_damping: f64,
    /// Inactive bodies are skipped by every system but keep their state
    pub active: bool,
    /// Position restored when a non-finite position shows up
    last_good_position: Vector2,
}

impl MovingBody {
    /// Create a body launched upward in a random direction
    pub fn new<R: Rng>(id: u32, config: &BodyConfig, rng: &mut R) -> Self {
        Self::with_direction(id, config, launch_direction(rng))
    }

    /// Create a body moving along `direction` at the configured speed
    pub fn with_direction(id: u32, config: &BodyConfig, direction: Vector2) -> Self {
        let config = config.clone().validated();
        let mut body = Self {
            id,
            position: config.position,
            velocity: Vector2::ZERO,
            radius: config.radius,
            min_speed: config.min_speed,
            max_speed: config.max_speed,
            bounce_damping: config.bounce_damping,
            active: true,
            last_good_position: config.position,
        };
        body.set_velocity(normalize_or(direction, DEFAULT_DIRECTION) * config.speed);
        body
    }

    /// Reset in place for a new round (keeps the id)
    pub fn reset<R: Rng>(&mut self, config: &BodyConfig, rng: &mut R) {
        *self = Self::new(self.id, config, rng);
        log::debug!("Body {} reset at {:?}", self.id, self.position);
    }

    #[inline]
    pub fn velocity(&self) -> Vector2 {
        self.velocity
    }

    #[inline]
    pub fn speed(&self) -> f64 {
        self.velocity.length()
    }

    #[inline]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    #[inline]
    pub fn min_speed(&self) -> f64 {
        self.min_speed
    }

    #[inline]
    pub fn max_speed(&self) -> f64 {
        self.max_speed
    }

    #[inline]
    pub fn bounce_damping(&self) -> f64 {
        self.bounce_damping
    }

    /// Geometry handed to the detector
    pub fn circle(&self) -> Circle {
        Circle::at(self.position, self.radius)
    }

    /// Advance position by one Euler step
    pub fn integrate(&mut self, dt: f64) {
        if !self.active || !dt.is_finite() || dt <= 0.0 {
            return;
        }
        self.sanitize();
        self.position += self.velocity * dt;
        self.sanitize();
        self.last_good_position = self.position;
    }

    /// Apply a constant acceleration for `dt`, keeping the speed band
    pub fn apply_acceleration(&mut self, acceleration: Vector2, dt: f64) {
        if !self.active || !dt.is_finite() || dt <= 0.0 || acceleration == Vector2::ZERO {
            return;
        }
        self.set_velocity(self.velocity + acceleration * dt);
    }

    /// Set velocity, clamping its magnitude into the speed band.
    ///
    /// A zero (or non-finite) vector becomes [`DEFAULT_DIRECTION`] at `min_speed`.
    pub fn set_velocity(&mut self, velocity: Vector2) {
        let velocity = if is_finite_vec(velocity) {
            velocity
        } else {
            log::warn!("Body {}: non-finite velocity {:?} discarded", self.id, velocity);
            Vector2::ZERO
        };

        let speed_sq = velocity.length_squared();
        if speed_sq <= ZERO_LENGTH_SQ {
            self.velocity = DEFAULT_DIRECTION * self.min_speed;
            return;
        }

        let speed = speed_sq.sqrt();
        let clamped = speed.clamp(self.min_speed, self.max_speed);
        self.velocity = if clamped == speed {
            velocity
        } else {
            velocity / speed * clamped
        };
    }

    /// Explicitly zero the velocity (e.g. ball parked on the paddle)
    pub fn stop(&mut self) {
        self.velocity = Vector2::ZERO;
    }

    /// Reflect off a surface with unit `normal`, losing energy to damping.
    ///
    /// v' = (v - 2(v·n)n) * damping, then clamped back into the speed band.
    pub fn reflect(&mut self, normal: Vector2) {
        let normal = normalize_or(normal, Vector2::ZERO);
        if normal == Vector2::ZERO {
            log::warn!("Body {}: reflect with degenerate normal ignored", self.id);
            return;
        }
        let reflected = self.velocity - 2.0 * self.velocity.dot(normal) * normal;
        self.set_velocity(reflected * self.bounce_damping);
    }

    /// Change speed without changing direction
    pub fn set_speed_preserving_direction(&mut self, speed: f64) {
        let speed = if speed.is_finite() { speed } else { self.min_speed };
        let direction = normalize_or(self.velocity, DEFAULT_DIRECTION);
        self.set_velocity(direction * speed.clamp(self.min_speed, self.max_speed));
    }

    /// Change radius; non-positive or non-finite values are rejected
    pub fn set_radius(&mut self, radius: f64) -> bool {
        if !(radius.is_finite() && radius > 0.0) {
            log::warn!("Body {}: invalid radius {} ignored", self.id, radius);
            return false;
        }
        self.radius = radius;
        true
    }

    /// Change the speed band and re-clamp the current velocity
    pub fn set_speed_limits(&mut self, min_speed: f64, max_speed: f64) -> bool {
        if !(min_speed.is_finite() && max_speed.is_finite() && min_speed > 0.0 && min_speed <= max_speed)
        {
            log::warn!(
                "Body {}: invalid speed limits [{}, {}] ignored",
                self.id,
                min_speed,
                max_speed
            );
            return false;
        }
        self.min_speed = min_speed;
        self.max_speed = max_speed;
        self.set_velocity(self.velocity);
        true
    }

    /// Change damping; clamped into (0, 1]
    pub fn set_bounce_damping(&mut self, damping: f64) {
        if damping.is_finite() && damping > 0.0 {
            self.bounce_damping = damping.min(1.0);
        }
    }

    /// Repair non-finite state in place. Returns true if anything was fixed.
    pub fn sanitize(&mut self) -> bool {
        let mut repaired = false;
        if !is_finite_vec(self.position) {
            log::warn!(
                "Body {}: non-finite position {:?}, restoring {:?}",
                self.id,
                self.position,
                self.last_good_position
            );
            self.position = if is_finite_vec(self.last_good_position) {
                self.last_good_position
            } else {
                Vector2::ZERO
            };
            repaired = true;
        }
        if !is_finite_vec(self.velocity) {
            log::warn!("Body {}: non-finite velocity {:?}", self.id, self.velocity);
            self.set_velocity(Vector2::ZERO);
            repaired = true;
        }
        repaired
    }
}

/// Random upward direction within the launch cone
pub fn launch_direction<R: Rng>(rng: &mut R) -> Vector2 {
    let offset = rng.random_range(-LAUNCH_CONE_HALF_ANGLE..=LAUNCH_CONE_HALF_ANGLE);
    let angle = -std::f64::consts::FRAC_PI_2 + offset;
    Vector2::new(angle.cos(), angle.sin())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn body() -> MovingBody {
        let config = BodyConfig {
            position: Vector2::new(100.0, 100.0),
            speed: 200.0,
            radius: 8.0,
            bounce_damping: 0.5,
            min_speed: 100.0,
            max_speed: 400.0,
        };
        MovingBody::with_direction(1, &config, Vector2::new(1.0, 0.0))
    }

    #[test]
    fn test_new_launches_upward_deterministically() {
        let config = BodyConfig::default();
        let a = MovingBody::new(1, &config, &mut Pcg32::seed_from_u64(42));
        let b = MovingBody::new(1, &config, &mut Pcg32::seed_from_u64(42));
        assert_eq!(a, b);
        assert!(a.velocity().y < 0.0);
        assert!((a.speed() - config.speed).abs() < 1e-9);
    }

    #[test]
    fn test_integrate() {
        let mut b = body();
        b.integrate(0.5);
        assert_eq!(b.position, Vector2::new(200.0, 100.0));
    }

    #[test]
    fn test_integrate_inactive_is_noop() {
        let mut b = body();
        b.active = false;
        b.integrate(0.5);
        assert_eq!(b.position, Vector2::new(100.0, 100.0));
    }

    #[test]
    fn test_set_velocity_zero_uses_default_direction() {
        let mut b = body();
        b.set_velocity(Vector2::ZERO);
        assert_eq!(b.velocity(), Vector2::new(100.0, 0.0));
    }

    #[test]
    fn test_set_velocity_clamps_magnitude() {
        let mut b = body();
        b.set_velocity(Vector2::new(0.0, -1000.0));
        assert_eq!(b.velocity(), Vector2::new(0.0, -400.0));

        b.set_velocity(Vector2::new(3.0, 4.0));
        assert!((b.speed() - 100.0).abs() < 1e-9);
        assert!((b.velocity().x - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_reflect_with_damping_respects_floor() {
        let mut b = body();
        // 200 * 0.5 = 100 sits exactly at the floor
        b.reflect(Vector2::new(-1.0, 0.0));
        assert!((b.velocity().x + 100.0).abs() < 1e-9);

        // Another bounce would drop to 50; the floor restores 100
        b.reflect(Vector2::new(1.0, 0.0));
        assert!((b.velocity().x - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_reflect_unnormalized_normal() {
        let mut b = body();
        b.set_bounce_damping(1.0);
        b.reflect(Vector2::new(-10.0, 0.0));
        assert!((b.velocity().x + 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_reflect_zero_normal_ignored() {
        let mut b = body();
        let before = b.velocity();
        b.reflect(Vector2::ZERO);
        assert_eq!(b.velocity(), before);
    }

    #[test]
    fn test_non_finite_velocity_is_sanitized() {
        let mut b = body();
        b.set_velocity(Vector2::new(f64::NAN, 1.0));
        assert_eq!(b.velocity(), Vector2::new(100.0, 0.0));
    }

    #[test]
    fn test_non_finite_position_restores_last_good() {
        let mut b = body();
        b.integrate(0.5);
        b.position = Vector2::new(f64::INFINITY, 0.0);
        assert!(b.sanitize());
        assert_eq!(b.position, Vector2::new(200.0, 100.0));
        assert!(!b.sanitize());
    }

    #[test]
    fn test_set_radius_rejects_invalid() {
        let mut b = body();
        assert!(!b.set_radius(0.0));
        assert!(!b.set_radius(f64::NAN));
        assert_eq!(b.radius(), 8.0);
        assert!(b.set_radius(12.0));
        assert_eq!(b.radius(), 12.0);
    }

    #[test]
    fn test_set_speed_preserving_direction() {
        let mut b = body();
        b.set_velocity(Vector2::new(0.0, 150.0));
        b.set_speed_preserving_direction(1000.0);
        assert_eq!(b.velocity(), Vector2::new(0.0, 400.0));
    }

    #[test]
    fn test_set_speed_limits_reclamps() {
        let mut b = body();
        assert!(!b.set_speed_limits(300.0, 200.0));
        assert!(b.set_speed_limits(250.0, 300.0));
        assert!((b.speed() - 250.0).abs() < 1e-9);
    }

    #[test]
    fn test_stop_then_set_velocity() {
        let mut b = body();
        b.stop();
        assert_eq!(b.velocity(), Vector2::ZERO);
        b.set_speed_preserving_direction(200.0);
        assert_eq!(b.velocity(), Vector2::new(200.0, 0.0));
    }

    #[test]
    fn test_reset_in_place_keeps_id() {
        let mut rng = Pcg32::seed_from_u64(7);
        let mut b = body();
        b.position = Vector2::new(-50.0, 900.0);
        b.active = false;
        b.reset(&BodyConfig::default(), &mut rng);
        assert_eq!(b.id, 1);
        assert!(b.active);
        assert_eq!(b.position, BodyConfig::default().position);
    }
}
