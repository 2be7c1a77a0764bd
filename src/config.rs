//! World and body configuration
//!
//! Plain serde structs so the embedding game can keep them in JSON next to
//! its other tuning data.

use serde::{Deserialize, Serialize};

use crate::Vector2;
use crate::consts::*;

/// Play-field and solver configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Field width (x grows right)
    pub field_width: f64,
    /// Field height (y grows down)
    pub field_height: f64,
    /// Downward acceleration applied to active bodies (units/s²)
    pub gravity: f64,
    /// Bounces are boosted back up to this speed
    pub min_bounce_speed: f64,
    /// Broad-phase grid cell size
    pub cell_size: f64,
    /// Bottom edge lets bodies leave the field (ball lost)
    pub open_bottom: bool,
    /// Paddle hit offset to tangential deflection factor (0 disables)
    pub paddle_english: f64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            field_width: FIELD_WIDTH,
            field_height: FIELD_HEIGHT,
            gravity: 0.0,
            min_bounce_speed: MIN_BOUNCE_SPEED,
            cell_size: CELL_SIZE,
            open_bottom: true,
            paddle_english: PADDLE_ENGLISH,
        }
    }
}

impl WorldConfig {
    /// Create a config for a field of the given size, other values default
    pub fn with_field(field_width: f64, field_height: f64) -> Self {
        Self {
            field_width,
            field_height,
            ..Self::default()
        }
    }

    /// Parse from JSON
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<Self>(json).map(Self::validated)
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Parse from JSON, falling back to defaults on any error
    pub fn load_or_default(json: &str) -> Self {
        match Self::from_json(json) {
            Ok(config) => {
                log::info!(
                    "Loaded world config ({}x{}, cell {})",
                    config.field_width,
                    config.field_height,
                    config.cell_size
                );
                config
            }
            Err(e) => {
                log::warn!("Invalid world config ({}), using defaults", e);
                Self::default()
            }
        }
    }

    /// Repair values that would break the solver
    pub fn validated(mut self) -> Self {
        let defaults = Self::default();
        if !(self.field_width.is_finite() && self.field_width > 0.0) {
            log::warn!("field_width {} invalid, using {}", self.field_width, defaults.field_width);
            self.field_width = defaults.field_width;
        }
        if !(self.field_height.is_finite() && self.field_height > 0.0) {
            log::warn!("field_height {} invalid, using {}", self.field_height, defaults.field_height);
            self.field_height = defaults.field_height;
        }
        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            log::warn!("cell_size {} invalid, using {}", self.cell_size, defaults.cell_size);
            self.cell_size = defaults.cell_size;
        }
        if !self.gravity.is_finite() {
            self.gravity = 0.0;
        }
        if !(self.min_bounce_speed.is_finite() && self.min_bounce_speed >= 0.0) {
            self.min_bounce_speed = 0.0;
        }
        if !self.paddle_english.is_finite() {
            self.paddle_english = 0.0;
        }
        self
    }
}

/// Initial configuration for a moving body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyConfig {
    /// Spawn position
    pub position: Vector2,
    /// Launch speed
    pub speed: f64,
    pub radius: f64,
    /// Fraction of speed kept per bounce, in (0, 1]
    pub bounce_damping: f64,
    pub min_speed: f64,
    pub max_speed: f64,
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            position: Vector2::new(FIELD_WIDTH / 2.0, FIELD_HEIGHT * 0.75),
            speed: BALL_START_SPEED,
            radius: BALL_RADIUS,
            bounce_damping: BOUNCE_DAMPING,
            min_speed: BALL_MIN_SPEED,
            max_speed: BALL_MAX_SPEED,
        }
    }
}

impl BodyConfig {
    /// Config at `position` with default speeds and radius
    pub fn at(position: Vector2) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Repair values that would violate body invariants
    pub fn validated(mut self) -> Self {
        let defaults = Self::default();
        if !crate::is_finite_vec(self.position) {
            log::warn!("Body position {:?} not finite, using default", self.position);
            self.position = defaults.position;
        }
        if !(self.radius.is_finite() && self.radius > 0.0) {
            log::warn!("Body radius {} invalid, using {}", self.radius, defaults.radius);
            self.radius = defaults.radius;
        }
        if !(self.bounce_damping.is_finite() && self.bounce_damping > 0.0) {
            self.bounce_damping = defaults.bounce_damping;
        }
        self.bounce_damping = self.bounce_damping.min(1.0);
        if !(self.min_speed.is_finite() && self.min_speed > 0.0) {
            log::warn!("Body min_speed {} invalid, using {}", self.min_speed, defaults.min_speed);
            self.min_speed = defaults.min_speed;
        }
        if !(self.max_speed.is_finite() && self.max_speed > 0.0) {
            self.max_speed = defaults.max_speed.max(self.min_speed);
        }
        if self.min_speed > self.max_speed {
            log::warn!(
                "Body min_speed {} above max_speed {}, swapping",
                self.min_speed,
                self.max_speed
            );
            std::mem::swap(&mut self.min_speed, &mut self.max_speed);
        }
        if !self.speed.is_finite() {
            self.speed = self.min_speed;
        }
        self.speed = self.speed.clamp(self.min_speed, self.max_speed);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_config_json_round_trip() {
        let config = WorldConfig {
            gravity: 50.0,
            open_bottom: false,
            ..WorldConfig::with_field(640.0, 480.0)
        };
        let json = config.to_json().unwrap();
        let parsed = WorldConfig::from_json(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_world_config_partial_json_uses_defaults() {
        let config = WorldConfig::from_json(r#"{ "field_width": 1024.0 }"#).unwrap();
        assert_eq!(config.field_width, 1024.0);
        assert_eq!(config.field_height, FIELD_HEIGHT);
        assert_eq!(config.cell_size, CELL_SIZE);
    }

    #[test]
    fn test_world_config_load_or_default() {
        let config = WorldConfig::load_or_default("not json");
        assert_eq!(config, WorldConfig::default());

        let config = WorldConfig::load_or_default(r#"{ "cell_size": -4.0 }"#);
        assert_eq!(config.cell_size, CELL_SIZE);
    }

    #[test]
    fn test_body_config_validated() {
        let config = BodyConfig {
            radius: -1.0,
            bounce_damping: 3.0,
            min_speed: 500.0,
            max_speed: 100.0,
            speed: 1000.0,
            ..BodyConfig::default()
        }
        .validated();

        assert_eq!(config.radius, BALL_RADIUS);
        assert_eq!(config.bounce_damping, 1.0);
        assert_eq!(config.min_speed, 100.0);
        assert_eq!(config.max_speed, 500.0);
        assert_eq!(config.speed, 500.0);
    }
}
