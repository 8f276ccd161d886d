//! Immutable tuning values threaded through construction and update.
//!
//! Every struct deserializes from the scene file with per-field defaults, so a
//! scene only needs to mention the values it overrides.

use serde::Deserialize;

/// Layout and physics constants shared by every entity.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct WorldConfig {
    #[serde(default = "default_screen_width")]
    pub screen_width: u32,
    #[serde(default = "default_screen_height")]
    pub screen_height: u32,
    /// Normalized y of the floor. Entities whose lower edge reaches it are
    /// grounded.
    #[serde(default = "default_floor")]
    pub floor: f32,
    /// Added to the vertical velocity of airborne gravity-sensitive entities
    /// once per update.
    #[serde(default = "default_gravity")]
    pub gravity: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            screen_width: default_screen_width(),
            screen_height: default_screen_height(),
            floor: default_floor(),
            gravity: default_gravity(),
        }
    }
}

impl WorldConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.screen_width == 0 || self.screen_height == 0 {
            return Err("World validation failed: screen size must be > 0".to_string());
        }
        if !self.floor.is_finite() || !self.gravity.is_finite() {
            return Err("World validation failed: floor and gravity must be finite".to_string());
        }
        Ok(())
    }
}

/// Rates of the two independent loop cadences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct LoopConfig {
    /// Model updates per second.
    #[serde(default = "default_model_rate")]
    pub model_rate: u32,
    /// Rendered frames per second.
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,
    /// Upper bound on the dt handed to the model after a stall.
    #[serde(default = "default_max_dt_ms")]
    pub max_dt_ms: u32,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            model_rate: default_model_rate(),
            frame_rate: default_frame_rate(),
            max_dt_ms: default_max_dt_ms(),
        }
    }
}

impl LoopConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.model_rate == 0 || self.model_rate > 1000 {
            return Err("Loop validation failed: model_rate must be in 1..=1000".to_string());
        }
        if self.frame_rate == 0 || self.frame_rate > 1000 {
            return Err("Loop validation failed: frame_rate must be in 1..=1000".to_string());
        }
        if self.max_dt_ms == 0 {
            return Err("Loop validation failed: max_dt_ms must be > 0".to_string());
        }
        Ok(())
    }

    pub fn model_interval_ms(&self) -> u32 {
        1000 / self.model_rate
    }

    pub fn frame_interval_ms(&self) -> u32 {
        1000 / self.frame_rate
    }
}

/// Player movement constants, in normalized distance per millisecond.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct PlayerTuning {
    #[serde(default = "default_walk_speed")]
    pub walk_speed: f32,
    #[serde(default = "default_jump_speed")]
    pub jump_speed: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            walk_speed: default_walk_speed(),
            jump_speed: default_jump_speed(),
        }
    }
}

impl PlayerTuning {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.walk_speed > 0.0) || !(self.jump_speed > 0.0) {
            return Err(
                "Player tuning validation failed: walk_speed and jump_speed must be > 0"
                    .to_string(),
            );
        }
        Ok(())
    }
}

const fn default_screen_width() -> u32 {
    800
}

const fn default_screen_height() -> u32 {
    600
}

const fn default_floor() -> f32 {
    1.0
}

const fn default_gravity() -> f32 {
    0.0001
}

const fn default_model_rate() -> u32 {
    200
}

const fn default_frame_rate() -> u32 {
    60
}

const fn default_max_dt_ms() -> u32 {
    250
}

const fn default_walk_speed() -> f32 {
    0.001
}

const fn default_jump_speed() -> f32 {
    0.005
}
