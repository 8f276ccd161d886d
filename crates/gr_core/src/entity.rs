//! The shared entity body: a destination rectangle that moves, falls, and
//! draws the animation of its current state.
//!
//! Player and projectile behavior is layered on top by composition (see
//! [`crate::player::Player`] and [`crate::projectile::Projectile`]). Static
//! scenery is a plain [`Entity`] with zero velocity.

use serde::Deserialize;
use std::collections::HashMap;

use crate::animation::Animation;
use crate::config::WorldConfig;
use crate::geometry::{Rect, RectF};
use crate::render::RenderSurface;

/// How far above the floor a lower edge still counts as resting on it.
/// Absorbs f32 drift from integrating a jump back down to the floor.
const GROUND_EPSILON: f32 = 1e-5;

/// Movement/combat state. Every entity is in exactly one of these.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjState {
    #[default]
    Idle,
    Moving,
    Jumping,
    Firing,
    FiringAndMoving,
    FiringAndJumping,
}

impl ObjState {
    pub const ALL: &'static [ObjState] = &[
        ObjState::Idle,
        ObjState::Moving,
        ObjState::Jumping,
        ObjState::Firing,
        ObjState::FiringAndMoving,
        ObjState::FiringAndJumping,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Moving => "moving",
            Self::Jumping => "jumping",
            Self::Firing => "firing",
            Self::FiringAndMoving => "firing_and_moving",
            Self::FiringAndJumping => "firing_and_jumping",
        }
    }

    pub fn is_firing(self) -> bool {
        matches!(
            self,
            Self::Firing | Self::FiringAndMoving | Self::FiringAndJumping
        )
    }

    pub fn is_jumping(self) -> bool {
        matches!(self, Self::Jumping | Self::FiringAndJumping)
    }
}

impl std::fmt::Display for ObjState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone)]
pub struct Entity {
    destination: RectF,
    /// Normalized distance per millisecond.
    pub velocity_x: f32,
    pub velocity_y: f32,
    state: ObjState,
    animations: HashMap<ObjState, Animation>,
    gravity_sensitive: bool,
}

impl Entity {
    pub fn new(destination: RectF) -> Self {
        Self {
            destination,
            velocity_x: 0.0,
            velocity_y: 0.0,
            state: ObjState::Idle,
            animations: HashMap::new(),
            gravity_sensitive: false,
        }
    }

    pub fn with_velocity(mut self, vx: f32, vy: f32) -> Self {
        self.velocity_x = vx;
        self.velocity_y = vy;
        self
    }

    pub fn with_gravity(mut self, gravity_sensitive: bool) -> Self {
        self.gravity_sensitive = gravity_sensitive;
        self
    }

    pub fn with_scale(mut self, factor: f32) -> Self {
        self.scale(factor);
        self
    }

    pub fn with_animations(mut self, animations: HashMap<ObjState, Animation>) -> Self {
        self.animations = animations;
        self
    }

    pub fn with_state(mut self, state: ObjState) -> Self {
        self.state = state;
        self
    }

    pub fn add_animation(&mut self, state: ObjState, animation: Animation) {
        self.animations.insert(state, animation);
    }

    /// Move, apply floor and gravity, then advance the current animation.
    ///
    /// Gravity is added once per call, not scaled by `dt_ms`.
    pub fn update(&mut self, dt_ms: u32, world: &WorldConfig) {
        let dt = dt_ms as f32;
        self.destination.x += self.velocity_x * dt;
        self.destination.y += self.velocity_y * dt;

        if self.is_grounded(world) {
            self.destination.y = world.floor - self.destination.h;
            self.velocity_y = 0.0;
        } else if self.gravity_sensitive {
            self.velocity_y += world.gravity;
        }

        if let Some(animation) = self.animation_mut() {
            animation.update(dt_ms);
        }
    }

    pub fn render<S: RenderSurface + ?Sized>(&self, surface: &mut S, world: &WorldConfig) {
        if let Some(animation) = self.animation() {
            animation.render(surface, self.absolute_destination(world));
        }
    }

    /// Enter `state`. When it differs from the current one, the entered
    /// state's animation restarts from its first frame; other states keep
    /// their cursors.
    pub fn set_state(&mut self, state: ObjState) {
        if state == self.state {
            return;
        }
        log::debug!("Entity state {} -> {}", self.state, state);
        self.state = state;
        if let Some(animation) = self.animations.get_mut(&state) {
            animation.reset();
        }
    }

    /// True when `other` lies inside `self`: own top-left at or before the
    /// other's, own bottom-right at or past the other's.
    pub fn is_colliding(&self, other: &Entity) -> bool {
        let a = &self.destination;
        let b = &other.destination;
        a.x <= b.x && a.y <= b.y && a.right() >= b.right() && a.bottom() >= b.bottom()
    }

    /// Multiply width and height by `factor`.
    ///
    /// # Panics
    /// If `factor` is not strictly positive.
    pub fn scale(&mut self, factor: f32) {
        assert!(factor > 0.0, "scale factor must be > 0, got {factor}");
        self.destination.w *= factor;
        self.destination.h *= factor;
    }

    /// Same test the floor clamp in [`Entity::update`] uses.
    pub fn is_grounded(&self, world: &WorldConfig) -> bool {
        self.destination.bottom() >= world.floor - GROUND_EPSILON
    }

    pub fn absolute_destination(&self, world: &WorldConfig) -> Rect {
        self.destination
            .to_pixels(world.screen_width, world.screen_height)
    }

    pub fn destination(&self) -> &RectF {
        &self.destination
    }

    pub fn set_destination(&mut self, destination: RectF) {
        self.destination = destination;
    }

    pub fn set_position(&mut self, x: f32, y: f32) {
        self.destination.x = x;
        self.destination.y = y;
    }

    pub fn state(&self) -> ObjState {
        self.state
    }

    pub fn gravity_sensitive(&self) -> bool {
        self.gravity_sensitive
    }

    /// Animation for the current state. Falls back to the idle animation so
    /// an entity without a clip for every state stays visible.
    pub fn animation(&self) -> Option<&Animation> {
        self.animations
            .get(&self.state)
            .or_else(|| self.animations.get(&ObjState::Idle))
    }

    fn animation_mut(&mut self) -> Option<&mut Animation> {
        let key = if self.animations.contains_key(&self.state) {
            self.state
        } else {
            ObjState::Idle
        };
        self.animations.get_mut(&key)
    }

    pub fn animation_for(&self, state: ObjState) -> Option<&Animation> {
        self.animations.get(&state)
    }
}
