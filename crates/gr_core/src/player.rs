//! The keyboard-driven player: a transition table over [`ObjState`] plus the
//! driver that applies its effects to the entity body.

use crate::config::{PlayerTuning, WorldConfig};
use crate::entity::{Entity, ObjState};
use crate::input::KbdEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    fn sign(self) -> f32 {
        match self {
            Direction::Left => -1.0,
            Direction::Right => 1.0,
        }
    }
}

/// Side effect requested by a transition, applied by [`Player`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// vx = ±walk speed.
    Walk(Direction),
    /// vx = 0.
    Halt,
    /// vy = -jump speed.
    Jump,
    ResetBulletTimer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub next: ObjState,
    pub effect: Option<Effect>,
}

impl Transition {
    fn to(next: ObjState) -> Self {
        Self { next, effect: None }
    }

    fn with(next: ObjState, effect: Effect) -> Self {
        Self {
            next,
            effect: Some(effect),
        }
    }
}

/// Transition table. Pairs not listed leave the state unchanged with no
/// effect; this covers Up/Down, Space-Up, and Space-Down while airborne.
pub fn transition(state: ObjState, event: KbdEvent) -> Transition {
    use KbdEvent as E;
    use ObjState as S;

    let walk = |dir| Effect::Walk(dir);
    match (state, event) {
        (S::Idle, E::LeftKeyDown) => Transition::with(S::Moving, walk(Direction::Left)),
        (S::Idle, E::RightKeyDown) => Transition::with(S::Moving, walk(Direction::Right)),
        (S::Idle, E::SpaceKeyDown) => Transition::with(S::Jumping, Effect::Jump),
        (S::Idle, E::LCtrlKeyDown) => Transition::with(S::Firing, Effect::ResetBulletTimer),

        (S::Moving, E::LeftKeyDown) => Transition::with(S::Moving, walk(Direction::Left)),
        (S::Moving, E::RightKeyDown) => Transition::with(S::Moving, walk(Direction::Right)),
        (S::Moving, E::LeftKeyUp | E::RightKeyUp) => Transition::with(S::Idle, Effect::Halt),
        (S::Moving, E::SpaceKeyDown) => Transition::with(S::Jumping, Effect::Jump),
        (S::Moving, E::LCtrlKeyDown) => Transition::to(S::FiringAndMoving),

        (S::Jumping, E::LeftKeyDown) => Transition::with(S::Jumping, walk(Direction::Left)),
        (S::Jumping, E::RightKeyDown) => Transition::with(S::Jumping, walk(Direction::Right)),
        (S::Jumping, E::LeftKeyUp | E::RightKeyUp) => Transition::with(S::Jumping, Effect::Halt),
        (S::Jumping, E::LCtrlKeyDown) => Transition::to(S::FiringAndJumping),

        (S::Firing, E::LeftKeyDown) => {
            Transition::with(S::FiringAndMoving, walk(Direction::Left))
        }
        (S::Firing, E::RightKeyDown) => {
            Transition::with(S::FiringAndMoving, walk(Direction::Right))
        }
        (S::Firing, E::SpaceKeyDown) => Transition::with(S::FiringAndJumping, Effect::Jump),
        (S::Firing, E::LCtrlKeyUp) => Transition::to(S::Idle),

        (S::FiringAndMoving, E::LeftKeyDown) => {
            Transition::with(S::FiringAndMoving, walk(Direction::Left))
        }
        (S::FiringAndMoving, E::RightKeyDown) => {
            Transition::with(S::FiringAndMoving, walk(Direction::Right))
        }
        (S::FiringAndMoving, E::LeftKeyUp | E::RightKeyUp) => {
            Transition::with(S::Firing, Effect::Halt)
        }
        (S::FiringAndMoving, E::SpaceKeyDown) => {
            Transition::with(S::FiringAndJumping, Effect::Jump)
        }
        (S::FiringAndMoving, E::LCtrlKeyUp) => Transition::to(S::Moving),

        (S::FiringAndJumping, E::LeftKeyDown) => {
            Transition::with(S::FiringAndJumping, walk(Direction::Left))
        }
        (S::FiringAndJumping, E::RightKeyDown) => {
            Transition::with(S::FiringAndJumping, walk(Direction::Right))
        }
        (S::FiringAndJumping, E::LeftKeyUp | E::RightKeyUp) => {
            Transition::with(S::FiringAndJumping, Effect::Halt)
        }
        (S::FiringAndJumping, E::LCtrlKeyUp) => Transition::to(S::Jumping),

        (state, _) => Transition::to(state),
    }
}

/// State after touching the floor. Only the airborne states change.
pub fn land(state: ObjState, velocity_x: f32) -> ObjState {
    let still = velocity_x == 0.0;
    match state {
        ObjState::Jumping if still => ObjState::Idle,
        ObjState::Jumping => ObjState::Moving,
        ObjState::FiringAndJumping if still => ObjState::Firing,
        ObjState::FiringAndJumping => ObjState::FiringAndMoving,
        other => other,
    }
}

#[derive(Debug, Clone)]
pub struct Player {
    body: Entity,
    health: i32,
    fire_interval_ms: u32,
    bullet_timer_ms: u32,
    tuning: PlayerTuning,
}

impl Player {
    /// `fire_rate` is shots per second and must be in `1..=1000`.
    pub fn new(
        body: Entity,
        health: i32,
        fire_rate: u32,
        tuning: PlayerTuning,
    ) -> Result<Self, String> {
        if fire_rate == 0 || fire_rate > 1000 {
            return Err(format!(
                "Player validation failed: fire_rate must be in 1..=1000, got {fire_rate}"
            ));
        }
        Ok(Self {
            body,
            health,
            fire_interval_ms: 1000 / fire_rate,
            bullet_timer_ms: 0,
            tuning,
        })
    }

    /// One model tick: fold `events` in order, advance the bullet timer,
    /// run physics and animation, then resolve a landing.
    ///
    /// The folded state is committed once, so a press and release inside one
    /// tick that ends where it started leaves the animation running.
    pub fn update(&mut self, dt_ms: u32, events: &[KbdEvent], world: &WorldConfig) {
        let mut state = self.body.state();
        for &event in events {
            let step = transition(state, event);
            if let Some(effect) = step.effect {
                self.apply(effect);
            }
            if step.next != state {
                log::debug!("Player {} --{:?}--> {}", state, event, step.next);
                state = step.next;
            }
        }
        self.body.set_state(state);

        if self.body.state().is_firing() {
            self.bullet_timer_ms = self.bullet_timer_ms.saturating_add(dt_ms);
        } else {
            self.bullet_timer_ms = 0;
        }

        self.body.update(dt_ms, world);

        let state = self.body.state();
        if state.is_jumping() && self.body.is_grounded(world) {
            let next = land(state, self.body.velocity_x);
            log::debug!("Player landed: {} -> {}", state, next);
            self.body.set_state(next);
        }
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::Walk(dir) => self.body.velocity_x = dir.sign() * self.tuning.walk_speed,
            Effect::Halt => self.body.velocity_x = 0.0,
            Effect::Jump => self.body.velocity_y = -self.tuning.jump_speed,
            Effect::ResetBulletTimer => self.bullet_timer_ms = 0,
        }
    }

    /// True when a shot is due. A true result consumes one fire interval and
    /// keeps the overshoot.
    pub fn should_spawn_bullet(&mut self) -> bool {
        if self.body.state().is_firing() && self.bullet_timer_ms >= self.fire_interval_ms {
            self.bullet_timer_ms %= self.fire_interval_ms;
            true
        } else {
            false
        }
    }

    pub fn body(&self) -> &Entity {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut Entity {
        &mut self.body
    }

    pub fn state(&self) -> ObjState {
        self.body.state()
    }

    pub fn health(&self) -> i32 {
        self.health
    }

    pub fn fire_interval_ms(&self) -> u32 {
        self.fire_interval_ms
    }

    pub fn bullet_timer_ms(&self) -> u32 {
        self.bullet_timer_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{Animation, AnimationFrame, Frame};
    use crate::geometry::{Rect, RectF};
    use crate::render::TextureHandle;
    use std::collections::HashMap;

    fn world() -> WorldConfig {
        WorldConfig::default()
    }

    /// 0.15 x 0.3 body resting on the floor, gravity on.
    fn grounded_player() -> Player {
        let body = Entity::new(RectF::new(0.1, 0.7, 0.15, 0.3)).with_gravity(true);
        Player::new(body, 100, 5, PlayerTuning::default()).expect("valid player")
    }

    fn run(player: &mut Player, events: &[KbdEvent], dt_ms: u32) {
        player.update(dt_ms, events, &world());
    }

    #[test]
    fn zero_fire_rate_is_rejected() {
        let body = Entity::new(RectF::new(0.0, 0.0, 0.1, 0.1));
        let err = Player::new(body, 100, 0, PlayerTuning::default())
            .expect_err("zero fire rate should fail");
        assert!(err.contains("fire_rate"));
    }

    #[test]
    fn fire_rate_sets_interval() {
        assert_eq!(grounded_player().fire_interval_ms(), 200);
    }

    #[test]
    fn left_press_and_release_in_one_tick_returns_to_idle() {
        let mut p = grounded_player();
        run(&mut p, &[KbdEvent::LeftKeyDown, KbdEvent::LeftKeyUp], 5);
        assert_eq!(p.state(), ObjState::Idle);
        assert_eq!(p.body().velocity_x, 0.0);
    }

    #[test]
    fn events_fold_against_the_state_left_by_the_previous_one() {
        let mut p = grounded_player();
        run(
            &mut p,
            &[
                KbdEvent::RightKeyDown,
                KbdEvent::LCtrlKeyDown,
                KbdEvent::RightKeyUp,
            ],
            5,
        );
        // Idle -> Moving -> FiringAndMoving -> Firing
        assert_eq!(p.state(), ObjState::Firing);
        assert_eq!(p.body().velocity_x, 0.0);
    }

    #[test]
    fn walking_sets_signed_speed() {
        let mut p = grounded_player();
        run(&mut p, &[KbdEvent::LeftKeyDown], 10);
        assert_eq!(p.state(), ObjState::Moving);
        assert_eq!(p.body().velocity_x, -0.001);
        let x_before = p.body().destination().x;
        run(&mut p, &[], 10);
        assert!((p.body().destination().x - (x_before - 0.01)).abs() < 1e-6);

        run(&mut p, &[KbdEvent::RightKeyDown], 10);
        assert_eq!(p.state(), ObjState::Moving);
        assert_eq!(p.body().velocity_x, 0.001);
    }

    #[test]
    fn one_spawn_per_interval_keeps_remainder() {
        let mut p = grounded_player();
        run(&mut p, &[KbdEvent::LCtrlKeyDown], 250);
        assert_eq!(p.state(), ObjState::Firing);
        assert!(p.should_spawn_bullet());
        assert_eq!(p.bullet_timer_ms(), 50);
        assert!(!p.should_spawn_bullet());

        run(&mut p, &[], 150);
        assert!(p.should_spawn_bullet());
        assert_eq!(p.bullet_timer_ms(), 0);
    }

    #[test]
    fn no_spawn_before_interval_or_when_not_firing() {
        let mut p = grounded_player();
        run(&mut p, &[], 500);
        assert!(!p.should_spawn_bullet());

        run(&mut p, &[KbdEvent::LCtrlKeyDown], 199);
        assert!(!p.should_spawn_bullet());
        run(&mut p, &[KbdEvent::LCtrlKeyUp], 5);
        assert_eq!(p.state(), ObjState::Idle);
        assert_eq!(p.bullet_timer_ms(), 0);
        assert!(!p.should_spawn_bullet());
    }

    #[test]
    fn jump_leaves_floor_and_lands_back_in_idle() {
        let w = world();
        let mut p = grounded_player();
        run(&mut p, &[KbdEvent::SpaceKeyDown], 5);
        assert_eq!(p.state(), ObjState::Jumping);
        assert!(p.body().velocity_y < 0.0);
        assert!(!p.body().is_grounded(&w));

        let mut ticks = 0;
        while p.state() == ObjState::Jumping {
            run(&mut p, &[], 5);
            ticks += 1;
            assert!(ticks < 10_000, "player never landed");
        }
        assert_eq!(p.state(), ObjState::Idle);
        assert!(p.body().is_grounded(&w));
        assert_eq!(p.body().velocity_y, 0.0);
    }

    #[test]
    fn landing_while_moving_and_firing() {
        let mut p = grounded_player();
        run(
            &mut p,
            &[
                KbdEvent::LCtrlKeyDown,
                KbdEvent::SpaceKeyDown,
                KbdEvent::RightKeyDown,
            ],
            5,
        );
        assert_eq!(p.state(), ObjState::FiringAndJumping);
        for _ in 0..10_000 {
            if p.state() != ObjState::FiringAndJumping {
                break;
            }
            run(&mut p, &[], 5);
        }
        assert_eq!(p.state(), ObjState::FiringAndMoving);
    }

    #[test]
    fn double_jump_is_ignored() {
        let mut p = grounded_player();
        run(&mut p, &[KbdEvent::SpaceKeyDown], 5);
        run(&mut p, &[], 5);
        let vy = p.body().velocity_y;
        run(&mut p, &[KbdEvent::SpaceKeyDown], 5);
        // Only gravity changed vy; no fresh impulse.
        assert!((p.body().velocity_y - (vy + world().gravity)).abs() < 1e-9);
        assert_eq!(p.state(), ObjState::Jumping);

        assert_eq!(
            transition(ObjState::FiringAndJumping, KbdEvent::SpaceKeyDown),
            Transition::to(ObjState::FiringAndJumping)
        );
    }

    #[test]
    fn up_and_down_keys_are_ignored_everywhere() {
        for &state in ObjState::ALL {
            for event in [
                KbdEvent::UpKeyDown,
                KbdEvent::UpKeyUp,
                KbdEvent::DownKeyDown,
                KbdEvent::DownKeyUp,
            ] {
                assert_eq!(transition(state, event), Transition::to(state));
            }
        }
    }

    #[test]
    fn table_spot_checks() {
        use KbdEvent as E;
        use ObjState as S;
        assert_eq!(
            transition(S::Idle, E::LCtrlKeyDown),
            Transition::with(S::Firing, Effect::ResetBulletTimer)
        );
        assert_eq!(transition(S::Moving, E::LCtrlKeyDown).next, S::FiringAndMoving);
        assert_eq!(
            transition(S::FiringAndMoving, E::RightKeyUp),
            Transition::with(S::Firing, Effect::Halt)
        );
        assert_eq!(transition(S::FiringAndMoving, E::LCtrlKeyUp).next, S::Moving);
        assert_eq!(transition(S::FiringAndJumping, E::LCtrlKeyUp).next, S::Jumping);
        assert_eq!(
            transition(S::Jumping, E::LeftKeyUp),
            Transition::with(S::Jumping, Effect::Halt)
        );
        // LCtrl-Up without firing does nothing.
        assert_eq!(transition(S::Moving, E::LCtrlKeyUp), Transition::to(S::Moving));
    }

    #[test]
    fn land_only_changes_airborne_states() {
        assert_eq!(land(ObjState::Jumping, 0.0), ObjState::Idle);
        assert_eq!(land(ObjState::Jumping, -0.001), ObjState::Moving);
        assert_eq!(land(ObjState::FiringAndJumping, 0.0), ObjState::Firing);
        assert_eq!(land(ObjState::FiringAndJumping, 0.001), ObjState::FiringAndMoving);
        assert_eq!(land(ObjState::Moving, 0.0), ObjState::Moving);
    }

    #[test]
    fn state_changes_commit_once_per_tick() {
        let clip = |texture| {
            Animation::from_frames(
                (0..4)
                    .map(|i| {
                        AnimationFrame::new(
                            Frame::new(TextureHandle::new(texture), Rect::new(i * 10, 0, 10, 10)),
                            10,
                        )
                        .expect("non-zero duration")
                    })
                    .collect(),
            )
        };
        let mut animations = HashMap::new();
        animations.insert(ObjState::Idle, clip(0));
        animations.insert(ObjState::Moving, clip(1));
        let body = Entity::new(RectF::new(0.1, 0.7, 0.15, 0.3)).with_animations(animations);
        let mut p = Player::new(body, 100, 5, PlayerTuning::default()).expect("valid player");

        run(&mut p, &[KbdEvent::RightKeyDown], 10);
        run(&mut p, &[], 10);
        assert_eq!(p.body().animation().map(Animation::frame_index), Some(2));

        // Release and re-press inside one tick: still Moving, cycle untouched.
        run(&mut p, &[KbdEvent::RightKeyUp, KbdEvent::RightKeyDown], 0);
        assert_eq!(p.state(), ObjState::Moving);
        assert_eq!(p.body().animation().map(Animation::frame_index), Some(2));

        // Tapping fire while walking ends the tick back in Moving.
        run(&mut p, &[KbdEvent::LCtrlKeyDown, KbdEvent::LCtrlKeyUp], 0);
        assert_eq!(p.state(), ObjState::Moving);
        assert_eq!(p.body().animation().map(Animation::frame_index), Some(2));

        // Stopping for a tick and walking again re-enters Moving.
        run(&mut p, &[KbdEvent::RightKeyUp], 0);
        assert_eq!(p.state(), ObjState::Idle);
        run(&mut p, &[KbdEvent::RightKeyDown], 0);
        assert_eq!(p.body().animation().map(Animation::frame_index), Some(0));
    }
}
