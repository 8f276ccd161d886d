//! Keyboard state tracking and the gameplay event queue.
//!
//! - **Level-triggered (held):** `is_held(key)` is true every tick the key is
//!   physically down.
//!
//! - **Edge-triggered (just_pressed / just_released):** true only until the
//!   next `end_frame()`. Used for non-gameplay keys like Escape and F3.
//!
//! - **Events:** gameplay keys additionally push a [`KbdEvent`] on every real
//!   transition. OS key repeat (a second down while already held) is dropped
//!   before it reaches the queue, so the player state machine only ever sees
//!   one `*KeyDown` per physical press.

use serde::Deserialize;
use std::collections::HashSet;

/// A debounced gameplay key transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KbdEvent {
    UpKeyDown,
    UpKeyUp,
    DownKeyDown,
    DownKeyUp,
    LeftKeyDown,
    LeftKeyUp,
    RightKeyDown,
    RightKeyUp,
    SpaceKeyDown,
    SpaceKeyUp,
    #[serde(rename = "lctrl_key_down")]
    LCtrlKeyDown,
    #[serde(rename = "lctrl_key_up")]
    LCtrlKeyUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    Space,
    LCtrl,
    Escape,
    F3,
}

impl Key {
    /// The gameplay event for a transition of this key, if it has one.
    pub fn event(self, pressed: bool) -> Option<KbdEvent> {
        let event = match (self, pressed) {
            (Key::Up, true) => KbdEvent::UpKeyDown,
            (Key::Up, false) => KbdEvent::UpKeyUp,
            (Key::Down, true) => KbdEvent::DownKeyDown,
            (Key::Down, false) => KbdEvent::DownKeyUp,
            (Key::Left, true) => KbdEvent::LeftKeyDown,
            (Key::Left, false) => KbdEvent::LeftKeyUp,
            (Key::Right, true) => KbdEvent::RightKeyDown,
            (Key::Right, false) => KbdEvent::RightKeyUp,
            (Key::Space, true) => KbdEvent::SpaceKeyDown,
            (Key::Space, false) => KbdEvent::SpaceKeyUp,
            (Key::LCtrl, true) => KbdEvent::LCtrlKeyDown,
            (Key::LCtrl, false) => KbdEvent::LCtrlKeyUp,
            (Key::Escape | Key::F3, _) => return None,
        };
        Some(event)
    }
}

pub struct InputState {
    held: HashSet<Key>,
    just_pressed: HashSet<Key>,
    just_released: HashSet<Key>,
    events: Vec<KbdEvent>,
}

impl InputState {
    pub fn new() -> Self {
        Self {
            held: HashSet::new(),
            just_pressed: HashSet::new(),
            just_released: HashSet::new(),
            events: Vec::new(),
        }
    }

    pub fn key_down(&mut self, key: Key) {
        if self.held.insert(key) {
            self.just_pressed.insert(key);
            self.events.extend(key.event(true));
        }
    }

    pub fn key_up(&mut self, key: Key) {
        if self.held.remove(&key) {
            self.just_released.insert(key);
            self.events.extend(key.event(false));
        }
    }

    /// Take every queued event in arrival order.
    pub fn drain_events(&mut self) -> Vec<KbdEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn pending_events(&self) -> &[KbdEvent] {
        &self.events
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    pub fn is_just_pressed(&self, key: Key) -> bool {
        self.just_pressed.contains(&key)
    }

    pub fn is_just_released(&self, key: Key) -> bool {
        self.just_released.contains(&key)
    }

    pub fn end_frame(&mut self) {
        self.just_pressed.clear();
        self.just_released.clear();
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}
