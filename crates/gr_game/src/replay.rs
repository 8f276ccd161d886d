use gr_core::input::KbdEvent;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::world::World;

/// Scripted input for headless runs: each step delivers its events on the
/// first of `repeat` ticks, then idles for the rest.
#[derive(Debug, Deserialize, Clone)]
pub struct ReplaySequence {
    #[serde(default = "default_dt_ms")]
    pub dt_ms: u32,
    pub steps: Vec<ReplayStep>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReplayStep {
    #[serde(default)]
    pub events: Vec<KbdEvent>,
    #[serde(default = "default_repeat")]
    pub repeat: u32,
}

impl ReplaySequence {
    pub fn expanded_ticks(&self) -> Vec<Vec<KbdEvent>> {
        let mut out = Vec::new();
        for step in &self.steps {
            out.push(step.events.clone());
            for _ in 1..step.repeat.max(1) {
                out.push(Vec::new());
            }
        }
        out
    }

    pub fn run(&self, world: &mut World) {
        for events in self.expanded_ticks() {
            world.update_model(self.dt_ms, &events);
        }
    }
}

pub fn load_replay_from_path(path: &Path) -> Result<ReplaySequence, String> {
    let raw =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let replay: ReplaySequence = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse replay JSON {}: {e}", path.display()))?;
    validate_replay(&replay)?;
    Ok(replay)
}

fn validate_replay(replay: &ReplaySequence) -> Result<(), String> {
    if replay.dt_ms == 0 {
        return Err("Replay validation failed: dt_ms must be > 0".to_string());
    }
    if replay.steps.is_empty() {
        return Err("Replay validation failed: steps list is empty".to_string());
    }
    Ok(())
}

const fn default_dt_ms() -> u32 {
    5
}

const fn default_repeat() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::testing::range_world;
    use gr_core::entity::ObjState;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "gr_replay_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    fn load(name: &str, json: &str) -> ReplaySequence {
        let path = temp_file_path(name);
        fs::write(&path, json).expect("write replay file");
        let replay = load_replay_from_path(&path).expect("replay should load");
        let _ = fs::remove_file(path);
        replay
    }

    #[test]
    fn replay_file_parses_and_expands() {
        let replay = load(
            "parse",
            r#"{
              "steps": [
                { "events": ["right_key_down"], "repeat": 3 },
                { "events": ["right_key_up", "space_key_down"] }
              ]
            }"#,
        );
        assert_eq!(replay.dt_ms, 5);
        let ticks = replay.expanded_ticks();
        assert_eq!(ticks.len(), 4);
        assert_eq!(ticks[0], vec![KbdEvent::RightKeyDown]);
        assert!(ticks[1].is_empty() && ticks[2].is_empty());
        assert_eq!(ticks[3], vec![KbdEvent::RightKeyUp, KbdEvent::SpaceKeyDown]);
    }

    #[test]
    fn empty_replay_is_rejected() {
        let path = temp_file_path("empty");
        fs::write(&path, r#"{ "steps": [] }"#).expect("write replay file");
        let err = load_replay_from_path(&path).expect_err("empty replay should fail");
        assert!(err.contains("steps list is empty"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn run_and_gun_replay_is_deterministic() {
        let replay = load(
            "deterministic",
            r#"{
              "dt_ms": 5,
              "steps": [
                { "events": ["right_key_down", "lctrl_key_down"], "repeat": 60 },
                { "events": ["space_key_down"], "repeat": 150 },
                { "events": ["space_key_up", "right_key_up"], "repeat": 30 },
                { "events": ["lctrl_key_up"], "repeat": 400 }
              ]
            }"#,
        );

        let mut run_a = range_world();
        let mut run_b = range_world();
        replay.run(&mut run_a);
        replay.run(&mut run_b);

        let a = run_a.player().body();
        let b = run_b.player().body();
        assert_eq!(a.destination(), b.destination());
        assert_eq!(a.velocity_x, b.velocity_x);
        assert_eq!(a.velocity_y, b.velocity_y);
        assert_eq!(run_a.shots_fired(), run_b.shots_fired());
        assert_eq!(run_a.hits(), run_b.hits());

        // Landed, stopped and no longer firing by the end.
        assert_eq!(run_a.player().state(), ObjState::Idle);
        assert!(run_a.player().body().is_grounded(run_a.config()));
        assert!(run_a.shots_fired() > 0);
        assert!(run_a.bullets().is_empty());
    }
}
