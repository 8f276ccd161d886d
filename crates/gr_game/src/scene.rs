use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use gr_core::config::{LoopConfig, PlayerTuning, WorldConfig};
use gr_core::geometry::RectF;

use crate::animation::AnimationRegistry;

/// A firing-range scene: world constants, the player, the bullet template
/// and the targets, all in normalized screen space.
#[derive(Debug, Deserialize, Clone)]
pub struct SceneFile {
    pub version: String,
    pub scene_id: String,
    #[serde(default)]
    pub world: WorldConfig,
    #[serde(default)]
    pub timing: LoopConfig,
    /// Animation definition files, relative to the working directory.
    #[serde(default)]
    pub animations: Vec<String>,
    pub player: ScenePlayer,
    pub projectile: SceneProjectile,
    #[serde(default)]
    pub targets: Vec<SceneTarget>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScenePlayer {
    pub rect: RectF,
    #[serde(default = "default_scale")]
    pub scale: f32,
    #[serde(default = "default_health")]
    pub health: i32,
    /// Shots per second while firing.
    #[serde(default = "default_fire_rate")]
    pub fire_rate: u32,
    pub animation: String,
    #[serde(default)]
    pub tuning: PlayerTuning,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SceneProjectile {
    #[serde(default = "default_bullet_size")]
    pub w: f32,
    #[serde(default = "default_bullet_size")]
    pub h: f32,
    #[serde(default = "default_bullet_speed")]
    pub speed_x: f32,
    #[serde(default = "default_lifespan_ms")]
    pub lifespan_ms: u32,
    #[serde(default = "default_damage")]
    pub damage: i32,
    pub animation: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SceneTarget {
    pub id: String,
    pub rect: RectF,
    #[serde(default = "default_scale")]
    pub scale: f32,
    #[serde(default)]
    pub gravity: bool,
    pub animation: String,
}

pub struct SceneWatcher {
    scene_path: PathBuf,
    last_seen_modified: Option<SystemTime>,
}

impl SceneWatcher {
    pub fn new(scene_path: PathBuf) -> Self {
        let last_seen_modified = modified_time(&scene_path);
        Self {
            scene_path,
            last_seen_modified,
        }
    }

    pub fn should_reload(&mut self) -> bool {
        let current = modified_time(&self.scene_path);
        match (self.last_seen_modified, current) {
            (Some(old), Some(now)) if now > old => {
                self.last_seen_modified = Some(now);
                true
            }
            (None, Some(now)) => {
                self.last_seen_modified = Some(now);
                true
            }
            _ => false,
        }
    }
}

pub fn load_scene_from_path(scene_path: &Path) -> Result<SceneFile, String> {
    let raw = fs::read_to_string(scene_path)
        .map_err(|e| format!("Failed to read scene file {}: {e}", scene_path.display()))?;
    let scene: SceneFile = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse scene JSON {}: {e}", scene_path.display()))?;
    validate_scene(&scene)?;
    Ok(scene)
}

fn validate_scene(scene: &SceneFile) -> Result<(), String> {
    if scene.version != "0.1" {
        return Err(format!(
            "Scene validation failed: unsupported version '{}'",
            scene.version
        ));
    }
    if scene.scene_id.is_empty() {
        return Err("Scene validation failed: scene_id is empty".to_string());
    }
    scene.world.validate()?;
    scene.timing.validate()?;
    scene.player.tuning.validate()?;

    validate_rect("player", &scene.player.rect, scene.player.scale)?;
    if scene.player.fire_rate == 0 || scene.player.fire_rate > 1000 {
        return Err(format!(
            "Scene validation failed: player fire_rate must be in 1..=1000, got {}",
            scene.player.fire_rate
        ));
    }

    let projectile = &scene.projectile;
    if !(projectile.w > 0.0) || !(projectile.h > 0.0) {
        return Err("Scene validation failed: projectile size must be > 0".to_string());
    }
    if projectile.lifespan_ms == 0 {
        return Err("Scene validation failed: projectile lifespan_ms must be > 0".to_string());
    }

    let mut target_ids = HashSet::new();
    for target in &scene.targets {
        if !target_ids.insert(target.id.as_str()) {
            return Err(format!(
                "Scene validation failed: duplicate target id '{}'",
                target.id
            ));
        }
        validate_rect(&format!("target '{}'", target.id), &target.rect, target.scale)?;
    }
    if scene.targets.is_empty() {
        log::warn!(
            "Scene '{}' has no targets. This is allowed but often accidental.",
            scene.scene_id
        );
    }

    Ok(())
}

fn validate_rect(what: &str, rect: &RectF, scale: f32) -> Result<(), String> {
    if !(rect.w > 0.0) || !(rect.h > 0.0) {
        return Err(format!("Scene validation failed: {what} rect must have size > 0"));
    }
    if !(scale > 0.0) {
        return Err(format!("Scene validation failed: {what} scale must be > 0"));
    }
    Ok(())
}

/// Every animation id the scene names must be registered.
pub fn validate_animation_refs(
    scene: &SceneFile,
    registry: &AnimationRegistry,
) -> Result<(), String> {
    let refs = std::iter::once(("player", scene.player.animation.as_str()))
        .chain(std::iter::once((
            "projectile",
            scene.projectile.animation.as_str(),
        )))
        .chain(
            scene
                .targets
                .iter()
                .map(|t| (t.id.as_str(), t.animation.as_str())),
        );
    for (owner, animation_id) in refs {
        if !registry.contains(animation_id) {
            return Err(format!(
                "Scene validation failed: '{owner}' references unknown animation '{animation_id}'"
            ));
        }
    }
    Ok(())
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).ok()?.modified().ok()
}

const fn default_scale() -> f32 {
    1.0
}

const fn default_health() -> i32 {
    100
}

const fn default_fire_rate() -> u32 {
    5
}

const fn default_bullet_size() -> f32 {
    0.02
}

const fn default_bullet_speed() -> f32 {
    0.002
}

const fn default_lifespan_ms() -> u32 {
    1500
}

const fn default_damage() -> i32 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;
    use gr_core::animation::parse_animation_file;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "gr_scene_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    fn write_scene_file(path: &Path, body: &str) {
        fs::write(path, body).expect("failed to write temp scene file");
    }

    const MINIMAL: &str = r#"
    {
      "version": "0.1",
      "scene_id": "range",
      "player": {
        "rect": { "x": 0.125, "y": 0.4, "w": 0.15, "h": 0.3 },
        "animation": "player"
      },
      "projectile": { "animation": "bullet" },
      "targets": [
        { "id": "dummy", "rect": { "x": 0.6, "y": 0.4, "w": 0.15, "h": 0.3 }, "animation": "dummy" }
      ]
    }
    "#;

    fn load_str(name: &str, json: &str) -> Result<SceneFile, String> {
        let path = temp_file_path(name);
        write_scene_file(&path, json);
        let result = load_scene_from_path(&path);
        let _ = fs::remove_file(path);
        result
    }

    #[test]
    fn minimal_scene_fills_in_defaults() {
        let scene = load_str("minimal", MINIMAL).expect("valid scene should load");
        assert_eq!(scene.scene_id, "range");
        assert_eq!(scene.world, WorldConfig::default());
        assert_eq!(scene.timing, LoopConfig::default());
        assert_eq!(scene.player.health, 100);
        assert_eq!(scene.player.fire_rate, 5);
        assert_eq!(scene.player.scale, 1.0);
        assert_eq!(scene.projectile.w, 0.02);
        assert_eq!(scene.projectile.lifespan_ms, 1500);
        assert_eq!(scene.targets.len(), 1);
        assert!(!scene.targets[0].gravity);
    }

    #[test]
    fn overrides_are_applied() {
        let json = MINIMAL.replace(
            r#""scene_id": "range","#,
            r#""scene_id": "range", "world": { "gravity": 0.0002 }, "timing": { "model_rate": 100 },"#,
        );
        let scene = load_str("overrides", &json).expect("scene should load");
        assert_eq!(scene.world.gravity, 0.0002);
        assert_eq!(scene.world.floor, 1.0);
        assert_eq!(scene.timing.model_interval_ms(), 10);
    }

    #[test]
    fn rejects_unsupported_version() {
        let json = MINIMAL.replace(r#""version": "0.1""#, r#""version": "9.9""#);
        let err = load_str("version", &json).expect_err("bad version should fail");
        assert!(err.contains("unsupported version"));
    }

    #[test]
    fn rejects_zero_fire_rate() {
        let json = MINIMAL.replace(
            r#""animation": "player""#,
            r#""animation": "player", "fire_rate": 0"#,
        );
        let err = load_str("fire_rate", &json).expect_err("zero fire rate should fail");
        assert!(err.contains("fire_rate"));
    }

    #[test]
    fn rejects_zero_model_rate() {
        let json = MINIMAL.replace(
            r#""scene_id": "range","#,
            r#""scene_id": "range", "timing": { "model_rate": 0 },"#,
        );
        let err = load_str("model_rate", &json).expect_err("zero model rate should fail");
        assert!(err.contains("model_rate"));
    }

    #[test]
    fn rejects_duplicate_target_ids() {
        let json = MINIMAL.replace(
            r#""targets": ["#,
            r#""targets": [ { "id": "dummy", "rect": { "x": 0.1, "y": 0.1, "w": 0.1, "h": 0.1 }, "animation": "dummy" },"#,
        );
        let err = load_str("dup_target", &json).expect_err("duplicate targets should fail");
        assert!(err.contains("duplicate target id 'dummy'"));
    }

    #[test]
    fn rejects_empty_player_rect() {
        let json = MINIMAL.replace(r#""x": 0.125, "y": 0.4, "w": 0.15"#, r#""x": 0.125, "y": 0.4, "w": 0.0"#);
        let err = load_str("empty_rect", &json).expect_err("empty rect should fail");
        assert!(err.contains("player rect must have size > 0"));
    }

    #[test]
    fn animation_refs_must_be_registered() {
        let scene = load_str("refs", MINIMAL).expect("scene should load");
        let mut registry = AnimationRegistry::new();
        for id in ["player", "bullet"] {
            let file = parse_animation_file(&format!(
                r#"{{ "version": "0.1", "animation_id": "{id}", "states": {{}} }}"#
            ))
            .expect("animation should parse");
            registry.insert(file);
        }
        let err = validate_animation_refs(&scene, &registry).expect_err("dummy is missing");
        assert!(err.contains("'dummy' references unknown animation 'dummy'"));

        registry.insert(
            parse_animation_file(r#"{ "version": "0.1", "animation_id": "dummy", "states": {} }"#)
                .expect("animation should parse"),
        );
        validate_animation_refs(&scene, &registry).expect("all refs resolve");
    }

    #[test]
    fn scene_watcher_detects_newly_created_file() {
        let path = temp_file_path("watcher_create");
        let _ = fs::remove_file(&path);

        let mut watcher = SceneWatcher::new(path.clone());
        assert!(!watcher.should_reload(), "missing file should not reload");

        write_scene_file(&path, MINIMAL);

        assert!(
            watcher.should_reload(),
            "creating file should trigger reload once"
        );
        assert!(
            !watcher.should_reload(),
            "without changes, second poll should not reload"
        );

        let _ = fs::remove_file(path);
    }
}
