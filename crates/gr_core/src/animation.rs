//! Sprite-sheet keyframe animation and its JSON definition files.
//!
//! An [`Animation`] is a looping sequence of [`AnimationFrame`]s, each showing
//! one source rectangle of a texture for a fixed number of milliseconds. The
//! playback cursor advances at most one frame per [`Animation::update`] call:
//! once the time accumulated in the current frame reaches its duration the
//! accumulator is reduced modulo that duration and the cursor moves on.
//!
//! The JSON format groups frame lists by entity state. It is converted into
//! runtime animations through a [`TextureSource`], which turns the asset ids
//! in the file into texture handles.

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::entity::ObjState;
use crate::geometry::Rect;
use crate::render::{RenderSurface, TextureHandle, TextureSource};

/// One region of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub texture: TextureHandle,
    pub source: Rect,
}

impl Frame {
    pub fn new(texture: TextureHandle, source: Rect) -> Self {
        Self { texture, source }
    }

    pub fn render<S: RenderSurface + ?Sized>(&self, surface: &mut S, destination: Rect) {
        surface.draw(self.texture, self.source, destination);
    }
}

/// A [`Frame`] shown for `duration_ms` milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationFrame {
    frame: Frame,
    duration_ms: u32,
}

impl AnimationFrame {
    /// Fails on a zero duration, which would stall the modulo step in
    /// [`Animation::update`].
    pub fn new(frame: Frame, duration_ms: u32) -> Result<Self, String> {
        if duration_ms == 0 {
            return Err("Animation frame validation failed: duration must be > 0".to_string());
        }
        Ok(Self { frame, duration_ms })
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn duration_ms(&self) -> u32 {
        self.duration_ms
    }
}

/// Looping frame sequence plus its playback cursor.
#[derive(Debug, Clone, Default)]
pub struct Animation {
    frames: Vec<AnimationFrame>,
    frame_index: usize,
    elapsed_ms: u32,
}

impl Animation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_frames(frames: Vec<AnimationFrame>) -> Self {
        Self {
            frames,
            frame_index: 0,
            elapsed_ms: 0,
        }
    }

    pub fn add_frame(&mut self, frame: AnimationFrame) {
        self.frames.push(frame);
    }

    pub fn add_frames(&mut self, frames: impl IntoIterator<Item = AnimationFrame>) {
        for frame in frames {
            self.add_frame(frame);
        }
    }

    /// Advance playback by `dt_ms`.
    ///
    /// Moves at most one frame per call even when `dt_ms` spans several
    /// frame durations; the remainder is taken modulo the duration of the
    /// frame being left.
    pub fn update(&mut self, dt_ms: u32) {
        if self.frames.is_empty() {
            return;
        }
        self.elapsed_ms = self.elapsed_ms.saturating_add(dt_ms);

        let duration = self.frames[self.frame_index].duration_ms;
        if self.elapsed_ms >= duration {
            self.elapsed_ms %= duration;
            self.frame_index = (self.frame_index + 1) % self.frames.len();
        }
    }

    pub fn render<S: RenderSurface + ?Sized>(&self, surface: &mut S, destination: Rect) {
        if let Some(current) = self.current_frame() {
            current.frame.render(surface, destination);
        }
    }

    pub fn reset(&mut self) {
        self.frame_index = 0;
        self.elapsed_ms = 0;
    }

    pub fn current_frame(&self) -> Option<&AnimationFrame> {
        self.frames.get(self.frame_index)
    }

    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    pub fn elapsed_ms(&self) -> u32 {
        self.elapsed_ms
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Total duration of one full cycle.
    pub fn total_duration_ms(&self) -> u64 {
        self.frames.iter().map(|f| u64::from(f.duration_ms)).sum()
    }
}

/// Frame lists for one texture.
#[derive(Debug, Clone)]
pub struct ClipDef {
    pub texture: String,
    pub frames: Vec<FrameDef>,
}

#[derive(Debug, Clone, Copy)]
pub struct FrameDef {
    pub source: Rect,
    pub duration_ms: u32,
}

/// Top-level animation definition file (deserialized from JSON).
#[derive(Debug, Clone)]
pub struct AnimationFile {
    pub version: String,
    pub animation_id: String,
    pub states: HashMap<ObjState, ClipDef>,
}

impl AnimationFile {
    /// Resolve textures and build one independent animation per state.
    pub fn build(
        &self,
        textures: &mut dyn TextureSource,
    ) -> Result<HashMap<ObjState, Animation>, String> {
        let mut animations = HashMap::with_capacity(self.states.len());
        for (&state, clip) in &self.states {
            let texture = textures.texture(&clip.texture);
            let mut animation = Animation::new();
            for def in &clip.frames {
                let frame = AnimationFrame::new(Frame::new(texture, def.source), def.duration_ms)
                    .map_err(|e| format!("{} ({}/{state}): {e}", self.animation_id, clip.texture))?;
                animation.add_frame(frame);
            }
            animations.insert(state, animation);
        }
        Ok(animations)
    }
}

// --- JSON deserialization types (private) ---

#[derive(Debug, Deserialize)]
struct AnimationFileJson {
    version: String,
    animation_id: String,
    states: HashMap<ObjState, ClipJson>,
}

#[derive(Debug, Deserialize)]
struct ClipJson {
    texture: String,
    frames: Vec<FrameJson>,
}

#[derive(Debug, Deserialize)]
struct FrameJson {
    x: i32,
    y: i32,
    w: i32,
    h: i32,
    duration_ms: u32,
    #[serde(default = "default_repeat")]
    repeat: u32,
}

/// Load an animation definition file from disk.
pub fn load_animation_file(path: &Path) -> Result<AnimationFile, String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read animation file {}: {e}", path.display()))?;
    parse_animation_file(&raw)
        .map_err(|e| format!("Failed to load animation file {}: {e}", path.display()))
}

pub fn parse_animation_file(raw: &str) -> Result<AnimationFile, String> {
    let json: AnimationFileJson = serde_json::from_str(raw).map_err(|e| e.to_string())?;
    validate_animation_json(&json)?;

    let mut states = HashMap::new();
    for (state, clip_json) in json.states {
        let mut frames = Vec::new();
        for f in clip_json.frames {
            for _ in 0..f.repeat.max(1) {
                frames.push(FrameDef {
                    source: Rect::new(f.x, f.y, f.w, f.h),
                    duration_ms: f.duration_ms,
                });
            }
        }
        states.insert(
            state,
            ClipDef {
                texture: clip_json.texture,
                frames,
            },
        );
    }

    Ok(AnimationFile {
        version: json.version,
        animation_id: json.animation_id,
        states,
    })
}

fn validate_animation_json(json: &AnimationFileJson) -> Result<(), String> {
    if json.version != "0.1" {
        return Err(format!(
            "Animation validation failed: unsupported version '{}'",
            json.version
        ));
    }
    if json.animation_id.is_empty() {
        return Err("Animation validation failed: animation_id is empty".to_string());
    }
    for (state, clip) in &json.states {
        if clip.texture.is_empty() {
            return Err(format!(
                "Animation validation failed: state '{state}' has an empty texture"
            ));
        }
        if clip.frames.is_empty() {
            return Err(format!(
                "Animation validation failed: state '{state}' has no frames"
            ));
        }
        for (i, frame) in clip.frames.iter().enumerate() {
            if frame.duration_ms == 0 {
                return Err(format!(
                    "Animation validation failed: state '{state}' frame {i} has zero duration"
                ));
            }
            if frame.w <= 0 || frame.h <= 0 {
                return Err(format!(
                    "Animation validation failed: state '{state}' frame {i} has an empty source rect"
                ));
            }
        }
    }
    Ok(())
}

const fn default_repeat() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::testing::{FakeTextures, RecordingSurface};
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "gr_anim_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    fn make_animation(durations_ms: &[u32]) -> Animation {
        let texture = TextureHandle::new(7);
        Animation::from_frames(
            durations_ms
                .iter()
                .enumerate()
                .map(|(i, &d)| {
                    AnimationFrame::new(Frame::new(texture, Rect::new(i as i32 * 16, 0, 16, 16)), d)
                        .expect("non-zero duration")
                })
                .collect(),
        )
    }

    #[test]
    fn zero_duration_frame_is_rejected() {
        let frame = Frame::new(TextureHandle::new(0), Rect::new(0, 0, 8, 8));
        let err = AnimationFrame::new(frame, 0).expect_err("zero duration should fail");
        assert!(err.contains("duration must be > 0"));
    }

    #[test]
    fn update_advances_once_duration_is_reached() {
        let mut anim = make_animation(&[100, 100, 100]);

        anim.update(50);
        assert_eq!(anim.frame_index(), 0);
        assert_eq!(anim.elapsed_ms(), 50);

        anim.update(60);
        assert_eq!(anim.frame_index(), 1);
        assert_eq!(anim.elapsed_ms(), 10);
    }

    #[test]
    fn remainder_is_taken_modulo_the_exited_frame() {
        let mut anim = make_animation(&[30, 200]);
        // 70 >= 30: leave frame 0 with 70 % 30 = 10, not 70 % 200.
        anim.update(70);
        assert_eq!(anim.frame_index(), 1);
        assert_eq!(anim.elapsed_ms(), 10);
    }

    #[test]
    fn large_step_advances_a_single_frame() {
        let mut anim = make_animation(&[100, 100, 100]);
        anim.update(350);
        assert_eq!(anim.frame_index(), 1);
        assert_eq!(anim.elapsed_ms(), 50);
    }

    #[test]
    fn wraps_back_to_first_frame() {
        let mut anim = make_animation(&[100, 100]);
        anim.update(100);
        anim.update(100);
        assert_eq!(anim.frame_index(), 0);
    }

    #[test]
    fn full_cycle_returns_to_frame_zero() {
        // Holds for any step no longer than the shortest frame.
        for step in [1u32, 5, 10, 25] {
            let mut anim = make_animation(&[50, 100, 75, 25]);
            let total = anim.total_duration_ms() as u32;
            for _ in 0..(total / step) {
                anim.update(step);
            }
            assert_eq!(anim.frame_index(), 0, "step {step}");
            assert_eq!(anim.elapsed_ms(), 0, "step {step}");
        }
    }

    #[test]
    fn reset_zeroes_cursor() {
        let mut anim = make_animation(&[40, 40, 40]);
        anim.update(45);
        anim.update(30);
        assert_ne!((anim.frame_index(), anim.elapsed_ms()), (0, 0));
        anim.reset();
        assert_eq!(anim.frame_index(), 0);
        assert_eq!(anim.elapsed_ms(), 0);
    }

    #[test]
    fn empty_animation_is_a_no_op() {
        let mut anim = Animation::new();
        anim.update(1000);
        assert_eq!(anim.frame_index(), 0);
        assert_eq!(anim.elapsed_ms(), 0);

        let mut surface = RecordingSurface::default();
        anim.render(&mut surface, Rect::new(0, 0, 10, 10));
        assert!(surface.calls.is_empty());
    }

    #[test]
    fn render_draws_current_frame_region() {
        let mut anim = make_animation(&[100, 100]);
        anim.update(100);

        let mut surface = RecordingSurface::default();
        let dst = Rect::new(5, 6, 7, 8);
        anim.render(&mut surface, dst);

        assert_eq!(surface.calls.len(), 1);
        assert_eq!(surface.calls[0].texture, TextureHandle::new(7));
        assert_eq!(surface.calls[0].src, Rect::new(16, 0, 16, 16));
        assert_eq!(surface.calls[0].dst, dst);
    }

    #[test]
    fn add_frames_appends_in_order() {
        let texture = TextureHandle::new(1);
        let mut anim = Animation::new();
        anim.add_frames((1..=3).map(|i| {
            AnimationFrame::new(Frame::new(texture, Rect::new(i, 0, 1, 1)), 10 * i as u32)
                .expect("non-zero duration")
        }));
        assert_eq!(anim.len(), 3);
        assert_eq!(anim.total_duration_ms(), 60);
        assert_eq!(
            anim.current_frame().map(|f| f.frame().source.x),
            Some(1)
        );
    }

    #[test]
    fn load_animation_file_parses_valid_json() {
        let path = temp_file_path("valid");
        let json = r#"
        {
          "version": "0.1",
          "animation_id": "hero",
          "states": {
            "idle": {
              "texture": "assets/textures/hero.png",
              "frames": [ { "x": 20, "y": 20, "w": 500, "h": 500, "duration_ms": 100, "repeat": 10 } ]
            },
            "firing_and_moving": {
              "texture": "assets/textures/hero.png",
              "frames": [
                { "x": 0, "y": 0, "w": 32, "h": 32, "duration_ms": 80 },
                { "x": 32, "y": 0, "w": 32, "h": 32, "duration_ms": 120 }
              ]
            }
          }
        }
        "#;
        fs::write(&path, json).expect("write temp file");

        let file = load_animation_file(&path).expect("should parse");
        assert_eq!(file.animation_id, "hero");
        assert_eq!(file.states.len(), 2);
        assert_eq!(file.states[&ObjState::Idle].frames.len(), 10);

        let clip = &file.states[&ObjState::FiringAndMoving];
        assert_eq!(clip.frames[1].source, Rect::new(32, 0, 32, 32));
        assert_eq!(clip.frames[1].duration_ms, 120);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn load_animation_file_rejects_bad_version() {
        let json = r#"
        {
          "version": "9.9",
          "animation_id": "hero",
          "states": {
            "idle": { "texture": "a.png", "frames": [{ "x": 0, "y": 0, "w": 1, "h": 1, "duration_ms": 100 }] }
          }
        }
        "#;
        let err = parse_animation_file(json).expect_err("bad version should fail");
        assert!(err.contains("unsupported version"));
    }

    #[test]
    fn load_animation_file_rejects_zero_duration() {
        let path = temp_file_path("zero_dur");
        let json = r#"
        {
          "version": "0.1",
          "animation_id": "hero",
          "states": {
            "idle": { "texture": "a.png", "frames": [{ "x": 0, "y": 0, "w": 1, "h": 1, "duration_ms": 0 }] }
          }
        }
        "#;
        fs::write(&path, json).expect("write temp file");
        let err = load_animation_file(&path).expect_err("zero duration should fail");
        assert!(err.contains("zero duration"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn load_animation_file_rejects_unknown_state() {
        let json = r#"
        {
          "version": "0.1",
          "animation_id": "hero",
          "states": {
            "dancing": { "texture": "a.png", "frames": [{ "x": 0, "y": 0, "w": 1, "h": 1, "duration_ms": 10 }] }
          }
        }
        "#;
        assert!(parse_animation_file(json).is_err());
    }

    #[test]
    fn build_resolves_textures_once_per_asset() {
        let json = r#"
        {
          "version": "0.1",
          "animation_id": "hero",
          "states": {
            "idle": { "texture": "hero.png", "frames": [{ "x": 0, "y": 0, "w": 8, "h": 8, "duration_ms": 10 }] },
            "moving": { "texture": "hero.png", "frames": [{ "x": 8, "y": 0, "w": 8, "h": 8, "duration_ms": 10, "repeat": 3 }] }
          }
        }
        "#;
        let file = parse_animation_file(json).expect("should parse");
        let mut textures = FakeTextures::default();
        let set = file.build(&mut textures).expect("should build");

        assert_eq!(textures.ids.len(), 1);
        assert_eq!(set[&ObjState::Idle].len(), 1);
        assert_eq!(set[&ObjState::Moving].len(), 3);
        let idle_tex = set[&ObjState::Idle].current_frame().map(|f| f.frame().texture);
        let moving_tex = set[&ObjState::Moving].current_frame().map(|f| f.frame().texture);
        assert_eq!(idle_tex, moving_tex);
    }
}
