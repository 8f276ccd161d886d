//! Animation registry for the scene's animation definition files.
//!
//! Each file describes one entity's per-state clips and is registered under
//! its `animation_id`. Building a set resolves textures through the texture
//! source and hands back fresh, independent playback cursors, so two
//! entities sharing a definition never share animation state.

use std::collections::HashMap;
use std::path::Path;

use gr_core::animation::{load_animation_file, Animation, AnimationFile};
use gr_core::entity::ObjState;
use gr_core::render::TextureSource;

pub struct AnimationRegistry {
    /// animation_id -> definition
    files: HashMap<String, AnimationFile>,
}

impl AnimationRegistry {
    pub fn new() -> Self {
        Self {
            files: HashMap::new(),
        }
    }

    /// Load every file in order. Stops at the first failure.
    pub fn load_all<P: AsRef<Path>>(paths: &[P]) -> Result<Self, String> {
        let mut registry = Self::new();
        for path in paths {
            registry.load_file(path.as_ref())?;
        }
        Ok(registry)
    }

    /// Load an animation file and register it under its `animation_id`.
    /// Returns the id.
    pub fn load_file(&mut self, path: &Path) -> Result<String, String> {
        let file = load_animation_file(path)?;
        let id = file.animation_id.clone();
        log::info!(
            "Loaded animation '{}' ({} states) from {}",
            id,
            file.states.len(),
            path.display()
        );
        self.insert(file);
        Ok(id)
    }

    pub fn insert(&mut self, file: AnimationFile) {
        if self.files.contains_key(&file.animation_id) {
            log::warn!(
                "Animation id '{}' registered twice; keeping the later file",
                file.animation_id
            );
        }
        self.files.insert(file.animation_id.clone(), file);
    }

    pub fn contains(&self, animation_id: &str) -> bool {
        self.files.contains_key(animation_id)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Build a fresh state -> animation map for one entity.
    pub fn build(
        &self,
        animation_id: &str,
        textures: &mut dyn TextureSource,
    ) -> Result<HashMap<ObjState, Animation>, String> {
        let file = self
            .files
            .get(animation_id)
            .ok_or_else(|| format!("Unknown animation id '{animation_id}'"))?;
        let animations = file.build(textures)?;
        if !animations.contains_key(&ObjState::Idle) {
            log::warn!(
                "Animation '{}' has no idle clip; states without a clip will not be drawn",
                animation_id
            );
        }
        Ok(animations)
    }
}

impl Default for AnimationRegistry {
    fn default() -> Self {
        Self::new()
    }
}
