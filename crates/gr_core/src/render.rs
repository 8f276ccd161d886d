//! Seams between the simulation core and the code that actually draws it.
//!
//! The core never owns textures. It asks a [`TextureSource`] for a handle once
//! at setup time and hands that handle back to a [`RenderSurface`] on every
//! draw. Whatever sits behind the handle (a GPU texture, a test fake) lives as
//! long as the source that issued it.

use crate::geometry::Rect;

/// Opaque reference to a texture owned by a [`TextureSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(u32);

impl TextureHandle {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub const fn id(self) -> u32 {
        self.0
    }
}

/// Resolves asset identifiers to texture handles. Implementations memoize:
/// asking twice for the same asset returns the same handle.
pub trait TextureSource {
    fn texture(&mut self, asset: &str) -> TextureHandle;
}

/// Draw primitive: copy `src` (texture pixels) into `dst` (screen pixels).
pub trait RenderSurface {
    fn draw(&mut self, texture: TextureHandle, src: Rect, dst: Rect);
}

/// In-memory doubles for the two traits above.
#[cfg(any(test, feature = "testing"))]
pub mod testing {
    use super::*;
    use std::collections::HashMap;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DrawCall {
        pub texture: TextureHandle,
        pub src: Rect,
        pub dst: Rect,
    }

    /// Surface that remembers every draw call.
    #[derive(Default)]
    pub struct RecordingSurface {
        pub calls: Vec<DrawCall>,
    }

    impl RenderSurface for RecordingSurface {
        fn draw(&mut self, texture: TextureHandle, src: Rect, dst: Rect) {
            self.calls.push(DrawCall { texture, src, dst });
        }
    }

    /// Texture source handing out sequential ids.
    #[derive(Default)]
    pub struct FakeTextures {
        pub ids: HashMap<String, TextureHandle>,
    }

    impl TextureSource for FakeTextures {
        fn texture(&mut self, asset: &str) -> TextureHandle {
            let next = TextureHandle::new(self.ids.len() as u32);
            *self.ids.entry(asset.to_string()).or_insert(next)
        }
    }
}
