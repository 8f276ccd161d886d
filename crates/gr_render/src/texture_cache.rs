//! Asset id to GPU texture, memoized for the life of the process.
//!
//! A texture that cannot be read or decoded is replaced by a solid-color
//! placeholder (tinted per asset id) so the game keeps running with visible
//! stand-ins instead of invisible entities.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use gr_core::render::{TextureHandle, TextureSource};
use image::{Rgba, RgbaImage};

use crate::sprite_pipeline::SpritePipeline;
use crate::texture::{decode_rgba, Texture};

const FALLBACK_SIZE: u32 = 16;

pub struct GpuTexture {
    pub texture: Texture,
    pub bind_group: wgpu::BindGroup,
}

pub struct TextureCache {
    root: PathBuf,
    textures: Vec<GpuTexture>,
    by_asset: HashMap<String, TextureHandle>,
    fallback_count: usize,
}

impl TextureCache {
    /// Asset ids are resolved relative to `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            textures: Vec::new(),
            by_asset: HashMap::new(),
            fallback_count: 0,
        }
    }

    /// Borrow the GPU handles needed to satisfy [`TextureSource`] lookups.
    pub fn loader<'a>(
        &'a mut self,
        device: &'a wgpu::Device,
        queue: &'a wgpu::Queue,
        pipeline: &'a SpritePipeline,
    ) -> TextureLoader<'a> {
        TextureLoader {
            cache: self,
            device,
            queue,
            pipeline,
        }
    }

    pub fn get(&self, handle: TextureHandle) -> Option<&GpuTexture> {
        self.textures.get(handle.id() as usize)
    }

    pub fn size(&self, handle: TextureHandle) -> Option<(u32, u32)> {
        self.get(handle).map(|t| t.texture.size)
    }

    pub fn handle(&self, asset: &str) -> Option<TextureHandle> {
        self.by_asset.get(asset).copied()
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    /// How many cached entries are placeholders.
    pub fn fallback_count(&self) -> usize {
        self.fallback_count
    }

    pub fn memory_bytes(&self) -> usize {
        self.textures.iter().map(|t| t.texture.byte_size()).sum()
    }

    fn resolve(&self, asset: &str) -> PathBuf {
        self.root.join(asset)
    }
}

/// [`TextureSource`] view of a [`TextureCache`] with the GPU context attached.
pub struct TextureLoader<'a> {
    cache: &'a mut TextureCache,
    device: &'a wgpu::Device,
    queue: &'a wgpu::Queue,
    pipeline: &'a SpritePipeline,
}

impl TextureSource for TextureLoader<'_> {
    fn texture(&mut self, asset: &str) -> TextureHandle {
        if let Some(handle) = self.cache.handle(asset) {
            return handle;
        }

        let path = self.cache.resolve(asset);
        let image = match load_rgba(&path) {
            Ok(image) => {
                log::info!(
                    "Loaded texture '{}' ({}x{})",
                    asset,
                    image.width(),
                    image.height()
                );
                image
            }
            Err(err) => {
                log::warn!("{err}. Falling back to placeholder for '{asset}'.");
                self.cache.fallback_count += 1;
                fallback_image(asset)
            }
        };

        let texture = Texture::from_image(self.device, self.queue, &image, asset);
        let bind_group = self
            .pipeline
            .create_texture_bind_group(self.device, &texture);

        let handle = TextureHandle::new(self.cache.textures.len() as u32);
        self.cache.textures.push(GpuTexture {
            texture,
            bind_group,
        });
        self.cache.by_asset.insert(asset.to_string(), handle);
        handle
    }
}

/// Read and decode an image file.
pub fn load_rgba(path: &Path) -> Result<RgbaImage, String> {
    let bytes = std::fs::read(path)
        .map_err(|e| format!("Failed to read texture {}: {e}", path.display()))?;
    decode_rgba(&bytes).map_err(|e| format!("Failed to load texture {}: {e}", path.display()))
}

/// Opaque solid-color placeholder. The color is derived from `asset` so
/// different missing textures stay distinguishable.
pub fn fallback_image(asset: &str) -> RgbaImage {
    let hash = fnv1a(asset.as_bytes());
    let [r, g, b, _] = hash.to_le_bytes();
    // Keep it away from black so it reads against the clear color.
    let lift = |c: u8| 64 + c / 2;
    RgbaImage::from_pixel(
        FALLBACK_SIZE,
        FALLBACK_SIZE,
        Rgba([lift(r), lift(g), lift(b), 255]),
    )
}

fn fnv1a(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0x811c_9dc5u32, |hash, &byte| {
        (hash ^ u32::from(byte)).wrapping_mul(0x0100_0193)
    })
}
