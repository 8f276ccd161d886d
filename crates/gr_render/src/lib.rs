//! wgpu backend for the Gunrun core: window surface, sprite pipeline, texture
//! cache and the batched [`gr_core::render::RenderSurface`] implementation.

pub mod camera;
pub mod gpu_context;
pub mod sprite_batch;
pub mod sprite_pipeline;
pub mod texture;
pub mod texture_cache;

pub use camera::{CameraUniform, ScreenProjection};
pub use gpu_context::GpuContext;
pub use sprite_batch::SpriteBatch;
pub use sprite_pipeline::{SpritePipeline, SpriteVertex};
pub use texture::Texture;
pub use texture_cache::{GpuTexture, TextureCache};
