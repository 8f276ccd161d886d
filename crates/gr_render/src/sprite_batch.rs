//! Batched [`RenderSurface`]: queue sprites during a frame, then build one
//! vertex/index mesh and issue one `draw_indexed` per run of same-texture
//! quads.

use gr_core::geometry::Rect;
use gr_core::render::{RenderSurface, TextureHandle};
use wgpu::util::DeviceExt;

use crate::camera::ScreenProjection;
use crate::sprite_pipeline::{SpritePipeline, SpriteVertex};
use crate::texture_cache::TextureCache;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueuedSprite {
    pub texture: TextureHandle,
    pub src: Rect,
    pub dst: Rect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawCall {
    pub texture: TextureHandle,
    pub index_start: u32,
    pub index_count: u32,
}

pub struct SpriteBatch {
    queued: Vec<QueuedSprite>,
    vertices: Vec<SpriteVertex>,
    indices: Vec<u32>,
    draw_calls: Vec<DrawCall>,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    vertex_capacity: usize,
    index_capacity: usize,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    projection: ScreenProjection,
}

impl RenderSurface for SpriteBatch {
    fn draw(&mut self, texture: TextureHandle, src: Rect, dst: Rect) {
        self.queued.push(QueuedSprite { texture, src, dst });
    }
}

impl SpriteBatch {
    pub fn new(
        device: &wgpu::Device,
        pipeline: &SpritePipeline,
        projection: ScreenProjection,
    ) -> Self {
        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[projection.build_uniform()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let camera_bind_group = pipeline.create_camera_bind_group(device, &camera_buffer);

        // Room for a handful of sprites; grows on demand.
        let vertex_capacity = 64;
        let index_capacity = 96;
        Self {
            queued: Vec::new(),
            vertices: Vec::new(),
            indices: Vec::new(),
            draw_calls: Vec::new(),
            vertex_buffer: create_vertex_buffer(device, vertex_capacity),
            index_buffer: create_index_buffer(device, index_capacity),
            vertex_capacity,
            index_capacity,
            camera_buffer,
            camera_bind_group,
            projection,
        }
    }

    pub fn set_projection(&mut self, queue: &wgpu::Queue, projection: ScreenProjection) {
        self.projection = projection;
        queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::cast_slice(&[projection.build_uniform()]),
        );
    }

    /// Sprites drawn by the last `render`.
    pub fn sprite_count(&self) -> usize {
        self.vertices.len() / 4
    }

    /// Draw calls issued by the last `render`.
    pub fn draw_call_count(&self) -> usize {
        self.draw_calls.len()
    }

    pub fn buffer_bytes(&self) -> usize {
        self.vertex_capacity * std::mem::size_of::<SpriteVertex>()
            + self.index_capacity * std::mem::size_of::<u32>()
    }

    /// Upload everything queued since the last call, draw it over a cleared
    /// `view`, and empty the queue.
    #[allow(clippy::too_many_arguments)]
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        pipeline: &SpritePipeline,
        textures: &TextureCache,
        clear: wgpu::Color,
    ) {
        build_mesh(
            &self.queued,
            |handle| textures.size(handle),
            &mut self.vertices,
            &mut self.indices,
            &mut self.draw_calls,
        );
        self.queued.clear();

        self.ensure_capacity(device, self.vertices.len(), self.indices.len());
        if !self.vertices.is_empty() {
            queue.write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&self.vertices));
            queue.write_buffer(&self.index_buffer, 0, bytemuck::cast_slice(&self.indices));
        }

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Sprite Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            ..Default::default()
        });

        if self.draw_calls.is_empty() {
            return;
        }

        render_pass.set_pipeline(&pipeline.render_pipeline);
        render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);

        for draw in &self.draw_calls {
            if let Some(texture) = textures.get(draw.texture) {
                render_pass.set_bind_group(1, &texture.bind_group, &[]);
                render_pass.draw_indexed(
                    draw.index_start..(draw.index_start + draw.index_count),
                    0,
                    0..1,
                );
            }
        }
    }

    fn ensure_capacity(&mut self, device: &wgpu::Device, vertex_count: usize, index_count: usize) {
        if vertex_count > self.vertex_capacity {
            self.vertex_capacity = vertex_count.next_power_of_two();
            self.vertex_buffer = create_vertex_buffer(device, self.vertex_capacity);
            log::debug!("Sprite vertex buffer grown to {}", self.vertex_capacity);
        }
        if index_count > self.index_capacity {
            self.index_capacity = index_count.next_power_of_two();
            self.index_buffer = create_index_buffer(device, self.index_capacity);
            log::debug!("Sprite index buffer grown to {}", self.index_capacity);
        }
    }
}

/// Turn queued sprites into quads. Sprites whose texture size is unknown are
/// skipped.
pub fn build_mesh(
    sprites: &[QueuedSprite],
    size_of: impl Fn(TextureHandle) -> Option<(u32, u32)>,
    vertices: &mut Vec<SpriteVertex>,
    indices: &mut Vec<u32>,
    draw_calls: &mut Vec<DrawCall>,
) {
    vertices.clear();
    indices.clear();
    draw_calls.clear();

    for sprite in sprites {
        let Some((tex_w, tex_h)) = size_of(sprite.texture) else {
            log::trace!("Skipping sprite with unknown texture {:?}", sprite.texture);
            continue;
        };
        add_quad(vertices, indices, draw_calls, sprite, tex_w, tex_h);
    }
}

fn add_quad(
    vertices: &mut Vec<SpriteVertex>,
    indices: &mut Vec<u32>,
    draw_calls: &mut Vec<DrawCall>,
    sprite: &QueuedSprite,
    tex_w: u32,
    tex_h: u32,
) {
    let (u0, v0, u1, v1) = source_uvs(sprite.src, tex_w, tex_h);
    let x0 = sprite.dst.x as f32;
    let y0 = sprite.dst.y as f32;
    let x1 = (sprite.dst.x + sprite.dst.w) as f32;
    let y1 = (sprite.dst.y + sprite.dst.h) as f32;
    let base_index = vertices.len() as u32;

    vertices.push(SpriteVertex {
        position: [x0, y0],
        tex_coords: [u0, v0],
    });
    vertices.push(SpriteVertex {
        position: [x1, y0],
        tex_coords: [u1, v0],
    });
    vertices.push(SpriteVertex {
        position: [x1, y1],
        tex_coords: [u1, v1],
    });
    vertices.push(SpriteVertex {
        position: [x0, y1],
        tex_coords: [u0, v1],
    });

    let draw_start = indices.len() as u32;
    indices.extend_from_slice(&[
        base_index,
        base_index + 1,
        base_index + 2,
        base_index,
        base_index + 2,
        base_index + 3,
    ]);

    push_draw_call(draw_calls, sprite.texture, draw_start, 6);
}

/// Pixel source rect to normalized texture coordinates (origin top-left).
fn source_uvs(src: Rect, tex_w: u32, tex_h: u32) -> (f32, f32, f32, f32) {
    let w = tex_w.max(1) as f32;
    let h = tex_h.max(1) as f32;
    (
        src.x as f32 / w,
        src.y as f32 / h,
        (src.x + src.w) as f32 / w,
        (src.y + src.h) as f32 / h,
    )
}

/// Append a draw call, merging with the previous one when the texture matches
/// and indices are contiguous. Entities draw in a fixed order, so
/// consecutive sprites sharing a sheet collapse into one `draw_indexed`.
fn push_draw_call(
    draw_calls: &mut Vec<DrawCall>,
    texture: TextureHandle,
    index_start: u32,
    index_count: u32,
) {
    if let Some(last) = draw_calls.last_mut() {
        let contiguous = last.index_start + last.index_count == index_start;
        if last.texture == texture && contiguous {
            last.index_count += index_count;
            return;
        }
    }
    draw_calls.push(DrawCall {
        texture,
        index_start,
        index_count,
    });
}

fn create_vertex_buffer(device: &wgpu::Device, vertex_capacity: usize) -> wgpu::Buffer {
    let byte_len = (vertex_capacity * std::mem::size_of::<SpriteVertex>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Sprite Vertex Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_index_buffer(device: &wgpu::Device, index_capacity: usize) -> wgpu::Buffer {
    let byte_len = (index_capacity * std::mem::size_of::<u32>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Sprite Index Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}
