use glam::{Mat4, Vec2, Vec3};

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

/// Fixed orthographic projection from window pixels (origin top-left, y
/// down) to clip space. Sprites are emitted directly in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenProjection {
    pub width: u32,
    pub height: u32,
}

impl ScreenProjection {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::orthographic_rh(
            0.0,
            self.width.max(1) as f32,
            self.height.max(1) as f32,
            0.0,
            -1.0,
            1.0,
        )
    }

    pub fn build_uniform(&self) -> CameraUniform {
        CameraUniform {
            view_proj: self.matrix().to_cols_array_2d(),
        }
    }

    /// Clip-space x/y of a pixel position.
    pub fn to_clip(&self, pixel: Vec2) -> Vec2 {
        self.matrix().project_point3(Vec3::new(pixel.x, pixel.y, 0.0)).truncate()
    }
}
