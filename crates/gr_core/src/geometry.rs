use serde::Deserialize;

/// Pixel-space rectangle: sprite-sheet source regions and final on-screen
/// destinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }
}

/// Rectangle in normalized screen space, where `0.0..=1.0` spans the window
/// on each axis.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct RectF {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl RectF {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// X coordinate of the right edge.
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    /// Y coordinate of the lower edge (y grows downward).
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    /// Vertical midpoint.
    pub fn center_y(&self) -> f32 {
        (self.y + self.bottom()) / 2.0
    }

    /// Scale into pixels for a `screen_w` x `screen_h` surface. Truncates
    /// toward zero.
    pub fn to_pixels(&self, screen_w: u32, screen_h: u32) -> Rect {
        let sw = screen_w as f32;
        let sh = screen_h as f32;
        Rect {
            x: (self.x * sw) as i32,
            y: (self.y * sh) as i32,
            w: (self.w * sw) as i32,
            h: (self.h * sh) as i32,
        }
    }
}
