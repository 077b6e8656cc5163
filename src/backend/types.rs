//! Common types shared between backends

/// A drawable target addressed by a stable external identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RenderSurface {
    pub id: String,
    pub width: u32,
    pub height: u32,
}

impl RenderSurface {
    pub fn new(id: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            id: id.into(),
            width,
            height,
        }
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}
