//! Material definitions

use glam::{Vec3, Vec4};

/// How a material responds to scene lighting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Shading {
    /// Diffuse lighting from the scene's directional light
    #[default]
    Lambert,
    /// Unlit, the base color is written as-is
    Flat,
}

/// Which triangle faces are drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Side {
    #[default]
    Front,
    Back,
    Double,
}

/// Surface appearance of a mesh
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    /// RGB color with opacity in `w`
    pub base_color: Vec4,
    pub shading: Shading,
    pub side: Side,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            base_color: Vec4::ONE,
            shading: Shading::Lambert,
            side: Side::Front,
        }
    }
}

impl Material {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_base_color(mut self, color: Vec4) -> Self {
        self.base_color = color;
        self
    }

    pub fn with_side(mut self, side: Side) -> Self {
        self.side = side;
        self
    }

    pub fn with_shading(mut self, shading: Shading) -> Self {
        self.shading = shading;
        self
    }

    pub fn color(&self) -> Vec3 {
        self.base_color.truncate()
    }

    pub fn opacity(&self) -> f32 {
        self.base_color.w
    }

    pub fn is_transparent(&self) -> bool {
        self.base_color.w < 1.0
    }

    // Preset materials

    /// Lit, possibly translucent material
    pub fn lambert(color: Vec3, opacity: f32) -> Self {
        Self::new("lambert")
            .with_base_color(color.extend(opacity.clamp(0.0, 1.0)))
            .with_shading(Shading::Lambert)
    }

    /// Unlit opaque material used for annotation passes
    pub fn flat(color: Vec3) -> Self {
        Self::new("flat")
            .with_base_color(color.extend(1.0))
            .with_shading(Shading::Flat)
            .with_side(Side::Double)
    }
}

/// Convert a packed `0xRRGGBB` value to linear 0..1 components
pub fn rgb_hex(hex: u32) -> Vec3 {
    Vec3::new(
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    )
}
