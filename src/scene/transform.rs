//! Transform for positioning objects in 3D space

use glam::{Mat4, Quat, Vec3};

/// Position, rotation and scale of a scene object
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Local to world: scale, then rotate, then translate
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    pub fn translate(&mut self, offset: Vec3) {
        self.position += offset;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn identity_matrix() {
        assert_eq!(Transform::default().matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn matrix_applies_scale_then_translation() {
        let t = Transform {
            position: Vec3::new(1.0, 2.0, 3.0),
            scale: Vec3::splat(2.0),
            ..Default::default()
        };
        let p = t.matrix().transform_point3(Vec3::ONE);
        assert!((p - Vec3::new(3.0, 4.0, 5.0)).length() < 1e-5);
    }

    #[test]
    fn rotation_turns_x_into_y() {
        let t = Transform {
            rotation: Quat::from_rotation_z(FRAC_PI_2),
            ..Default::default()
        };
        let p = t.matrix().transform_point3(Vec3::X);
        assert!((p - Vec3::Y).length() < 1e-5);
    }

    #[test]
    fn translate_accumulates() {
        let mut t = Transform::default();
        t.translate(Vec3::X);
        t.translate(Vec3::Y);
        assert_eq!(t.position, Vec3::new(1.0, 1.0, 0.0));
    }
}
