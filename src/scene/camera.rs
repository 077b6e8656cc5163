//! Scene camera

use std::sync::Arc;

use glam::{Mat4, Vec3};
use parking_lot::RwLock;

/// Camera shared by reference between scene managers.
///
/// Two managers holding clones of the same `SharedCamera` always render from
/// an identical viewpoint.
pub type SharedCamera = Arc<RwLock<Camera>>;

/// Right-handed perspective frustum with depth mapped to `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Vertical field of view in radians
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Projection {
    fn default() -> Self {
        Self::perspective(45.0, 1.0, 0.1, 1000.0)
    }
}

impl Projection {
    pub fn perspective(fov_y_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            fov_y: fov_y_degrees.to_radians(),
            aspect,
            near,
            far,
        }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }
}

/// Eye position and look-at target of a scene
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub projection: Projection,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, 0.0, 20.0), Vec3::ZERO)
    }
}

impl Camera {
    pub fn new(position: Vec3, target: Vec3) -> Self {
        Self {
            position,
            target,
            up: Vec3::Y,
            projection: Projection::default(),
        }
    }

    pub fn with_projection(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }

    /// Wrap the camera so it can be shared between scene managers
    pub fn into_shared(self) -> SharedCamera {
        Arc::new(RwLock::new(self))
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// World to clip space
    pub fn view_projection_matrix(&self) -> Mat4 {
        let view = Mat4::look_at_rh(self.position, self.target, self.up);
        self.projection.matrix() * view
    }
}
