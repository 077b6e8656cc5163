//! Screen-space bounding boxes of scene objects
//!
//! Boxes are the axis-aligned bound of every projected vertex. They are not
//! clipped against the frustum: geometry behind the camera can yield an
//! inverted or degenerate box, and an object without vertices always yields
//! an inverted one, which callers read as "no coverage".

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::resources::VertexSource;
use crate::scene::{Camera, SceneObject};

/// Bounding box in normalized `[0, 1]` screen coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedBBox {
    pub top_left_x: f32,
    pub top_left_y: f32,
    pub bottom_right_x: f32,
    pub bottom_right_y: f32,
}

impl NormalizedBBox {
    /// `true` when min exceeds max on either axis
    pub fn is_inverted(&self) -> bool {
        self.top_left_x > self.bottom_right_x || self.top_left_y > self.bottom_right_y
    }
}

/// Project an object's geometry through `camera`
pub fn project(object: &SceneObject, camera: &Camera) -> NormalizedBBox {
    project_vertices(object, object.world_matrix(), camera.view_projection_matrix())
}

/// Project any vertex source placed by `world` through `view_projection`
pub fn project_vertices<S>(source: &S, world: Mat4, view_projection: Mat4) -> NormalizedBBox
where
    S: VertexSource + ?Sized,
{
    let clip_from_local = view_projection * world;

    let mut min = Vec3::ONE;
    let mut max = Vec3::NEG_ONE;
    for index in 0..source.vertex_count() {
        let ndc = clip_from_local.project_point3(source.vertex(index));
        min = min.min(ndc);
        max = max.max(ndc);
    }

    NormalizedBBox {
        top_left_x: to_unit(min.x),
        top_left_y: to_unit(min.y),
        bottom_right_x: to_unit(max.x),
        bottom_right_y: to_unit(max.y),
    }
}

#[inline]
fn to_unit(ndc: f32) -> f32 {
    0.5 * (ndc + 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::ObjectFactory;
    use crate::resources::Side;
    use crate::scene::Projection;

    fn camera() -> Camera {
        Camera::new(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO)
            .with_projection(Projection::perspective(45.0, 1.0, 0.1, 100.0))
    }

    #[test]
    fn centered_object_is_inside_unit_square() {
        let sphere = ObjectFactory::sphere(Vec3::ZERO, 1.0, 1.0, 0xffffff, Side::Front);
        let bbox = project(&sphere, &camera());
        assert!(0.0 <= bbox.top_left_x && bbox.top_left_x <= bbox.bottom_right_x);
        assert!(bbox.bottom_right_x <= 1.0);
        assert!(0.0 <= bbox.top_left_y && bbox.top_left_y <= bbox.bottom_right_y);
        assert!(bbox.bottom_right_y <= 1.0);
        assert!((bbox.top_left_x + bbox.bottom_right_x - 1.0).abs() < 1e-4);
    }

    #[test]
    fn empty_object_is_inverted() {
        let bbox = project(&SceneObject::empty(), &camera());
        assert!(bbox.is_inverted());
        assert_eq!(bbox.top_left_x, 1.0);
        assert_eq!(bbox.bottom_right_x, 0.0);
    }

    #[test]
    fn empty_point_list_is_inverted() {
        let points: Vec<Vec3> = Vec::new();
        let bbox = project_vertices(&points, Mat4::IDENTITY, Mat4::IDENTITY);
        assert!(bbox.is_inverted());
    }

    #[test]
    fn identity_projection_remaps_ndc() {
        let points = vec![Vec3::new(-0.5, -1.0, 0.0), Vec3::new(0.5, 0.0, 0.0)];
        let bbox = project_vertices(&points, Mat4::IDENTITY, Mat4::IDENTITY);
        assert_eq!(
            bbox,
            NormalizedBBox {
                top_left_x: 0.25,
                top_left_y: 0.0,
                bottom_right_x: 0.75,
                bottom_right_y: 0.5,
            }
        );
    }

    #[test]
    fn box_shifts_with_object_position() {
        let left = ObjectFactory::sphere(Vec3::new(-2.0, 0.0, 0.0), 0.5, 1.0, 0, Side::Front);
        let right = ObjectFactory::sphere(Vec3::new(2.0, 0.0, 0.0), 0.5, 1.0, 0, Side::Front);
        let cam = camera();
        assert!(project(&left, &cam).bottom_right_x < project(&right, &cam).top_left_x);
    }
}
