//! Procedural builders for the tracked scene content

use std::sync::Arc;

use glam::Vec3;
use rand::Rng;

use crate::resources::{rgb_hex, Material, Mesh, Side};
use crate::scene::{ObjectKind, SceneObject, TrackedObject};

/// Tag prefix of the objects the remote processor should detect
pub const TARGET_TAG: &str = "target";
/// Tag prefix of distractor objects
pub const NON_TARGET_TAG: &str = "non_target";
/// Tag of the background plane
pub const BACKGROUND_TAG: &str = "bg";

/// Radius constant of the placement volume
pub const XYZ_MAX: f32 = 7.0;

const SPHERE_RADIUS: f32 = 0.5;
const SPHERE_OPACITY: f32 = 0.8;
const SPHERE_COLOR: u32 = 0xff0077;

const BOX_SIZE: Vec3 = Vec3::new(0.8, 0.6, 0.5);
const BOX_OPACITY: f32 = 0.8;
const BOX_COLOR: u32 = 0x55ff11;

const BACKGROUND_DISTANCE: f32 = 10.0;
const BACKGROUND_SIZE: f32 = 50.0;
const BACKGROUND_OPACITY: f32 = 0.5;
const BACKGROUND_COLOR: u32 = 0xffffff;

/// Stateless builders for tagged primitives
pub struct ObjectFactory;

impl ObjectFactory {
    pub fn sphere(position: Vec3, radius: f32, opacity: f32, color: u32, side: Side) -> SceneObject {
        let material = Material::lambert(rgb_hex(color), opacity).with_side(side);
        SceneObject::mesh(Arc::new(Mesh::sphere(radius, 24, 12)), material).with_position(position)
    }

    pub fn cuboid(position: Vec3, size: Vec3, opacity: f32, color: u32, side: Side) -> SceneObject {
        let material = Material::lambert(rgb_hex(color), opacity).with_side(side);
        SceneObject::mesh(Arc::new(Mesh::cuboid(size.x, size.y, size.z)), material)
            .with_position(position)
    }

    /// Square backdrop `distance` units behind the origin, facing +Z
    pub fn background_plane(distance: f32, size: f32, color: u32, opacity: f32) -> SceneObject {
        let material = Material::lambert(rgb_hex(color), opacity).with_side(Side::Double);
        SceneObject::mesh(Arc::new(Mesh::plane(size, size, 1)), material)
            .with_position(Vec3::new(0.0, 0.0, -distance))
    }

    /// Uniform random position inside the placement cube
    pub fn random_position<R: Rng>(rng: &mut R) -> Vec3 {
        let half_extent = XYZ_MAX - 1.0;
        let mut axis = || 2.0 * half_extent * (rng.gen::<f32>() - 0.5);
        Vec3::new(axis(), axis(), axis())
    }

    /// Build `n` targets, `n` distractors and one background, in that order
    pub fn create_objects<R: Rng>(n: usize, rng: &mut R) -> Vec<TrackedObject> {
        let mut objects = Vec::with_capacity(2 * n + 1);

        for idx in 0..n {
            let position = Self::random_position(rng);
            objects.push(TrackedObject::new(
                format!("{TARGET_TAG}{idx}"),
                ObjectKind::Sphere,
                Self::sphere(position, SPHERE_RADIUS, SPHERE_OPACITY, SPHERE_COLOR, Side::Front),
            ));
        }

        for idx in 0..n {
            let position = Self::random_position(rng);
            objects.push(TrackedObject::new(
                format!("{NON_TARGET_TAG}{idx}"),
                ObjectKind::Box,
                Self::cuboid(position, BOX_SIZE, BOX_OPACITY, BOX_COLOR, Side::Front),
            ));
        }

        objects.push(TrackedObject::new(
            BACKGROUND_TAG,
            ObjectKind::Plane,
            Self::background_plane(
                BACKGROUND_DISTANCE,
                BACKGROUND_SIZE,
                BACKGROUND_COLOR,
                BACKGROUND_OPACITY,
            ),
        ));

        log::debug!("Created {} scene objects", objects.len());
        objects
    }
}
