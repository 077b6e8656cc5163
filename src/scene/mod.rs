//! Scene management

mod camera;
mod clock;
mod transform;

pub use camera::*;
pub use clock::*;
pub use transform::*;

use std::sync::Arc;

use glam::{Mat4, Vec3};

use crate::resources::{Material, Mesh, VertexSource};

/// What a scene node draws
#[derive(Debug, Clone)]
pub enum Primitive {
    /// Triangle mesh drawn with a material
    Mesh { mesh: Arc<Mesh>, material: Material },
    /// Transform-only node without geometry
    Empty,
}

impl Primitive {
    pub fn material(&self) -> Option<&Material> {
        match self {
            Primitive::Mesh { material, .. } => Some(material),
            Primitive::Empty => None,
        }
    }
}

impl VertexSource for Primitive {
    fn vertex_count(&self) -> usize {
        match self {
            Primitive::Mesh { mesh, .. } => mesh.vertex_count(),
            Primitive::Empty => 0,
        }
    }

    fn vertex(&self, index: usize) -> Vec3 {
        match self {
            Primitive::Mesh { mesh, .. } => mesh.vertex(index),
            Primitive::Empty => Vec3::ZERO,
        }
    }
}

/// A renderable node in the scene
#[derive(Debug, Clone)]
pub struct SceneObject {
    pub transform: Transform,
    pub primitive: Primitive,
}

impl SceneObject {
    pub fn mesh(mesh: Arc<Mesh>, material: Material) -> Self {
        Self {
            transform: Transform::default(),
            primitive: Primitive::Mesh { mesh, material },
        }
    }

    pub fn empty() -> Self {
        Self {
            transform: Transform::default(),
            primitive: Primitive::Empty,
        }
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.transform.position = position;
        self
    }

    pub fn position(&self) -> Vec3 {
        self.transform.position
    }

    pub fn world_matrix(&self) -> Mat4 {
        self.transform.matrix()
    }

    /// Replace the material of a mesh node.
    ///
    /// Returns `false` and leaves the node untouched for non-mesh primitives.
    pub fn replace_material(&mut self, new_material: Material) -> bool {
        match &mut self.primitive {
            Primitive::Mesh { material, .. } => {
                *material = new_material;
                true
            }
            Primitive::Empty => false,
        }
    }
}

impl VertexSource for SceneObject {
    fn vertex_count(&self) -> usize {
        self.primitive.vertex_count()
    }

    fn vertex(&self, index: usize) -> Vec3 {
        self.primitive.vertex(index)
    }
}

/// Geometric kind of a tracked object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Sphere,
    Box,
    Plane,
}

/// A scene object carrying a semantic tag.
///
/// The tag prefix (`target`, `non_target`, `bg`) classifies the object for
/// annotation coloring and bounding box reporting.
#[derive(Debug, Clone)]
pub struct TrackedObject {
    pub tag: String,
    pub kind: ObjectKind,
    pub object: SceneObject,
}

impl TrackedObject {
    pub fn new(tag: impl Into<String>, kind: ObjectKind, object: SceneObject) -> Self {
        Self {
            tag: tag.into(),
            kind,
            object,
        }
    }

    pub fn is_target(&self) -> bool {
        self.tag.starts_with(crate::factory::TARGET_TAG)
    }
}
