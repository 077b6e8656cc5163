//! Resource management
//!
//! Mesh geometry and material definitions shared by scene objects.

mod material;
mod mesh;

pub use material::*;
pub use mesh::*;
