//! Core backend abstraction traits
//!
//! These traits define the interface a scene manager renders through.

use image::RgbaImage;
use thiserror::Error;

use crate::backend::types::RenderSurface;
use crate::scene::{Camera, TrackedObject};

/// Backend error type
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Surface {0:?} lost")]
    SurfaceLost(String),
    #[error("Invalid surface dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("Failed to read back surface {0:?}")]
    ReadbackFailed(String),
}

pub type BackendResult<T> = Result<T, BackendError>;

/// A renderer that draws tracked objects into a drawable surface
pub trait RenderBackend {
    /// The surface this backend draws into
    fn surface(&self) -> &RenderSurface;

    /// Draw one frame of `objects` as seen from `camera`
    fn render(&mut self, camera: &Camera, objects: &[TrackedObject]) -> BackendResult<()>;

    /// Copy out the most recently rendered frame
    fn read_pixels(&self) -> BackendResult<RgbaImage>;

    /// Tear the surface down; later renders fail with [`BackendError::SurfaceLost`]
    fn detach(&mut self);
}
