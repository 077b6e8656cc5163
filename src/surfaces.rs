//! Output surfaces that reply images are painted onto

use std::collections::HashMap;

use image::{imageops, RgbaImage};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SurfaceError {
    #[error("no output surface named {0:?}")]
    Unknown(String),
}

/// Named RGBA canvases, painted from their top-left corner
#[derive(Debug, Default)]
pub struct OutputSurfaces {
    canvases: HashMap<String, RgbaImage>,
}

impl OutputSurfaces {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create (or clear) a transparent canvas
    pub fn register(&mut self, id: impl Into<String>, width: u32, height: u32) {
        self.canvases.insert(id.into(), RgbaImage::new(width, height));
    }

    pub fn get(&self, id: &str) -> Option<&RgbaImage> {
        self.canvases.get(id)
    }

    /// Composite `image` over the canvas at (0, 0); parts outside the canvas are cut off
    pub fn paint(&mut self, id: &str, image: &RgbaImage) -> Result<(), SurfaceError> {
        let canvas = self
            .canvases
            .get_mut(id)
            .ok_or_else(|| SurfaceError::Unknown(id.to_owned()))?;
        imageops::overlay(canvas, image, 0, 0);
        log::trace!("Painted {}x{} image on {id:?}", image.width(), image.height());
        Ok(())
    }
}
