//! Display and annotation passes over the same logical scene
//!
//! The annotation manager shares the display camera by reference and holds a
//! parallel object list: index `i` in both lists is the same logical entity.
//! Positions are copied once by [`DualRenderer::sync_annotation_positions`];
//! nothing keeps the two lists in step afterwards.

use rand::Rng;

use crate::backend::{BackendResult, RenderSurface};
use crate::factory::ObjectFactory;
use crate::projection::project;
use crate::resources::{rgb_hex, Material};
use crate::scene_manager::{SceneManager, SnapshotError};
use crate::stream::{FrameCapture, FrameSource, TaggedBBox};
use crate::StreamerConfig;

/// Flat annotation color of `target*` objects
pub const TARGET_ANNOTATION_COLOR: u32 = 0x00ff00;
/// Flat annotation color of every other object
pub const OTHER_ANNOTATION_COLOR: u32 = 0x0000ff;

/// A display scene plus its segmentation-style twin
pub struct DualRenderer {
    display: SceneManager,
    annotation: SceneManager,
}

impl DualRenderer {
    /// Build both managers and their object sets.
    ///
    /// The annotation objects are generated independently, then positioned
    /// and recolored from the display objects.
    pub fn new<R: Rng>(config: &StreamerConfig, rng: &mut R) -> BackendResult<Self> {
        let mut display = SceneManager::new(RenderSurface::new(
            config.display_surface.clone(),
            config.width,
            config.height,
        ))?;
        display.set_objects(ObjectFactory::create_objects(config.object_count, rng));

        let mut annotation = SceneManager::new(RenderSurface::new(
            config.annotation_surface.clone(),
            config.width,
            config.height,
        ))?;
        annotation.set_camera(display.camera());
        annotation.set_objects(ObjectFactory::create_objects(config.object_count, rng));

        let mut renderer = Self {
            display,
            annotation,
        };
        renderer.sync_annotation_positions();
        renderer.apply_annotation_materials();

        log::info!(
            "Dual renderer ready: {} objects per pass at {}x{}",
            renderer.display.objects().len(),
            config.width,
            config.height
        );
        Ok(renderer)
    }

    /// Pair two existing managers without touching their objects
    pub fn from_managers(display: SceneManager, mut annotation: SceneManager) -> Self {
        annotation.set_camera(display.camera());
        Self {
            display,
            annotation,
        }
    }

    pub fn display(&self) -> &SceneManager {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut SceneManager {
        &mut self.display
    }

    pub fn annotation(&self) -> &SceneManager {
        &self.annotation
    }

    pub fn annotation_mut(&mut self) -> &mut SceneManager {
        &mut self.annotation
    }

    /// Copy each display object's position onto its annotation twin.
    ///
    /// Rotation and scale are left alone. Call again after moving display
    /// objects to re-align the passes.
    pub fn sync_annotation_positions(&mut self) {
        let display = self.display.objects();
        let annotation = self.annotation.objects_mut();
        if display.len() != annotation.len() {
            log::warn!(
                "Object lists differ in length ({} display, {} annotation); syncing the common prefix",
                display.len(),
                annotation.len()
            );
        }
        for (source, twin) in display.iter().zip(annotation.iter_mut()) {
            twin.object.transform.position = source.object.transform.position;
        }
    }

    /// Give every annotation mesh the flat color of its display twin's class
    pub fn apply_annotation_materials(&mut self) {
        let display = self.display.objects();
        let annotation = self.annotation.objects_mut();
        for (source, twin) in display.iter().zip(annotation.iter_mut()) {
            let color = if source.is_target() {
                TARGET_ANNOTATION_COLOR
            } else {
                OTHER_ANNOTATION_COLOR
            };
            if !twin.object.replace_material(Material::flat(rgb_hex(color))) {
                log::trace!("Skipping material swap on non-mesh object {:?}", twin.tag);
            }
        }
    }

    /// Render the display pass, then the annotation pass
    pub fn render_frame(&mut self) -> BackendResult<()> {
        self.display.render_frame()?;
        self.annotation.render_frame()?;
        Ok(())
    }
}

impl FrameSource for DualRenderer {
    /// Both snapshots plus one box per display object, in object order
    fn capture(&self) -> Result<FrameCapture, SnapshotError> {
        let image = self.display.snapshot_data_url()?;
        let seg_image = self.annotation.snapshot_data_url()?;
        let camera = self.display.camera();
        let camera = camera.read();
        let bboxes = self
            .display
            .objects()
            .iter()
            .map(|tracked| TaggedBBox {
                bbox: project(&tracked.object, &camera),
                obj_tag: tracked.tag.clone(),
            })
            .collect();
        Ok(FrameCapture {
            image,
            seg_image,
            bboxes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{ObjectKind, SceneObject, TrackedObject};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn config() -> StreamerConfig {
        StreamerConfig {
            width: 40,
            height: 30,
            object_count: 3,
            ..Default::default()
        }
    }

    #[test]
    fn empty_primitives_keep_their_state() {
        let mut display = SceneManager::new(RenderSurface::new("d", 8, 8)).unwrap();
        let mut annotation = SceneManager::new(RenderSurface::new("a", 8, 8)).unwrap();
        display.set_objects(vec![TrackedObject::new("target0", ObjectKind::Sphere, SceneObject::empty())]);
        annotation.set_objects(vec![TrackedObject::new("target0", ObjectKind::Sphere, SceneObject::empty())]);

        let mut renderer = DualRenderer::from_managers(display, annotation);
        renderer.apply_annotation_materials();
        assert!(renderer.annotation().objects()[0].object.primitive.material().is_none());
    }

    #[test]
    fn resync_after_display_motion() {
        let mut renderer = DualRenderer::new(&config(), &mut StdRng::seed_from_u64(11)).unwrap();
        renderer.display_mut().objects_mut()[0]
            .object
            .transform
            .translate(glam::Vec3::X);
        let moved = renderer.display().objects()[0].object.position();
        assert_ne!(renderer.annotation().objects()[0].object.position(), moved);

        renderer.sync_annotation_positions();
        assert_eq!(renderer.annotation().objects()[0].object.position(), moved);
    }
    #[test]
    fn capture_boxes_follow_display_order() {
        let mut renderer = DualRenderer::new(&config(), &mut StdRng::seed_from_u64(5)).unwrap();
        renderer.render_frame().unwrap();
        let capture = renderer.capture().unwrap();

        let tags: Vec<_> = capture.bboxes.iter().map(|b| b.obj_tag.as_str()).collect();
        let expected: Vec<_> = renderer.display().objects().iter().map(|o| o.tag.as_str()).collect();
        assert_eq!(tags, expected);
        assert!(capture.image.starts_with("data:image/png;base64,"));
        assert!(capture.seg_image.starts_with("data:image/png;base64,"));
    }
}
