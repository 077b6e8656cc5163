//! Scene manager: one renderer, one camera, one clock and a tagged object list

use glam::Vec3;
use image::RgbaImage;

use crate::backend::{BackendResult, RenderBackend, RenderSurface, SoftwareBackend};
use crate::codec::{encode_data_url, CodecError};
use crate::scene::{Camera, Clock, Projection, SharedCamera, TrackedObject};

/// Invoked after every completed frame with that frame's ordinal
pub type FrameCallback = Box<dyn FnMut(u64) + Send>;

/// Timing of a completed frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInfo {
    /// Ordinal of the frame, starting at 1
    pub frame: u64,
    /// Seconds since the manager was created
    pub elapsed: f64,
    /// Seconds since the previous frame
    pub delta: f32,
}

/// Owns the renderer, camera, clock and tracked objects of one scene.
///
/// [`SceneManager::render_frame`] is the per-refresh step of the render loop:
/// it advances the clock, redraws every tracked object and then calls the
/// frame callback.
pub struct SceneManager {
    backend: Box<dyn RenderBackend + Send>,
    camera: SharedCamera,
    clock: Clock,
    objects: Vec<TrackedObject>,
    frame_callback: Option<FrameCallback>,
    frame_count: u64,
}

impl SceneManager {
    /// Create a manager drawing into `surface` with the CPU backend
    pub fn new(surface: RenderSurface) -> BackendResult<Self> {
        let backend = SoftwareBackend::new(surface)?;
        Ok(Self::with_backend(Box::new(backend)))
    }

    /// Create a manager on top of an already constructed backend
    pub fn with_backend(backend: Box<dyn RenderBackend + Send>) -> Self {
        let aspect = backend.surface().aspect();
        let camera = Camera::new(Vec3::new(0.0, 0.0, 20.0), Vec3::ZERO)
            .with_projection(Projection::perspective(45.0, aspect, 0.1, 1000.0));

        Self {
            backend,
            camera: camera.into_shared(),
            clock: Clock::new(),
            objects: Vec::new(),
            frame_callback: None,
            frame_count: 0,
        }
    }

    /// Install the per-frame callback, replacing any previous one
    pub fn set_frame_callback(&mut self, callback: impl FnMut(u64) + Send + 'static) {
        self.frame_callback = Some(Box::new(callback));
    }

    /// Replace the whole tracked object list
    pub fn set_objects(&mut self, objects: Vec<TrackedObject>) {
        log::debug!(
            "Scene {:?}: replacing {} objects with {}",
            self.backend.surface().id,
            self.objects.len(),
            objects.len()
        );
        self.objects = objects;
    }

    pub fn objects(&self) -> &[TrackedObject] {
        &self.objects
    }

    pub fn objects_mut(&mut self) -> &mut [TrackedObject] {
        &mut self.objects
    }

    /// Shared handle to this manager's camera
    pub fn camera(&self) -> SharedCamera {
        SharedCamera::clone(&self.camera)
    }

    /// Adopt another manager's camera so both render the same viewpoint
    pub fn set_camera(&mut self, camera: SharedCamera) {
        self.camera = camera;
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// Advance the clock, draw the scene and notify the frame callback
    pub fn render_frame(&mut self) -> BackendResult<FrameInfo> {
        let delta = self.clock.tick();
        {
            let camera = self.camera.read();
            self.backend.render(&camera, &self.objects)?;
        }
        self.frame_count += 1;

        if let Some(callback) = self.frame_callback.as_mut() {
            callback(self.frame_count);
        }

        Ok(FrameInfo {
            frame: self.frame_count,
            elapsed: self.clock.elapsed_secs(),
            delta,
        })
    }

    /// Pixels of the most recently rendered frame
    pub fn snapshot(&self) -> BackendResult<RgbaImage> {
        self.backend.read_pixels()
    }

    /// Most recently rendered frame as a PNG data URL
    pub fn snapshot_data_url(&self) -> Result<String, SnapshotError> {
        let image = self.snapshot()?;
        Ok(encode_data_url(&image)?)
    }

    /// Tear down the drawable surface; subsequent frames fail
    pub fn detach_surface(&mut self) {
        self.backend.detach();
    }
}

/// Failure to capture a frame as an encoded image
#[derive(thiserror::Error, Debug)]
pub enum SnapshotError {
    #[error(transparent)]
    Backend(#[from] crate::backend::BackendError),
    #[error(transparent)]
    Codec(#[from] CodecError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendError;
    use crate::factory::ObjectFactory;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    fn manager() -> SceneManager {
        SceneManager::new(RenderSurface::new("display", 32, 24)).unwrap()
    }

    #[test]
    fn callback_receives_monotonic_frame_counts() {
        let mut manager = manager();
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        manager.set_frame_callback(move |frame| sink.lock().push(frame));

        for _ in 0..3 {
            manager.render_frame().unwrap();
        }
        assert_eq!(*seen.lock(), vec![1, 2, 3]);
        assert_eq!(manager.frame_count(), 3);
    }

    #[test]
    fn set_objects_is_a_full_swap() {
        let mut manager = manager();
        let mut rng = StdRng::seed_from_u64(5);
        manager.set_objects(ObjectFactory::create_objects(4, &mut rng));
        assert_eq!(manager.objects().len(), 9);
        manager.set_objects(ObjectFactory::create_objects(1, &mut rng));
        assert_eq!(manager.objects().len(), 3);
    }

    #[test]
    fn shared_camera_is_the_same_instance() {
        let display = manager();
        let mut annotation = manager();
        annotation.set_camera(display.camera());
        display.camera().write().set_position(Vec3::new(3.0, 0.0, 9.0));
        assert_eq!(annotation.camera().read().position, Vec3::new(3.0, 0.0, 9.0));
    }

    #[test]
    fn snapshot_is_a_png_data_url() {
        let mut manager = manager();
        manager.render_frame().unwrap();
        let url = manager.snapshot_data_url().unwrap();
        assert!(url.starts_with(crate::codec::PNG_DATA_URL_HEADER));
    }

    #[test]
    fn detached_surface_stops_frames_without_callback() {
        let mut manager = manager();
        let calls = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&calls);
        manager.set_frame_callback(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        manager.detach_surface();
        assert!(matches!(manager.render_frame(), Err(BackendError::SurfaceLost(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
