//! Scene Streamer - renders a 3D scene twice and streams both frames to an image processor
//!
//! Every frame the same randomly populated scene is drawn by two passes:
//! - **display**: translucent, Lambert-shaded spheres and boxes in front of a background plane
//! - **annotation**: the same objects in flat class colors (green targets, blue others)
//!
//! Both renders, plus a screen-space bounding box for every object, are sent as
//! JSON over a WebSocket at most every 0.2 seconds. Images coming back are
//! decoded off-thread and painted onto two output surfaces.
//!
//! # Modules
//! - [`scene`] - transforms, cameras, clocks and tracked objects
//! - [`resources`] - meshes and materials
//! - [`backend`] - render surfaces and the CPU rasterizer
//! - [`factory`] - object generation
//! - [`projection`] - normalized screen-space bounding boxes
//! - [`scene_manager`] / [`dual_render`] - render loop step and the two coordinated passes
//! - [`stream`] - wire messages, transport, session and reply decoding
//! - [`app`] - the loop that drives all of the above

use serde::{Deserialize, Serialize};

pub mod app;
pub mod backend;
pub mod codec;
pub mod dual_render;
pub mod factory;
pub mod projection;
pub mod resources;
pub mod scene;
pub mod scene_manager;
pub mod stream;
pub mod surfaces;

pub use app::{App, AppError, AppEvent, LoopStats, Pass};
pub use dual_render::DualRenderer;
pub use factory::ObjectFactory;
pub use projection::{project, NormalizedBBox};
pub use scene_manager::{FrameInfo, SceneManager};
pub use stream::{StreamingSession, WsConnector};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Configuration for the streamer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamerConfig {
    /// Width of both render surfaces
    pub width: u32,
    /// Height of both render surfaces
    pub height: u32,
    /// Objects generated per class (spheres and boxes)
    pub object_count: usize,
    /// WebSocket URL of the image processor
    pub endpoint: String,
    /// Minimum seconds between two sent frames
    pub send_interval_secs: f64,
    /// Render loop rate
    pub target_fps: u32,
    /// Stop after this many frames (`None` runs until the process exits)
    pub max_frames: Option<u64>,
    /// Seed for object placement; random when unset
    pub seed: Option<u64>,
    /// Connect as soon as the app starts
    pub auto_connect: bool,
    pub display_surface: String,
    pub annotation_surface: String,
    /// Surface painted with the processed display image
    pub display_reply_surface: String,
    /// Surface painted with the processed annotation image
    pub annotation_reply_surface: String,
}

impl Default for StreamerConfig {
    fn default() -> Self {
        Self {
            width: 700,
            height: 500,
            object_count: 25,
            endpoint: "ws://127.0.0.1:8000/image_process".to_string(),
            send_interval_secs: 0.2,
            target_fps: 60,
            max_frames: None,
            seed: None,
            auto_connect: true,
            display_surface: "main_canvas".to_string(),
            annotation_surface: "seg_canvas".to_string(),
            display_reply_surface: "rcv_image_canvas".to_string(),
            annotation_reply_surface: "rcv_image_canvas2".to_string(),
        }
    }
}

impl StreamerConfig {
    /// Load a config from JSON; missing fields take their defaults
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_config_uses_defaults() {
        let config = StreamerConfig::from_json(r#"{"object_count": 3, "seed": 9}"#).unwrap();
        assert_eq!(config.object_count, 3);
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.width, 700);
        assert_eq!(config.endpoint, "ws://127.0.0.1:8000/image_process");
    }
}
