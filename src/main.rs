//! Scene Streamer binary
//!
//! Renders the dual-pass scene and streams it to the configured endpoint.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use env_logger::Env;

use scene_streamer::{App, StreamerConfig, WsConnector, VERSION};

/// Stream rendered frames and annotation masks to an image processor.
#[derive(Parser, Debug)]
#[command(name = "scene-streamer", version, about)]
struct Args {
    /// JSON config file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// WebSocket endpoint of the image processor
    #[arg(long)]
    endpoint: Option<String>,

    /// Render surface width
    #[arg(long)]
    width: Option<u32>,

    /// Render surface height
    #[arg(long)]
    height: Option<u32>,

    /// Objects per class
    #[arg(long)]
    objects: Option<usize>,

    /// Minimum seconds between sent frames
    #[arg(long)]
    send_interval: Option<f64>,

    /// Render loop rate
    #[arg(long)]
    fps: Option<u32>,

    /// Exit after this many frames
    #[arg(long)]
    max_frames: Option<u64>,

    /// Seed for object placement
    #[arg(long)]
    seed: Option<u64>,

    /// Do not connect on startup
    #[arg(long)]
    no_connect: bool,
}

impl Args {
    fn into_config(self) -> Result<StreamerConfig, String> {
        let mut config = match &self.config {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
                StreamerConfig::from_json(&text)
                    .map_err(|e| format!("invalid config {}: {e}", path.display()))?
            }
            None => StreamerConfig::default(),
        };

        if let Some(endpoint) = self.endpoint {
            config.endpoint = endpoint;
        }
        if let Some(width) = self.width {
            config.width = width;
        }
        if let Some(height) = self.height {
            config.height = height;
        }
        if let Some(objects) = self.objects {
            config.object_count = objects;
        }
        if let Some(interval) = self.send_interval {
            config.send_interval_secs = interval;
        }
        if let Some(fps) = self.fps {
            config.target_fps = fps;
        }
        if self.max_frames.is_some() {
            config.max_frames = self.max_frames;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if self.no_connect {
            config.auto_connect = false;
        }
        Ok(config)
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    log::info!("Scene Streamer v{VERSION}");

    let config = match Args::parse().into_config() {
        Ok(config) => config,
        Err(message) => {
            log::error!("{message}");
            return ExitCode::FAILURE;
        }
    };

    let mut app = match App::new(config, Box::new(WsConnector)) {
        Ok(app) => app,
        Err(error) => {
            log::error!("Failed to start: {error}");
            return ExitCode::FAILURE;
        }
    };

    if app.config().auto_connect && app.connect().is_err() {
        log::warn!("Continuing without a connection");
    }

    let result = app.run();
    app.close();

    match result {
        Ok(stats) => {
            log::info!(
                "Finished: {} frames rendered, {} sent, {} replies painted over {} connection attempts",
                stats.frames,
                stats.frames_sent,
                stats.paints,
                app.session().connection_attempts()
            );
            ExitCode::SUCCESS
        }
        Err(error) => {
            log::error!("Render loop stopped: {error}");
            ExitCode::FAILURE
        }
    }
}
