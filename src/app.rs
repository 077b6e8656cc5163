//! Application loop tying the renderers, the session and the output surfaces together.
//!
//! Everything runs on the loop thread. Frame callbacks, socket callbacks and
//! decode workers only push [`AppEvent`]s onto a single queue which the loop
//! drains after every render, so frame handling, reply handling and paint
//! completions never interleave mid-update.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;

use crate::backend::BackendError;
use crate::dual_render::DualRenderer;
use crate::stream::{
    AttemptId, Connector, DecodedReply, FrameOutcome, ReplyDecoder, SessionError, SocketEvent,
    StreamingSession,
};
use crate::surfaces::OutputSurfaces;
use crate::StreamerConfig;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("render failure: {0}")]
    Backend(#[from] BackendError),
    #[error("streaming failure: {0}")]
    Session(#[from] SessionError),
}

/// Which of the two render passes finished a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    Display,
    Annotation,
}

/// Work item for the loop thread
#[derive(Debug)]
pub enum AppEvent {
    FrameRendered { pass: Pass, frame: u64 },
    Socket { attempt: AttemptId, event: SocketEvent },
    Decoded(DecodedReply),
}

/// Counters reported when the loop exits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub frames: u64,
    pub frames_sent: u64,
    pub paints: u64,
    pub discarded_paints: u64,
}

pub struct App {
    config: StreamerConfig,
    renderer: DualRenderer,
    session: StreamingSession,
    outputs: OutputSurfaces,
    decoder: ReplyDecoder,
    events_rx: Receiver<AppEvent>,
    stats: LoopStats,
}

impl App {
    /// Build the scenes, the session and the output surfaces.
    ///
    /// Scene randomness comes from `config.seed` when set.
    pub fn new(config: StreamerConfig, connector: Box<dyn Connector>) -> Result<Self, AppError> {
        let (events_tx, events_rx) = mpsc::channel();

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut renderer = DualRenderer::new(&config, &mut rng)?;
        renderer
            .display_mut()
            .set_frame_callback(frame_forwarder(events_tx.clone(), Pass::Display));
        renderer
            .annotation_mut()
            .set_frame_callback(frame_forwarder(events_tx.clone(), Pass::Annotation));

        let socket_tx = events_tx.clone();
        let session = StreamingSession::new(
            &config,
            connector,
            Arc::new(move |attempt, event| {
                let _ = socket_tx.send(AppEvent::Socket { attempt, event });
            }),
        );

        let decode_tx = events_tx;
        let decoder = ReplyDecoder::new(Arc::new(move |reply| {
            let _ = decode_tx.send(AppEvent::Decoded(reply));
        }));

        let mut outputs = OutputSurfaces::new();
        outputs.register(config.display_reply_surface.clone(), config.width, config.height);
        outputs.register(config.annotation_reply_surface.clone(), config.width, config.height);

        Ok(Self {
            config,
            renderer,
            session,
            outputs,
            decoder,
            events_rx,
            stats: LoopStats::default(),
        })
    }

    pub fn config(&self) -> &StreamerConfig {
        &self.config
    }

    pub fn renderer(&self) -> &DualRenderer {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut DualRenderer {
        &mut self.renderer
    }

    pub fn session(&self) -> &StreamingSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut StreamingSession {
        &mut self.session
    }

    pub fn outputs(&self) -> &OutputSurfaces {
        &self.outputs
    }

    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    pub fn connect(&mut self) -> Result<AttemptId, SessionError> {
        self.session.connect()
    }

    pub fn close(&mut self) {
        self.session.close();
    }

    /// Render both passes once, then handle every queued event
    pub fn step(&mut self) -> Result<(), AppError> {
        self.renderer.render_frame()?;
        self.stats.frames += 1;
        self.process_events();
        Ok(())
    }

    /// Drain the event queue without rendering
    pub fn process_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event);
        }
    }

    /// Block until one event arrives or `timeout` passes, then drain the queue.
    ///
    /// Returns whether anything was handled.
    pub fn wait_for_events(&mut self, timeout: Duration) -> bool {
        match self.events_rx.recv_timeout(timeout) {
            Ok(event) => {
                self.handle_event(event);
                self.process_events();
                true
            }
            Err(_) => false,
        }
    }

    fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::FrameRendered {
                pass: Pass::Display,
                frame,
            } => {
                let now = self.renderer.display().clock().elapsed_secs();
                let outcome = self.session.on_display_frame(now, &self.renderer);
                self.after_frame(frame, outcome);
            }
            AppEvent::FrameRendered {
                pass: Pass::Annotation,
                frame,
            } => {
                log::trace!("Annotation frame {frame} rendered");
            }
            AppEvent::Socket { attempt, event } => {
                self.session.handle_socket_event(attempt, event);
            }
            AppEvent::Decoded(reply) => self.paint(reply),
        }
    }

    fn after_frame(&mut self, frame: u64, outcome: FrameOutcome) {
        if outcome.sent {
            self.stats.frames_sent += 1;
            log::debug!("Frame {frame} sent");
        }
        for request in outcome.paints {
            self.decoder.decode(request);
        }
    }

    fn paint(&mut self, reply: DecodedReply) {
        if !self.session.accepts_paint(reply.attempt) {
            log::debug!(
                "Discarding decoded reply for {:?} from attempt {}",
                reply.surface_id,
                reply.attempt.0
            );
            self.stats.discarded_paints += 1;
            return;
        }
        match reply.image {
            Ok(image) => match self.outputs.paint(&reply.surface_id, &image) {
                Ok(()) => self.stats.paints += 1,
                Err(error) => log::error!("{error}"),
            },
            Err(error) => log::warn!("Reply image for {:?} not painted: {error}", reply.surface_id),
        }
    }

    /// Run the render loop at the configured rate.
    ///
    /// Stops after `max_frames` frames when set. A lost render surface ends
    /// the loop with an error. The connection is left as it is.
    pub fn run(&mut self) -> Result<LoopStats, AppError> {
        let frame_budget = Duration::from_secs_f64(1.0 / f64::from(self.config.target_fps.max(1)));
        log::info!(
            "Render loop started at {} fps{}",
            self.config.target_fps,
            self.config
                .max_frames
                .map(|max| format!(", stopping after {max} frames"))
                .unwrap_or_default()
        );

        loop {
            if self.config.max_frames.is_some_and(|max| self.stats.frames >= max) {
                log::info!("Reached max frames ({})", self.stats.frames);
                break;
            }

            let started = Instant::now();
            self.step()?;
            if let Some(rest) = frame_budget.checked_sub(started.elapsed()) {
                thread::sleep(rest);
            }
        }

        Ok(self.stats)
    }
}

fn frame_forwarder(events: Sender<AppEvent>, pass: Pass) -> impl FnMut(u64) + Send + 'static {
    move |frame| {
        let _ = events.send(AppEvent::FrameRendered { pass, frame });
    }
}
