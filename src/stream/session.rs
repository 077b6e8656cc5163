//! Streaming session: connection lifecycle, send throttle and reply cache
//!
//! The session is driven from the render loop thread. Transport callbacks run
//! elsewhere and only forward [`SocketEvent`]s, tagged with the
//! [`AttemptId`] of the connection that produced them, to the session's
//! event sink. The loop hands those back through
//! [`StreamingSession::handle_socket_event`], so all state changes happen
//! in one place and events from an abandoned connection are recognizable.

use std::sync::Arc;

use thiserror::Error;

use super::message::{FrameMessage, ReplyMessage, TaggedBBox, CLOSE_SENTINEL};
use super::transport::{Connector, SocketEvent, SocketEventHandler, Transport};
use crate::scene_manager::SnapshotError;
use crate::StreamerConfig;

/// Identifies one call to [`StreamingSession::connect`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttemptId(pub u64);

/// Receives socket events together with the attempt that produced them
pub type EventSink = Arc<dyn Fn(AttemptId, SocketEvent) + Send + Sync>;

/// Receives every error the session cannot hand back to a caller
pub type ErrorSink = Box<dyn FnMut(&SessionError) + Send>;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("failed to connect to {endpoint}: {reason}")]
    Connect { endpoint: String, reason: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("malformed reply: {0}")]
    MalformedReply(serde_json::Error),
    #[error("failed to serialize frame: {0}")]
    Serialize(serde_json::Error),
    #[error("failed to capture frame: {0}")]
    Capture(#[from] SnapshotError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Closed,
    Connecting,
    Open,
}

/// Which output surface a reply image is painted on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReplyTarget {
    Display,
    Annotation,
}

/// A cached reply image that should be decoded and painted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaintRequest {
    pub attempt: AttemptId,
    pub target: ReplyTarget,
    pub surface_id: String,
    pub data_url: String,
}

/// What happened on one display frame
#[derive(Debug, Default)]
pub struct FrameOutcome {
    pub sent: bool,
    pub throttled: bool,
    pub paints: Vec<PaintRequest>,
}

/// Everything an outbound frame carries
#[derive(Debug, Clone, PartialEq)]
pub struct FrameCapture {
    pub image: String,
    pub seg_image: String,
    pub bboxes: Vec<TaggedBBox>,
}

impl From<FrameCapture> for FrameMessage {
    fn from(capture: FrameCapture) -> Self {
        Self {
            image: capture.image,
            seg_image: capture.seg_image,
            bboxes: capture.bboxes,
        }
    }
}

/// Produces the payload of a frame on demand.
///
/// Called only once the throttle has let a frame through.
pub trait FrameSource {
    fn capture(&self) -> Result<FrameCapture, SnapshotError>;
}

struct Connection {
    transport: Box<dyn Transport>,
    attempt: AttemptId,
    state: ConnectionState,
}

/// Client side of the frame streaming protocol
pub struct StreamingSession {
    endpoint: String,
    display_reply_surface: String,
    annotation_reply_surface: String,
    connector: Box<dyn Connector>,
    events: EventSink,
    error_sink: ErrorSink,
    connection: Option<Connection>,
    connection_attempts: u64,
    send_interval_ms: u64,
    last_sent_ms: Option<u64>,
    received: ReplyMessage,
}

impl StreamingSession {
    pub fn new(config: &StreamerConfig, connector: Box<dyn Connector>, events: EventSink) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            send_interval_ms: to_millis(config.send_interval_secs),
            display_reply_surface: config.display_reply_surface.clone(),
            annotation_reply_surface: config.annotation_reply_surface.clone(),
            connector,
            events,
            error_sink: Box::new(|error: &SessionError| log::error!("Streaming session: {error}")),
            connection: None,
            connection_attempts: 0,
            last_sent_ms: None,
            received: ReplyMessage::default(),
        }
    }

    /// Route asynchronous errors somewhere other than the log
    pub fn set_error_sink(&mut self, sink: impl FnMut(&SessionError) + Send + 'static) {
        self.error_sink = Box::new(sink);
    }

    pub fn state(&self) -> ConnectionState {
        self.connection
            .as_ref()
            .map_or(ConnectionState::Closed, |connection| connection.state)
    }

    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    pub fn connection_attempts(&self) -> u64 {
        self.connection_attempts
    }

    /// Time of the most recent send, in whole milliseconds
    pub fn last_sent_ms(&self) -> Option<u64> {
        self.last_sent_ms
    }

    /// Most recent reply images, each kept until a later reply replaces it
    pub fn received(&self) -> &ReplyMessage {
        &self.received
    }

    /// Open a connection to the endpoint.
    ///
    /// Does nothing while a connection is pending or open. A failure to open
    /// is passed to the error sink as well as returned.
    pub fn connect(&mut self) -> Result<AttemptId, SessionError> {
        if let Some(connection) = &self.connection {
            log::debug!("Already connected to {:?}, ignoring connect", self.endpoint);
            return Ok(connection.attempt);
        }

        self.connection_attempts += 1;
        let attempt = AttemptId(self.connection_attempts);
        let events = Arc::clone(&self.events);
        let handler: SocketEventHandler = Box::new(move |event| events(attempt, event));

        match self.connector.open(&self.endpoint, handler) {
            Ok(transport) => {
                log::info!("Connection attempt {} to {:?} started", attempt.0, self.endpoint);
                self.connection = Some(Connection {
                    transport,
                    attempt,
                    state: ConnectionState::Connecting,
                });
                Ok(attempt)
            }
            Err(reason) => {
                let error = SessionError::Connect {
                    endpoint: self.endpoint.clone(),
                    reason,
                };
                (self.error_sink)(&error);
                Err(error)
            }
        }
    }

    /// Send the close sentinel, shut the transport and forget the connection
    pub fn close(&mut self) {
        let Some(mut connection) = self.connection.take() else {
            log::debug!("No connection to close");
            return;
        };
        connection.transport.send_text(CLOSE_SENTINEL.to_owned());
        connection.transport.close();
        log::info!("Connection attempt {} closed", connection.attempt.0);
    }

    /// Apply one transport event produced by connection `attempt`
    pub fn handle_socket_event(&mut self, attempt: AttemptId, event: SocketEvent) {
        let Some(connection) = self
            .connection
            .as_mut()
            .filter(|connection| connection.attempt == attempt)
        else {
            log::debug!("Dropping {event:?} from stale connection attempt {}", attempt.0);
            return;
        };

        match event {
            SocketEvent::Opened => {
                connection.state = ConnectionState::Open;
                log::info!("Connected to {:?}", self.endpoint);
            }
            SocketEvent::Message(text) => match serde_json::from_str::<ReplyMessage>(&text) {
                Ok(reply) => self.store_reply(reply),
                Err(error) => self.report(SessionError::MalformedReply(error)),
            },
            SocketEvent::Error(reason) => {
                self.connection = None;
                self.report(SessionError::Transport(reason));
            }
            SocketEvent::Closed => {
                self.connection = None;
                log::info!("Server closed connection attempt {}", attempt.0);
            }
        }
    }

    fn store_reply(&mut self, reply: ReplyMessage) {
        log::trace!(
            "Reply received (image: {}, seg_image: {})",
            reply.image.is_some(),
            reply.seg_image.is_some()
        );
        if reply.image.is_some() {
            self.received.image = reply.image;
        }
        if reply.seg_image.is_some() {
            self.received.seg_image = reply.seg_image;
        }
    }

    /// Called once per rendered display frame at time `now` (seconds).
    ///
    /// Times are compared in whole milliseconds. Frames less than the send
    /// interval after the previous send are skipped. Otherwise, if the
    /// connection is open, the frame is captured and sent, and the latest
    /// reply images are queued for painting.
    pub fn on_display_frame(&mut self, now: f64, source: &impl FrameSource) -> FrameOutcome {
        let mut outcome = FrameOutcome::default();

        let now_ms = to_millis(now);
        if let Some(last) = self.last_sent_ms {
            if now_ms.saturating_sub(last) < self.send_interval_ms {
                outcome.throttled = true;
                return outcome;
            }
        }

        let Some(attempt) = self
            .connection
            .as_ref()
            .filter(|connection| connection.state == ConnectionState::Open)
            .map(|connection| connection.attempt)
        else {
            return outcome;
        };

        let text = match source
            .capture()
            .map_err(SessionError::from)
            .and_then(|capture| {
                serde_json::to_string(&FrameMessage::from(capture)).map_err(SessionError::Serialize)
            }) {
            Ok(text) => text,
            Err(error) => {
                self.report(error);
                return outcome;
            }
        };

        if let Some(connection) = self.connection.as_mut() {
            connection.transport.send_text(text);
        }
        outcome.sent = true;

        if let Some(data_url) = &self.received.image {
            outcome.paints.push(PaintRequest {
                attempt,
                target: ReplyTarget::Display,
                surface_id: self.display_reply_surface.clone(),
                data_url: data_url.clone(),
            });
        }
        if let Some(data_url) = &self.received.seg_image {
            outcome.paints.push(PaintRequest {
                attempt,
                target: ReplyTarget::Annotation,
                surface_id: self.annotation_reply_surface.clone(),
                data_url: data_url.clone(),
            });
        }

        self.last_sent_ms = Some(now_ms);
        outcome
    }

    /// Whether a decode started under `attempt` may still be painted
    pub fn accepts_paint(&self, attempt: AttemptId) -> bool {
        self.connection.as_ref().is_some_and(|connection| {
            connection.attempt == attempt && connection.state == ConnectionState::Open
        })
    }

    fn report(&mut self, error: SessionError) {
        (self.error_sink)(&error);
    }
}

fn to_millis(secs: f64) -> u64 {
    (secs.max(0.0) * 1000.0).round() as u64
}
