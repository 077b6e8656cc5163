//! Frame streaming to a remote image processor over WebSocket

pub mod decoder;
pub mod message;
pub mod session;
pub mod transport;

pub use decoder::{DecodeSink, DecodedReply, ReplyDecoder};
pub use message::{FrameMessage, ReplyMessage, TaggedBBox, CLOSE_SENTINEL};
pub use session::{
    AttemptId, ConnectionState, ErrorSink, EventSink, FrameCapture, FrameOutcome, FrameSource,
    PaintRequest, ReplyTarget, SessionError, StreamingSession,
};
pub use transport::{Connector, SocketEvent, SocketEventHandler, Transport, WsConnector, WsTransport};
