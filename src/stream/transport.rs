//! Socket transport seam and its WebSocket implementation

use std::ops::ControlFlow;

use ewebsock::{WsEvent, WsMessage, WsSender};

/// Transport-level event delivered to the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    Opened,
    Message(String),
    Error(String),
    Closed,
}

/// Called from the transport's own thread for every event
pub type SocketEventHandler = Box<dyn Fn(SocketEvent) + Send>;

/// Outbound half of an open connection
pub trait Transport: Send {
    fn send_text(&mut self, text: String);
    fn close(&mut self);
}

/// Opens outbound connections
pub trait Connector: Send {
    fn open(&mut self, url: &str, on_event: SocketEventHandler) -> Result<Box<dyn Transport>, String>;
}

/// WebSocket connector backed by `ewebsock`
#[derive(Debug, Default)]
pub struct WsConnector;

impl Connector for WsConnector {
    fn open(&mut self, url: &str, on_event: SocketEventHandler) -> Result<Box<dyn Transport>, String> {
        log::info!("Connecting to {url:?}…");
        let sender = ewebsock::ws_connect(
            url.to_owned(),
            ewebsock::Options::default(),
            Box::new(move |event: WsEvent| match event {
                WsEvent::Opened => {
                    on_event(SocketEvent::Opened);
                    ControlFlow::Continue(())
                }
                WsEvent::Message(message) => match message {
                    WsMessage::Text(text) => {
                        on_event(SocketEvent::Message(text));
                        ControlFlow::Continue(())
                    }
                    WsMessage::Binary(binary) => {
                        log::warn!("Unexpected binary message ({} bytes)", binary.len());
                        ControlFlow::Continue(())
                    }
                    WsMessage::Unknown(text) => {
                        log::warn!("Unknown message: {text:?}");
                        ControlFlow::Continue(())
                    }
                    WsMessage::Ping(_) | WsMessage::Pong(_) => ControlFlow::Continue(()),
                },
                WsEvent::Error(error) => {
                    on_event(SocketEvent::Error(error));
                    ControlFlow::Break(())
                }
                WsEvent::Closed => {
                    on_event(SocketEvent::Closed);
                    ControlFlow::Break(())
                }
            }),
        )?;

        Ok(Box::new(WsTransport(sender)))
    }
}

/// Sending half of an `ewebsock` connection
pub struct WsTransport(WsSender);

impl Transport for WsTransport {
    fn send_text(&mut self, text: String) {
        self.0.send(WsMessage::Text(text));
    }

    fn close(&mut self) {
        self.0.close();
    }
}
