//! Shared fixtures for the integration tests.
//!
//! [`MockConnector`] hands out transports that record every outbound text
//! frame, and keeps each connection's event handler so a test can play the
//! server side.

#![allow(dead_code)]

use std::sync::Arc;

use parking_lot::Mutex;

use scene_streamer::stream::{Connector, SocketEvent, SocketEventHandler, Transport};
use scene_streamer::StreamerConfig;

/// Everything the fake server saw, plus the handles needed to answer
#[derive(Default)]
pub struct MockWire {
    pub opened: usize,
    pub sent: Vec<String>,
    pub closed: usize,
    handlers: Vec<SocketEventHandler>,
}

#[derive(Clone, Default)]
pub struct MockServer(Arc<Mutex<MockWire>>);

impl MockServer {
    pub fn connector(&self) -> Box<dyn Connector> {
        Box::new(MockConnector(self.clone()))
    }

    /// Deliver `event` on the most recently opened connection
    pub fn emit(&self, event: SocketEvent) {
        let wire = self.0.lock();
        let handler = wire.handlers.last().expect("no connection opened");
        handler(event);
    }

    /// Deliver `event` on the connection opened `index`-th (0-based)
    pub fn emit_on(&self, index: usize, event: SocketEvent) {
        let wire = self.0.lock();
        (wire.handlers[index])(event);
    }

    pub fn opened(&self) -> usize {
        self.0.lock().opened
    }

    pub fn sent(&self) -> Vec<String> {
        self.0.lock().sent.clone()
    }

    pub fn closed(&self) -> usize {
        self.0.lock().closed
    }
}

pub struct MockConnector(MockServer);

impl Connector for MockConnector {
    fn open(&mut self, _url: &str, on_event: SocketEventHandler) -> Result<Box<dyn Transport>, String> {
        let mut wire = (self.0).0.lock();
        wire.opened += 1;
        wire.handlers.push(on_event);
        Ok(Box::new(MockTransport(self.0.clone())))
    }
}

pub struct MockTransport(MockServer);

impl Transport for MockTransport {
    fn send_text(&mut self, text: String) {
        (self.0).0.lock().sent.push(text);
    }

    fn close(&mut self) {
        (self.0).0.lock().closed += 1;
    }
}

/// Connector whose every attempt fails
pub struct RefusingConnector;

impl Connector for RefusingConnector {
    fn open(&mut self, _url: &str, _on_event: SocketEventHandler) -> Result<Box<dyn Transport>, String> {
        Err("connection refused".to_string())
    }
}

/// Small, seeded config that renders quickly
pub fn small_config(object_count: usize) -> StreamerConfig {
    StreamerConfig {
        width: 64,
        height: 48,
        object_count,
        seed: Some(42),
        max_frames: Some(3),
        target_fps: 1000,
        ..Default::default()
    }
}
