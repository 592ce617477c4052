//! Compression lifecycle events.
//!
//! The engine reports the start, success and failure of every call as events
//! sent to registered observers. Observers typically persist the payloads
//! (compression logs, metrics tables); the engine never waits on them for
//! anything but the call itself, and an observer failure is logged and
//! otherwise ignored.

use serde::Serialize;
use std::sync::Arc;
use std::sync::mpsc::Sender;

pub mod json_handler;

pub use json_handler::JsonLinesObserver;

/// Status reported alongside each lifecycle event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionStatus {
    Processing,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CompressionEvent {
    Started {
        video_id: String,
        original_size_mb: f64,
        target_size_mb: f64,
        status: CompressionStatus,
    },

    Completed {
        video_id: String,
        compressed_size_mb: f64,
        compression_ratio: f64,
        status: CompressionStatus,
        processing_time_sec: f64,
        /// Only a still frame was encoded
        degraded: bool,
    },

    Failed {
        video_id: String,
        compressed_size_mb: f64,
        compression_ratio: f64,
        status: CompressionStatus,
        processing_time_sec: f64,
        error: String,
    },
}

impl CompressionEvent {
    pub fn video_id(&self) -> &str {
        match self {
            CompressionEvent::Started { video_id, .. }
            | CompressionEvent::Completed { video_id, .. }
            | CompressionEvent::Failed { video_id, .. } => video_id,
        }
    }

    pub fn status(&self) -> CompressionStatus {
        match self {
            CompressionEvent::Started { status, .. }
            | CompressionEvent::Completed { status, .. }
            | CompressionEvent::Failed { status, .. } => *status,
        }
    }
}

/// Receives lifecycle events.
///
/// Errors are reported back as text; the dispatcher logs them and carries on.
pub trait CompressionObserver: Send + Sync {
    fn on_event(&self, event: &CompressionEvent) -> Result<(), String>;
}

/// Fans events out to every registered observer.
#[derive(Clone, Default)]
pub struct EventDispatcher {
    observers: Vec<Arc<dyn CompressionObserver>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self {
            observers: Vec::new(),
        }
    }

    pub fn add_observer(&mut self, observer: Arc<dyn CompressionObserver>) {
        self.observers.push(observer);
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    pub fn emit(&self, event: CompressionEvent) {
        for observer in &self.observers {
            if let Err(e) = observer.on_event(&event) {
                log::warn!(
                    "Failed to record {:?} event for {}: {}",
                    event.status(),
                    event.video_id(),
                    e
                );
            }
        }
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("observers", &self.observers.len())
            .finish()
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl CompressionObserver for NullObserver {
    fn on_event(&self, _event: &CompressionEvent) -> Result<(), String> {
        Ok(())
    }
}

/// Hands events to another thread over an mpsc channel without blocking.
#[derive(Debug)]
pub struct ChannelObserver {
    sender: std::sync::Mutex<Sender<CompressionEvent>>,
}

impl ChannelObserver {
    pub fn new(sender: Sender<CompressionEvent>) -> Self {
        Self {
            sender: std::sync::Mutex::new(sender),
        }
    }
}

impl CompressionObserver for ChannelObserver {
    fn on_event(&self, event: &CompressionEvent) -> Result<(), String> {
        let sender = self
            .sender
            .lock()
            .map_err(|_| "event channel lock poisoned".to_string())?;
        sender
            .send(event.clone())
            .map_err(|_| "event receiver has been dropped".to_string())
    }
}
