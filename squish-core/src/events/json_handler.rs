//! JSON lines observer for structured event output
//!
//! Writes every lifecycle event as one JSON object per line, for consumption
//! by log shippers or by a separate process that persists compression logs.

use super::{CompressionEvent, CompressionObserver};
use serde_json::json;
use std::io::{self, Write};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// Observer that writes events as JSON lines
pub struct JsonLinesObserver {
    output: Mutex<Box<dyn Write + Send>>,
}

impl JsonLinesObserver {
    /// Create an observer that writes to stderr
    pub fn new() -> Self {
        Self {
            output: Mutex::new(Box::new(io::stderr())),
        }
    }

    /// Create an observer with a custom writer
    pub fn with_writer(writer: Box<dyn Write + Send>) -> Self {
        Self {
            output: Mutex::new(writer),
        }
    }

    /// Get current timestamp as seconds since Unix epoch
    fn get_timestamp() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}

impl Default for JsonLinesObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl CompressionObserver for JsonLinesObserver {
    fn on_event(&self, event: &CompressionEvent) -> Result<(), String> {
        let line = json!({
            "timestamp": Self::get_timestamp(),
            "payload": event,
        });

        let mut output = self
            .output
            .lock()
            .map_err(|_| "output lock poisoned".to_string())?;
        writeln!(output, "{line}").map_err(|e| e.to_string())?;
        output.flush().map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::CompressionStatus;
    use std::sync::Arc;

    /// Writer that appends into a shared buffer.
    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_one_json_object_per_line() {
        let buf = SharedBuf::default();
        let observer = JsonLinesObserver::with_writer(Box::new(buf.clone()));

        observer
            .on_event(&CompressionEvent::Completed {
                video_id: "a".to_string(),
                compressed_size_mb: 9.5,
                compression_ratio: 0.81,
                status: CompressionStatus::Completed,
                processing_time_sec: 12.0,
                degraded: false,
            })
            .unwrap();
        observer
            .on_event(&CompressionEvent::Failed {
                video_id: "b".to_string(),
                compressed_size_mb: 0.0,
                compression_ratio: 0.0,
                status: CompressionStatus::Failed,
                processing_time_sec: 1.5,
                error: "boom".to_string(),
            })
            .unwrap();

        let text = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["payload"]["event"], "completed");
        assert_eq!(lines[0]["payload"]["compression_ratio"], 0.81);
        assert_eq!(lines[1]["payload"]["status"], "failed");
        assert_eq!(lines[1]["payload"]["error"], "boom");
        assert!(lines[1]["timestamp"].is_u64());
    }
}
