//! Common test utilities

#![allow(dead_code)]

use exec_capture::{CapturedStream, ExecutionRecord, LogSink};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::Level;

/// A log sink that keeps every record it receives
#[derive(Default)]
pub struct MemorySink {
    records: Mutex<Vec<(Level, String, ExecutionRecord)>>,
}

impl MemorySink {
    /// All records received so far
    pub fn records(&self) -> Vec<(Level, String, ExecutionRecord)> {
        self.records.lock().unwrap().clone()
    }
}

impl LogSink for MemorySink {
    fn record(&self, level: Level, message: &str, record: &ExecutionRecord) {
        self.records
            .lock()
            .unwrap()
            .push((level, message.to_string(), record.clone()));
    }
}

/// Poll `stream` until its snapshot equals `expected`, failing after a few seconds
pub async fn wait_for_snapshot(stream: &CapturedStream, expected: &str) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while stream.snapshot() != expected {
        assert!(
            Instant::now() < deadline,
            "timed out waiting for {:?}, have {:?}",
            expected,
            stream.snapshot()
        );
        smol::Timer::after(Duration::from_millis(10)).await;
    }
}
