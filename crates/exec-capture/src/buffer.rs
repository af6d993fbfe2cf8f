//! In-memory sinks for process output
//!
//! An [`OutputBuffer`] is filled by a pump thread that drains one of the
//! child's pipes, while callers read it concurrently.

use async_channel::Receiver;
use futures_lite::io::{AsyncRead, AsyncReadExt};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::warn;

use crate::error::Result;

const CHUNK_SIZE: usize = 8 * 1024;

/// Append-only byte buffer shared between a pump and its readers
#[derive(Debug, Clone, Default)]
pub struct OutputBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl OutputBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<u8>> {
        self.bytes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append raw bytes
    pub fn append(&self, chunk: &[u8]) {
        self.lock().extend_from_slice(chunk);
    }

    /// Copy of everything captured so far
    pub fn bytes(&self) -> Vec<u8> {
        self.lock().clone()
    }

    /// Number of bytes captured so far
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing has been captured yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The captured text with leading and trailing whitespace removed.
    ///
    /// Recomputed on every call. Invalid UTF-8 is replaced, and a multi-byte
    /// character still being written is left out until it is complete.
    pub fn trimmed(&self) -> String {
        let bytes = self.lock();
        String::from_utf8_lossy(complete_prefix(&bytes))
            .trim()
            .to_string()
    }
}

/// Drop a trailing UTF-8 sequence that has not been fully written yet
fn complete_prefix(bytes: &[u8]) -> &[u8] {
    let len = bytes.len();
    for back in 1..=len.min(4) {
        let byte = bytes[len - back];
        if byte & 0b1100_0000 == 0b1000_0000 {
            continue;
        }
        let width = match byte {
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => 1,
        };
        return if width > back { &bytes[..len - back] } else { bytes };
    }
    bytes
}

/// Spawn a thread that copies `reader` into `sink` until end of stream.
///
/// The returned receiver closes once the pump has finished, so awaiting
/// `recv()` on it waits for the buffer to be final.
pub(crate) fn spawn_pump<R>(name: &str, mut reader: R, sink: OutputBuffer) -> Result<Receiver<()>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let (done, drained) = async_channel::bounded::<()>(1);
    let stream = name.to_string();

    std::thread::Builder::new()
        .name(format!("{}-pump", name))
        .spawn(move || {
            let _done = done;
            futures_lite::future::block_on(async move {
                let mut chunk = [0u8; CHUNK_SIZE];
                loop {
                    match reader.read(&mut chunk).await {
                        Ok(0) => break,
                        Ok(n) => sink.append(&chunk[..n]),
                        Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                        Err(e) => {
                            warn!(stream = %stream, error = %e, "output pump stopped early");
                            break;
                        }
                    }
                }
            });
        })?;

    Ok(drained)
}
