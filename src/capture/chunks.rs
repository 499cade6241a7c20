//! Ordered binary chunks emitted by a capture stream.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::foundation::error::{RaceError, RaceResult};

/// One slice of encoded output, numbered in emission order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
    pub seq: u64,
    pub bytes: Vec<u8>,
}

#[derive(Debug)]
struct ChunkLog {
    interval: Duration,
    pending: Vec<u8>,
    chunks: Vec<Chunk>,
    last_cut: Instant,
    next_seq: u64,
}

impl ChunkLog {
    fn cut(&mut self) {
        self.last_cut = Instant::now();
        if self.pending.is_empty() {
            return;
        }
        let bytes = std::mem::take(&mut self.pending);
        self.chunks.push(Chunk {
            seq: self.next_seq,
            bytes,
        });
        self.next_seq += 1;
    }
}

/// Shared sink for encoder output.
///
/// Bytes accumulate until the chunk interval has elapsed on the wall clock, then become a new
/// [`Chunk`]. Clones share the same log, so an encoder's reader thread and the controller can
/// both hold one.
#[derive(Clone, Debug)]
pub struct ChunkWriter {
    log: Arc<Mutex<ChunkLog>>,
}

impl ChunkWriter {
    pub fn new(interval: Duration) -> Self {
        Self {
            log: Arc::new(Mutex::new(ChunkLog {
                interval,
                pending: Vec::new(),
                chunks: Vec::new(),
                last_cut: Instant::now(),
                next_seq: 0,
            })),
        }
    }

    fn lock(&self) -> RaceResult<MutexGuard<'_, ChunkLog>> {
        self.log
            .lock()
            .map_err(|_| RaceError::capture("chunk log lock poisoned"))
    }

    pub fn write(&self, bytes: &[u8]) -> RaceResult<()> {
        let mut log = self.lock()?;
        log.pending.extend_from_slice(bytes);
        if log.last_cut.elapsed() >= log.interval {
            log.cut();
        }
        Ok(())
    }

    /// Close the pending bytes into a chunk now, regardless of the interval.
    pub fn cut(&self) -> RaceResult<()> {
        self.lock()?.cut();
        Ok(())
    }

    /// Remove and return every completed chunk, pending bytes included.
    pub fn take_chunks(&self) -> RaceResult<Vec<Chunk>> {
        let mut log = self.lock()?;
        log.cut();
        Ok(std::mem::take(&mut log.chunks))
    }
}

impl std::io::Write for ChunkWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        ChunkWriter::write(self, buf).map_err(std::io::Error::other)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Join chunks in sequence order into one buffer.
pub fn concat(chunks: &[Chunk]) -> Vec<u8> {
    let mut ordered: Vec<&Chunk> = chunks.iter().collect();
    ordered.sort_by_key(|c| c.seq);
    let len = ordered.iter().map(|c| c.bytes.len()).sum();
    let mut out = Vec::with_capacity(len);
    for c in ordered {
        out.extend_from_slice(&c.bytes);
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/capture/chunks.rs"]
mod tests;
