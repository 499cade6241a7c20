//! Recording lifecycle around a [`StreamEncoder`].

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

use crate::capture::chunks::{ChunkWriter, concat};
use crate::capture::encoder::{StreamConfig, StreamEncoder};
use crate::capture::ffmpeg::ensure_parent_dir;
use crate::foundation::core::{Canvas, Fps, FrameIndex};
use crate::foundation::error::{RaceError, RaceResult};
use crate::render::backend::RasterSource;

/// The finished video.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub bytes: u64,
    pub chunk_count: usize,
    pub frame_count: u64,
}

impl Artifact {
    /// `file://` reference to the artifact.
    pub fn url(&self) -> String {
        let abs = std::path::absolute(&self.path).unwrap_or_else(|_| self.path.clone());
        format!("file://{}", abs.display())
    }
}

/// Pending result of one recording; resolves once [`CaptureController::stop`] completes.
#[derive(Debug)]
pub struct Recording {
    rx: mpsc::Receiver<RaceResult<Artifact>>,
    result: Option<RaceResult<Artifact>>,
}

impl Recording {
    /// Block until the recording resolves.
    pub fn wait(self) -> RaceResult<Artifact> {
        if let Some(result) = self.result {
            return result;
        }
        self.rx
            .recv()
            .map_err(|_| RaceError::capture("capture ended without producing a result"))?
    }

    /// Non-blocking check; `None` while the recording is still open.
    pub fn try_result(&mut self) -> Option<&RaceResult<Artifact>> {
        if self.result.is_none() {
            match self.rx.try_recv() {
                Ok(result) => self.result = Some(result),
                Err(mpsc::TryRecvError::Empty) => return None,
                Err(mpsc::TryRecvError::Disconnected) => {
                    self.result = Some(Err(RaceError::capture(
                        "capture ended without producing a result",
                    )));
                }
            }
        }
        self.result.as_ref()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Recording,
    Stopped,
    Disposed,
}

#[derive(Clone, Debug)]
pub struct CaptureSettings {
    pub canvas: Canvas,
    pub fps: Fps,
    /// Unconditional wait between the final flush and the actual stop.
    pub grace: Duration,
    pub output: PathBuf,
}

/// Owns the capture stream of one race.
///
/// Frames are sampled from a [`RasterSource`] at `fps` on the virtual timeline. Stopping follows a
/// fixed order: flush, grace delay, stop, then concatenate every chunk into the artifact.
pub struct CaptureController {
    settings: CaptureSettings,
    encoder: Box<dyn StreamEncoder>,
    writer: Option<ChunkWriter>,
    state: CaptureState,
    frames: u64,
    failure: Option<RaceError>,
    tx: Option<mpsc::Sender<RaceResult<Artifact>>>,
}

impl std::fmt::Debug for CaptureController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureController")
            .field("settings", &self.settings)
            .field("state", &self.state)
            .field("frames", &self.frames)
            .field("failure", &self.failure)
            .finish_non_exhaustive()
    }
}

impl CaptureController {
    pub fn new(encoder: Box<dyn StreamEncoder>, settings: CaptureSettings) -> Self {
        Self {
            settings,
            encoder,
            writer: None,
            state: CaptureState::Idle,
            frames: 0,
            failure: None,
            tx: None,
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn frames_captured(&self) -> u64 {
        self.frames
    }

    pub fn output(&self) -> &Path {
        &self.settings.output
    }

    /// Start the stream, cutting chunks every `chunk_interval`.
    pub fn record(&mut self, chunk_interval: Duration) -> RaceResult<Recording> {
        if self.state != CaptureState::Idle {
            return Err(RaceError::capture(format!(
                "cannot record from state {:?}",
                self.state
            )));
        }
        let writer = ChunkWriter::new(chunk_interval);
        let cfg = StreamConfig {
            width: self.settings.canvas.width,
            height: self.settings.canvas.height,
            fps: self.settings.fps,
        };
        self.encoder.begin(&cfg, writer.clone())?;

        let (tx, rx) = mpsc::channel();
        self.writer = Some(writer);
        self.tx = Some(tx);
        self.frames = 0;
        self.failure = None;
        self.state = CaptureState::Recording;
        tracing::info!(
            output = %self.settings.output.display(),
            chunk_interval_ms = chunk_interval.as_millis() as u64,
            "recording started"
        );
        Ok(Recording { rx, result: None })
    }

    /// Sample every frame due at or before `at`.
    ///
    /// An encoder failure is remembered and reported through the [`Recording`]; it does not
    /// interrupt the race.
    pub fn capture(&mut self, at: Duration, source: &dyn RasterSource) -> RaceResult<()> {
        if self.state != CaptureState::Recording {
            return Err(RaceError::capture("capture is not recording"));
        }
        if self.failure.is_some() {
            return Ok(());
        }
        let mut frame = None;
        while self.settings.fps.frame_time(FrameIndex(self.frames)) <= at {
            let f = frame.get_or_insert_with(|| source.frame());
            if let Err(e) = self.encoder.encode_frame(f) {
                tracing::warn!(error = %e, frame = self.frames, "encoder failed; capture halted");
                self.failure = Some(e);
                return Ok(());
            }
            self.frames += 1;
        }
        Ok(())
    }

    /// Flush, wait out the grace delay, stop, and resolve the recording.
    #[tracing::instrument(skip(self), fields(frames = self.frames))]
    pub fn stop(&mut self) -> RaceResult<()> {
        if self.state != CaptureState::Recording {
            return Err(RaceError::capture(format!(
                "cannot stop from state {:?}",
                self.state
            )));
        }
        let result = self.finalize();
        match &result {
            Ok(artifact) => tracing::info!(
                url = %artifact.url(),
                bytes = artifact.bytes,
                chunks = artifact.chunk_count,
                "recording finished"
            ),
            Err(e) => tracing::warn!(error = %e, "recording failed"),
        }
        self.state = CaptureState::Stopped;
        self.writer = None;
        if let Some(tx) = self.tx.take() {
            // The receiver may already be gone; the result is then simply unobserved.
            let _ = tx.send(result);
        }
        Ok(())
    }

    fn finalize(&mut self) -> RaceResult<Artifact> {
        let writer = self
            .writer
            .clone()
            .ok_or_else(|| RaceError::capture("capture stream missing"))?;

        if self.failure.is_none()
            && let Err(e) = self.encoder.request_data().and_then(|()| writer.cut())
        {
            self.failure = Some(e);
        }
        std::thread::sleep(self.settings.grace);
        if self.failure.is_none() {
            if let Err(e) = self.encoder.finish() {
                self.failure = Some(e);
            }
        } else {
            self.encoder.abort();
        }
        if let Some(e) = self.failure.take() {
            return Err(e);
        }

        let chunks = writer.take_chunks()?;
        let bytes = concat(&chunks);
        if bytes.is_empty() {
            return Err(RaceError::capture("capture produced no data"));
        }
        ensure_parent_dir(&self.settings.output)?;
        std::fs::write(&self.settings.output, &bytes).map_err(|e| {
            RaceError::capture(format!(
                "failed to write artifact '{}': {e}",
                self.settings.output.display()
            ))
        })?;
        Ok(Artifact {
            path: self.settings.output.clone(),
            bytes: bytes.len() as u64,
            chunk_count: chunks.len(),
            frame_count: self.frames,
        })
    }

    /// Tear down a live stream; an open recording resolves with an error.
    pub fn dispose(&mut self) {
        if self.state == CaptureState::Disposed {
            return;
        }
        if self.state == CaptureState::Recording {
            self.encoder.abort();
            if let Some(tx) = self.tx.take() {
                let _ = tx.send(Err(RaceError::capture("capture disposed before stop")));
            }
            tracing::debug!("live capture disposed");
        }
        self.writer = None;
        self.state = CaptureState::Disposed;
    }
}

impl Drop for CaptureController {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/capture/controller.rs"]
mod tests;
