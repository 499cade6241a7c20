use crate::capture::chunks::ChunkWriter;
use crate::foundation::core::Fps;
use crate::foundation::error::{RaceError, RaceResult};
use crate::render::backend::FrameRGBA;

/// Configuration handed to a [`StreamEncoder`] when recording starts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamConfig {
    pub width: u32,
    pub height: u32,
    pub fps: Fps,
}

/// Turns raster frames into an encoded byte stream written to a [`ChunkWriter`].
///
/// Call order: `begin`, any number of `encode_frame`, then `request_data` and `finish`.
/// `abort` may be called at any point and must leave no running process behind.
pub trait StreamEncoder: Send {
    fn begin(&mut self, cfg: &StreamConfig, out: ChunkWriter) -> RaceResult<()>;

    fn encode_frame(&mut self, frame: &FrameRGBA) -> RaceResult<()>;

    /// Push everything buffered so far towards the writer.
    fn request_data(&mut self) -> RaceResult<()>;

    /// End the stream; all remaining output reaches the writer before this returns.
    fn finish(&mut self) -> RaceResult<()>;

    fn abort(&mut self) {}

    /// File extension of the produced artifact.
    fn extension(&self) -> &'static str;
}

/// Writes frames uncompressed, as tightly packed premultiplied RGBA8.
#[derive(Debug, Default)]
pub struct RawFrameEncoder {
    cfg: Option<StreamConfig>,
    out: Option<ChunkWriter>,
    frames: u64,
}

impl RawFrameEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames_encoded(&self) -> u64 {
        self.frames
    }
}

impl StreamEncoder for RawFrameEncoder {
    fn begin(&mut self, cfg: &StreamConfig, out: ChunkWriter) -> RaceResult<()> {
        if cfg.width == 0 || cfg.height == 0 {
            return Err(RaceError::validation(
                "raw encoder width/height must be non-zero",
            ));
        }
        self.cfg = Some(cfg.clone());
        self.out = Some(out);
        self.frames = 0;
        Ok(())
    }

    fn encode_frame(&mut self, frame: &FrameRGBA) -> RaceResult<()> {
        let (Some(cfg), Some(out)) = (self.cfg.as_ref(), self.out.as_ref()) else {
            return Err(RaceError::capture("raw encoder not started"));
        };
        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(RaceError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }
        if frame.data.len() != FrameRGBA::byte_len(cfg.width, cfg.height) {
            return Err(RaceError::validation(
                "frame.data size mismatch with width*height*4",
            ));
        }
        out.write(&frame.data)?;
        self.frames += 1;
        Ok(())
    }

    fn request_data(&mut self) -> RaceResult<()> {
        match self.out.as_ref() {
            Some(out) => out.cut(),
            None => Err(RaceError::capture("raw encoder not started")),
        }
    }

    fn finish(&mut self) -> RaceResult<()> {
        let out = self
            .out
            .take()
            .ok_or_else(|| RaceError::capture("raw encoder not started"))?;
        self.cfg = None;
        out.cut()
    }

    fn abort(&mut self) {
        self.out = None;
        self.cfg = None;
    }

    fn extension(&self) -> &'static str {
        "rgba"
    }
}
