use std::io::{Read, Write as _};
use std::path::Path;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::JoinHandle;

use crate::capture::chunks::ChunkWriter;
use crate::capture::encoder::{StreamConfig, StreamEncoder};
use crate::foundation::core::{Fps, Rgba8};
use crate::foundation::error::{RaceError, RaceResult};
use crate::foundation::math::mul_div255_u16;
use crate::render::backend::FrameRGBA;

const READ_BUF: usize = 64 * 1024;

/// Streams frames through the system `ffmpeg` into fragmented H.264 MP4.
///
/// Raw RGBA goes in on stdin; the MP4 comes back on stdout and is drained by a reader thread
/// into the [`ChunkWriter`] as it is produced, so the container must be fragmented.
pub struct FfmpegEncoder {
    background: Rgba8,

    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stdout_reader: Option<JoinHandle<RaceResult<u64>>>,
    stderr_drain: Option<JoinHandle<std::io::Result<Vec<u8>>>>,

    scratch: Vec<u8>,
    cfg: Option<StreamConfig>,
}

impl std::fmt::Debug for FfmpegEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FfmpegEncoder")
            .field("background", &self.background)
            .field("running", &self.child.is_some())
            .field("cfg", &self.cfg)
            .finish_non_exhaustive()
    }
}

impl Default for FfmpegEncoder {
    fn default() -> Self {
        Self::new(Rgba8::WHITE)
    }
}

impl FfmpegEncoder {
    /// `background` is what transparent pixels flatten onto.
    pub fn new(background: Rgba8) -> Self {
        Self {
            background,
            child: None,
            stdin: None,
            stdout_reader: None,
            stderr_drain: None,
            scratch: Vec::new(),
            cfg: None,
        }
    }

    fn join_stderr(&mut self) -> Vec<u8> {
        match self.stderr_drain.take() {
            Some(handle) => match handle.join() {
                Ok(Ok(bytes)) => bytes,
                Ok(Err(e)) => format!("ffmpeg stderr read failed: {e}").into_bytes(),
                Err(_) => b"ffmpeg stderr drain thread panicked".to_vec(),
            },
            None => Vec::new(),
        }
    }
}

impl StreamEncoder for FfmpegEncoder {
    fn begin(&mut self, cfg: &StreamConfig, out: ChunkWriter) -> RaceResult<()> {
        if cfg.width == 0 || cfg.height == 0 {
            return Err(RaceError::validation(
                "ffmpeg encoder width/height must be non-zero",
            ));
        }
        if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
            return Err(RaceError::validation(
                "ffmpeg encoder width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        if self.child.is_some() {
            return Err(RaceError::capture("ffmpeg encoder already started"));
        }
        if !is_ffmpeg_on_path() {
            return Err(RaceError::capture(
                "ffmpeg is required for MP4 encoding, but was not found on PATH",
            ));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd.args([
            "-hide_banner",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
        ]);
        push_input_fps(&mut cmd, cfg.fps);
        cmd.args([
            "-i",
            "pipe:0",
            "-an",
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "frag_keyframe+empty_moov+default_base_moof",
            "-f",
            "mp4",
            "pipe:1",
        ]);

        let mut child = cmd.spawn().map_err(|e| {
            RaceError::capture(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| RaceError::capture("failed to open ffmpeg stdin (unexpected)"))?;
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| RaceError::capture("failed to open ffmpeg stdout (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| RaceError::capture("failed to open ffmpeg stderr (unexpected)"))?;

        let stdout_reader = std::thread::spawn(move || {
            let mut buf = vec![0u8; READ_BUF];
            let mut total = 0u64;
            loop {
                let n = stdout
                    .read(&mut buf)
                    .map_err(|e| RaceError::capture(format!("ffmpeg stdout read failed: {e}")))?;
                if n == 0 {
                    return Ok(total);
                }
                out.write(&buf[..n])?;
                total += n as u64;
            }
        });
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        tracing::debug!(
            width = cfg.width,
            height = cfg.height,
            fps = cfg.fps.as_f64(),
            "ffmpeg encoder started"
        );
        self.scratch = vec![0u8; FrameRGBA::byte_len(cfg.width, cfg.height)];
        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stdout_reader = Some(stdout_reader);
        self.stderr_drain = Some(stderr_drain);
        self.cfg = Some(cfg.clone());
        Ok(())
    }

    fn encode_frame(&mut self, frame: &FrameRGBA) -> RaceResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| RaceError::capture("ffmpeg encoder not started"))?;
        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(RaceError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }
        if frame.data.len() != self.scratch.len() {
            return Err(RaceError::validation(
                "frame.data size mismatch with width*height*4",
            ));
        }

        if frame.premultiplied {
            flatten_premul_over_bg_to_opaque_rgba8(
                &mut self.scratch,
                &frame.data,
                self.background.to_array(),
            )?;
        } else {
            self.scratch.copy_from_slice(&frame.data);
        }

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(RaceError::capture("ffmpeg encoder is already finalized"));
        };
        stdin
            .write_all(&self.scratch)
            .map_err(|e| RaceError::capture(format!("failed to write frame to ffmpeg stdin: {e}")))
    }

    fn request_data(&mut self) -> RaceResult<()> {
        if let Some(stdin) = self.stdin.as_mut() {
            stdin
                .flush()
                .map_err(|e| RaceError::capture(format!("failed to flush ffmpeg stdin: {e}")))?;
        }
        Ok(())
    }

    fn finish(&mut self) -> RaceResult<()> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| RaceError::capture("ffmpeg encoder not started"))?;
        let status = child
            .wait()
            .map_err(|e| RaceError::capture(format!("failed to wait for ffmpeg to finish: {e}")))?;

        let streamed = match self.stdout_reader.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| RaceError::capture("ffmpeg stdout reader thread panicked"))??,
            None => 0,
        };
        let stderr_bytes = self.join_stderr();
        self.cfg = None;

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(RaceError::capture(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }
        tracing::debug!(bytes = streamed, "ffmpeg encoder finished");
        Ok(())
    }

    fn abort(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill() {
                tracing::debug!(error = %e, "ffmpeg kill failed");
            }
            let _ = child.wait();
        }
        if let Some(handle) = self.stdout_reader.take() {
            let _ = handle.join();
        }
        let _ = self.join_stderr();
        self.cfg = None;
    }

    fn extension(&self) -> &'static str {
        "mp4"
    }
}

impl Drop for FfmpegEncoder {
    fn drop(&mut self) {
        if self.child.is_some() {
            self.abort();
        }
    }
}

fn push_input_fps(cmd: &mut Command, fps: Fps) {
    // For rawvideo input, `-r` before `-i` sets the input framerate.
    cmd.args(["-r", &format!("{}/{}", fps.num, fps.den)]);
}

/// Composite premultiplied RGBA8 over an opaque background, writing opaque straight RGBA8.
pub fn flatten_premul_over_bg_to_opaque_rgba8(
    dst: &mut [u8],
    src_premul: &[u8],
    bg_rgba: [u8; 4],
) -> RaceResult<()> {
    if dst.len() != src_premul.len() || !dst.len().is_multiple_of(4) {
        return Err(RaceError::validation(
            "flatten_premul_over_bg_to_opaque_rgba8 expects equal-length rgba8 buffers",
        ));
    }

    let bg_r = u16::from(bg_rgba[0]);
    let bg_g = u16::from(bg_rgba[1]);
    let bg_b = u16::from(bg_rgba[2]);

    for (d, s) in dst.chunks_exact_mut(4).zip(src_premul.chunks_exact(4)) {
        let a = u16::from(s[3]);
        if a == 255 {
            d.copy_from_slice(s);
            continue;
        }
        let inv = 255u16 - a;
        d[0] = (u16::from(s[0]) + mul_div255_u16(bg_r, inv)).min(255) as u8;
        d[1] = (u16::from(s[1]) + mul_div255_u16(bg_g, inv)).min(255) as u8;
        d[2] = (u16::from(s[2]) + mul_div255_u16(bg_b, inv)).min(255) as u8;
        d[3] = 255;
    }
    Ok(())
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> RaceResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}
