//! Configuration surface collected before a race starts.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;

use crate::animation::ease::{Ease, TransitionSpec};
use crate::data::series::validate_strftime;
use crate::data::table::ColumnNames;
use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{RaceError, RaceResult};

/// Which capture stream backs the artifact.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncoderKind {
    /// H.264 in fragmented MP4 through the system `ffmpeg`.
    #[default]
    Ffmpeg,
    /// Uncompressed premultiplied RGBA8 frames.
    Raw,
}

/// Everything one race run needs.
///
/// Loadable from JSON; absent fields take the defaults below.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RaceConfig {
    /// Bars shown on screen (`N`).
    pub visible_bar_count: usize,
    pub date_column: String,
    pub label_column: String,
    pub value_column: String,
    pub input_file: Option<PathBuf>,
    pub delimiter: char,
    pub output: PathBuf,
    pub canvas: Canvas,
    pub fps: Fps,
    /// Keyframes emitted per series segment (`K`).
    pub interpolation_steps: usize,
    pub transition_ms: u64,
    pub animation_hz: u32,
    pub ease: Ease,
    pub chunk_interval_ms: u64,
    /// Wait between the final flush and stopping the stream.
    pub grace_ms: u64,
    /// strftime pattern for calendar timestamps on the ticker.
    pub ticker_format: String,
    pub font: Option<PathBuf>,
    pub bold_font: Option<PathBuf>,
    pub encoder: EncoderKind,
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            visible_bar_count: 12,
            date_column: "date".to_string(),
            label_column: "name".to_string(),
            value_column: "value".to_string(),
            input_file: None,
            delimiter: ',',
            output: PathBuf::from("race.mp4"),
            canvas: Canvas::default(),
            fps: Fps { num: 25, den: 1 },
            interpolation_steps: 10,
            transition_ms: 250,
            animation_hz: 60,
            ease: Ease::Linear,
            chunk_interval_ms: 2000,
            grace_ms: 1000,
            ticker_format: "%Y".to_string(),
            font: None,
            bold_font: None,
            encoder: EncoderKind::Ffmpeg,
        }
    }
}

impl RaceConfig {
    pub fn from_json_str(s: &str) -> RaceResult<Self> {
        serde_json::from_str(s).map_err(|e| RaceError::serde(format!("race config: {e}")))
    }

    pub fn load(path: &Path) -> RaceResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        Self::from_json_str(&text)
    }

    pub fn to_json_pretty(&self) -> RaceResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| RaceError::serde(e.to_string()))
    }

    /// Check every field and report all problems at once.
    pub fn validate(&self) -> RaceResult<()> {
        let mut problems = Vec::new();

        if self.visible_bar_count == 0 {
            problems.push("visible bar count must be a positive integer".to_string());
        }
        for (what, name) in [
            ("date", &self.date_column),
            ("label", &self.label_column),
            ("value", &self.value_column),
        ] {
            if name.trim().is_empty() {
                problems.push(format!("{what} column name must not be empty"));
            }
        }
        match &self.input_file {
            None => problems.push("input file is required".to_string()),
            Some(p) if p.as_os_str().is_empty() => {
                problems.push("input file is required".to_string());
            }
            Some(_) => {}
        }
        if !self.delimiter.is_ascii() {
            problems.push(format!("delimiter '{}' must be a single ASCII character", self.delimiter));
        }
        if self.output.as_os_str().is_empty() {
            problems.push("output path must not be empty".to_string());
        }
        if let Err(e) = self.canvas.validate() {
            problems.push(e.to_string());
        } else if self.encoder == EncoderKind::Ffmpeg
            && (!self.canvas.width.is_multiple_of(2) || !self.canvas.height.is_multiple_of(2))
        {
            problems.push("canvas width/height must be even for yuv420p video".to_string());
        }
        if let Err(e) = Fps::new(self.fps.num, self.fps.den) {
            problems.push(e.to_string());
        }
        if self.interpolation_steps == 0 {
            problems.push("interpolation steps must be > 0".to_string());
        }
        if let Err(e) = self.transition().validate() {
            problems.push(e.to_string());
        }
        if let Err(e) = validate_strftime(&self.ticker_format) {
            problems.push(e.to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(RaceError::validation(problems.join("; ")))
        }
    }

    pub fn column_names(&self) -> ColumnNames<'_> {
        ColumnNames {
            date: &self.date_column,
            label: &self.label_column,
            value: &self.value_column,
        }
    }

    pub fn delimiter_byte(&self) -> RaceResult<u8> {
        u8::try_from(self.delimiter)
            .ok()
            .filter(u8::is_ascii)
            .ok_or_else(|| RaceError::validation("delimiter must be a single ASCII character"))
    }

    pub fn transition(&self) -> TransitionSpec {
        TransitionSpec {
            duration: Duration::from_millis(self.transition_ms),
            ease: self.ease,
            animation_hz: self.animation_hz,
        }
    }

    pub fn chunk_interval(&self) -> Duration {
        Duration::from_millis(self.chunk_interval_ms)
    }

    pub fn grace(&self) -> Duration {
        Duration::from_millis(self.grace_ms)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/config.rs"]
mod tests;
