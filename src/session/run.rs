//! One race end to end: input, keyframes, scene playback, mirror, capture.

use std::path::PathBuf;
use std::time::Duration;

use crate::capture::controller::{Artifact, CaptureController, CaptureSettings};
use crate::capture::encoder::{RawFrameEncoder, StreamEncoder};
use crate::capture::ffmpeg::FfmpegEncoder;
use crate::data::series::Series;
use crate::data::table::{Table, is_tabular};
use crate::foundation::core::Rgba8;
use crate::foundation::error::{RaceError, RaceResult};
use crate::race::keyframes::{KeyframeGenerator, KeyframeSet};
use crate::render::mirror::MirrorRenderer;
use crate::render::text::TextPainter;
use crate::scene::binder::{SceneBinder, SceneObserver};
use crate::scene::model::{Scene, SceneChange, SceneLayout};
use crate::session::config::{EncoderKind, RaceConfig};

/// Summary of a completed race.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RaceReport {
    pub artifact: Artifact,
    pub keyframes: usize,
    pub entities: usize,
    pub time_points: usize,
    pub frames: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RaceOutcome {
    /// The input was not a tabular file; nothing was attempted.
    Skipped,
    Completed(RaceReport),
}

/// Read the configured input into a [`Series`].
///
/// Returns `Ok(None)` for inputs that are not tabular files.
pub fn load_series(cfg: &RaceConfig) -> RaceResult<Option<Series>> {
    let path = cfg
        .input_file
        .as_deref()
        .ok_or_else(|| RaceError::validation("input file is required"))?;
    if !is_tabular(path) {
        return Ok(None);
    }
    let table = Table::read(path, cfg.delimiter_byte()?)?;
    let cols = table.check_columns(cfg.column_names())?;
    Series::from_table(&table, cols, &cfg.ticker_format).map(Some)
}

pub fn build_keyframes(cfg: &RaceConfig, series: &Series) -> RaceResult<KeyframeSet> {
    KeyframeGenerator {
        steps: cfg.interpolation_steps,
        visible: cfg.visible_bar_count,
    }
    .generate(series)
}

pub fn encoder_for(kind: EncoderKind) -> Box<dyn StreamEncoder> {
    match kind {
        EncoderKind::Ffmpeg => Box::new(FfmpegEncoder::new(Rgba8::WHITE)),
        EncoderKind::Raw => Box::new(RawFrameEncoder::new()),
    }
}

/// `cfg.output` with the extension of the artifact its encoder produces.
pub fn artifact_path(cfg: &RaceConfig) -> PathBuf {
    cfg.output.with_extension(encoder_for(cfg.encoder).extension())
}

/// Mirror plus capture, fed by the binder.
struct Stage<'a> {
    mirror: &'a mut MirrorRenderer,
    capture: &'a mut CaptureController,
}

impl SceneObserver for Stage<'_> {
    fn on_mutation(&mut self, scene: &Scene, change: SceneChange) -> RaceResult<()> {
        self.mirror.on_mutation(scene, change)
    }

    fn on_tick(&mut self, _scene: &Scene, at: Duration) -> RaceResult<()> {
        self.capture.capture(at, &*self.mirror)
    }
}

/// Runs races one after another, owning the capture stream of the current one.
///
/// Starting a run disposes whatever capture a previous run left behind.
#[derive(Debug, Default)]
pub struct Racer {
    active: Option<CaptureController>,
}

impl Racer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn run(&mut self, cfg: &RaceConfig) -> RaceResult<RaceOutcome> {
        self.run_with_encoder(cfg, encoder_for(cfg.encoder))
    }

    #[tracing::instrument(skip_all, fields(input = ?cfg.input_file, output = %cfg.output.display()))]
    pub fn run_with_encoder(
        &mut self,
        cfg: &RaceConfig,
        encoder: Box<dyn StreamEncoder>,
    ) -> RaceResult<RaceOutcome> {
        self.dispose();
        cfg.validate()?;

        let Some(series) = load_series(cfg)? else {
            tracing::info!("input is not a tabular file; race skipped");
            return Ok(RaceOutcome::Skipped);
        };
        let keyframes = build_keyframes(cfg, &series)?;
        tracing::info!(
            entities = series.universe().len(),
            time_points = series.len(),
            keyframes = keyframes.len(),
            "race prepared"
        );

        let result = self.play(cfg, &series, &keyframes, encoder);
        self.dispose();
        let artifact = result?;
        Ok(RaceOutcome::Completed(RaceReport {
            frames: artifact.frame_count,
            artifact,
            keyframes: keyframes.len(),
            entities: series.universe().len(),
            time_points: series.len(),
        }))
    }

    fn play(
        &mut self,
        cfg: &RaceConfig,
        series: &Series,
        keyframes: &KeyframeSet,
        encoder: Box<dyn StreamEncoder>,
    ) -> RaceResult<Artifact> {
        let layout = SceneLayout::new(cfg.canvas, cfg.visible_bar_count)?;
        let text = TextPainter::load(cfg.font.as_deref(), cfg.bold_font.as_deref())?;
        let mut mirror = MirrorRenderer::new(cfg.canvas, text)?;
        let mut binder = SceneBinder::new(layout, series);

        let capture = self.active.insert(CaptureController::new(
            encoder,
            CaptureSettings {
                canvas: cfg.canvas,
                fps: cfg.fps,
                grace: cfg.grace(),
                output: cfg.output.clone(),
            },
        ));
        let recording = capture.record(cfg.chunk_interval())?;
        binder.play(
            keyframes,
            &cfg.transition(),
            &mut Stage {
                mirror: &mut mirror,
                capture: &mut *capture,
            },
        )?;
        tracing::debug!(
            renders = mirror.render_count(),
            frames = capture.frames_captured(),
            "playback finished"
        );
        capture.stop()?;
        recording.wait()
    }

    /// Tear down any capture still held from an earlier run.
    pub fn dispose(&mut self) {
        if let Some(mut capture) = self.active.take() {
            capture.dispose();
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/run.rs"]
mod tests;
