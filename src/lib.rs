//! barrace renders bar chart races to video.
//!
//! A race is built in stages:
//!
//! - Read a delimiter-separated table into a [`Series`]
//! - Expand it into a [`KeyframeSet`] of interpolated, ranked keyframes
//! - Play the keyframes through a [`SceneBinder`], which animates a retained [`Scene`]
//! - Mirror every scene mutation into a raster with [`MirrorRenderer`]
//! - Sample the raster on a fixed frame clock into a [`CaptureController`]
//!
//! [`Racer`] wires the stages together for one configured run.
#![forbid(unsafe_code)]

pub mod foundation {
    pub mod core;
    pub mod error;
    pub mod math;
}

pub mod animation {
    pub mod ease;
}

/// Tabular input, time series, and entity colours.
pub mod data {
    pub mod palette;
    pub mod series;
    pub mod table;
}

/// Ranking and keyframe interpolation.
pub mod race {
    pub mod keyframes;
    pub mod rank;
}

/// Retained scene model and the binder that animates it.
pub mod scene {
    pub mod axis;
    pub mod binder;
    pub mod model;
    pub mod scale;
}

/// CPU raster mirror of the scene.
pub mod render {
    pub mod backend;
    pub mod mirror;
    pub mod text;
}

/// Frame sampling, encoders, and artifact assembly.
pub mod capture {
    pub mod chunks;
    pub mod controller;
    pub mod encoder;
    pub mod ffmpeg;
}

pub mod session {
    pub mod config;
    pub mod run;
}

pub use crate::animation::ease::{Ease, TransitionSpec};
pub use crate::capture::controller::{Artifact, CaptureController, CaptureSettings, Recording};
pub use crate::capture::encoder::{RawFrameEncoder, StreamConfig, StreamEncoder};
pub use crate::capture::ffmpeg::{
    FfmpegEncoder, flatten_premul_over_bg_to_opaque_rgba8, is_ffmpeg_on_path,
};
pub use crate::data::series::{EntityId, Series, TimeAxis, TimeUnit, Universe};
pub use crate::data::table::{ColumnRole, MissingColumn, Table};
pub use crate::foundation::core::{Canvas, Fps, FrameIndex, Rgba8};
pub use crate::foundation::error::{RaceError, RaceResult};
pub use crate::race::keyframes::{Keyframe, KeyframeGenerator, KeyframeSet};
pub use crate::render::backend::{FrameRGBA, RasterSource};
pub use crate::render::mirror::MirrorRenderer;
pub use crate::render::text::TextPainter;
pub use crate::scene::binder::{SceneBinder, SceneObserver};
pub use crate::scene::model::{Scene, SceneLayout};
pub use crate::session::config::{EncoderKind, RaceConfig};
pub use crate::session::run::{RaceOutcome, RaceReport, Racer};
