use std::path::{Path, PathBuf};

use super::*;
use crate::capture::controller::CaptureState;
use crate::foundation::core::Canvas;
use crate::render::backend::FrameRGBA;

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "barrace_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
    let p = dir.join(name);
    std::fs::write(&p, body).unwrap();
    p
}

fn small_config(dir: &Path, input: PathBuf) -> RaceConfig {
    RaceConfig {
        visible_bar_count: 2,
        input_file: Some(input),
        output: dir.join("out").join("race.rgba"),
        canvas: Canvas {
            width: 64,
            height: 36,
        },
        interpolation_steps: 2,
        grace_ms: 5,
        chunk_interval_ms: 0,
        encoder: EncoderKind::Raw,
        ..RaceConfig::default()
    }
}

const RACE_CSV: &str = "date,name,value\n2000,A,10\n2000,B,40\n2000,C,5\n2001,A,50\n2001,B,20\n2001,C,30\n";

#[test]
fn raw_race_produces_every_sampled_frame() {
    let dir = temp_dir("run_raw");
    let cfg = small_config(&dir, write(&dir, "race.csv", RACE_CSV));
    let mut racer = Racer::new();
    let RaceOutcome::Completed(report) = racer.run(&cfg).unwrap() else {
        panic!("race skipped");
    };
    assert_eq!(report.keyframes, 2 + 2);
    assert_eq!(report.entities, 3);
    assert_eq!(report.time_points, 2);
    assert!(report.frames > 0);

    let bytes = std::fs::read(&report.artifact.path).unwrap();
    let frame_len = FrameRGBA::byte_len(64, 36) as u64;
    assert_eq!(bytes.len() as u64, report.frames * frame_len);
    assert_eq!(report.artifact.bytes, bytes.len() as u64);
    // Four transitions of 15 ticks at 16_666_666 ns end just short of 1 s,
    // so the 25 fps samples are 0, 40, ..., 960 ms.
    assert_eq!(report.frames, 25);
    assert!(racer.active.is_none());
}

#[test]
fn non_tabular_input_is_skipped() {
    let dir = temp_dir("run_skip");
    let cfg = small_config(&dir, write(&dir, "race.json", "{}"));
    assert_eq!(Racer::new().run(&cfg).unwrap(), RaceOutcome::Skipped);
    assert!(!cfg.output.exists());
}

#[test]
fn missing_value_column_stops_before_keyframes() {
    let dir = temp_dir("run_missing");
    let mut cfg = small_config(&dir, write(&dir, "race.csv", RACE_CSV));
    cfg.value_column = "amount".into();
    let err = Racer::new().run(&cfg).unwrap_err();
    match err {
        RaceError::MissingColumns(missing) => {
            assert_eq!(missing.len(), 1);
            assert_eq!(missing[0].role.to_string(), "Value");
            assert_eq!(missing[0].given, "amount");
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(!cfg.output.exists());
}

#[test]
fn single_time_point_is_insufficient() {
    let dir = temp_dir("run_single");
    let cfg = small_config(
        &dir,
        write(&dir, "race.csv", "date,name,value\n2000,A,1\n2000,B,2\n"),
    );
    let err = Racer::new().run(&cfg).unwrap_err();
    assert!(matches!(err, RaceError::InsufficientData { observations: 1 }));
}

#[test]
fn invalid_config_never_reads_input() {
    let dir = temp_dir("run_invalid");
    let mut cfg = small_config(&dir, dir.join("does-not-exist.csv"));
    cfg.visible_bar_count = 0;
    let err = Racer::new().run(&cfg).unwrap_err();
    assert!(matches!(err, RaceError::Validation(_)));
}

#[test]
fn new_run_disposes_a_leftover_capture() {
    let dir = temp_dir("run_dispose");
    let cfg = small_config(&dir, write(&dir, "race.csv", RACE_CSV));
    let mut racer = Racer::new();
    let mut stale = CaptureController::new(
        Box::new(RawFrameEncoder::new()),
        CaptureSettings {
            canvas: cfg.canvas,
            fps: cfg.fps,
            grace: Duration::ZERO,
            output: dir.join("stale.rgba"),
        },
    );
    let recording = stale.record(Duration::ZERO).unwrap();
    assert_eq!(stale.state(), CaptureState::Recording);
    racer.active = Some(stale);

    assert!(matches!(racer.run(&cfg).unwrap(), RaceOutcome::Completed(_)));
    assert!(recording.wait().is_err());
    assert!(!dir.join("stale.rgba").exists());
}

#[test]
fn artifact_path_follows_the_encoder() {
    let raw = RaceConfig {
        encoder: EncoderKind::Raw,
        ..RaceConfig::default()
    };
    assert_eq!(artifact_path(&raw), PathBuf::from("race.rgba"));
    assert_eq!(artifact_path(&RaceConfig::default()), PathBuf::from("race.mp4"));
}
