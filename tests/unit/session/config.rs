use super::*;

fn valid() -> RaceConfig {
    RaceConfig {
        input_file: Some(PathBuf::from("data.csv")),
        ..RaceConfig::default()
    }
}

#[test]
fn defaults_match_the_classic_race() {
    let cfg = RaceConfig::default();
    assert_eq!(cfg.visible_bar_count, 12);
    assert_eq!(cfg.interpolation_steps, 10);
    assert_eq!(cfg.transition().duration, Duration::from_millis(250));
    assert_eq!(cfg.grace(), Duration::from_secs(1));
    assert_eq!(cfg.canvas, Canvas::default());
    assert!(valid().validate().is_ok());
}

#[test]
fn missing_input_and_zero_bars_are_reported_together() {
    let cfg = RaceConfig {
        visible_bar_count: 0,
        ..RaceConfig::default()
    };
    let msg = cfg.validate().unwrap_err().to_string();
    assert!(msg.contains("visible bar count"));
    assert!(msg.contains("input file is required"));
}

#[test]
fn blank_column_names_are_rejected() {
    let cfg = RaceConfig {
        value_column: "  ".into(),
        ..valid()
    };
    let msg = cfg.validate().unwrap_err().to_string();
    assert!(msg.contains("value column name must not be empty"));
}

#[test]
fn odd_canvas_only_matters_for_ffmpeg() {
    let odd = Canvas {
        width: 321,
        height: 180,
    };
    let cfg = RaceConfig {
        canvas: odd,
        ..valid()
    };
    assert!(cfg.validate().is_err());
    let cfg = RaceConfig {
        canvas: odd,
        encoder: EncoderKind::Raw,
        ..valid()
    };
    assert!(cfg.validate().is_ok());
}

#[test]
fn json_fills_in_defaults() {
    let cfg = RaceConfig::from_json_str(
        r#"{"visible_bar_count": 5, "input_file": "x.tsv", "delimiter": "\t", "encoder": "raw", "ease": "in_out_cubic"}"#,
    )
    .unwrap();
    assert_eq!(cfg.visible_bar_count, 5);
    assert_eq!(cfg.delimiter_byte().unwrap(), b'\t');
    assert_eq!(cfg.encoder, EncoderKind::Raw);
    assert_eq!(cfg.ease, Ease::InOutCubic);
    assert_eq!(cfg.date_column, "date");
    assert!(cfg.validate().is_ok());

    let back = RaceConfig::from_json_str(&cfg.to_json_pretty().unwrap()).unwrap();
    assert_eq!(back, cfg);
}

#[test]
fn unknown_json_fields_are_serde_errors() {
    let err = RaceConfig::from_json_str(r#"{"bars": 3}"#).unwrap_err();
    assert!(matches!(err, RaceError::Serde(_)));
}

#[test]
fn non_ascii_delimiter_is_rejected() {
    let cfg = RaceConfig {
        delimiter: '§',
        ..valid()
    };
    assert!(cfg.validate().is_err());
    assert!(cfg.delimiter_byte().is_err());
}
