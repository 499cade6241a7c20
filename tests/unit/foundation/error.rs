use super::*;
use crate::data::table::ColumnRole;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        RaceError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(RaceError::render("x").to_string().contains("render error:"));
    assert!(RaceError::capture("x").to_string().contains("capture error:"));
    assert!(
        RaceError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn insufficient_data_names_the_observation_count() {
    let msg = RaceError::InsufficientData { observations: 1 }.to_string();
    assert!(msg.contains("fewer than two observations"));
    assert!(msg.contains("got 1"));
}

#[test]
fn missing_columns_render_one_line_per_entry() {
    let err = RaceError::MissingColumns(vec![
        MissingColumn {
            role: ColumnRole::Date,
            given: "year".to_string(),
        },
        MissingColumn {
            role: ColumnRole::Value,
            given: "gdp".to_string(),
        },
    ]);
    let msg = err.to_string();
    assert!(msg.starts_with("Date header name isn't called year\nValue header name isn't called gdp"));
    assert!(msg.ends_with("Please ensure your header names exist in the csv file."));
    assert!(err.is_input_error());
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = RaceError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
    assert!(!err.is_input_error());
}
