use super::*;
use crate::data::table::Table;

fn table(csv: &str) -> Table {
    Table::from_reader(csv.as_bytes(), b',').unwrap()
}

const COLS: ColumnIndices = ColumnIndices {
    date: 0,
    label: 1,
    value: 2,
};

#[test]
fn rollup_orders_by_time_and_fills_absent_with_zero() {
    let t = table("date,name,value\n2001,B,20\n2000,A,10\n2000,B,40\n2001,A,50\n2002,C,7\n");
    let s = Series::from_table(&t, COLS, "%Y").unwrap();

    assert_eq!(s.time().unit, TimeUnit::Year);
    let names: Vec<_> = s.universe().ids().map(|id| s.universe().name(id)).collect();
    assert_eq!(names, vec!["B", "A", "C"]);

    let ts: Vec<_> = s.entries().iter().map(|e| e.timestamp).collect();
    assert_eq!(ts, vec![2000.0, 2001.0, 2002.0]);

    let a = s.universe().get("A").unwrap();
    let b = s.universe().get("B").unwrap();
    let c = s.universe().get("C").unwrap();
    assert_eq!(s.entries()[0].value(a), 10.0);
    assert_eq!(s.entries()[0].value(b), 40.0);
    assert_eq!(s.entries()[0].value(c), 0.0);
    assert_eq!(s.entries()[2].value(c), 7.0);
    assert_eq!(s.entries()[2].value(a), 0.0);
}

#[test]
fn first_duplicate_row_wins() {
    let t = table("date,name,value\n2000,A,1\n2000,A,99\n2001,A,2\n");
    let s = Series::from_table(&t, COLS, "%Y").unwrap();
    let a = s.universe().get("A").unwrap();
    assert_eq!(s.entries()[0].value(a), 1.0);
}

#[test]
fn empty_value_cells_count_as_absent() {
    let t = table("date,name,value\n2000,A,\n2001,A,5\n");
    let s = Series::from_table(&t, COLS, "%Y").unwrap();
    let a = s.universe().get("A").unwrap();
    assert_eq!(s.entries()[0].value(a), 0.0);
}

#[test]
fn non_numeric_values_are_rejected_with_row_number() {
    let t = table("date,name,value\n2000,A,1\n2001,A,lots\n");
    let err = Series::from_table(&t, COLS, "%Y").unwrap_err();
    assert!(err.to_string().contains("row 3"));
}

#[test]
fn calendar_dates_become_epoch_millis() {
    let t = table("date,name,value\n2020-01-01,A,1\n2021-06-15,A,2\n");
    let s = Series::from_table(&t, COLS, "%Y-%m").unwrap();
    assert_eq!(s.time().unit, TimeUnit::EpochMillis);
    assert_eq!(s.time().format(s.entries()[1].timestamp), "2021-06");
    assert_eq!(s.entries()[0].timestamp, 1_577_836_800_000.0);
}

#[test]
fn single_number_date_is_not_a_year() {
    let t = table("date,name,value\n2000,A,1\n2000,B,2\n");
    let s = Series::from_table(&t, COLS, "%Y").unwrap();
    assert_eq!(s.time().unit, TimeUnit::EpochMillis);
    assert_eq!(s.len(), 1);
}

#[test]
fn mixed_date_kinds_are_rejected() {
    let t = table("date,name,value\n2000,A,1\n2001-01-01,A,2\n");
    assert!(Series::from_table(&t, COLS, "%Y").is_err());
}

#[test]
fn year_ticker_floors_interpolated_years() {
    let axis = TimeAxis::new(TimeUnit::Year, "%Y").unwrap();
    assert_eq!(axis.format(2000.0), "2000");
    assert_eq!(axis.format(2000.9), "2000");
}

#[test]
fn invalid_ticker_patterns_are_rejected() {
    assert!(TimeAxis::new(TimeUnit::EpochMillis, "%Q").is_err());
}

#[test]
fn constructor_rejects_unordered_timestamps() {
    let universe = Universe::from_names(["A"]);
    let axis = TimeAxis::new(TimeUnit::Year, "%Y").unwrap();
    let entries = vec![
        SeriesEntry {
            timestamp: 2001.0,
            values: vec![1.0],
        },
        SeriesEntry {
            timestamp: 2001.0,
            values: vec![2.0],
        },
    ];
    assert!(Series::new(universe, entries, axis).is_err());
}
