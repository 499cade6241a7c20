use super::*;

const NAMES: ColumnNames<'static> = ColumnNames {
    date: "date",
    label: "name",
    value: "value",
};

#[test]
fn reads_header_and_trimmed_rows() {
    let csv = "date, name ,value\n2000,A, 10\n2001,B,20\n";
    let table = Table::from_reader(csv.as_bytes(), b',').unwrap();
    assert_eq!(table.headers, vec!["date", "name", "value"]);
    assert_eq!(table.rows.len(), 2);
    assert_eq!(table.rows[0], vec!["2000", "A", "10"]);
}

#[test]
fn honors_custom_delimiter() {
    let tsv = "date\tname\tvalue\n2000\tA\t10\n";
    let table = Table::from_reader(tsv.as_bytes(), b'\t').unwrap();
    let idx = table.check_columns(NAMES).unwrap();
    assert_eq!(
        idx,
        ColumnIndices {
            date: 0,
            label: 1,
            value: 2
        }
    );
}

#[test]
fn missing_value_column_yields_exactly_one_entry() {
    let csv = "date,name,amount\n2000,A,10\n";
    let table = Table::from_reader(csv.as_bytes(), b',').unwrap();
    let err = table.check_columns(NAMES).unwrap_err();
    let RaceError::MissingColumns(missing) = err else {
        panic!("expected MissingColumns, got {err:?}");
    };
    assert_eq!(
        missing,
        vec![MissingColumn {
            role: ColumnRole::Value,
            given: "value".to_string(),
        }]
    );
}

#[test]
fn all_missing_columns_are_reported_in_role_order() {
    let csv = "a,b,c\n1,2,3\n";
    let table = Table::from_reader(csv.as_bytes(), b',').unwrap();
    let RaceError::MissingColumns(missing) = table.check_columns(NAMES).unwrap_err() else {
        panic!("expected MissingColumns");
    };
    let roles: Vec<_> = missing.iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![ColumnRole::Date, ColumnRole::Value, ColumnRole::Label]
    );
}

#[test]
fn tabular_extensions_are_case_insensitive() {
    assert!(is_tabular(Path::new("data/gdp.CSV")));
    assert!(is_tabular(Path::new("x.tsv")));
    assert!(!is_tabular(Path::new("x.json")));
    assert!(!is_tabular(Path::new("noext")));
}
