//! Time series construction from raw table rows.

use std::collections::HashMap;

use crate::data::table::{ColumnIndices, Table};
use crate::foundation::error::{RaceError, RaceResult};

/// Dense identifier of an entity within a [`Universe`].
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct EntityId(pub u32);

impl EntityId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The closed, ordered set of entity names known before generation.
///
/// Iteration order is first-appearance order in the input, which also fixes the order of ties
/// when ranking.
#[derive(Clone, Debug, Default)]
pub struct Universe {
    names: Vec<String>,
    index: HashMap<String, EntityId>,
}

impl Universe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_names<S: AsRef<str>>(names: impl IntoIterator<Item = S>) -> Self {
        let mut out = Self::new();
        for n in names {
            out.intern(n.as_ref());
        }
        out
    }

    /// Return the id for `name`, registering it on first sight.
    pub fn intern(&mut self, name: &str) -> EntityId {
        if let Some(id) = self.index.get(name) {
            return *id;
        }
        let id = EntityId(self.names.len() as u32);
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), id);
        id
    }

    pub fn get(&self, name: &str) -> Option<EntityId> {
        self.index.get(name).copied()
    }

    pub fn name(&self, id: EntityId) -> &str {
        self.names.get(id.index()).map(String::as_str).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        (0..self.names.len() as u32).map(EntityId)
    }
}

/// Linear unit the numeric timestamps are expressed in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub enum TimeUnit {
    /// Plain calendar years (e.g. `1999.0`).
    Year,
    /// Milliseconds since the Unix epoch, UTC.
    EpochMillis,
}

/// Unit plus display pattern for ticker text.
#[derive(Clone, Debug, PartialEq)]
pub struct TimeAxis {
    pub unit: TimeUnit,
    pub pattern: String,
}

impl TimeAxis {
    pub fn new(unit: TimeUnit, pattern: impl Into<String>) -> RaceResult<Self> {
        let pattern = pattern.into();
        validate_strftime(&pattern)?;
        Ok(Self { unit, pattern })
    }

    /// Ticker text for a (possibly interpolated) timestamp.
    ///
    /// Years print as the floored year; epoch timestamps use the strftime pattern.
    pub fn format(&self, ts: f64) -> String {
        match self.unit {
            TimeUnit::Year => format!("{}", ts.floor() as i64),
            TimeUnit::EpochMillis => {
                use std::fmt::Write as _;
                let Some(dt) = chrono::DateTime::from_timestamp_millis(ts.round() as i64) else {
                    return String::new();
                };
                let mut out = String::new();
                if write!(out, "{}", dt.format(&self.pattern)).is_err() {
                    out.clear();
                }
                out
            }
        }
    }
}

pub(crate) fn validate_strftime(pattern: &str) -> RaceResult<()> {
    use chrono::format::{Item, StrftimeItems};
    if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
        return Err(RaceError::validation(format!(
            "invalid ticker format pattern '{pattern}'"
        )));
    }
    Ok(())
}

/// One distinct time point with a value per universe entity (absent entities hold `0`).
#[derive(Clone, Debug, PartialEq)]
pub struct SeriesEntry {
    pub timestamp: f64,
    pub values: Vec<f64>,
}

impl SeriesEntry {
    pub fn value(&self, id: EntityId) -> f64 {
        self.values.get(id.index()).copied().unwrap_or(0.0)
    }
}

/// Ordered-by-timestamp observations over a closed entity universe.
#[derive(Clone, Debug)]
pub struct Series {
    universe: Universe,
    entries: Vec<SeriesEntry>,
    time: TimeAxis,
}

impl Series {
    /// Build a series, checking strictly increasing timestamps and finite values.
    pub fn new(universe: Universe, entries: Vec<SeriesEntry>, time: TimeAxis) -> RaceResult<Self> {
        for pair in entries.windows(2) {
            if pair[1].timestamp <= pair[0].timestamp {
                return Err(RaceError::validation(
                    "series timestamps must be strictly increasing",
                ));
            }
        }
        for e in &entries {
            if !e.timestamp.is_finite() {
                return Err(RaceError::validation("series timestamps must be finite"));
            }
            if e.values.len() > universe.len() {
                return Err(RaceError::validation(
                    "series entry has more values than the entity universe",
                ));
            }
            if e.values.iter().any(|v| !v.is_finite()) {
                return Err(RaceError::validation("series values must be finite"));
            }
        }
        Ok(Self {
            universe,
            entries,
            time,
        })
    }

    pub fn universe(&self) -> &Universe {
        &self.universe
    }

    pub fn entries(&self) -> &[SeriesEntry] {
        &self.entries
    }

    pub fn time(&self) -> &TimeAxis {
        &self.time
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Roll table rows up into a series.
    ///
    /// The first row seen for a `(date, entity)` pair wins; empty value cells count as absent.
    #[tracing::instrument(skip(table), fields(rows = table.rows.len()))]
    pub fn from_table(
        table: &Table,
        cols: ColumnIndices,
        ticker_pattern: &str,
    ) -> RaceResult<Self> {
        if table.rows.is_empty() {
            return Err(RaceError::validation("input table has no data rows"));
        }

        let mut universe = Universe::new();
        let mut observations = Vec::with_capacity(table.rows.len());
        for (i, row) in table.rows.iter().enumerate() {
            let line = i + 2;
            let cell = |idx: usize| row.get(idx).map(String::as_str).unwrap_or("");

            let date = parse_date_cell(cell(cols.date))
                .map_err(|msg| RaceError::validation(format!("row {line}: {msg}")))?;
            let entity = universe.intern(cell(cols.label));
            let raw_value = cell(cols.value);
            let value = if raw_value.is_empty() {
                None
            } else {
                Some(parse_number(raw_value).ok_or_else(|| {
                    RaceError::validation(format!(
                        "row {line}: value '{raw_value}' is not a number"
                    ))
                })?)
            };
            observations.push((date, entity, value));
        }

        let unit = infer_unit(observations.iter().map(|(d, _, _)| *d))?;
        let mut stamped: Vec<(f64, EntityId, Option<f64>)> = observations
            .into_iter()
            .map(|(d, e, v)| (d.value(), e, v))
            .collect();
        stamped.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut entries: Vec<SeriesEntry> = Vec::new();
        let mut seen: Vec<bool> = Vec::new();
        for (ts, entity, value) in stamped {
            if entries.last().map(|e| e.timestamp) != Some(ts) {
                entries.push(SeriesEntry {
                    timestamp: ts,
                    values: vec![0.0; universe.len()],
                });
                seen = vec![false; universe.len()];
            }
            let Some(entry) = entries.last_mut() else {
                continue;
            };
            if !seen[entity.index()] {
                seen[entity.index()] = true;
                entry.values[entity.index()] = value.unwrap_or(0.0);
            }
        }

        tracing::debug!(
            entities = universe.len(),
            time_points = entries.len(),
            unit = ?unit,
            "rolled up series"
        );
        Self::new(universe, entries, TimeAxis::new(unit, ticker_pattern)?)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum RawDate {
    Number(f64),
    Millis(f64),
}

impl RawDate {
    fn value(self) -> f64 {
        match self {
            Self::Number(v) | Self::Millis(v) => v,
        }
    }
}

fn parse_number(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_date_cell(s: &str) -> Result<RawDate, String> {
    if s.is_empty() {
        return Err("empty date cell".to_string());
    }
    if let Some(v) = parse_number(s) {
        return Ok(RawDate::Number(v));
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Ok(RawDate::Millis(dt.timestamp_millis() as f64));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(RawDate::Millis(dt.and_utc().timestamp_millis() as f64));
        }
    }
    if let Ok(d) = chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
        && let Some(dt) = d.and_hms_opt(0, 0, 0)
    {
        return Ok(RawDate::Millis(dt.and_utc().timestamp_millis() as f64));
    }
    Err(format!("date '{s}' is neither a number nor a calendar date"))
}

/// Plain numbers below 3000 spanning more than one value are years; other numbers are epoch
/// milliseconds.
fn infer_unit(dates: impl Iterator<Item = RawDate>) -> RaceResult<TimeUnit> {
    let mut numeric = 0usize;
    let mut calendar = 0usize;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for d in dates {
        match d {
            RawDate::Number(v) => {
                numeric += 1;
                min = min.min(v);
                max = max.max(v);
            }
            RawDate::Millis(_) => calendar += 1,
        }
    }
    match (numeric, calendar) {
        (0, _) => Ok(TimeUnit::EpochMillis),
        (_, 0) if max < 3000.0 && max != min => Ok(TimeUnit::Year),
        (_, 0) => Ok(TimeUnit::EpochMillis),
        _ => Err(RaceError::validation(
            "date column mixes plain numbers and calendar dates",
        )),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/data/series.rs"]
mod tests;
