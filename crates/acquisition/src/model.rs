use std::collections::{btree_map, BTreeMap};

use serde::Serialize;
use time::{
    format_description::well_known::Rfc3339, macros::format_description, OffsetDateTime,
    PrimitiveDateTime,
};

use crate::VariableDescriptor;

/// Canonical timestamp type, always UTC
pub type Timestamp = OffsetDateTime;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ModelError {
    #[error("latitude {0} is outside [-90, 90]")]
    Latitude(f64),
    #[error("longitude {0} is outside [-180, 180]")]
    Longitude(f64),
    #[error("invalid timestamp '{0}'")]
    Timestamp(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Result<Self, ModelError> {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(ModelError::Latitude(lat));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(ModelError::Longitude(lon));
        }
        Ok(Self { lat, lon })
    }
}

/// Requested time range. `start < end` is expected but never enforced,
/// an inverted window goes upstream untouched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl TimeWindow {
    pub fn new(start: Timestamp, end: Timestamp) -> Self {
        Self { start, end }
    }

    pub fn parse(start: &str, end: &str) -> Result<Self, ModelError> {
        let start = parse_timestamp(start).ok_or_else(|| ModelError::Timestamp(start.into()))?;
        let end = parse_timestamp(end).ok_or_else(|| ModelError::Timestamp(end.into()))?;
        Ok(Self { start, end })
    }

    pub fn is_inverted(&self) -> bool {
        self.start >= self.end
    }
}

/// Parse a timestamp cell into UTC.
///
/// Accepts RFC 3339 and the offset-less `YYYY-MM-DDThh:mm[:ss]`,
/// `YYYY-MM-DD hh:mm[:ss]` and `YYYY-MM-DD` forms, which are read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<Timestamp> {
    let raw = raw.trim();
    if let Ok(ts) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(ts.to_offset(time::UtcOffset::UTC));
    }

    let naive = [
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
        format_description!("[year]-[month]-[day]T[hour]:[minute]"),
        format_description!("[year]-[month]-[day] [hour]:[minute]"),
    ];
    for format in naive {
        if let Ok(dt) = PrimitiveDateTime::parse(raw, format) {
            return Some(dt.assume_utc());
        }
    }

    time::Date::parse(raw, format_description!("[year]-[month]-[day]"))
        .ok()
        .map(|date| date.midnight().assume_utc())
}

/// Render a timestamp as `YYYY-MM-DDThh:mm:ss` (UTC, no offset)
pub fn format_timestamp(ts: &Timestamp) -> String {
    let utc = ts.to_offset(time::UtcOffset::UTC);
    utc.format(format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second]"
    ))
    .unwrap_or_else(|_| utc.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub time: Timestamp,
    pub value: Option<f64>,
}

/// Ordered readings for one variable. Timestamps need not be uniformly
/// spaced nor aligned with other variables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSeries {
    readings: Vec<Reading>,
}

impl TimeSeries {
    pub fn new(readings: Vec<Reading>) -> Self {
        Self { readings }
    }

    pub fn push(&mut self, time: Timestamp, value: Option<f64>) {
        self.readings.push(Reading { time, value });
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    pub fn iter(&self) -> impl Iterator<Item = &Reading> {
        self.readings.iter()
    }

    /// Non-null values in series order
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.readings.iter().filter_map(|r| r.value)
    }

    pub fn sort_by_time(&mut self) {
        self.readings.sort_by_key(|r| r.time);
    }
}

impl FromIterator<(Timestamp, Option<f64>)> for TimeSeries {
    fn from_iter<T: IntoIterator<Item = (Timestamp, Option<f64>)>>(iter: T) -> Self {
        Self {
            readings: iter
                .into_iter()
                .map(|(time, value)| Reading { time, value })
                .collect(),
        }
    }
}

/// Key/value preamble of a text time-series response
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RawSeriesHeader(BTreeMap<String, String>);

impl RawSeriesHeader {
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn param_name(&self) -> Option<&str> {
        self.get("param_name")
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Where a variable's series came from
#[derive(Debug, Clone, PartialEq)]
pub enum SeriesMetadata {
    Header(RawSeriesHeader),
    Granules {
        collection: String,
        variable: String,
        granules_used: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableData {
    pub descriptor: VariableDescriptor,
    pub metadata: SeriesMetadata,
    pub series: TimeSeries,
}

/// Successfully fetched variables keyed by name. A variable missing from
/// the map failed to fetch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeatherDataset {
    variables: BTreeMap<String, VariableData>,
}

impl WeatherDataset {
    pub fn insert(&mut self, name: impl Into<String>, data: VariableData) {
        self.variables.insert(name.into(), data);
    }

    pub fn get(&self, name: &str) -> Option<&VariableData> {
        self.variables.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, VariableData> {
        self.variables.iter()
    }
}

impl<'a> IntoIterator for &'a WeatherDataset {
    type Item = (&'a String, &'a VariableData);
    type IntoIter = btree_map::Iter<'a, String, VariableData>;

    fn into_iter(self) -> Self::IntoIter {
        self.variables.iter()
    }
}
