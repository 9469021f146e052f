//! Parser for the time-series text format: a fixed 13 line `key,value`
//! preamble followed by a two column CSV body.

use crate::{parse_timestamp, AcquireError, RawSeriesHeader, TimeSeries};

pub const HEADER_LINES: usize = 13;
pub const MIN_RESPONSE_LEN: usize = 100;
pub const TIMESTAMP_COLUMN: &str = "Timestamp";

const ERROR_MARKERS: [&str; 2] = ["Error", "error"];
const FILL_VALUES: [&str; 2] = ["-9999", "-9999.0"];

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSeries {
    pub header: RawSeriesHeader,
    pub series: TimeSeries,
    /// Non-fatal problems found in the preamble
    pub warnings: Vec<String>,
}

impl ParsedSeries {
    /// Always `["Timestamp", <param_name>]`
    pub fn columns(&self) -> [&str; 2] {
        [TIMESTAMP_COLUMN, self.header.param_name().unwrap_or_default()]
    }
}

/// Parse a raw response in strict mode: one bad timestamp or value rejects
/// the whole response.
pub fn parse_time_series(raw: &str) -> Result<ParsedSeries, AcquireError> {
    let length = raw.chars().count();
    if length < MIN_RESPONSE_LEN {
        return Err(AcquireError::MalformedResponse(format!(
            "response too short ({} chars): {}",
            length,
            raw.trim()
        )));
    }
    if ERROR_MARKERS.iter().any(|marker| raw.contains(marker)) {
        return Err(AcquireError::MalformedResponse(format!(
            "service reported an error: {}",
            preview(raw)
        )));
    }

    let mut lines = raw.lines().enumerate();
    let mut header = RawSeriesHeader::default();
    let mut warnings = Vec::new();

    for row in 0..HEADER_LINES {
        let Some((_, line)) = lines.next() else {
            return Err(AcquireError::MalformedResponse(format!(
                "header ended after {} of {} lines",
                row, HEADER_LINES
            )));
        };
        let line = line.trim();
        if line.is_empty() {
            return Err(AcquireError::MalformedResponse(format!(
                "empty header line at row {}",
                row
            )));
        }
        match line.split_once(',') {
            Some((key, value)) => header.insert(key.trim(), value.trim()),
            None => warnings.push(format!("header line without comma skipped: {}", line)),
        }
    }

    if header.param_name().is_none() {
        return Err(AcquireError::MissingParameterName);
    }

    let mut series = TimeSeries::default();
    let mut seen_column_header = false;
    for (index, line) in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let line_number = index + 1;
        let (time_cell, value_cell) = line.split_once(',').unwrap_or((line, ""));

        let Some(time) = parse_timestamp(time_cell) else {
            if !seen_column_header && series.is_empty() {
                seen_column_header = true;
                continue;
            }
            return Err(AcquireError::InvalidTimestamp {
                line: line_number,
                value: time_cell.to_string(),
            });
        };
        seen_column_header = true;

        let value = parse_value(value_cell).ok_or_else(|| AcquireError::InvalidValue {
            line: line_number,
            value: value_cell.to_string(),
        })?;
        series.push(time, value);
    }

    Ok(ParsedSeries {
        header,
        series,
        warnings,
    })
}

/// `Some(None)` is a null reading, `None` an unreadable cell
fn parse_value(cell: &str) -> Option<Option<f64>> {
    let cell = cell.trim();
    if cell.is_empty() || cell.eq_ignore_ascii_case("nan") || FILL_VALUES.contains(&cell) {
        return Some(None);
    }
    cell.parse::<f64>()
        .ok()
        .map(|v| if v.is_nan() { None } else { Some(v) })
}

fn preview(raw: &str) -> String {
    let cut: String = raw.chars().take(200).collect();
    format!("{}...", cut.trim())
}
