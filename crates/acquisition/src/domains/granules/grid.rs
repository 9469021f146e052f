//! In-memory gridded dataset decoded from one granule file.

use time::Duration;

use crate::{parse_timestamp, AcquireError, Timestamp};

/// A 1-D coordinate axis, e.g. `lat` or `lon`
#[derive(Debug, Clone, PartialEq)]
pub struct GridAxis {
    pub name: String,
    pub values: Vec<f64>,
}

impl GridAxis {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Index of the value closest to `target`. NaN coordinates never match.
    pub fn nearest_index(&self, target: f64) -> Option<usize> {
        self.values
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.is_nan())
            .min_by(|(_, a), (_, b)| (*a - target).abs().total_cmp(&(*b - target).abs()))
            .map(|(index, _)| index)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimeAxis {
    pub name: String,
    pub times: Vec<Timestamp>,
}

/// Row-major n-dimensional array of one data variable, NaN for missing cells
#[derive(Debug, Clone, PartialEq)]
pub struct GridVariable {
    pub name: String,
    pub dimensions: Vec<String>,
    pub shape: Vec<usize>,
    pub data: Vec<f64>,
}

impl GridVariable {
    pub fn new(
        name: impl Into<String>,
        dimensions: Vec<String>,
        shape: Vec<usize>,
        data: Vec<f64>,
    ) -> Result<Self, AcquireError> {
        let name = name.into();
        if dimensions.len() != shape.len() {
            return Err(AcquireError::Extraction(format!(
                "variable {} has {} dimensions but shape of rank {}",
                name,
                dimensions.len(),
                shape.len()
            )));
        }
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(AcquireError::Extraction(format!(
                "variable {} has {} values, shape {:?} needs {}",
                name,
                data.len(),
                shape,
                expected
            )));
        }
        Ok(Self {
            name,
            dimensions,
            shape,
            data,
        })
    }

    pub fn dimension_index(&self, name: &str) -> Option<usize> {
        self.dimensions.iter().position(|d| d == name)
    }

    /// Row-major strides for each dimension
    pub fn strides(&self) -> Vec<usize> {
        let mut strides = vec![1; self.shape.len()];
        for i in (0..self.shape.len().saturating_sub(1)).rev() {
            strides[i] = strides[i + 1] * self.shape[i + 1];
        }
        strides
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridDataset {
    /// Where the grid was read from, used in log lines
    pub source: String,
    /// Start time from the granule's search metadata
    pub reference_time: Option<Timestamp>,
    pub axes: Vec<GridAxis>,
    pub time: Option<TimeAxis>,
    pub variables: Vec<GridVariable>,
}

impl GridDataset {
    /// First axis whose name contains `needle`, ignoring case
    pub fn axis_containing(&self, needle: &str) -> Option<&GridAxis> {
        let needle = needle.to_lowercase();
        self.axes
            .iter()
            .find(|axis| axis.name.to_lowercase().contains(&needle))
    }

    pub fn variable(&self, name: &str) -> Option<&GridVariable> {
        self.variables.iter().find(|v| v.name == name)
    }
}

/// Decode CF `"<unit> since <epoch>"` time values
pub fn decode_cf_time(units: &str, values: &[f64]) -> Result<Vec<Timestamp>, AcquireError> {
    let invalid = || AcquireError::Extraction(format!("unsupported time units '{}'", units));

    let (unit, epoch) = units.split_once(" since ").ok_or_else(invalid)?;
    let seconds_per_unit = match unit.trim().to_lowercase().as_str() {
        "seconds" | "second" | "secs" | "sec" | "s" => 1.0,
        "minutes" | "minute" | "mins" | "min" => 60.0,
        "hours" | "hour" | "hrs" | "hr" | "h" => 3_600.0,
        "days" | "day" | "d" => 86_400.0,
        _ => return Err(invalid()),
    };
    let epoch = parse_epoch(epoch).ok_or_else(invalid)?;

    values
        .iter()
        .map(|value| {
            if !value.is_finite() {
                return Err(AcquireError::Extraction(format!(
                    "non-finite time value {}",
                    value
                )));
            }
            epoch
                .checked_add(Duration::seconds_f64(value * seconds_per_unit))
                .ok_or_else(|| AcquireError::Extraction(format!("time value {} overflows", value)))
        })
        .collect()
}

fn parse_epoch(raw: &str) -> Option<Timestamp> {
    let raw = raw.trim();
    parse_timestamp(raw).or_else(|| {
        let stripped = raw
            .trim_end_matches("UTC")
            .trim_end_matches('Z')
            .trim_end();
        parse_timestamp(stripped)
    })
}
