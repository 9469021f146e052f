use std::fmt;

use serde::Deserialize;
use time::{format_description::well_known::Rfc3339, UtcOffset};

use crate::{format_timestamp, GeoPoint, TimeWindow, Timestamp, VariableDescriptor};

/// Degrees added around the point when searching for granules
pub const SEARCH_MARGIN_DEG: f64 = 5.0;

/// Which upstream service answers variable queries.
///
/// Defaults to granules only in builds that can decode them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Giovanni time-series text API
    #[cfg_attr(not(feature = "netcdf"), default)]
    Giovanni,
    /// Earthdata granule search + nearest grid point extraction
    #[cfg_attr(feature = "netcdf", default)]
    Granules,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Giovanni => write!(f, "giovanni"),
            Backend::Granules => write!(f, "granules"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl BoundingBox {
    pub fn around(point: GeoPoint, margin: f64) -> Self {
        Self {
            west: (point.lon - margin).max(-180.0),
            south: (point.lat - margin).max(-90.0),
            east: (point.lon + margin).min(180.0),
            north: (point.lat + margin).min(90.0),
        }
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.west, self.south, self.east, self.north)
    }
}

/// Everything one acquisition task needs to fetch one variable
#[derive(Debug, Clone, PartialEq)]
pub struct VariableQuery {
    pub variable: VariableDescriptor,
    pub point: GeoPoint,
    pub window: TimeWindow,
}

impl VariableQuery {
    pub fn new(variable: VariableDescriptor, point: GeoPoint, window: TimeWindow) -> Self {
        Self {
            variable,
            point,
            window,
        }
    }

    /// Query string for the time-series service
    pub fn giovanni_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("data", self.variable.backend_code.clone()),
            (
                "location",
                format!("[{},{}]", self.point.lat, self.point.lon),
            ),
            (
                "time",
                format!(
                    "{}/{}",
                    format_timestamp(&self.window.start),
                    format_timestamp(&self.window.end)
                ),
            ),
        ]
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::around(self.point, SEARCH_MARGIN_DEG)
    }

    /// `start,end` temporal filter for granule search
    pub fn temporal(&self) -> String {
        format!(
            "{},{}",
            search_time(&self.window.start),
            search_time(&self.window.end)
        )
    }
}

fn search_time(ts: &Timestamp) -> String {
    let utc = ts.to_offset(UtcOffset::UTC);
    utc.format(&Rfc3339)
        .unwrap_or_else(|_| format!("{}Z", format_timestamp(&utc)))
}
