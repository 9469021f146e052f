use slog::{debug, warn, Logger};

use super::GridDataset;
use crate::{AcquireError, GeoPoint, Reading, TimeSeries};

/// Read `variable` at the grid cell nearest to `point`.
///
/// Returns one reading per step of the time dimension (a single reading
/// when the variable has none). NaN cells are dropped.
pub fn extract_point(
    grid: &GridDataset,
    variable: &str,
    point: GeoPoint,
) -> Result<Vec<Reading>, AcquireError> {
    let lat_axis = grid
        .axis_containing("lat")
        .ok_or_else(|| AcquireError::Extraction(format!("{}: no latitude axis", grid.source)))?;
    let lon_axis = grid
        .axis_containing("lon")
        .ok_or_else(|| AcquireError::Extraction(format!("{}: no longitude axis", grid.source)))?;
    let var = grid.variable(variable).ok_or_else(|| {
        AcquireError::Extraction(format!("{}: variable {} not found", grid.source, variable))
    })?;

    let lat_index = lat_axis
        .nearest_index(point.lat)
        .ok_or_else(|| AcquireError::Extraction(format!("{}: empty latitude axis", grid.source)))?;
    let lon_index = lon_axis
        .nearest_index(point.lon)
        .ok_or_else(|| AcquireError::Extraction(format!("{}: empty longitude axis", grid.source)))?;

    let time_dim = grid
        .time
        .as_ref()
        .and_then(|axis| var.dimension_index(&axis.name));
    let strides = var.strides();

    let mut base = 0;
    for (dim, name) in var.dimensions.iter().enumerate() {
        let index = if *name == lat_axis.name {
            lat_index
        } else if *name == lon_axis.name {
            lon_index
        } else if Some(dim) == time_dim {
            0
        } else if var.shape[dim] == 1 {
            0
        } else {
            return Err(AcquireError::Extraction(format!(
                "{}: {} has unsupported dimension {} of length {}",
                grid.source, variable, name, var.shape[dim]
            )));
        };
        if index >= var.shape[dim] {
            return Err(AcquireError::Extraction(format!(
                "{}: index {} out of range for dimension {}",
                grid.source, index, name
            )));
        }
        base += index * strides[dim];
    }
    if var.dimension_index(&lat_axis.name).is_none() || var.dimension_index(&lon_axis.name).is_none()
    {
        return Err(AcquireError::Extraction(format!(
            "{}: {} is not gridded on {}/{}",
            grid.source, variable, lat_axis.name, lon_axis.name
        )));
    }

    let mut readings = Vec::new();
    match (time_dim, grid.time.as_ref()) {
        (Some(dim), Some(axis)) => {
            if axis.times.len() != var.shape[dim] {
                return Err(AcquireError::Extraction(format!(
                    "{}: time axis has {} steps, variable has {}",
                    grid.source,
                    axis.times.len(),
                    var.shape[dim]
                )));
            }
            for (step, time) in axis.times.iter().enumerate() {
                let value = var.data[base + step * strides[dim]];
                if !value.is_nan() {
                    readings.push(Reading {
                        time: *time,
                        value: Some(value),
                    });
                }
            }
        }
        _ => {
            let time = grid
                .time
                .as_ref()
                .and_then(|axis| axis.times.first().copied())
                .or(grid.reference_time)
                .ok_or_else(|| {
                    AcquireError::Extraction(format!("{}: no time coordinate", grid.source))
                })?;
            let value = var.data[base];
            if !value.is_nan() {
                readings.push(Reading {
                    time,
                    value: Some(value),
                });
            }
        }
    }
    Ok(readings)
}

/// Extract and concatenate the point series from every grid.
///
/// A grid that fails is logged and skipped. Rows from overlapping grids are
/// kept as they are, then sorted by time. `None` when nothing was extracted.
pub fn extract_point_series(
    grids: &[GridDataset],
    variable: &str,
    point: GeoPoint,
    logger: &Logger,
) -> Option<TimeSeries> {
    let mut readings = Vec::new();
    for grid in grids {
        match extract_point(grid, variable, point) {
            Ok(found) => {
                debug!(logger, "{} readings from {}", found.len(), grid.source);
                readings.extend(found);
            }
            Err(err) => warn!(logger, "skipping granule: {}", err),
        }
    }
    if readings.is_empty() {
        return None;
    }
    let mut series = TimeSeries::new(readings);
    series.sort_by_time();
    Some(series)
}
