use std::path::Path;

use super::GridDataset;
use crate::{AcquireError, Timestamp};

/// Whether this build can decode granule files
pub const fn is_supported() -> bool {
    cfg!(feature = "netcdf")
}

#[cfg(not(feature = "netcdf"))]
pub fn read_grid(
    path: &Path,
    _source: &str,
    _reference_time: Option<Timestamp>,
) -> Result<GridDataset, AcquireError> {
    Err(AcquireError::Unsupported(format!(
        "cannot decode {}: built without the `netcdf` feature",
        path.display()
    )))
}

/// Decode a NetCDF4 granule into a [`GridDataset`].
///
/// 1-D variables named after their own dimension are coordinate axes; the
/// one whose name contains `time` is decoded from its CF units. Everything
/// else numeric becomes a data variable with fill values mapped to NaN and
/// packing (`scale_factor`/`add_offset`) applied.
#[cfg(feature = "netcdf")]
pub fn read_grid(
    path: &Path,
    source: &str,
    reference_time: Option<Timestamp>,
) -> Result<GridDataset, AcquireError> {
    use super::{decode_cf_time, GridAxis, GridVariable, TimeAxis};

    let file = netcdf::open(path)
        .map_err(|e| AcquireError::Extraction(format!("failed to open {}: {}", source, e)))?;

    let mut grid = GridDataset {
        source: source.to_string(),
        reference_time,
        ..Default::default()
    };

    for var in file.variables() {
        let name = var.name().to_string();
        let dimensions: Vec<String> = var.dimensions().iter().map(|d| d.name().to_string()).collect();
        let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();

        let Ok(raw) = var.get_values::<f64, _>(..) else {
            continue;
        };
        let is_coordinate = dimensions.len() == 1 && dimensions[0] == name;

        if is_coordinate && name.to_lowercase().contains("time") {
            let units = string_attr(&var, "units").ok_or_else(|| {
                AcquireError::Extraction(format!("{}: time axis without units", source))
            })?;
            grid.time = Some(TimeAxis {
                times: decode_cf_time(&units, &raw)?,
                name,
            });
        } else if is_coordinate {
            grid.axes.push(GridAxis::new(name, raw));
        } else {
            let data = unpack(&var, raw);
            grid.variables
                .push(GridVariable::new(name, dimensions, shape, data)?);
        }
    }

    Ok(grid)
}

#[cfg(feature = "netcdf")]
fn unpack(var: &netcdf::Variable, raw: Vec<f64>) -> Vec<f64> {
    let fill = f64_attr(var, "_FillValue");
    let missing = f64_attr(var, "missing_value");
    let scale = f64_attr(var, "scale_factor").unwrap_or(1.0);
    let offset = f64_attr(var, "add_offset").unwrap_or(0.0);

    raw.into_iter()
        .map(|value| {
            if Some(value) == fill || Some(value) == missing || value.is_nan() {
                f64::NAN
            } else {
                value * scale + offset
            }
        })
        .collect()
}

/// Checking first avoids HDF5 error spam for absent attributes
#[cfg(feature = "netcdf")]
fn has_attr(var: &netcdf::Variable, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

#[cfg(feature = "netcdf")]
fn f64_attr(var: &netcdf::Variable, name: &str) -> Option<f64> {
    if !has_attr(var, name) {
        return None;
    }
    let value = var.attribute_value(name)?.ok()?;
    f64::try_from(value).ok()
}

#[cfg(feature = "netcdf")]
fn string_attr(var: &netcdf::Variable, name: &str) -> Option<String> {
    if !has_attr(var, name) {
        return None;
    }
    match var.attribute_value(name)?.ok()? {
        netcdf::AttributeValue::Str(s) => Some(s),
        _ => None,
    }
}
