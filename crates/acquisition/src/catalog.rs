use serde::Serialize;

/// GLDAS Noah land surface model, 0.25 degree, 3-hourly
pub const GLDAS_COLLECTION: &str = "GLDAS_NOAH025_3H";

/// Variable whose mean drives the cloudiness classification
pub const SOLAR_RADIATION: &str = "radiacion_solar";

/// Variables requested when a caller does not pick any
pub const FORECAST_VARIABLES: [&str; 7] = [
    "velocidad_viento",
    "precipitacion",
    "humedad",
    "temperatura",
    "presion_superficie",
    "radiacion_solar",
    "radiacion_infrarroja",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariableDescriptor {
    /// Key used in datasets, tables and API payloads
    pub name: String,
    /// Variable code understood by the time-series service
    pub backend_code: String,
    /// Collection short name for granule search
    pub collection: String,
    /// Variable name inside a granule file
    pub granule_variable: String,
    pub unit: String,
    pub description: String,
}

#[derive(thiserror::Error, Debug, PartialEq)]
#[error("unknown weather variable '{0}'")]
pub struct UnknownVariable(pub String);

const CATALOG: [(&str, &str, &str, &str); 8] = [
    (
        "velocidad_viento",
        "Wind_f_inst",
        "m/s",
        "Near surface wind speed",
    ),
    (
        "precipitacion",
        "Rainf_f_tavg",
        "kg/m²/s",
        "Total precipitation rate",
    ),
    ("humedad", "Qair_f_inst", "kg/kg", "Specific humidity"),
    (
        "temperatura",
        "Tair_f_inst",
        "K",
        "Near surface air temperature",
    ),
    ("precipitacion_nieve", "Snowf_tavg", "kg/m²/s", "Snow precipitation rate"),
    ("presion_superficie", "Psurf_f_inst", "Pa", "Surface pressure"),
    (
        "radiacion_solar",
        "SWdown_f_tavg",
        "W/m²",
        "Downward shortwave radiation flux (cloud cover proxy)",
    ),
    (
        "radiacion_infrarroja",
        "LWdown_f_tavg",
        "W/m²",
        "Downward longwave radiation flux",
    ),
];

/// Every variable the services know how to fetch
pub fn catalog() -> Vec<VariableDescriptor> {
    CATALOG
        .iter()
        .map(|(name, granule_variable, unit, description)| VariableDescriptor {
            name: name.to_string(),
            backend_code: format!("{}_2_1_{}", GLDAS_COLLECTION, granule_variable),
            collection: GLDAS_COLLECTION.to_string(),
            granule_variable: granule_variable.to_string(),
            unit: unit.to_string(),
            description: description.to_string(),
        })
        .collect()
}

pub fn find_variable(name: &str) -> Option<VariableDescriptor> {
    catalog().into_iter().find(|v| v.name == name)
}

/// Look up descriptors by name, defaulting to [`FORECAST_VARIABLES`] when
/// `names` is empty. Duplicate names are requested once.
pub fn select_variables(names: &[String]) -> Result<Vec<VariableDescriptor>, UnknownVariable> {
    if names.is_empty() {
        return Ok(forecast_variables());
    }

    let mut selected: Vec<VariableDescriptor> = Vec::with_capacity(names.len());
    for name in names {
        let name = name.trim();
        if selected.iter().any(|v| v.name == name) {
            continue;
        }
        let found = find_variable(name).ok_or_else(|| UnknownVariable(name.to_string()))?;
        selected.push(found);
    }
    Ok(selected)
}

pub fn forecast_variables() -> Vec<VariableDescriptor> {
    catalog()
        .into_iter()
        .filter(|v| FORECAST_VARIABLES.contains(&v.name.as_str()))
        .collect()
}
