use std::collections::BTreeMap;

use acquisition::{GeoPoint, TimeWindow};
use serde::{Deserialize, Serialize};
use time::{Date, Month, Time as TimeOfDay};
use utoipa::ToSchema;

use crate::ApiError;

/// Calendar day and hour range a forecast is asked for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Time {
    /// 1-31
    pub day: u8,
    /// 1-12
    pub month: u8,
    /// `HH:MM`, 24h
    pub start_time: String,
    /// `HH:MM`, 24h
    pub end_time: String,
}

impl Time {
    pub fn validate(&self) -> Result<(), ApiError> {
        if !(1..=31).contains(&self.day) {
            return Err(ApiError::Validation(format!(
                "day must be between 1 and 31, got {}",
                self.day
            )));
        }
        if !(1..=12).contains(&self.month) {
            return Err(ApiError::Validation(format!(
                "month must be between 1 and 12, got {}",
                self.month
            )));
        }
        parse_hh_mm(&self.start_time)?;
        parse_hh_mm(&self.end_time)?;
        Ok(())
    }

    /// `{year}-MM-DDT00:00:00 .. {year}-MM-DDT{start_time}:00`
    pub fn window(&self, year: i32) -> Result<TimeWindow, ApiError> {
        self.validate()?;
        let month = Month::try_from(self.month)
            .map_err(|e| ApiError::Validation(format!("invalid month: {}", e)))?;
        let date = Date::from_calendar_date(year, month, self.day).map_err(|e| {
            ApiError::Validation(format!(
                "{}-{:02}-{:02} is not a valid date: {}",
                year, self.month, self.day, e
            ))
        })?;
        let until = parse_hh_mm(&self.start_time)?;
        Ok(TimeWindow::new(
            date.midnight().assume_utc(),
            date.with_time(until).assume_utc(),
        ))
    }
}

fn parse_hh_mm(raw: &str) -> Result<TimeOfDay, ApiError> {
    let invalid = || ApiError::Validation(format!("'{}' is not a valid HH:MM time", raw));
    let (hour, minute) = raw.split_once(':').ok_or_else(invalid)?;
    if hour.len() != 2 || minute.len() != 2 {
        return Err(invalid());
    }
    let hour: u8 = hour.parse().map_err(|_| invalid())?;
    let minute: u8 = minute.parse().map_err(|_| invalid())?;
    TimeOfDay::from_hms(hour, minute, 0).map_err(|_| invalid())
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
}

impl Location {
    pub fn point(&self) -> Result<GeoPoint, ApiError> {
        GeoPoint::new(self.lat, self.lon).map_err(|e| ApiError::Validation(e.to_string()))
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct WeatherPredictionRequest {
    pub time: Time,
    pub location: Location,
    /// What the user plans to do that day
    #[serde(default)]
    pub plan: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ChatRequest {
    pub prompt: String,
    pub time: Time,
    pub location: Location,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatResponse {
    pub res: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ChatLocation {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SimpleChatRequest {
    pub prompt: String,
    #[serde(default)]
    pub location: Option<ChatLocation>,
    /// Free-form, e.g. ISO 8601
    #[serde(default)]
    pub current_time: Option<String>,
    /// A previous `/predict/weather` response
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub weather_data: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SimpleChatResponse {
    pub response: String,
    pub status: String,
}

impl SimpleChatResponse {
    pub fn success(response: String) -> Self {
        Self {
            response,
            status: "success".to_string(),
        }
    }

    pub fn error(message: impl std::fmt::Display) -> Self {
        Self {
            response: format!("Error: {}", message),
            status: "error".to_string(),
        }
    }
}

/// Timestamp → value per forecast variable
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct WeatherData {
    pub velocidad_viento: BTreeMap<String, f64>,
    pub precipitacion: BTreeMap<String, f64>,
    pub humedad: BTreeMap<String, f64>,
    pub temperatura: BTreeMap<String, f64>,
    pub presion_superficie: BTreeMap<String, f64>,
    pub radiacion_solar: BTreeMap<String, f64>,
    pub radiacion_infrarroja: BTreeMap<String, f64>,
}

impl WeatherData {
    /// Columns in export order
    pub fn columns(&self) -> [(&'static str, &BTreeMap<String, f64>); 7] {
        [
            ("velocidad_viento", &self.velocidad_viento),
            ("precipitacion", &self.precipitacion),
            ("humedad", &self.humedad),
            ("temperatura", &self.temperatura),
            ("presion_superficie", &self.presion_superficie),
            ("radiacion_solar", &self.radiacion_solar),
            ("radiacion_infrarroja", &self.radiacion_infrarroja),
        ]
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CsvRequest {
    pub location: Location,
    pub data: WeatherData,
}
