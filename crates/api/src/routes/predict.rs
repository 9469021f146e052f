use std::sync::Arc;

use axum::{extract::State, Json};
use log::{debug, info};
use serde_json::Value;

use crate::{forecast_prompt, ApiError, AppState, LlmError, WeatherPredictionRequest};

/// Forecast as a JSON object, tolerating a markdown code fence around it
pub fn parse_forecast(reply: &str) -> Result<Value, LlmError> {
    let trimmed = reply.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    match serde_json::from_str::<Value>(body) {
        Ok(value @ Value::Object(_)) => Ok(value),
        Ok(other) => Err(LlmError::InvalidJson(format!(
            "expected an object, got {}",
            other
        ))),
        Err(e) => Err(LlmError::InvalidJson(e.to_string())),
    }
}

#[utoipa::path(
    post,
    path = "/predict/weather",
    request_body = WeatherPredictionRequest,
    responses(
        (status = OK, description = "Hourly forecast with summary and recommendations", content_type = "application/json"),
        (status = BAD_REQUEST, description = "Invalid time or location"),
        (status = INTERNAL_SERVER_ERROR, description = "Weather data or model reply unavailable")
    ))]
pub async fn predict_weather(
    State(state): State<Arc<AppState>>,
    Json(body): Json<WeatherPredictionRequest>,
) -> Result<Json<Value>, ApiError> {
    let window = body.time.window(state.reference_year)?;
    let point = body.location.point()?;

    let summary = state.weather.summarize(point, window).await?;
    let prompt = forecast_prompt(
        &summary,
        &body.time.start_time,
        &body.time.end_time,
        &body.plan,
    );
    let reply = state.chat.complete(prompt).await?;
    debug!("forecast reply: {}", reply);

    let forecast = parse_forecast(&reply)?;
    info!(
        "forecast for ({}, {}) with {} recommendations",
        point.lat,
        point.lon,
        forecast
            .get("recomendations")
            .and_then(Value::as_array)
            .map_or(0, Vec::len)
    );
    Ok(Json(forecast))
}
