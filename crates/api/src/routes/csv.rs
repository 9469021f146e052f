use acquisition::{align, export_filename, to_csv_string, AlignedTable};
use axum::{
    http::{HeaderMap, HeaderValue},
    Json,
};
use hyper::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use log::info;

use crate::{ApiError, CsvRequest, WeatherData};

/// Outer join of every variable on its timestamp strings
pub fn weather_table(data: &WeatherData) -> AlignedTable<String> {
    align(data.columns().into_iter().map(|(name, cells)| {
        (
            name.to_string(),
            cells.iter().map(|(time, value)| (time.clone(), Some(*value))),
        )
    }))
}

#[utoipa::path(
    post,
    path = "/csv/generate",
    request_body = CsvRequest,
    responses(
        (status = OK, description = "Weather variables as a CSV attachment", content_type = "text/csv", body = String),
        (status = INTERNAL_SERVER_ERROR, description = "CSV could not be generated")
    ))]
pub async fn generate_csv(Json(body): Json<CsvRequest>) -> Result<(HeaderMap, String), ApiError> {
    let table = weather_table(&body.data);
    let csv = to_csv_string(&table).map_err(|e| ApiError::Csv(e.to_string()))?;
    let filename = export_filename(body.location.lat, body.location.lon);

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/csv"));
    headers.insert(
        CONTENT_DISPOSITION,
        HeaderValue::from_str(&format!("attachment; filename={}", filename))
            .map_err(|e| ApiError::Csv(e.to_string()))?,
    );

    info!("generated {} with {} rows", filename, table.len());
    Ok((headers, csv))
}
