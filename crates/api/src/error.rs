use acquisition::FetchError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use log::error;

use crate::LlmError;

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("invalid request: {0}")]
    Validation(String),
    #[error("weather data unavailable: {0}")]
    Fetch(#[from] FetchError),
    #[error("language model failed: {0}")]
    Llm(#[from] LlmError),
    #[error("Error generando CSV: {0}")]
    Csv(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Fetch(_) | ApiError::Llm(_) | ApiError::Csv(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("request failed: {}", self);
        }
        (status, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_validation_is_a_client_error() {
        assert_eq!(
            ApiError::Validation("bad day".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Llm(LlmError::InvalidJson("not json".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::Fetch(FetchError::NoDataAvailable { failures: vec![] }).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
