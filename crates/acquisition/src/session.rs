//! Explicit authentication sessions.
//!
//! Every acquisition task authenticates on its own and passes the resulting
//! session by reference into its queries; sessions are never shared
//! between tasks.

use nasa_weather_core::Credentials;
use serde::Deserialize;
use slog::{debug, info};

use crate::{AcquireError, Endpoints, HttpClient};

/// Token for the Giovanni time-series API
#[derive(Clone, PartialEq)]
pub struct GiovanniSession {
    token: String,
}

impl GiovanniSession {
    pub fn token(&self) -> &str {
        &self.token
    }
}

impl std::fmt::Debug for GiovanniSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("GiovanniSession { .. }")
    }
}

/// Earthdata Login bearer token used for granule search and download
#[derive(Clone, PartialEq)]
pub struct EarthdataSession {
    access_token: String,
    expires: Option<String>,
}

impl EarthdataSession {
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn expires(&self) -> Option<&str> {
        self.expires.as_deref()
    }
}

impl std::fmt::Debug for EarthdataSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EarthdataSession")
            .field("expires", &self.expires)
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expiration_date: Option<String>,
}

/// Exchange basic credentials for a Giovanni token. Only a 200 counts as success.
pub async fn authenticate_giovanni(
    http: &HttpClient,
    endpoints: &Endpoints,
    credentials: &Credentials,
) -> Result<GiovanniSession, AcquireError> {
    let url = &endpoints.giovanni_signin;
    let response = http
        .get(url)
        .basic_auth(&credentials.username, Some(&credentials.password))
        .send()
        .await?;

    let status = response.status();
    if status != reqwest::StatusCode::OK {
        let body = response.text().await.unwrap_or_default();
        return Err(AcquireError::Authentication(format!(
            "sign-in returned status {}: {}",
            status.as_u16(),
            body.trim()
        )));
    }

    let body = response
        .text()
        .await
        .map_err(|e| AcquireError::Decode(format!("error reading sign-in token: {}", e)))?;
    let token = clean_token(&body);
    if token.is_empty() {
        return Err(AcquireError::Authentication(
            "sign-in returned an empty token".to_string(),
        ));
    }
    debug!(http.logger(), "giovanni session established");
    Ok(GiovanniSession { token })
}

/// Exchange basic credentials for an Earthdata Login bearer token
pub async fn authenticate_earthdata(
    http: &HttpClient,
    endpoints: &Endpoints,
    credentials: &Credentials,
) -> Result<EarthdataSession, AcquireError> {
    let url = &endpoints.earthdata_token;
    let response = http
        .post(url)
        .basic_auth(&credentials.username, Some(&credentials.password))
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(AcquireError::Authentication(format!(
            "Earthdata login returned status {}",
            status.as_u16()
        )));
    }

    let body = response
        .text()
        .await
        .map_err(|e| AcquireError::Decode(format!("error reading Earthdata token: {}", e)))?;
    let session = parse_token_response(&body)?;
    info!(http.logger(), "earthdata session established"; "expires" => session.expires.clone());
    Ok(session)
}

/// Strip quotes and surrounding whitespace from a sign-in response body
pub fn clean_token(body: &str) -> String {
    body.replace('"', "").trim().to_string()
}

pub fn parse_token_response(body: &str) -> Result<EarthdataSession, AcquireError> {
    let parsed: TokenResponse = serde_json::from_str(body)
        .map_err(|e| AcquireError::Authentication(format!("unexpected token response: {}", e)))?;
    if parsed.access_token.is_empty() {
        return Err(AcquireError::Authentication(
            "Earthdata login returned an empty token".to_string(),
        ));
    }
    Ok(EarthdataSession {
        access_token: parsed.access_token,
        expires: parsed.expiration_date,
    })
}
