use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, RequestBuilder};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::Deserialize;
use slog::{debug, Logger};

use crate::AcquireError;

pub const DEFAULT_USER_AGENT: &str = "nasa-weather-fetch/0.1";

/// Upstream service URLs
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub giovanni_signin: String,
    pub giovanni_timeseries: String,
    pub earthdata_token: String,
    pub cmr_granules: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            giovanni_signin: "https://api.giovanni.earthdata.nasa.gov/signin".to_string(),
            giovanni_timeseries: "https://api.giovanni.earthdata.nasa.gov/timeseries".to_string(),
            earthdata_token: "https://urs.earthdata.nasa.gov/api/users/find_or_create_token"
                .to_string(),
            cmr_granules: "https://cmr.earthdata.nasa.gov/search/granules.json".to_string(),
        }
    }
}

/// HTTP client owned by a single acquisition task.
///
/// Transient failures are retried with exponential backoff and every
/// request carries its own timeout.
pub struct HttpClient {
    logger: Logger,
    client: ClientWithMiddleware,
    request_timeout: Duration,
}

impl HttpClient {
    pub fn new(
        logger: Logger,
        user_agent: &str,
        request_timeout: Duration,
    ) -> Result<Self, AcquireError> {
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(3);
        let client = ClientBuilder::new(Client::builder().user_agent(user_agent).build()?)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();
        Ok(Self {
            logger,
            client,
            request_timeout,
        })
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn get(&self, url: &str) -> RequestBuilder {
        debug!(self.logger, "requesting: GET {}", url);
        self.client.get(url).timeout(self.request_timeout)
    }

    pub fn post(&self, url: &str) -> RequestBuilder {
        debug!(self.logger, "requesting: POST {}", url);
        self.client.post(url).timeout(self.request_timeout)
    }

    /// Send a request and fail on any non-success status
    pub async fn send(&self, request: RequestBuilder, url: &str) -> Result<Response, AcquireError> {
        let response = request.send().await?;
        check_status(response.status(), url)?;
        Ok(response)
    }

    pub async fn text(&self, request: RequestBuilder, url: &str) -> Result<String, AcquireError> {
        let response = self.send(request, url).await?;
        response
            .text()
            .await
            .map_err(|e| AcquireError::Decode(format!("error reading body of {}: {}", url, e)))
    }
}

/// 401/403 mean the session is not accepted, anything else non-2xx is a plain status error
pub fn check_status(status: StatusCode, url: &str) -> Result<(), AcquireError> {
    if status.is_success() {
        return Ok(());
    }
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(AcquireError::Authentication(format!(
            "{} rejected credentials with status {}",
            url,
            status.as_u16()
        )));
    }
    Err(AcquireError::Status {
        status: status.as_u16(),
        url: url.to_string(),
    })
}
