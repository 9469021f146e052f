use async_trait::async_trait;
use slog::{info, o, warn, Logger};

use super::parse_time_series;
use crate::{
    authenticate_giovanni, AcquireError, Endpoints, GiovanniSession, HttpClient, SeriesMetadata,
    SourceConfig, VariableData, VariableQuery, VariableSource,
};

/// Header carrying the sign-in token on time-series calls
pub const TOKEN_HEADER: &str = "authorizationtoken";

/// Fetch the raw text series for one query
pub async fn call_time_series(
    http: &HttpClient,
    endpoints: &Endpoints,
    session: &GiovanniSession,
    query: &VariableQuery,
) -> Result<String, AcquireError> {
    let url = &endpoints.giovanni_timeseries;
    let request = http
        .get(url)
        .query(&query.giovanni_params())
        .header(TOKEN_HEADER, session.token());
    http.text(request, url).await
}

/// Time-series text API backed source
pub struct GiovanniSource {
    logger: Logger,
    config: SourceConfig,
}

impl GiovanniSource {
    pub fn new(logger: Logger, config: SourceConfig) -> Self {
        Self { logger, config }
    }
}

#[async_trait]
impl VariableSource for GiovanniSource {
    async fn acquire(&self, query: VariableQuery) -> Result<Option<VariableData>, AcquireError> {
        let logger = self.logger.new(o!(
            "backend" => "giovanni",
            "variable" => query.variable.name.clone()
        ));
        let http = HttpClient::new(
            logger.clone(),
            &self.config.user_agent,
            self.config.request_timeout,
        )?;
        let session =
            authenticate_giovanni(&http, &self.config.endpoints, &self.config.credentials).await?;

        let raw = call_time_series(&http, &self.config.endpoints, &session, &query).await?;
        let parsed = parse_time_series(&raw)?;
        for warning in &parsed.warnings {
            warn!(logger, "{}", warning);
        }
        if parsed.series.is_empty() {
            info!(logger, "time series response had no rows");
            return Ok(None);
        }

        info!(logger, "parsed {} readings", parsed.series.len());
        Ok(Some(VariableData {
            descriptor: query.variable,
            metadata: SeriesMetadata::Header(parsed.header),
            series: parsed.series,
        }))
    }
}
