use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use nasa_weather_core::{Credentials, DEFAULT_MAX_FILES};
use slog::Logger;

use crate::{
    is_supported, AcquireError, Backend, Endpoints, GiovanniSource, GranuleSource, VariableData,
    VariableQuery, DEFAULT_USER_AGENT,
};

/// Fetches one variable's series for one query.
///
/// `Ok(None)` means the upstream had nothing for the query, which is not an
/// error. Implementations authenticate inside every call so that no session
/// is shared between concurrent tasks.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VariableSource: Send + Sync {
    async fn acquire(&self, query: VariableQuery) -> Result<Option<VariableData>, AcquireError>;
}

#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub credentials: Credentials,
    pub endpoints: Endpoints,
    pub user_agent: String,
    pub request_timeout: Duration,
    /// Granules opened per variable
    pub max_files: usize,
}

impl SourceConfig {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            endpoints: Endpoints::default(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout: Duration::from_secs(60),
            max_files: DEFAULT_MAX_FILES,
        }
    }
}

/// Fails for the granule backend when this build cannot decode granules.
pub fn build_source(
    backend: Backend,
    config: SourceConfig,
    logger: Logger,
) -> Result<Arc<dyn VariableSource>, AcquireError> {
    match backend {
        Backend::Giovanni => Ok(Arc::new(GiovanniSource::new(logger, config))),
        Backend::Granules if !is_supported() => Err(AcquireError::Unsupported(
            "the granules backend needs a build with the `netcdf` feature, use `--backend giovanni`"
                .to_string(),
        )),
        Backend::Granules => Ok(Arc::new(GranuleSource::new(logger, config))),
    }
}
