use std::io::Write;

use async_trait::async_trait;
use slog::{info, o, warn, Logger};

use super::{extract_point_series, read_grid, search_granules, GranuleRef, GridDataset};
use crate::{
    authenticate_earthdata, AcquireError, EarthdataSession, HttpClient, SeriesMetadata,
    SourceConfig, VariableData, VariableQuery, VariableSource,
};

/// Download one granule and decode it on the blocking pool
pub async fn open_granule(
    http: &HttpClient,
    session: &EarthdataSession,
    granule: &GranuleRef,
) -> Result<GridDataset, AcquireError> {
    let request = http.get(&granule.url).bearer_auth(session.access_token());
    let bytes = http
        .send(request, &granule.url)
        .await?
        .bytes()
        .await
        .map_err(|e| AcquireError::Transport(format!("downloading {}: {}", granule.url, e)))?;

    let source = granule.title.clone();
    let reference_time = granule.time_start;
    tokio::task::spawn_blocking(move || {
        let mut file = tempfile::Builder::new()
            .prefix("granule-")
            .suffix(".nc4")
            .tempfile()?;
        file.write_all(&bytes)?;
        file.flush()?;
        read_grid(file.path(), &source, reference_time)
    })
    .await
    .map_err(|e| AcquireError::Extraction(format!("granule decoder stopped: {}", e)))?
}

/// Granule search + nearest grid point source
pub struct GranuleSource {
    logger: Logger,
    config: SourceConfig,
}

impl GranuleSource {
    pub fn new(logger: Logger, config: SourceConfig) -> Self {
        Self { logger, config }
    }
}

#[async_trait]
impl VariableSource for GranuleSource {
    async fn acquire(&self, query: VariableQuery) -> Result<Option<VariableData>, AcquireError> {
        let logger = self.logger.new(o!(
            "backend" => "granules",
            "variable" => query.variable.name.clone()
        ));
        let http = HttpClient::new(
            logger.clone(),
            &self.config.user_agent,
            self.config.request_timeout,
        )?;
        let session =
            authenticate_earthdata(&http, &self.config.endpoints, &self.config.credentials).await?;

        let granules = search_granules(&http, &self.config.endpoints, &session, &query).await?;
        if granules.is_empty() {
            info!(logger, "no granules found for {}", query.variable.collection);
            return Ok(None);
        }

        let mut grids = Vec::new();
        let mut last_error = None;
        for granule in granules.iter().take(self.config.max_files) {
            match open_granule(&http, &session, granule).await {
                Ok(grid) => grids.push(grid),
                Err(AcquireError::Authentication(reason)) => {
                    return Err(AcquireError::Authentication(reason))
                }
                Err(err) => {
                    warn!(logger, "failed to open granule {}: {}", granule.id, err);
                    last_error = Some(err);
                }
            }
        }
        // nothing opened: surface why instead of reporting an empty result
        if let Some(err) = last_error.filter(|_| grids.is_empty()) {
            return Err(err);
        }

        let variable = &query.variable.granule_variable;
        let Some(series) = extract_point_series(&grids, variable, query.point, &logger) else {
            info!(logger, "no readings extracted from {} granules", grids.len());
            return Ok(None);
        };

        info!(
            logger,
            "extracted {} readings from {} granules",
            series.len(),
            grids.len()
        );
        Ok(Some(VariableData {
            metadata: SeriesMetadata::Granules {
                collection: query.variable.collection.clone(),
                variable: variable.clone(),
                granules_used: grids.len(),
            },
            descriptor: query.variable,
            series,
        }))
    }
}
