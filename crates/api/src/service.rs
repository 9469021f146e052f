use std::{collections::BTreeMap, sync::Arc};

use acquisition::{
    format_timestamp, CloudinessReport, FetchError, FetchOptions, FetchOrchestrator, GeoPoint,
    SummaryStats, TimeWindow, VariableDescriptor, VariableSource, WeatherDataset,
    SOLAR_RADIATION,
};
use async_trait::async_trait;
use log::{info, warn};
use serde::Serialize;
use slog::{o, Drain, Logger};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl From<SummaryStats> for SeriesStats {
    fn from(stats: SummaryStats) -> Self {
        Self {
            min: stats.min,
            max: stats.max,
            mean: stats.mean,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub time: String,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableSummary {
    pub stats: SeriesStats,
    pub data: Vec<SeriesPoint>,
}

/// What the prompts get to see about a day's weather
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WeatherSummary {
    pub variables: BTreeMap<String, VariableSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloudiness: Option<CloudinessReport>,
    /// Variables that could not be fetched
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<String>,
}

impl WeatherSummary {
    /// Variables without a single non-null reading are listed as missing
    pub fn from_dataset(dataset: &WeatherDataset) -> Self {
        let mut variables = BTreeMap::new();
        let mut missing = Vec::new();
        for (name, data) in dataset.iter() {
            let Some(stats) = SummaryStats::from_series(&data.series) else {
                missing.push(name.clone());
                continue;
            };
            let points = data
                .series
                .iter()
                .map(|reading| SeriesPoint {
                    time: format_timestamp(&reading.time),
                    value: reading.value,
                })
                .collect();
            variables.insert(
                name.clone(),
                VariableSummary {
                    stats: stats.into(),
                    data: points,
                },
            );
        }

        let cloudiness = dataset
            .get(SOLAR_RADIATION)
            .and_then(|data| CloudinessReport::from_series(&data.series));

        Self {
            variables,
            cloudiness,
            missing,
        }
    }

    pub fn to_prompt_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Fetches and summarizes the weather variables around a point
#[async_trait]
pub trait WeatherService: Send + Sync {
    async fn summarize(
        &self,
        point: GeoPoint,
        window: TimeWindow,
    ) -> Result<WeatherSummary, FetchError>;
}

pub struct OrchestratorWeatherService {
    orchestrator: FetchOrchestrator,
    variables: Vec<VariableDescriptor>,
}

impl OrchestratorWeatherService {
    pub fn new(
        source: Arc<dyn VariableSource>,
        options: FetchOptions,
        variables: Vec<VariableDescriptor>,
    ) -> Self {
        Self {
            orchestrator: FetchOrchestrator::new(bridge_logger(), source, options),
            variables,
        }
    }
}

/// slog root that forwards into the `log` facade
pub fn bridge_logger() -> Logger {
    Logger::root(slog_stdlog::StdLog.fuse(), o!("component" => "acquisition"))
}

#[async_trait]
impl WeatherService for OrchestratorWeatherService {
    async fn summarize(
        &self,
        point: GeoPoint,
        window: TimeWindow,
    ) -> Result<WeatherSummary, FetchError> {
        let report = self
            .orchestrator
            .fetch(&self.variables, point, window)
            .await?;
        for failure in &report.failures {
            warn!("variable left out of summary: {}", failure);
        }

        let mut summary = WeatherSummary::from_dataset(&report.dataset);
        summary
            .missing
            .extend(report.failures.iter().map(|f| f.variable.clone()));
        summary.missing.sort();
        info!(
            "summarized {} variables for ({}, {})",
            summary.variables.len(),
            point.lat,
            point.lon
        );
        Ok(summary)
    }
}
