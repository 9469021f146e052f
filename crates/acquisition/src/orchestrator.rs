use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
    time::Duration,
};

use nasa_weather_core::DEFAULT_TASK_TIMEOUT;
use slog::{debug, error, info, warn, Logger};
use tokio::{
    sync::{mpsc, Semaphore},
    task::{Id, JoinError, JoinSet},
    time::timeout,
};

use crate::{
    AcquireError, FailureReason, FetchError, GeoPoint, TimeWindow, VariableData,
    VariableDescriptor, VariableFailure, VariableQuery, VariableSource, WeatherDataset,
};

type TaskOutcome = (String, Result<Option<VariableData>, FailureReason>);

#[derive(Debug, Clone, PartialEq)]
pub struct FetchOptions {
    /// Concurrent acquisitions, one per variable when unset
    pub max_workers: Option<usize>,
    pub task_timeout: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            max_workers: None,
            task_timeout: Duration::from_secs(DEFAULT_TASK_TIMEOUT),
        }
    }
}

/// Variables that were fetched plus the reason each missing one is missing
#[derive(Debug, Default)]
pub struct FetchReport {
    pub dataset: WeatherDataset,
    pub failures: Vec<VariableFailure>,
}

pub struct FetchOrchestrator {
    logger: Logger,
    source: Arc<dyn VariableSource>,
    options: FetchOptions,
}

impl FetchOrchestrator {
    pub fn new(logger: Logger, source: Arc<dyn VariableSource>, options: FetchOptions) -> Self {
        Self {
            logger,
            source,
            options,
        }
    }

    /// Fetch every variable for the same point and window, one task each.
    /// A name listed twice is fetched once.
    ///
    /// Results are collected in completion order. A failed variable is left
    /// out of the dataset and recorded in [`FetchReport::failures`]; an
    /// authentication failure aborts the whole batch.
    pub async fn fetch(
        &self,
        variables: &[VariableDescriptor],
        point: GeoPoint,
        window: TimeWindow,
    ) -> Result<FetchReport, FetchError> {
        if window.is_inverted() {
            warn!(
                self.logger,
                "time window starts at or after its end, passing it upstream as is"
            );
        }

        let mut seen = BTreeSet::new();
        let unique: Vec<&VariableDescriptor> = variables
            .iter()
            .filter(|v| seen.insert(v.name.as_str()))
            .collect();
        if unique.len() < variables.len() {
            warn!(
                self.logger,
                "ignoring {} duplicate variable names",
                variables.len() - unique.len()
            );
        }

        let total = unique.len();
        let workers = self.options.max_workers.unwrap_or(total).max(1);
        let semaphore = Arc::new(Semaphore::new(workers));
        let (tx, mut rx) = mpsc::channel::<TaskOutcome>(total.max(1));
        let mut set = JoinSet::new();
        let mut task_names: HashMap<Id, String> = HashMap::new();
        let mut pending: BTreeSet<String> = BTreeSet::new();

        info!(
            self.logger,
            "fetching {} variables with {} workers", total, workers
        );

        for variable in unique {
            let name = variable.name.clone();
            let query = VariableQuery::new(variable.clone(), point, window);
            let source = Arc::clone(&self.source);
            let semaphore = Arc::clone(&semaphore);
            let task_timeout = self.options.task_timeout;
            let tx = tx.clone();
            let logger = self.logger.clone();
            let task_name = name.clone();

            let handle = set.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return;
                };
                debug!(logger, "starting acquisition of {}", task_name);
                let outcome = match timeout(task_timeout, source.acquire(query)).await {
                    Ok(Ok(data)) => Ok(data),
                    Ok(Err(err)) => Err(FailureReason::Acquire(err)),
                    Err(_) => Err(FailureReason::Timeout(task_timeout)),
                };
                if let Err(err) = tx.send((task_name, outcome)).await {
                    debug!(logger, "result dropped, collector is gone: {}", err.0 .0);
                }
            });
            task_names.insert(handle.id(), name.clone());
            pending.insert(name);
        }

        // Drop the sender so the channel closes when all tasks complete
        drop(tx);

        let mut report = FetchReport::default();
        while let Some((name, outcome)) = rx.recv().await {
            pending.remove(&name);
            match outcome {
                Ok(Some(data)) => {
                    info!(
                        self.logger,
                        "fetched {} ({} readings)",
                        name,
                        data.series.len()
                    );
                    report.dataset.insert(name, data);
                }
                Ok(None) => {
                    info!(self.logger, "no data found for {}", name);
                    report.failures.push(VariableFailure {
                        variable: name,
                        reason: FailureReason::NoDataFound,
                    });
                }
                Err(FailureReason::Acquire(AcquireError::Authentication(reason))) => {
                    error!(
                        self.logger,
                        "authentication failed for {}, aborting batch: {}", name, reason
                    );
                    set.abort_all();
                    return Err(FetchError::Authentication {
                        variable: name,
                        reason,
                    });
                }
                Err(reason) => {
                    error!(self.logger, "failed to fetch {}: {}", name, reason);
                    report.failures.push(VariableFailure {
                        variable: name,
                        reason,
                    });
                }
            }
        }

        while let Some(joined) = set.join_next_with_id().await {
            let Err(err) = joined else { continue };
            let Some(name) = task_names.remove(&err.id()) else {
                continue;
            };
            if !pending.remove(&name) {
                continue;
            }
            let detail = join_error_detail(err);
            error!(self.logger, "acquisition of {} failed: {}", name, detail);
            report.failures.push(VariableFailure {
                variable: name,
                reason: FailureReason::WorkerPanicked(detail),
            });
        }
        for name in pending {
            error!(self.logger, "no result from {}", name);
            report.failures.push(VariableFailure {
                variable: name,
                reason: FailureReason::WorkerPanicked("task ended without a result".to_string()),
            });
        }

        if report.dataset.is_empty() {
            return Err(FetchError::NoDataAvailable {
                failures: report.failures,
            });
        }

        info!(
            self.logger,
            "fetched {} of {} variables",
            report.dataset.len(),
            total
        );
        Ok(report)
    }
}

/// Panic payload text when there is one
fn join_error_detail(err: JoinError) -> String {
    if !err.is_panic() {
        return err.to_string();
    }
    let payload = err.into_panic();
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {}", message)
    } else {
        "panicked".to_string()
    }
}
