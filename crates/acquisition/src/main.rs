use std::{fs::File, path::Path};

use acquisition::{
    build_source, consolidate, consolidated_filename, get_config_info, select_variables,
    setup_logger, write_csv, FetchOptions, FetchOrchestrator, GeoPoint, SourceConfig, TimeWindow,
};
use anyhow::anyhow;
use nasa_weather_core::{ensure_parent_dir, Credentials};
use slog::{info, warn};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    dotenvy::dotenv().ok();
    let cli = get_config_info();
    let logger = setup_logger(&cli);

    let point = GeoPoint::new(cli.lat(), cli.lon())?;
    let window = TimeWindow::parse(&cli.start(), &cli.end())?;
    let variables = select_variables(&cli.variables)?;
    let credentials = Credentials::resolve(cli.username.clone(), cli.password.clone())?;

    info!(logger, "Weather fetch starting...");
    info!(logger, "  Backend: {}", cli.backend());
    info!(logger, "  Point: {}, {}", point.lat, point.lon);
    info!(logger, "  Window: {} -> {}", cli.start(), cli.end());
    info!(logger, "  Variables: {}", variables.len());

    let config = SourceConfig {
        credentials,
        endpoints: cli.endpoints(),
        user_agent: cli.user_agent(),
        request_timeout: cli.request_timeout(),
        max_files: cli.max_files(),
    };
    let source = build_source(cli.backend(), config, logger.clone())?;
    let options = FetchOptions {
        max_workers: cli.max_workers,
        task_timeout: cli.task_timeout(),
    };

    let report = FetchOrchestrator::new(logger.clone(), source, options)
        .fetch(&variables, point, window)
        .await?;
    for failure in &report.failures {
        warn!(logger, "missing variable {}", failure);
    }

    let consolidated = consolidate(&report.dataset);
    for (name, stats) in &consolidated.stats {
        info!(
            logger,
            "{}: min={:.3} max={:.3} mean={:.3} n={}",
            name,
            stats.min,
            stats.max,
            stats.mean,
            stats.count
        );
    }
    if let Some(cloudiness) = &consolidated.cloudiness {
        info!(
            logger,
            "sky: {} (mean radiation {:.1} W/m², {:.1}% sunny, {:.1}% cloudy)",
            cloudiness.bucket,
            cloudiness.mean_radiation,
            cloudiness.sunny_pct,
            cloudiness.cloudy_pct
        );
    }

    let output_path = Path::new(&cli.output()).join(consolidated_filename(point));
    ensure_parent_dir(&output_path.to_string_lossy())?;
    let file = File::create(&output_path)
        .map_err(|e| anyhow!("failed to create {}: {}", output_path.display(), e))?;
    write_csv(&consolidated.table, file)?;

    info!(
        logger,
        "wrote {} rows to {}",
        consolidated.table.len(),
        output_path.display()
    );
    Ok(())
}
