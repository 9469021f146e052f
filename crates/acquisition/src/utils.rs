use std::{env, time::Duration};

use clap::Parser;
use nasa_weather_core::{
    find_config_file, load_config, ConfigSource, DEFAULT_MAX_FILES, DEFAULT_TASK_TIMEOUT,
};
use slog::{o, Drain, Level, Logger};

use crate::{Backend, Endpoints, DEFAULT_USER_AGENT};

#[derive(Parser, Clone, Debug, serde::Deserialize, Default)]
#[command(
    author,
    version,
    about = "Weather Fetch - Pulls NASA weather variables for a point and writes a consolidated CSV"
)]
pub struct Cli {
    /// Path to config file (TOML format)
    /// Searched in order: this flag, $NASA_WEATHER_FETCH_CONFIG, ./fetch.toml,
    /// $XDG_CONFIG_HOME/nasa-weather/fetch.toml, /etc/nasa-weather/fetch.toml
    #[arg(short, long)]
    #[serde(skip)]
    pub config: Option<String>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short, long, env = "NASA_WEATHER_FETCH_LEVEL")]
    pub level: Option<String>,

    /// Data backend: giovanni or granules
    #[arg(short, long, env = "NASA_WEATHER_FETCH_BACKEND")]
    pub backend: Option<Backend>,

    #[arg(long, env = "NASA_WEATHER_FETCH_LAT", allow_hyphen_values = true)]
    pub lat: Option<f64>,

    #[arg(long, env = "NASA_WEATHER_FETCH_LON", allow_hyphen_values = true)]
    pub lon: Option<f64>,

    /// Window start, e.g. 2024-04-10T00:00:00
    #[arg(long, env = "NASA_WEATHER_FETCH_START")]
    pub start: Option<String>,

    /// Window end, e.g. 2024-04-10T15:30:00
    #[arg(long, env = "NASA_WEATHER_FETCH_END")]
    pub end: Option<String>,

    /// Variables to fetch (repeatable), defaults to the forecast set
    #[arg(long = "variable", env = "NASA_WEATHER_FETCH_VARIABLES", value_delimiter = ',')]
    #[serde(default)]
    pub variables: Vec<String>,

    /// Granules opened per variable
    #[arg(long, env = "NASA_WEATHER_FETCH_MAX_FILES")]
    pub max_files: Option<usize>,

    /// Per-variable acquisition timeout in seconds
    #[arg(long, env = "NASA_WEATHER_FETCH_TASK_TIMEOUT")]
    pub task_timeout: Option<u64>,

    /// Per-request HTTP timeout in seconds
    #[arg(long, env = "NASA_WEATHER_FETCH_REQUEST_TIMEOUT")]
    pub request_timeout: Option<u64>,

    /// Concurrent acquisitions, defaults to one per variable
    #[arg(long, env = "NASA_WEATHER_FETCH_MAX_WORKERS")]
    pub max_workers: Option<usize>,

    /// Earthdata username, falls back to NASA_USERNAME or ~/.netrc
    #[arg(short, long)]
    pub username: Option<String>,

    /// Earthdata password, falls back to NASA_PASSWORD or ~/.netrc
    #[arg(short, long)]
    pub password: Option<String>,

    /// Directory the consolidated CSV is written to
    #[arg(short, long, env = "NASA_WEATHER_FETCH_OUTPUT")]
    pub output: Option<String>,

    /// HTTP User-Agent header for NASA API requests
    #[arg(long, env = "NASA_WEATHER_FETCH_USER_AGENT")]
    pub user_agent: Option<String>,

    /// Upstream URLs, only settable from the config file
    #[arg(skip)]
    #[serde(default)]
    pub endpoints: Option<Endpoints>,
}

impl Cli {
    pub fn backend(&self) -> Backend {
        self.backend.unwrap_or_default()
    }

    pub fn lat(&self) -> f64 {
        self.lat.unwrap_or(31.8578)
    }

    pub fn lon(&self) -> f64 {
        self.lon.unwrap_or(-116.6058)
    }

    pub fn start(&self) -> String {
        self.start
            .clone()
            .unwrap_or_else(|| "2024-04-10T00:00:00".to_string())
    }

    pub fn end(&self) -> String {
        self.end
            .clone()
            .unwrap_or_else(|| "2024-04-10T15:30:00".to_string())
    }

    pub fn max_files(&self) -> usize {
        self.max_files.unwrap_or(DEFAULT_MAX_FILES)
    }

    pub fn task_timeout(&self) -> Duration {
        Duration::from_secs(self.task_timeout.unwrap_or(DEFAULT_TASK_TIMEOUT))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout.unwrap_or(60))
    }

    pub fn output(&self) -> String {
        self.output.clone().unwrap_or_else(|| "./data".to_string())
    }

    pub fn user_agent(&self) -> String {
        self.user_agent
            .clone()
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string())
    }

    pub fn endpoints(&self) -> Endpoints {
        self.endpoints.clone().unwrap_or_default()
    }
}

/// Load configuration from CLI args, config file, and environment
pub fn get_config_info() -> Cli {
    let cli_args = Cli::parse();

    let source = if let Some(ref path) = cli_args.config {
        ConfigSource::Explicit(path.into())
    } else {
        find_config_file("NASA_WEATHER_FETCH_CONFIG", "fetch.toml")
    };

    let file_config: Cli = load_config(&source).unwrap_or_default();
    merge_config(cli_args, file_config)
}

/// CLI args override file config (env vars are handled by clap)
pub fn merge_config(cli_args: Cli, file_config: Cli) -> Cli {
    Cli {
        config: cli_args.config,
        level: cli_args.level.or(file_config.level),
        backend: cli_args.backend.or(file_config.backend),
        lat: cli_args.lat.or(file_config.lat),
        lon: cli_args.lon.or(file_config.lon),
        start: cli_args.start.or(file_config.start),
        end: cli_args.end.or(file_config.end),
        variables: if cli_args.variables.is_empty() {
            file_config.variables
        } else {
            cli_args.variables
        },
        max_files: cli_args.max_files.or(file_config.max_files),
        task_timeout: cli_args.task_timeout.or(file_config.task_timeout),
        request_timeout: cli_args.request_timeout.or(file_config.request_timeout),
        max_workers: cli_args.max_workers.or(file_config.max_workers),
        username: cli_args.username.or(file_config.username),
        password: cli_args.password.or(file_config.password),
        output: cli_args.output.or(file_config.output),
        user_agent: cli_args.user_agent.or(file_config.user_agent),
        endpoints: cli_args.endpoints.or(file_config.endpoints),
    }
}

pub fn parse_level(raw: &str) -> Level {
    match raw.to_lowercase().as_str() {
        "trace" => Level::Trace,
        "debug" => Level::Debug,
        "info" => Level::Info,
        "warn" => Level::Warning,
        "error" => Level::Error,
        _ => Level::Info,
    }
}

pub fn setup_logger(cli: &Cli) -> Logger {
    let log_level = match cli.level.as_ref() {
        Some(level) => parse_level(level),
        None => parse_level(&env::var("RUST_LOG").unwrap_or_default()),
    };

    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::CompactFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();
    let drain = drain.filter_level(log_level).fuse();
    slog::Logger::root(drain, o!("version" => env!("CARGO_PKG_VERSION")))
}
