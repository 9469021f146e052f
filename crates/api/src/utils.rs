use std::{env, time::Duration};

use acquisition::{Backend, Endpoints, DEFAULT_USER_AGENT};
use clap::Parser;
use fern::{
    colors::{Color, ColoredLevelConfig},
    Dispatch,
};
use log::LevelFilter;
use nasa_weather_core::{
    find_config_file, load_config, ConfigSource, DEFAULT_API_PORT, DEFAULT_MAX_FILES,
    DEFAULT_REFERENCE_YEAR, DEFAULT_TASK_TIMEOUT,
};
use time::{format_description::well_known::Iso8601, OffsetDateTime};

use crate::DEFAULT_OPENAI_BASE_URL;

#[derive(Parser, Clone, Debug, serde::Deserialize, Default)]
#[command(
    author,
    version,
    about = "Weather API - NASA weather summaries, LLM forecasts and CSV exports over HTTP"
)]
pub struct Cli {
    /// Path to config file (TOML format)
    /// Searched in order: this flag, $NASA_WEATHER_API_CONFIG, ./api.toml,
    /// $XDG_CONFIG_HOME/nasa-weather/api.toml, /etc/nasa-weather/api.toml
    #[arg(short, long)]
    #[serde(skip)]
    pub config: Option<String>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short, long, env = "NASA_WEATHER_API_LEVEL")]
    pub level: Option<String>,

    /// Host to listen on (use 0.0.0.0 for all interfaces)
    #[arg(long, env = "NASA_WEATHER_API_HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "NASA_WEATHER_API_PORT")]
    pub port: Option<u16>,

    /// Earthdata username, falls back to NASA_USERNAME or ~/.netrc
    #[arg(short, long)]
    pub username: Option<String>,

    /// Earthdata password, falls back to NASA_PASSWORD or ~/.netrc
    #[arg(long)]
    pub password: Option<String>,

    /// API key for the chat-completion service
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// Base URL of an OpenAI-compatible chat-completion service
    #[arg(long, env = "NASA_WEATHER_API_OPENAI_BASE_URL")]
    pub openai_base_url: Option<String>,

    /// Models tried before the built-in fallbacks, comma separated
    #[arg(long = "model", env = "NASA_WEATHER_API_MODELS", value_delimiter = ',')]
    #[serde(default)]
    pub models: Vec<String>,

    /// Data backend: giovanni or granules
    #[arg(short, long, env = "NASA_WEATHER_API_BACKEND")]
    pub backend: Option<Backend>,

    /// Granules opened per variable
    #[arg(long, env = "NASA_WEATHER_API_MAX_FILES")]
    pub max_files: Option<usize>,

    /// Per-variable acquisition timeout in seconds
    #[arg(long, env = "NASA_WEATHER_API_TASK_TIMEOUT")]
    pub task_timeout: Option<u64>,

    /// Per-request HTTP timeout in seconds
    #[arg(long, env = "NASA_WEATHER_API_REQUEST_TIMEOUT")]
    pub request_timeout: Option<u64>,

    /// Year whose data stands in for the requested calendar day
    #[arg(long, env = "NASA_WEATHER_API_REFERENCE_YEAR")]
    pub reference_year: Option<i32>,

    /// Variables summarized per request, defaults to the forecast set
    #[arg(long = "variable", env = "NASA_WEATHER_API_VARIABLES", value_delimiter = ',')]
    #[serde(default)]
    pub variables: Vec<String>,

    /// Upstream URLs, only settable from the config file
    #[arg(skip)]
    #[serde(default)]
    pub endpoints: Option<Endpoints>,
}

impl Cli {
    pub fn host(&self) -> String {
        self.host.clone().unwrap_or_else(|| "127.0.0.1".to_string())
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_API_PORT)
    }

    pub fn openai_base_url(&self) -> String {
        self.openai_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string())
    }

    pub fn backend(&self) -> Backend {
        self.backend.unwrap_or_default()
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

    pub fn reference_year(&self) -> i32 {
        self.reference_year.unwrap_or(DEFAULT_REFERENCE_YEAR)
    }

    pub fn user_agent(&self) -> String {
        DEFAULT_USER_AGENT.to_string()
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
        find_config_file("NASA_WEATHER_API_CONFIG", "api.toml")
    };

    if let Some(path) = source.path() {
        log::info!("Loading config from: {}", path.display());
    }

    let file_config: Cli = load_config(&source).unwrap_or_default();
    merge_config(cli_args, file_config)
}

/// CLI args override file config (env vars are handled by clap)
pub fn merge_config(cli_args: Cli, file_config: Cli) -> Cli {
    Cli {
        config: cli_args.config,
        level: cli_args.level.or(file_config.level),
        host: cli_args.host.or(file_config.host),
        port: cli_args.port.or(file_config.port),
        username: cli_args.username.or(file_config.username),
        password: cli_args.password.or(file_config.password),
        openai_api_key: cli_args.openai_api_key.or(file_config.openai_api_key),
        openai_base_url: cli_args.openai_base_url.or(file_config.openai_base_url),
        models: if cli_args.models.is_empty() {
            file_config.models
        } else {
            cli_args.models
        },
        backend: cli_args.backend.or(file_config.backend),
        max_files: cli_args.max_files.or(file_config.max_files),
        task_timeout: cli_args.task_timeout.or(file_config.task_timeout),
        request_timeout: cli_args.request_timeout.or(file_config.request_timeout),
        reference_year: cli_args.reference_year.or(file_config.reference_year),
        variables: if cli_args.variables.is_empty() {
            file_config.variables
        } else {
            cli_args.variables
        },
        endpoints: cli_args.endpoints.or(file_config.endpoints),
    }
}

pub fn get_log_level(cli: &Cli) -> LevelFilter {
    let level_str = cli
        .level
        .clone()
        .or_else(|| env::var("RUST_LOG").ok())
        .unwrap_or_else(|| "info".to_string());

    match level_str.to_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        _ => LevelFilter::Info,
    }
}

pub fn setup_logger() -> Dispatch {
    let colors = ColoredLevelConfig::new()
        .trace(Color::White)
        .debug(Color::Cyan)
        .info(Color::Blue)
        .warn(Color::Yellow)
        .error(Color::Magenta);

    fern::Dispatch::new()
        .format(move |out, message, record| {
            let now = OffsetDateTime::now_utc();
            out.finish(format_args!(
                "[{} {}] {}: {}",
                now.format(&Iso8601::DEFAULT)
                    .unwrap_or_else(|_| now.to_string()),
                colors.color(record.level()),
                record.target(),
                message
            ));
        })
        .chain(std::io::stdout())
}
