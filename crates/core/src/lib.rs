//! NASA Weather Core Library
//!
//! Shared utilities for the acquisition CLI and the HTTP API:
//! - Configuration loading (XDG-compliant)
//! - Earthdata credential discovery
//! - Output file helpers

mod config;
mod credentials;
pub mod fs;

pub use config::{find_config_file, load_config, ConfigSource};
pub use credentials::{parse_netrc, Credentials, CredentialsError, EARTHDATA_HOST};
pub use fs::ensure_parent_dir;

/// Application name used for XDG paths
pub const APP_NAME: &str = "nasa-weather";

/// Default API port
pub const DEFAULT_API_PORT: u16 = 8000;

/// Default per-variable acquisition timeout (5 minutes)
pub const DEFAULT_TASK_TIMEOUT: u64 = 300;

/// Default number of granules opened per variable
pub const DEFAULT_MAX_FILES: usize = 2;

/// Year whose historical data stands in for a requested calendar day
pub const DEFAULT_REFERENCE_YEAR: i32 = 2024;
