//! Earthdata credential discovery
//!
//! Credentials come from, in order: explicit values (CLI / config file),
//! the usual environment variable names, then the `~/.netrc` entry for
//! `urs.earthdata.nasa.gov`.

use std::env;
use std::fmt;
use std::fs;
use std::path::PathBuf;

use log::debug;

/// Host used by Earthdata Login in `.netrc` files
pub const EARTHDATA_HOST: &str = "urs.earthdata.nasa.gov";

const USERNAME_VARS: [&str; 3] = ["NASA_USERNAME", "EARTHDATA_USERNAME", "URS_USERNAME"];
const PASSWORD_VARS: [&str; 3] = ["NASA_PASSWORD", "EARTHDATA_PASSWORD", "URS_PASSWORD"];

#[derive(thiserror::Error, Debug)]
pub enum CredentialsError {
    #[error(
        "no Earthdata credentials found: set NASA_USERNAME and NASA_PASSWORD or add \
         `machine {EARTHDATA_HOST} login <user> password <pass>` to ~/.netrc"
    )]
    NotFound,
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Resolve credentials from explicit values, the environment, then `~/.netrc`
    pub fn resolve(
        username: Option<String>,
        password: Option<String>,
    ) -> Result<Self, CredentialsError> {
        if let (Some(user), Some(pass)) = (&username, &password) {
            if !user.is_empty() && !pass.is_empty() {
                return Ok(Self::new(user.clone(), pass.clone()));
            }
        }

        let env_user = USERNAME_VARS.iter().find_map(|v| non_empty_var(v));
        let env_pass = PASSWORD_VARS.iter().find_map(|v| non_empty_var(v));
        if let (Some(user), Some(pass)) = (env_user, env_pass) {
            debug!("using Earthdata credentials from environment");
            return Ok(Self::new(user, pass));
        }

        if let Some(content) = netrc_path().and_then(|p| fs::read_to_string(p).ok()) {
            if let Some(found) = parse_netrc(&content, EARTHDATA_HOST) {
                debug!("using Earthdata credentials from ~/.netrc");
                return Ok(found);
            }
        }

        Err(CredentialsError::NotFound)
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

fn netrc_path() -> Option<PathBuf> {
    if let Ok(path) = env::var("NETRC") {
        return Some(PathBuf::from(path));
    }
    env::var("HOME")
        .ok()
        .map(|home| PathBuf::from(home).join(".netrc"))
}

/// Find the `login`/`password` pair for `host` in `.netrc` content
///
/// Tokens may be spread over any number of lines. A leading UTF-8 BOM is ignored.
pub fn parse_netrc(content: &str, host: &str) -> Option<Credentials> {
    let content = content.trim_start_matches('\u{feff}');
    let mut tokens = content.split_whitespace();

    let mut in_host = false;
    let mut login = None;
    let mut password = None;

    while let Some(token) = tokens.next() {
        match token {
            "machine" => {
                if in_host {
                    break;
                }
                in_host = tokens.next() == Some(host);
            }
            "default" => {
                if in_host {
                    break;
                }
            }
            "login" if in_host => login = tokens.next().map(str::to_string),
            "password" if in_host => password = tokens.next().map(str::to_string),
            _ => {}
        }
    }

    match (login, password) {
        (Some(username), Some(password)) => Some(Credentials { username, password }),
        _ => None,
    }
}
