//! Configuration types for gdpull

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable supplying the OAuth client identifier
pub const ENV_CLIENT_ID: &str = "GDPULL_CLIENT_ID";

/// Environment variable supplying the OAuth client secret
pub const ENV_CLIENT_SECRET: &str = "GDPULL_CLIENT_SECRET";

/// OAuth client and token cache configuration
///
/// Used as a nested sub-config within [`Config`]. Credentials are never read
/// from files; they come from the environment at startup.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthConfig {
    /// OAuth client identifier (from `GDPULL_CLIENT_ID`)
    pub client_id: String,

    /// OAuth client secret (from `GDPULL_CLIENT_SECRET`)
    pub client_secret: String,

    /// Token cache file (default: `~/.gdpull`)
    #[serde(default = "default_token_cache_path")]
    pub token_cache_path: PathBuf,

    /// Authorization endpoint presented to the operator
    #[serde(default = "default_auth_url")]
    pub auth_url: String,

    /// Token endpoint used for code exchange and refresh
    #[serde(default = "default_token_url")]
    pub token_url: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            token_cache_path: default_token_cache_path(),
            auth_url: default_auth_url(),
            token_url: default_token_url(),
        }
    }
}

/// Download behavior configuration (destination, concurrency, listing page size)
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Directory downloaded files are written into (default: current directory)
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// Maximum concurrent downloads (default: 5)
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_downloads: usize,

    /// Listing page size requested from the remote API (default: 100)
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            max_concurrent_downloads: default_max_concurrent(),
            page_size: default_page_size(),
        }
    }
}

/// Main configuration for gdpull
///
/// Fields are organized into logical sub-configs:
/// - [`auth`](AuthConfig) — OAuth credentials, endpoints, token cache
/// - [`download`](DownloadConfig) — destination, concurrency, page size
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// OAuth credentials and token cache settings
    #[serde(flatten)]
    pub auth: AuthConfig,

    /// Download behavior settings
    #[serde(flatten)]
    pub download: DownloadConfig,
}

impl Config {
    /// Build a configuration from the process environment
    ///
    /// Both credential variables are required; the absence of either is a
    /// fatal configuration error raised before any remote work starts.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable lookup
    ///
    /// `from_env` delegates here; tests inject closures instead of mutating
    /// the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let client_id = require_var(&lookup, ENV_CLIENT_ID)?;
        let client_secret = require_var(&lookup, ENV_CLIENT_SECRET)?;

        Ok(Self {
            auth: AuthConfig {
                client_id,
                client_secret,
                ..AuthConfig::default()
            },
            download: DownloadConfig::default(),
        })
    }

    /// Validate settings that cannot be expressed in the type system
    pub fn validate(&self) -> Result<()> {
        if self.download.max_concurrent_downloads == 0 {
            return Err(Error::config(
                "max_concurrent_downloads must be at least 1",
                "max_concurrent_downloads",
            ));
        }
        if self.download.page_size == 0 {
            return Err(Error::config("page_size must be at least 1", "page_size"));
        }
        Ok(())
    }
}

fn require_var(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String> {
    lookup(key).ok_or_else(|| {
        Error::config(format!("'{}' environment variable is required", key), key)
    })
}

fn default_token_cache_path() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_default()
        .join(".gdpull")
}

fn default_auth_url() -> String {
    "https://accounts.google.com/o/oauth2/auth".to_string()
}

fn default_token_url() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

fn default_download_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_max_concurrent() -> usize {
    5
}

fn default_page_size() -> usize {
    100
}
