//! Configuration management for qrshield
//!
//! This module defines the main `Config` struct and its sub-structs. Settings
//! are layered with `figment`: built-in defaults, then an optional
//! `qrshield.toml` file, then `QRSHIELD_`-prefixed environment variables,
//! then command-line overrides.

use crate::cli::Cli;
use crate::lookup::{
    safe_browsing::DEFAULT_SAFE_BROWSING_URL, virustotal::DEFAULT_VIRUSTOTAL_URL,
    whois::DEFAULT_WHOIS_URL,
};
use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration file read when none is given on the command line.
pub const DEFAULT_CONFIG_FILE: &str = "qrshield.toml";

/// The main configuration struct for the application.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct Config {
    pub core: CoreConfig,
    /// Result cache and per-check limits.
    pub analysis: AnalysisConfig,
    /// Outbound HTTP settings shared by the URL-expansion and SSL checks.
    pub network: NetworkConfig,
    /// Credentials and endpoints of the optional lookup services.
    pub api: ApiConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CoreConfig {
    /// The logging level (an `EnvFilter` directive).
    pub log_level: String,
    /// Log a snapshot of all metrics before exiting.
    #[serde(default)]
    pub log_metrics: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_metrics: false,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub cache_enabled: bool,
    /// Maximum number of cached reports.
    pub cache_max_entries: usize,
    /// How long a cached report stays valid, in seconds.
    pub cache_ttl_secs: u64,
    /// Upper bound on a single check, in seconds. A check that runs longer is
    /// reported as failed.
    pub check_timeout_secs: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            cache_max_entries: 100,
            cache_ttl_secs: 300,
            check_timeout_secs: 15,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct NetworkConfig {
    /// Timeout of a single outbound request, in milliseconds.
    pub request_timeout_ms: u64,
    /// Maximum number of redirects followed when expanding a short URL.
    pub max_redirects: u32,
    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 10_000,
            max_redirects: 5,
            user_agent: format!("qrshield/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Optional lookup services. A service without a key is never called.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ApiConfig {
    pub safe_browsing_key: Option<String>,
    pub safe_browsing_url: String,
    pub virustotal_key: Option<String>,
    pub virustotal_url: String,
    pub whois_key: Option<String>,
    pub whois_url: String,
    /// How long per-domain lookup answers are memoised, in seconds.
    pub lookup_cache_ttl_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            safe_browsing_key: None,
            safe_browsing_url: DEFAULT_SAFE_BROWSING_URL.to_string(),
            virustotal_key: None,
            virustotal_url: DEFAULT_VIRUSTOTAL_URL.to_string(),
            whois_key: None,
            whois_url: DEFAULT_WHOIS_URL.to_string(),
            lookup_cache_ttl_secs: 3600,
        }
    }
}

/// The format for stdout output.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    Json,
    #[default]
    PlainText,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct OutputConfig {
    pub format: OutputFormat,
}

impl Config {
    fn figment(config_path: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            // e.g. QRSHIELD_API__SAFE_BROWSING_KEY=... or QRSHIELD_ANALYSIS__CACHE_ENABLED=false
            .merge(Env::prefixed("QRSHIELD_").split("__"))
    }

    /// Loads the configuration from the specified file and the environment.
    ///
    /// A missing file is not an error; the defaults and environment apply.
    pub fn load(config_path: impl AsRef<Path>) -> Result<Self> {
        let config: Config = Self::figment(config_path.as_ref()).extract()?;
        Ok(config)
    }

    /// Loads the configuration with command-line arguments as the final layer.
    pub fn load_from_cli(cli: &Cli) -> Result<Self> {
        let path = cli
            .config
            .clone()
            .unwrap_or_else(|| DEFAULT_CONFIG_FILE.into());
        let config: Config = Self::figment(&path).merge(cli.clone()).extract()?;
        Ok(config)
    }
}
