//! Command-Line Interface (CLI) argument parsing.
//!
//! Arguments are parsed at startup and then merged as the last layer on top
//! of the `qrshield.toml` file and the environment.

use crate::reporting::ReportCategory;
use clap::Parser;
use figment::{
    value::{Dict, Map, Value},
    Error, Metadata, Profile, Provider,
};
use std::path::PathBuf;

/// Checks URLs decoded from QR codes for phishing and other threats.
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print reports as JSON.
    #[arg(long)]
    pub json: bool,

    /// Bypass the result cache.
    #[arg(long)]
    pub no_cache: bool,

    /// Log level or filter directive, e.g. `debug` or `qrshield=trace`.
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Log a snapshot of the collected metrics before exiting.
    #[arg(long)]
    pub log_metrics: bool,

    /// Escalate every analysed URL as a report in this category.
    #[arg(long, value_enum, value_name = "CATEGORY")]
    pub report: Option<ReportCategory>,

    /// Free-text description attached to reports.
    #[arg(long, requires = "report", value_name = "TEXT")]
    pub description: Option<String>,

    /// URLs to analyse.
    #[arg(required = true, value_name = "URL")]
    pub urls: Vec<String>,
}

impl Provider for Cli {
    fn metadata(&self) -> Metadata {
        Metadata::named("Command-Line Arguments")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        let mut dict = Dict::new();

        let mut core = Dict::new();
        if let Some(level) = &self.log_level {
            core.insert("log_level".into(), Value::from(level.clone()));
        }
        if self.log_metrics {
            core.insert("log_metrics".into(), Value::from(true));
        }
        if !core.is_empty() {
            dict.insert("core".into(), Value::from(core));
        }

        // Flags only override when present; an absent flag leaves the file
        // and environment values alone.
        if self.no_cache {
            let mut analysis = Dict::new();
            analysis.insert("cache_enabled".into(), Value::from(false));
            dict.insert("analysis".into(), Value::from(analysis));
        }

        if self.json {
            let mut output = Dict::new();
            output.insert("format".into(), Value::from("Json"));
            dict.insert("output".into(), Value::from(output));
        }

        let mut map = Map::new();
        map.insert(Profile::Default, dict);
        Ok(map)
    }
}
