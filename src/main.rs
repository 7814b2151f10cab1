//! qrshield - QR code URL threat analysis
//!
//! Analyses each URL given on the command line and prints the verdicts.

use anyhow::{anyhow, Result};
use clap::Parser;
use qrshield::{
    cli::Cli,
    config::Config,
    engine::AnalysisEngine,
    formatting::formatter_for,
    reporting::{ExportFormat, LoggingObserver, ReportManager},
    telemetry::{describe_metrics, LoggingRecorder},
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Defaults, then file, then environment, then command-line arguments.
    let config = match Config::load_from_cli(&cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Failed to load configuration: {:#}", err);
            std::process::exit(1);
        }
    };

    // RUST_LOG wins over the configured level.
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.core.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let snapshot = if config.core.log_metrics {
        let (recorder, snapshot) = LoggingRecorder::new();
        metrics::set_global_recorder(recorder)
            .map_err(|_| anyhow!("a metrics recorder is already installed"))?;
        Some(snapshot)
    } else {
        None
    };
    describe_metrics();

    info!(
        cache_enabled = config.analysis.cache_enabled,
        check_timeout_secs = config.analysis.check_timeout_secs,
        max_redirects = config.network.max_redirects,
        safe_browsing = config.api.safe_browsing_key.is_some(),
        virustotal = config.api.virustotal_key.is_some(),
        whois = config.api.whois_key.is_some(),
        "qrshield starting"
    );

    let engine = AnalysisEngine::builder(config.clone()).build()?;
    let formatter = formatter_for(config.output.format);

    let reports = ReportManager::default();
    reports.subscribe(Arc::new(LoggingObserver)).await;

    for (i, url) in cli.urls.iter().enumerate() {
        let report = engine.analyze(url).await;
        if i > 0 {
            println!();
        }
        println!("{}", formatter.format(&report));

        if let Some(category) = cli.report {
            let description = cli.description.as_deref().unwrap_or_default();
            if let Err(e) = reports.report_url(url, category, description).await {
                warn!(url = %url, error = %e, "Could not report URL");
            }
        }
    }

    if cli.report.is_some() {
        println!();
        println!("{}", reports.export_reports(ExportFormat::Json).await?);
    }

    if let Some(snapshot) = snapshot {
        snapshot.log();
    }
    Ok(())
}
