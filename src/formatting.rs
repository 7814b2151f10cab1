// src/formatting.rs

use crate::config::OutputFormat;
use crate::core::{CheckOutcome, CompositeReport};

/// A trait for rendering a composite report for the terminal.
pub trait ReportFormatter: Send + Sync {
    fn format(&self, report: &CompositeReport) -> String;
}

/// Returns the formatter for the configured output format.
pub fn formatter_for(format: OutputFormat) -> Box<dyn ReportFormatter> {
    match format {
        OutputFormat::Json => Box::new(JsonFormatter),
        OutputFormat::PlainText => Box::new(PlainTextFormatter),
    }
}

/// Pretty-printed JSON, one document per report.
pub struct JsonFormatter;

impl ReportFormatter for JsonFormatter {
    fn format(&self, report: &CompositeReport) -> String {
        serde_json::to_string_pretty(report)
            .unwrap_or_else(|e| format!("{{\"url\":{:?},\"error\":{:?}}}", report.url, e.to_string()))
    }
}

/// A human-readable summary.
pub struct PlainTextFormatter;

impl PlainTextFormatter {
    fn format_check(name: &str, outcome: &CheckOutcome) -> String {
        match outcome {
            CheckOutcome::Ok(report) => format!(
                "  {:<18} {:<8} {}",
                name,
                report.risk_level.to_string(),
                report.details.join("; ")
            ),
            CheckOutcome::Failed { message } => format!("  {:<18} {:<8} {}", name, "failed", message),
        }
    }
}

impl ReportFormatter for PlainTextFormatter {
    fn format(&self, report: &CompositeReport) -> String {
        let mut lines = vec![
            format!("URL:     {}", report.url),
            format!(
                "Safety:  {} (risk score {}/100)",
                report.overall_safety.to_string().to_uppercase(),
                report.risk_score
            ),
        ];
        if let Some(error) = &report.error {
            lines.push(format!("Error:   {}", error));
        }

        lines.push("Checks:".to_string());
        for (name, outcome) in &report.checks {
            lines.push(Self::format_check(name.as_str(), outcome));
        }

        lines.push("Recommendations:".to_string());
        for rec in &report.recommendations {
            lines.push(format!("  - {}", rec));
        }
        lines.join("\n")
    }
}
