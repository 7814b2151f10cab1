//! History export and statistics.

use crate::reporting::{ReportCategory, ReportError, ReportRecord, ReportStatus};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Records newer than this count as recent.
const RECENT_WINDOW_HOURS: i64 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportStatistics {
    pub total: usize,
    pub by_category: BTreeMap<ReportCategory, usize>,
    pub by_status: BTreeMap<ReportStatus, usize>,
    /// Records from the last 24 hours.
    pub recent: usize,
}

#[derive(Serialize)]
struct CsvRow<'a> {
    report_id: String,
    url: &'a str,
    category: ReportCategory,
    description: &'a str,
    timestamp: String,
    status: ReportStatus,
    submissions: usize,
}

pub(crate) fn export(records: &[ReportRecord], format: ExportFormat) -> Result<String, ReportError> {
    match format {
        ExportFormat::Json => Ok(serde_json::to_string_pretty(records)?),
        ExportFormat::Csv => {
            let mut writer = csv::Writer::from_writer(Vec::new());
            for record in records {
                writer.serialize(CsvRow {
                    report_id: record.report_id.to_string(),
                    url: &record.url,
                    category: record.category,
                    description: &record.description,
                    timestamp: record.timestamp.to_rfc3339(),
                    status: record.status,
                    submissions: record.submissions.len(),
                })?;
            }
            let bytes = writer
                .into_inner()
                .map_err(|e| ReportError::Export(e.to_string()))?;
            String::from_utf8(bytes).map_err(|e| ReportError::Export(e.to_string()))
        }
    }
}

pub(crate) fn statistics(records: &[ReportRecord], now: DateTime<Utc>) -> ReportStatistics {
    let cutoff = now - Duration::hours(RECENT_WINDOW_HOURS);
    let mut stats = ReportStatistics {
        total: records.len(),
        ..Default::default()
    };

    for record in records {
        *stats.by_category.entry(record.category).or_default() += 1;
        *stats.by_status.entry(record.status).or_default() += 1;
        if record.timestamp > cutoff {
            stats.recent += 1;
        }
    }
    stats
}
