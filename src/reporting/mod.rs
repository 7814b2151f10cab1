//! Escalation of suspicious URLs.
//!
//! A user who disagrees with (or wants to act on) a verdict can report the
//! URL. The `ReportManager` builds a `ReportRecord`, logs it internally,
//! prepares manual-submission guides for the public reporting services, keeps
//! the record in history and tells every subscribed observer what happened.

pub mod export;
pub mod manager;
pub mod observer;
pub mod services;

pub use export::{ExportFormat, ReportStatistics};
pub use manager::{ReportManager, ReportSink, TracingReportSink};
pub use observer::{ChannelObserver, LoggingObserver, ReportObserver};
pub use services::{manual_guides, ManualGuide, Priority};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("failed to record report: {0}")]
    Sink(String),

    #[error("failed to export reports: {0}")]
    Export(String),
}

impl From<csv::Error> for ReportError {
    fn from(e: csv::Error) -> Self {
        ReportError::Export(e.to_string())
    }
}

impl From<serde_json::Error> for ReportError {
    fn from(e: serde_json::Error) -> Self {
        ReportError::Export(e.to_string())
    }
}

/// What kind of threat the user is reporting.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ReportCategory {
    Phishing,
    Malware,
    Scam,
    Spam,
    Other,
}

impl fmt::Display for ReportCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReportCategory::Phishing => "phishing",
            ReportCategory::Malware => "malware",
            ReportCategory::Scam => "scam",
            ReportCategory::Spam => "spam",
            ReportCategory::Other => "other",
        };
        f.write_str(s)
    }
}

/// Lifecycle of a report: `Pending` then exactly one of the terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Pending,
    Completed,
    Error,
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReportStatus::Pending => "pending",
            ReportStatus::Completed => "completed",
            ReportStatus::Error => "error",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    /// Recorded by this application.
    Logged,
    /// Needs the user to submit it by hand following the attached guides.
    ManualRequired,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SubmissionData {
    Logged { logged_at: DateTime<Utc> },
    Manual { guides: Vec<ManualGuide> },
}

/// One sub-action performed for a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub service: String,
    pub status: SubmissionStatus,
    pub data: SubmissionData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRecord {
    pub report_id: Uuid,
    pub url: String,
    pub category: ReportCategory,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    pub status: ReportStatus,
    pub submissions: Vec<Submission>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReportRecord {
    /// Creates a pending record with a fresh identifier.
    pub fn new(url: &str, category: ReportCategory, description: &str) -> Self {
        Self {
            report_id: Uuid::new_v4(),
            url: url.to_string(),
            category,
            description: description.to_string(),
            timestamp: Utc::now(),
            status: ReportStatus::Pending,
            submissions: Vec::new(),
            error: None,
        }
    }
}

/// Lifecycle notifications delivered to observers.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportEvent {
    Submitting(ReportRecord),
    Completed(ReportRecord),
    Error { record: ReportRecord, message: String },
    HistoryCleared,
}

impl ReportEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            ReportEvent::Submitting(_) => "submitting",
            ReportEvent::Completed(_) => "completed",
            ReportEvent::Error { .. } => "error",
            ReportEvent::HistoryCleared => "history_cleared",
        }
    }
}
