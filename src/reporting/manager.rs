//! The report manager: builds records, keeps history, notifies observers.

use crate::reporting::export::{self, ExportFormat, ReportStatistics};
use crate::reporting::{
    manual_guides, ReportCategory, ReportError, ReportEvent, ReportObserver, ReportRecord,
    ReportStatus, Submission, SubmissionData, SubmissionStatus,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};
use url::Url;

/// Internal log of submitted reports.
#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn record(&self, record: &ReportRecord) -> Result<(), ReportError>;
}

/// A sink that writes reports to the application log.
#[derive(Debug, Default)]
pub struct TracingReportSink;

#[async_trait]
impl ReportSink for TracingReportSink {
    async fn record(&self, record: &ReportRecord) -> Result<(), ReportError> {
        info!(
            report_id = %record.report_id,
            url = %record.url,
            category = %record.category,
            description = %record.description,
            "URL reported"
        );
        Ok(())
    }
}

pub struct ReportManager {
    sink: Arc<dyn ReportSink>,
    observers: RwLock<Vec<Arc<dyn ReportObserver>>>,
    history: RwLock<Vec<ReportRecord>>,
}

impl Default for ReportManager {
    fn default() -> Self {
        Self::new(Arc::new(TracingReportSink))
    }
}

/// Observers are identified by the address of their shared allocation.
fn same_observer(a: &Arc<dyn ReportObserver>, b: &Arc<dyn ReportObserver>) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

impl ReportManager {
    pub fn new(sink: Arc<dyn ReportSink>) -> Self {
        Self {
            sink,
            observers: RwLock::new(Vec::new()),
            history: RwLock::new(Vec::new()),
        }
    }

    /// Adds an observer. Subscribing the same observer twice has no effect.
    pub async fn subscribe(&self, observer: Arc<dyn ReportObserver>) {
        let mut observers = self.observers.write().await;
        if !observers.iter().any(|o| same_observer(o, &observer)) {
            observers.push(observer);
        }
    }

    /// Removes an observer. Unknown observers are ignored.
    pub async fn unsubscribe(&self, observer: &Arc<dyn ReportObserver>) {
        self.observers
            .write()
            .await
            .retain(|o| !same_observer(o, observer));
    }

    pub async fn observer_count(&self) -> usize {
        self.observers.read().await.len()
    }

    async fn notify(&self, event: ReportEvent) {
        for observer in self.observers.read().await.iter() {
            observer.on_event(&event);
        }
    }

    /// Reports a URL.
    ///
    /// The record is logged through the sink while the manual-submission
    /// guides are prepared. Whatever the outcome, the record ends up in
    /// history in a terminal state.
    ///
    /// # Returns
    /// * `Ok(ReportRecord)` with status `Completed`
    /// * `Err` if the URL is invalid (nothing is recorded) or the sink failed
    ///   (the record is kept with status `Error`)
    #[instrument(skip(self, description))]
    pub async fn report_url(
        &self,
        url: &str,
        category: ReportCategory,
        description: &str,
    ) -> Result<ReportRecord, ReportError> {
        Url::parse(url).map_err(|e| ReportError::InvalidUrl(format!("{}: {}", url, e)))?;

        let mut record = ReportRecord::new(url, category, description);
        self.notify(ReportEvent::Submitting(record.clone())).await;

        let (logged, guides) = tokio::join!(self.sink.record(&record), async {
            manual_guides(url, category)
        });

        match logged {
            Ok(()) => {
                record.submissions.push(Submission {
                    service: "internal-log".to_string(),
                    status: SubmissionStatus::Logged,
                    data: SubmissionData::Logged {
                        logged_at: Utc::now(),
                    },
                });
                record.submissions.push(Submission {
                    service: "manual-guides".to_string(),
                    status: SubmissionStatus::ManualRequired,
                    data: SubmissionData::Manual { guides },
                });
                record.status = ReportStatus::Completed;

                self.history.write().await.push(record.clone());
                metrics::counter!("reports_submitted_total", "status" => "completed").increment(1);
                self.notify(ReportEvent::Completed(record.clone())).await;
                Ok(record)
            }
            Err(e) => {
                warn!(report_id = %record.report_id, error = %e, "Report submission failed");
                record.status = ReportStatus::Error;
                record.error = Some(e.to_string());

                self.history.write().await.push(record.clone());
                metrics::counter!("reports_submitted_total", "status" => "error").increment(1);
                self.notify(ReportEvent::Error {
                    message: e.to_string(),
                    record,
                })
                .await;
                Err(e)
            }
        }
    }

    /// A snapshot of every record, oldest first.
    pub async fn history(&self) -> Vec<ReportRecord> {
        self.history.read().await.clone()
    }

    pub async fn clear_history(&self) {
        self.history.write().await.clear();
        self.notify(ReportEvent::HistoryCleared).await;
    }

    pub async fn export_reports(&self, format: ExportFormat) -> Result<String, ReportError> {
        export::export(&self.history.read().await, format)
    }

    pub async fn statistics(&self) -> ReportStatistics {
        self.statistics_at(Utc::now()).await
    }

    /// Statistics with the recent window measured back from `now`.
    pub async fn statistics_at(&self, now: DateTime<Utc>) -> ReportStatistics {
        export::statistics(&self.history.read().await, now)
    }
}
