//! Observers of report lifecycle events.

use crate::reporting::ReportEvent;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Receives every event emitted by a `ReportManager` it is subscribed to.
///
/// Implementations must not block; the manager calls them inline.
pub trait ReportObserver: Send + Sync {
    fn on_event(&self, event: &ReportEvent);
}

/// Writes every event to the log.
#[derive(Debug, Default)]
pub struct LoggingObserver;

impl ReportObserver for LoggingObserver {
    fn on_event(&self, event: &ReportEvent) {
        match event {
            ReportEvent::Submitting(record) => {
                info!(report_id = %record.report_id, url = %record.url, category = %record.category, "Submitting report");
            }
            ReportEvent::Completed(record) => {
                info!(report_id = %record.report_id, submissions = record.submissions.len(), "Report completed");
            }
            ReportEvent::Error { record, message } => {
                warn!(report_id = %record.report_id, error = %message, "Report failed");
            }
            ReportEvent::HistoryCleared => info!("Report history cleared"),
        }
    }
}

/// Forwards events to a broadcast channel.
pub struct ChannelObserver {
    tx: broadcast::Sender<ReportEvent>,
}

impl ChannelObserver {
    /// Creates the observer and the first receiver of its channel.
    pub fn new(capacity: usize) -> (Self, broadcast::Receiver<ReportEvent>) {
        let (tx, rx) = broadcast::channel(capacity);
        (Self { tx }, rx)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReportEvent> {
        self.tx.subscribe()
    }
}

impl ReportObserver for ChannelObserver {
    fn on_event(&self, event: &ReportEvent) {
        if self.tx.send(event.clone()).is_err() {
            debug!(event = event.kind(), "No receivers for report event");
        }
    }
}
