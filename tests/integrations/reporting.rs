//! Report manager behaviour as seen by an embedding application.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use futures::future::join_all;
use qrshield::reporting::{
    ChannelObserver, ExportFormat, ReportCategory, ReportError, ReportEvent, ReportManager,
    ReportObserver, ReportRecord, ReportSink, ReportStatus, SubmissionData,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast::error::TryRecvError;

/// A sink that can be switched into a failing state.
#[derive(Default)]
struct SwitchableSink {
    failing: AtomicBool,
}

#[async_trait]
impl ReportSink for SwitchableSink {
    async fn record(&self, _record: &ReportRecord) -> Result<(), ReportError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(ReportError::Sink("log store unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}

fn manager_with_sink() -> (ReportManager, Arc<SwitchableSink>) {
    let sink = Arc::new(SwitchableSink::default());
    (ReportManager::new(sink.clone()), sink)
}

#[tokio::test]
async fn test_observer_receives_lifecycle_events() {
    let (manager, _sink) = manager_with_sink();
    let (observer, mut rx) = ChannelObserver::new(16);
    manager.subscribe(Arc::new(observer)).await;

    let record = manager
        .report_url("https://paypa1.com/login", ReportCategory::Phishing, "parking meter sticker")
        .await
        .unwrap();

    match rx.recv().await.unwrap() {
        ReportEvent::Submitting(r) => {
            assert_eq!(r.report_id, record.report_id);
            assert_eq!(r.status, ReportStatus::Pending);
        }
        other => panic!("expected submitting, got {:?}", other),
    }
    match rx.recv().await.unwrap() {
        ReportEvent::Completed(r) => assert_eq!(r, record),
        other => panic!("expected completed, got {:?}", other),
    }
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));

    assert_eq!(record.status, ReportStatus::Completed);
    assert_eq!(record.submissions.len(), 2);
    match &record.submissions[1].data {
        SubmissionData::Manual { guides } => {
            assert_eq!(guides[0].service, "Google Safe Browsing");
            assert!(guides.windows(2).all(|w| w[0].priority <= w[1].priority));
        }
        other => panic!("expected manual guides, got {:?}", other),
    }
}

#[tokio::test]
async fn test_sink_failure_is_recorded_and_returned() {
    let (manager, sink) = manager_with_sink();
    let (observer, mut rx) = ChannelObserver::new(16);
    manager.subscribe(Arc::new(observer)).await;
    sink.failing.store(true, Ordering::SeqCst);

    let err = manager
        .report_url("https://scam.example/", ReportCategory::Scam, "")
        .await
        .unwrap_err();
    assert!(matches!(err, ReportError::Sink(_)));

    assert!(matches!(rx.recv().await.unwrap(), ReportEvent::Submitting(_)));
    match rx.recv().await.unwrap() {
        ReportEvent::Error { record, message } => {
            assert_eq!(record.status, ReportStatus::Error);
            assert!(message.contains("log store unavailable"));
        }
        other => panic!("expected error, got {:?}", other),
    }

    let history = manager.history().await;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, ReportStatus::Error);
    assert!(history[0].error.is_some());
}

#[tokio::test]
async fn test_invalid_url_is_rejected_silently() {
    let (manager, _sink) = manager_with_sink();
    let (observer, mut rx) = ChannelObserver::new(16);
    manager.subscribe(Arc::new(observer)).await;

    let err = manager
        .report_url("not a url", ReportCategory::Other, "")
        .await
        .unwrap_err();

    assert!(matches!(err, ReportError::InvalidUrl(_)));
    assert!(manager.history().await.is_empty());
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn test_unsubscribed_observer_hears_nothing() {
    let (manager, _sink) = manager_with_sink();
    let (observer, mut rx) = ChannelObserver::new(16);
    let observer: Arc<dyn ReportObserver> = Arc::new(observer);

    manager.subscribe(observer.clone()).await;
    manager.subscribe(observer.clone()).await;
    assert_eq!(manager.observer_count().await, 1);

    manager.unsubscribe(&observer).await;
    assert_eq!(manager.observer_count().await, 0);

    manager
        .report_url("https://a.example/", ReportCategory::Spam, "")
        .await
        .unwrap();
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn test_csv_export_and_statistics() {
    let (manager, sink) = manager_with_sink();
    manager
        .report_url("https://a.example/", ReportCategory::Phishing, "fake login, \"urgent\"")
        .await
        .unwrap();
    manager
        .report_url("https://b.example/", ReportCategory::Phishing, "")
        .await
        .unwrap();
    sink.failing.store(true, Ordering::SeqCst);
    let _ = manager
        .report_url("https://c.example/", ReportCategory::Malware, "")
        .await;

    let csv = manager.export_reports(ExportFormat::Csv).await.unwrap();
    let mut reader = csv::Reader::from_reader(csv.as_bytes());
    let headers = reader.headers().unwrap().clone();
    assert_eq!(
        headers.iter().collect::<Vec<_>>(),
        vec!["report_id", "url", "category", "description", "timestamp", "status", "submissions"]
    );
    let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    assert_eq!(rows.len(), 3);
    assert_eq!(&rows[0][3], "fake login, \"urgent\"");
    assert_eq!(&rows[0][5], "completed");
    assert_eq!(&rows[2][2], "malware");
    assert_eq!(&rows[2][5], "error");
    assert_eq!(&rows[2][6], "0");

    let json = manager.export_reports(ExportFormat::Json).await.unwrap();
    let parsed: Vec<ReportRecord> = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, manager.history().await);

    let stats = manager.statistics().await;
    assert_eq!(stats.total, 3);
    assert_eq!(stats.by_category[&ReportCategory::Phishing], 2);
    assert_eq!(stats.by_status[&ReportStatus::Error], 1);
    assert_eq!(stats.recent, 3);

    let later = manager.statistics_at(Utc::now() + Duration::hours(25)).await;
    assert_eq!(later.total, 3);
    assert_eq!(later.recent, 0);
}

#[tokio::test]
async fn test_clear_history_notifies_observers() {
    let (manager, _sink) = manager_with_sink();
    manager
        .report_url("https://a.example/", ReportCategory::Spam, "")
        .await
        .unwrap();
    let (observer, mut rx) = ChannelObserver::new(4);
    manager.subscribe(Arc::new(observer)).await;

    manager.clear_history().await;

    assert!(manager.history().await.is_empty());
    assert_eq!(rx.recv().await.unwrap(), ReportEvent::HistoryCleared);
    assert_eq!(manager.statistics().await.total, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_reports_are_all_recorded() {
    const REPORTS: usize = 32;
    let (manager, _sink) = manager_with_sink();
    let (observer, _rx) = ChannelObserver::new(4 * REPORTS);
    manager.subscribe(Arc::new(observer)).await;

    let urls: Vec<String> = (0..REPORTS)
        .map(|i| format!("https://scam-{}.example/", i))
        .collect();
    let results = join_all(
        urls.iter()
            .map(|url| manager.report_url(url, ReportCategory::Scam, "batch")),
    )
    .await;
    assert!(results.iter().all(Result::is_ok));

    let history = manager.history().await;
    assert_eq!(history.len(), REPORTS);
    let ids: HashSet<_> = history.iter().map(|r| r.report_id).collect();
    assert_eq!(ids.len(), REPORTS);
    let recorded: HashSet<_> = history.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(recorded.len(), REPORTS);

    let stats = manager.statistics().await;
    assert_eq!(stats.total, REPORTS);
    assert_eq!(stats.by_status[&ReportStatus::Completed], REPORTS);
    assert_eq!(stats.by_category[&ReportCategory::Scam], REPORTS);
}
