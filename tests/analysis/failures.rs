//! Analysis behaviour when input is unusable or collaborators misbehave.

#[path = "../helpers/mod.rs"]
mod helpers;

use async_trait::async_trait;
use helpers::fake_lookups::{FakeReputationLookup, FakeThreatLookup};
use helpers::fake_transport::FakeTransport;
use helpers::{offline_builder, offline_engine};
use qrshield::checks::{Check, CheckError};
use qrshield::config::Config;
use qrshield::core::{CheckData, CheckName, CheckOutcome, CheckReport, OverallSafety, RiskLevel};
use qrshield::lookup::LookupError;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

const CHECK_FAILED_ADVICE: &str = "Some checks could not be completed; verify the URL independently";

#[tokio::test]
async fn test_invalid_input_is_dangerous_and_not_cached() {
    let transport = Arc::new(FakeTransport::new());
    let engine = offline_engine(transport.clone());

    let report = engine.analyze("not a url").await;

    assert_eq!(report.risk_score, 100);
    assert_eq!(report.overall_safety, OverallSafety::Dangerous);
    assert!(report.error.is_some());
    assert_eq!(report.checks.len(), CheckName::ALL.len());
    assert!(report.checks.values().all(CheckOutcome::is_failed));
    assert_eq!(engine.cache_stats().await.size, 0);
    assert_eq!(transport.follow_calls() + transport.probe_calls(), 0);
}

#[tokio::test]
async fn test_non_web_scheme_is_rejected() {
    let engine = offline_engine(Arc::new(FakeTransport::new()));

    let report = engine.analyze("mailto:someone@example.com").await;

    assert_eq!(report.overall_safety, OverallSafety::Dangerous);
    assert!(report.error.as_deref().unwrap().contains("mailto"));
}

#[tokio::test]
async fn test_expansion_failure_does_not_stop_other_checks() {
    let transport = Arc::new(
        FakeTransport::new().with_follow_error(LookupError::Http("connection reset".to_string())),
    );
    let engine = offline_engine(transport);

    let report = engine.analyze("https://bit.ly/broken").await;

    assert!(report.check(CheckName::UrlExpansion).unwrap().is_failed());
    for name in [
        CheckName::DomainReputation,
        CheckName::Ssl,
        CheckName::Typosquatting,
        CheckName::PhishingPattern,
    ] {
        assert!(!report.check(name).unwrap().is_failed(), "{} failed", name);
    }
    // The remaining checks saw the original URL.
    match report.data(CheckName::Typosquatting) {
        Some(CheckData::Typosquatting(d)) => assert_eq!(d.domain, "bit.ly"),
        other => panic!("unexpected typosquatting data: {:?}", other),
    }
    assert!(report.error.is_none());
    assert!(report.recommendations.contains(&CHECK_FAILED_ADVICE.to_string()));
    assert_eq!(engine.cache_stats().await.size, 0);
}

#[tokio::test]
async fn test_threat_lookup_error_is_reported_as_failed_check() {
    let engine = offline_builder(Config::default(), Arc::new(FakeTransport::new()))
        .threat_lookup_override(Arc::new(FakeThreatLookup::failing(LookupError::Status(503))))
        .build()
        .unwrap();

    let report = engine.analyze("https://example.com/").await;

    let threat = report.check(CheckName::ThreatDatabase).unwrap();
    assert!(threat.is_failed());
    assert_eq!(threat.risk_level(), RiskLevel::Unknown);
    // A failed check adds nothing to the score but still rules out "safe".
    assert_eq!(report.risk_score, 0);
    assert_eq!(report.overall_safety, OverallSafety::Caution);
    assert_eq!(
        report.recommendations.first().map(String::as_str),
        Some("Be careful when entering personal information")
    );
    assert!(report.recommendations.contains(&CHECK_FAILED_ADVICE.to_string()));
    // An incomplete verdict is not served again from the cache.
    assert_eq!(engine.cache_stats().await.size, 0);
}

/// A check that always fails at runtime.
struct UnreachableCheck(CheckName);

#[async_trait]
impl Check for UnreachableCheck {
    fn name(&self) -> CheckName {
        self.0
    }

    async fn analyze(&self, _url: &Url) -> Result<CheckReport, CheckError> {
        Err(CheckError::Internal("network down".to_string()))
    }
}

#[tokio::test]
async fn test_every_check_failing_yields_unknown() {
    let checks: Vec<Arc<dyn Check>> = CheckName::ALL
        .iter()
        .map(|name| Arc::new(UnreachableCheck(*name)) as Arc<dyn Check>)
        .collect();
    let engine = offline_builder(Config::default(), Arc::new(FakeTransport::new()))
        .checks_override(checks)
        .build()
        .unwrap();

    let report = engine.analyze("https://unknown-site.example/").await;

    assert!(report.checks.values().all(CheckOutcome::is_failed));
    assert_ne!(report.overall_safety, OverallSafety::Safe);
    assert_eq!(report.overall_safety, OverallSafety::Unknown);
    assert_eq!(
        report.recommendations.first().map(String::as_str),
        Some("Unable to determine safety; treat this URL with caution")
    );
    assert!(!report
        .recommendations
        .iter()
        .any(|r| r == "URL appears safe to visit"));
    assert_eq!(engine.cache_stats().await.size, 0);

    // The next request runs the checks again instead of reusing the verdict.
    let again = engine.analyze("https://unknown-site.example/").await;
    assert_eq!(again.overall_safety, OverallSafety::Unknown);
    assert_eq!(engine.cache_stats().await.size, 0);
}

#[tokio::test(start_paused = true)]
async fn test_slow_probe_times_out() {
    let transport = Arc::new(FakeTransport::new().with_delay(Duration::from_secs(30)));
    let mut config = Config::default();
    config.analysis.check_timeout_secs = 1;
    let engine = offline_builder(config, transport).build().unwrap();

    let report = engine.analyze("https://example.com/").await;

    match report.check(CheckName::Ssl).unwrap() {
        CheckOutcome::Failed { message } => assert!(message.starts_with("timed out")),
        other => panic!("expected a timeout, got {:?}", other),
    }
    assert!(!report.check(CheckName::PhishingPattern).unwrap().is_failed());
    assert!(report.error.is_none());
}

#[tokio::test]
async fn test_reputation_outage_keeps_typosquat_verdict() {
    let engine = offline_builder(Config::default(), Arc::new(FakeTransport::new()))
        .reputation_lookup_override(Arc::new(FakeReputationLookup {
            result: Err(LookupError::Timeout),
        }))
        .build()
        .unwrap();

    let report = engine.analyze("https://paypa1.com/").await;

    let outcome = report.check(CheckName::Typosquatting).unwrap();
    assert_eq!(outcome.risk_level(), RiskLevel::High);
    let details = &outcome.report().unwrap().details;
    assert!(details
        .iter()
        .any(|d| d.starts_with("Reputation lookup unavailable")));
}

#[tokio::test]
async fn test_unflagged_reputation_downgrades_typosquat() {
    let engine = offline_builder(Config::default(), Arc::new(FakeTransport::new()))
        .reputation_lookup_override(Arc::new(FakeReputationLookup::clean()))
        .build()
        .unwrap();

    let report = engine.analyze("https://paypa1.com/").await;

    assert_eq!(
        report.check(CheckName::Typosquatting).unwrap().risk_level(),
        RiskLevel::Medium
    );
}

#[tokio::test]
async fn test_concurrent_requests_are_not_coalesced() {
    let transport = Arc::new(FakeTransport::new().with_redirect(
        "https://bit.ly/promo",
        "https://example.com/",
        1,
    ));
    let engine = offline_engine(transport.clone());

    let (a, b) = tokio::join!(
        engine.analyze("https://bit.ly/promo"),
        engine.analyze("https://bit.ly/promo")
    );

    assert_eq!(a.risk_score, b.risk_score);
    assert_eq!(transport.follow_calls(), 2);
    assert_eq!(engine.cache_stats().await.size, 1);
}
