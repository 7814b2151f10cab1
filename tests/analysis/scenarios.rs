//! End-to-end analysis scenarios against scripted collaborators.

#[path = "../helpers/mod.rs"]
mod helpers;

use helpers::fake_lookups::{FakeAgeLookup, FakeThreatLookup};
use helpers::fake_transport::FakeTransport;
use helpers::{offline_builder, offline_engine};
use qrshield::config::Config;
use qrshield::core::{CheckData, CheckName, OverallSafety, RiskLevel};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_well_known_domain_is_safe() {
    let engine = offline_engine(Arc::new(FakeTransport::new()));

    let report = engine.analyze("https://www.google.com").await;

    assert_eq!(report.risk_score, 0);
    assert_eq!(report.overall_safety, OverallSafety::Safe);
    assert!(report.error.is_none());
    assert_eq!(report.checks.len(), CheckName::ALL.len());
    assert_eq!(
        report.recommendations.first().map(String::as_str),
        Some("URL appears safe to visit")
    );
    // No threat database is configured, which is not a failure.
    let threat = report.check(CheckName::ThreatDatabase).unwrap();
    assert!(!threat.is_failed());
    assert_eq!(threat.risk_level(), RiskLevel::Unknown);
}

#[tokio::test]
async fn test_ip_login_page_is_dangerous() {
    let engine = offline_engine(Arc::new(FakeTransport::new()));

    let report = engine.analyze("http://192.168.1.1/login-verify").await;

    assert_eq!(
        report.check(CheckName::Ssl).unwrap().risk_level(),
        RiskLevel::High
    );
    assert_eq!(
        report.check(CheckName::PhishingPattern).unwrap().risk_level(),
        RiskLevel::High
    );
    assert_eq!(
        report.check(CheckName::DomainReputation).unwrap().risk_level(),
        RiskLevel::Low
    );
    assert_eq!(
        report.check(CheckName::Typosquatting).unwrap().risk_level(),
        RiskLevel::Low
    );
    // 30 (no HTTPS) + 30 (phishing) + 5 (digit run in the host)
    assert_eq!(report.risk_score, 65);
    assert_eq!(report.overall_safety, OverallSafety::Dangerous);
    assert!(report
        .recommendations
        .iter()
        .any(|r| r.starts_with("Connection is not encrypted")));
    assert!(report
        .recommendations
        .contains(&"URL contains common phishing patterns".to_string()));
}

#[tokio::test]
async fn test_shortened_link_is_analysed_at_its_destination() {
    let transport = Arc::new(FakeTransport::new().with_redirect(
        "https://bit.ly/promo",
        "https://paypa1.com/login",
        2,
    ));
    let engine = offline_engine(transport.clone());

    let report = engine.analyze("https://bit.ly/promo").await;

    match report.data(CheckName::UrlExpansion) {
        Some(CheckData::UrlExpansion(d)) => {
            assert!(d.is_shortened);
            assert_eq!(d.expanded, "https://paypa1.com/login");
            assert_eq!(d.redirect_count, 2);
        }
        other => panic!("unexpected expansion data: {:?}", other),
    }
    match report.data(CheckName::Typosquatting) {
        Some(CheckData::Typosquatting(d)) => {
            assert!(d.is_typosquat);
            assert_eq!(d.domain, "paypa1.com");
            assert_eq!(d.suspected_target.as_deref(), Some("paypal.com"));
        }
        other => panic!("unexpected typosquatting data: {:?}", other),
    }
    assert_eq!(
        report.check(CheckName::PhishingPattern).unwrap().risk_level(),
        RiskLevel::Medium
    );

    // 5 (shortened) + 30 (typosquat) + 15 (phishing)
    assert_eq!(report.risk_score, 50);
    assert_eq!(report.overall_safety, OverallSafety::Dangerous);
    assert_eq!(report.url, "https://bit.ly/promo");
    assert!(report
        .recommendations
        .contains(&"Shortened link leads to https://paypa1.com/login".to_string()));
    assert!(report
        .recommendations
        .contains(&"This domain may be impersonating paypal.com".to_string()));
    assert_eq!(transport.follow_calls(), 1);
}

#[tokio::test]
async fn test_repeat_analysis_is_served_from_cache() {
    let transport = Arc::new(FakeTransport::new().with_redirect(
        "https://bit.ly/promo",
        "https://example.com/",
        1,
    ));
    let engine = offline_engine(transport.clone());

    let first = engine.analyze("https://bit.ly/promo").await;
    let second = engine.analyze("https://bit.ly/promo").await;

    assert_eq!(first, second);
    assert_eq!(transport.follow_calls(), 1);
    assert_eq!(engine.cache_stats().await.size, 1);

    engine.clear_cache().await;
    engine.analyze("https://bit.ly/promo").await;
    assert_eq!(transport.follow_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_cached_report_expires() {
    let transport = Arc::new(FakeTransport::new());
    let mut config = Config::default();
    config.analysis.cache_ttl_secs = 60;
    let engine = offline_builder(config, transport.clone()).build().unwrap();

    engine.analyze("https://example.com/").await;
    tokio::time::advance(Duration::from_secs(30)).await;
    engine.analyze("https://example.com/").await;
    assert_eq!(transport.probe_calls(), 1);

    tokio::time::advance(Duration::from_secs(31)).await;
    engine.analyze("https://example.com/").await;
    assert_eq!(transport.probe_calls(), 2);
}

#[tokio::test]
async fn test_cache_can_be_disabled() {
    let transport = Arc::new(FakeTransport::new());
    let mut config = Config::default();
    config.analysis.cache_enabled = false;
    let engine = offline_builder(config, transport.clone()).build().unwrap();

    engine.analyze("https://example.com/").await;
    engine.analyze("https://example.com/").await;

    assert_eq!(transport.probe_calls(), 2);
    let stats = engine.cache_stats().await;
    assert!(!stats.enabled);
    assert_eq!(stats.size, 0);
}

#[tokio::test]
async fn test_recently_registered_domain_is_called_out() {
    let engine = offline_builder(Config::default(), Arc::new(FakeTransport::new()))
        .age_lookup_override(Arc::new(FakeAgeLookup::default().with_age("fresh-deals.com", 5)))
        .build()
        .unwrap();

    let report = engine.analyze("https://fresh-deals.com/").await;

    assert_eq!(
        report.check(CheckName::DomainReputation).unwrap().risk_level(),
        RiskLevel::High
    );
    assert!(report
        .recommendations
        .contains(&"Domain was registered only 5 days ago".to_string()));
}

#[tokio::test]
async fn test_threat_database_listing_raises_risk() {
    let engine = offline_builder(Config::default(), Arc::new(FakeTransport::new()))
        .threat_lookup_override(Arc::new(FakeThreatLookup::listing("SOCIAL_ENGINEERING")))
        .build()
        .unwrap();

    let report = engine.analyze("https://example.com/").await;

    match report.data(CheckName::ThreatDatabase) {
        Some(CheckData::ThreatDatabase(d)) => {
            assert_eq!(d.is_safe, Some(false));
            assert_eq!(d.matches[0].threat_type, "SOCIAL_ENGINEERING");
        }
        other => panic!("unexpected threat data: {:?}", other),
    }
    assert_eq!(report.risk_score, 30);
    assert_eq!(report.overall_safety, OverallSafety::Suspicious);
    assert!(report
        .recommendations
        .contains(&"URL is listed in a threat database".to_string()));
}
