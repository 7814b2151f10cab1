//! The analysis engine: the single entry point for analysing a URL.
//!
//! The engine owns the registered checks and the result cache. A cache miss
//! expands the URL first, then runs every other check concurrently against
//! the expanded destination and folds the outcomes into a `CompositeReport`.

use crate::cache::{CacheStats, ResultCache};
use crate::checks::{
    run_check, Check, DomainReputationCheck, PhishingPatternCheck, SslCheck, ThreatDatabaseCheck,
    TyposquattingCheck, UrlExpansionCheck,
};
use crate::config::Config;
use crate::core::{
    CheckData, CheckName, CheckOutcome, CompositeReport, DomainAgeLookup, DomainReputationLookup,
    OverallSafety, RiskLevel, ThreatLookup, Transport,
};
use crate::lookup::{HttpTransport, SafeBrowsingClient, VirusTotalClient, WhoisClient};
use anyhow::Result;
use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

const HIGH_WEIGHT: u32 = 30;
const MEDIUM_WEIGHT: u32 = 15;
const WARNING_WEIGHT: u32 = 5;

/// Domains younger than this get an explicit call-out.
const NEW_DOMAIN_DAYS: i64 = 30;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("invalid URL: {0}")]
    InvalidInput(String),

    #[error("failed to combine check results: {0}")]
    Aggregation(String),
}

/// Parses raw scanner input into an analysable URL.
///
/// # Returns
/// * `Err(AnalysisError::InvalidInput)` unless the input is an absolute
///   `http`/`https` URL with a host
pub fn parse_input(raw: &str) -> Result<Url, AnalysisError> {
    let url = Url::parse(raw.trim()).map_err(|e| AnalysisError::InvalidInput(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(AnalysisError::InvalidInput(format!(
            "unsupported scheme '{}'",
            url.scheme()
        )));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(AnalysisError::InvalidInput("URL has no host".to_string()));
    }
    Ok(url)
}

fn outcome_weight(outcome: &CheckOutcome) -> u32 {
    match outcome {
        CheckOutcome::Failed { .. } => 0,
        CheckOutcome::Ok(report) => match report.risk_level {
            RiskLevel::High => HIGH_WEIGHT,
            RiskLevel::Medium => MEDIUM_WEIGHT,
            RiskLevel::Low if report.has_warnings() => WARNING_WEIGHT,
            RiskLevel::Low | RiskLevel::Unknown => 0,
        },
    }
}

/// Sums the per-outcome weights, clamped to 100. Failed checks add nothing.
pub fn risk_score(checks: &BTreeMap<CheckName, CheckOutcome>) -> u8 {
    let total: u32 = checks.values().map(outcome_weight).sum();
    total.min(100) as u8
}

/// Derives the verdict band from the score and the check outcomes.
///
/// Missing information never reads as safe: a report with any failed check
/// is at least `Caution`, and one where every check failed is `Unknown`.
pub fn overall_safety(checks: &BTreeMap<CheckName, CheckOutcome>, score: u8) -> OverallSafety {
    if !checks.is_empty() && checks.values().all(CheckOutcome::is_failed) {
        return OverallSafety::Unknown;
    }
    match OverallSafety::from_score(score) {
        OverallSafety::Safe if checks.values().any(CheckOutcome::is_failed) => {
            OverallSafety::Caution
        }
        band => band,
    }
}

/// Builds the advice list: the safety band first, then call-outs for the
/// specific findings present in `checks`.
pub fn recommendations(
    checks: &BTreeMap<CheckName, CheckOutcome>,
    safety: OverallSafety,
) -> Vec<String> {
    let seed: &[&str] = match safety {
        OverallSafety::Dangerous => &[
            "Do not visit this URL",
            "Report this URL to help protect others",
        ],
        OverallSafety::Suspicious => &[
            "Proceed with extreme caution",
            "Verify the URL with the sender through another channel",
        ],
        OverallSafety::Caution => &[
            "Be careful when entering personal information",
            "Double-check the domain spelling",
        ],
        OverallSafety::Safe => &["URL appears safe to visit", "Always stay vigilant online"],
        OverallSafety::Unknown => &["Unable to determine safety; treat this URL with caution"],
    };
    let mut recs: Vec<String> = seed.iter().map(|s| s.to_string()).collect();

    for outcome in checks.values() {
        let report = match outcome {
            CheckOutcome::Ok(report) => report,
            CheckOutcome::Failed { .. } => continue,
        };
        match &report.data {
            CheckData::UrlExpansion(d) if d.is_shortened => {
                recs.push(format!("Shortened link leads to {}", d.expanded));
            }
            CheckData::DomainReputation(d) => {
                if let Some(age) = d.domain_age.as_ref().filter(|a| a.age_in_days < NEW_DOMAIN_DAYS) {
                    recs.push(format!(
                        "Domain was registered only {} days ago",
                        age.age_in_days
                    ));
                }
            }
            CheckData::Ssl(d) if !d.has_ssl => {
                recs.push("Connection is not encrypted; never enter passwords or payment details".to_string());
            }
            CheckData::Typosquatting(d) => {
                if let Some(target) = d.suspected_target.as_deref().filter(|_| d.is_typosquat) {
                    recs.push(format!("This domain may be impersonating {}", target));
                }
            }
            CheckData::PhishingPattern(d) if d.is_phishing => {
                recs.push("URL contains common phishing patterns".to_string());
            }
            CheckData::ThreatDatabase(d) if !d.matches.is_empty() => {
                recs.push("URL is listed in a threat database".to_string());
            }
            _ => {}
        }
    }

    if checks.values().any(CheckOutcome::is_failed) {
        recs.push("Some checks could not be completed; verify the URL independently".to_string());
    }
    recs
}

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Report for input that never reached the checks.
fn invalid_input_report(url: &str, error: &AnalysisError) -> CompositeReport {
    let checks = CheckName::ALL
        .iter()
        .map(|name| (*name, CheckOutcome::failed("invalid input")))
        .collect();
    CompositeReport {
        url: url.to_string(),
        timestamp: now_rfc3339(),
        checks,
        risk_score: 100,
        overall_safety: OverallSafety::Dangerous,
        recommendations: vec![
            "Do not visit this URL".to_string(),
            "The scanned code does not contain a valid web address".to_string(),
        ],
        error: Some(error.to_string()),
    }
}

/// Report for an analysis whose results could not be combined.
fn fail_closed_report(url: &str, error: &AnalysisError) -> CompositeReport {
    let checks: BTreeMap<_, _> = CheckName::ALL
        .iter()
        .map(|name| (*name, CheckOutcome::failed("analysis could not be completed")))
        .collect();
    let recommendations = recommendations(&checks, OverallSafety::Unknown);
    CompositeReport {
        url: url.to_string(),
        timestamp: now_rfc3339(),
        checks,
        risk_score: 100,
        overall_safety: OverallSafety::Unknown,
        recommendations,
        error: Some(error.to_string()),
    }
}

/// Combines settled outcomes into a report.
///
/// Checks that were never registered are reported as failed so the report
/// always carries every check.
pub fn aggregate(
    url: &str,
    outcomes: Vec<(CheckName, CheckOutcome)>,
) -> Result<CompositeReport, AnalysisError> {
    let mut checks = BTreeMap::new();
    for (name, outcome) in outcomes {
        if checks.insert(name, outcome).is_some() {
            return Err(AnalysisError::Aggregation(format!(
                "more than one result for {}",
                name
            )));
        }
    }
    for name in CheckName::ALL {
        checks
            .entry(name)
            .or_insert_with(|| CheckOutcome::failed("check not registered"));
    }

    let risk_score = risk_score(&checks);
    let overall_safety = overall_safety(&checks, risk_score);
    let recommendations = recommendations(&checks, overall_safety);

    Ok(CompositeReport {
        url: url.to_string(),
        timestamp: now_rfc3339(),
        checks,
        risk_score,
        overall_safety,
        recommendations,
        error: None,
    })
}

/// Runs one check under the per-check timeout.
async fn run_guarded(check: Arc<dyn Check>, url: Url, timeout: Duration) -> CheckOutcome {
    let name = check.name();
    match tokio::time::timeout(timeout, run_check(check.as_ref(), &url)).await {
        Ok(outcome) => outcome,
        Err(_) => {
            warn!(check = %name, timeout_secs = timeout.as_secs_f64(), "Check timed out");
            metrics::counter!("check_outcomes_total", "check" => name.as_str(), "status" => "timeout")
                .increment(1);
            CheckOutcome::failed(format!("timed out after {:?}", timeout))
        }
    }
}

/// The destination the remaining checks should look at.
fn expansion_target(outcome: &CheckOutcome, original: &Url) -> Url {
    match outcome.report().map(|r| &r.data) {
        Some(CheckData::UrlExpansion(d)) if d.is_shortened => match parse_input(&d.expanded) {
            Ok(expanded) => expanded,
            Err(e) => {
                debug!(expanded = %d.expanded, error = %e, "Ignoring unusable expansion");
                original.clone()
            }
        },
        _ => original.clone(),
    }
}

pub struct AnalysisEngine {
    checks: Vec<Arc<dyn Check>>,
    cache: ResultCache,
    check_timeout: Duration,
}

impl AnalysisEngine {
    /// Creates a new `AnalysisEngineBuilder` to construct an engine.
    pub fn builder(config: Config) -> AnalysisEngineBuilder {
        AnalysisEngineBuilder::new(config)
    }

    /// Analyses a URL.
    ///
    /// Never fails: invalid input yields a dangerous report, a failed check
    /// is reported as such, and a report that cannot be assembled is marked
    /// `Unknown`. Only reports in which every check settled are cached.
    #[instrument(skip(self))]
    pub async fn analyze(&self, url: &str) -> CompositeReport {
        let started = Instant::now();

        if let Some(report) = self.cache.get(url).await {
            debug!("Cache hit");
            metrics::counter!("analysis_requests_total", "cache" => "hit").increment(1);
            return report;
        }

        let parsed = match parse_input(url) {
            Ok(parsed) => parsed,
            Err(e) => {
                info!(error = %e, "Rejected invalid input");
                metrics::counter!("analysis_requests_total", "cache" => "invalid").increment(1);
                return invalid_input_report(url, &e);
            }
        };
        metrics::counter!("analysis_requests_total", "cache" => "miss").increment(1);

        let outcomes = self.run_checks(&parsed).await;
        let report = match aggregate(url, outcomes) {
            Ok(report) if report.has_failed_checks() => {
                debug!("Report has failed checks, not caching");
                report
            }
            Ok(report) => {
                self.cache.put(url, report.clone()).await;
                report
            }
            Err(e) => {
                error!(error = %e, "Aggregation failed, reporting unknown safety");
                fail_closed_report(url, &e)
            }
        };

        metrics::histogram!("analysis_duration_seconds").record(started.elapsed().as_secs_f64());
        info!(
            risk_score = report.risk_score,
            safety = %report.overall_safety,
            "Analysis complete"
        );
        report
    }

    /// Expands the URL, then runs the remaining checks concurrently.
    async fn run_checks(&self, url: &Url) -> Vec<(CheckName, CheckOutcome)> {
        let mut outcomes = Vec::with_capacity(self.checks.len());
        let mut target = url.clone();
        let mut rest = Vec::with_capacity(self.checks.len());

        let mut expansion_done = false;
        for check in &self.checks {
            if check.name() == CheckName::UrlExpansion && !expansion_done {
                let outcome = run_guarded(check.clone(), url.clone(), self.check_timeout).await;
                target = expansion_target(&outcome, url);
                outcomes.push((CheckName::UrlExpansion, outcome));
                expansion_done = true;
            } else {
                rest.push(check.clone());
            }
        }
        if target != *url {
            debug!(expanded = %target, "Analysing expanded destination");
        }

        let names: Vec<CheckName> = rest.iter().map(|c| c.name()).collect();
        let handles = rest.into_iter().map(|check| {
            let url = target.clone();
            let timeout = self.check_timeout;
            tokio::spawn(run_guarded(check, url, timeout))
        });

        for (name, joined) in names.into_iter().zip(join_all(handles).await) {
            let outcome = joined.unwrap_or_else(|e| {
                error!(check = %name, error = %e, "Check task panicked");
                CheckOutcome::failed("check aborted unexpectedly")
            });
            outcomes.push((name, outcome));
        }
        outcomes
    }

    pub async fn clear_cache(&self) {
        self.cache.clear().await;
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }
}

/// Builder for the analysis engine.
///
/// Every collaborator defaults to the HTTP-backed implementation configured
/// from `Config`; tests substitute fakes.
pub struct AnalysisEngineBuilder {
    config: Config,
    transport_override: Option<Arc<dyn Transport>>,
    threat_lookup_override: Option<Arc<dyn ThreatLookup>>,
    age_lookup_override: Option<Arc<dyn DomainAgeLookup>>,
    reputation_lookup_override: Option<Arc<dyn DomainReputationLookup>>,
    checks_override: Option<Vec<Arc<dyn Check>>>,
}

impl AnalysisEngineBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            transport_override: None,
            threat_lookup_override: None,
            age_lookup_override: None,
            reputation_lookup_override: None,
            checks_override: None,
        }
    }

    pub fn transport_override(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport_override = Some(transport);
        self
    }

    pub fn threat_lookup_override(mut self, lookup: Arc<dyn ThreatLookup>) -> Self {
        self.threat_lookup_override = Some(lookup);
        self
    }

    pub fn age_lookup_override(mut self, lookup: Arc<dyn DomainAgeLookup>) -> Self {
        self.age_lookup_override = Some(lookup);
        self
    }

    pub fn reputation_lookup_override(mut self, lookup: Arc<dyn DomainReputationLookup>) -> Self {
        self.reputation_lookup_override = Some(lookup);
        self
    }

    /// Replaces the whole check registry.
    pub fn checks_override(mut self, checks: Vec<Arc<dyn Check>>) -> Self {
        self.checks_override = Some(checks);
        self
    }

    /// Builds the engine.
    ///
    /// # Returns
    /// * `Err` if an HTTP client or the phishing pattern table cannot be built
    pub fn build(self) -> Result<AnalysisEngine> {
        let config = self.config;
        let check_timeout = Duration::from_secs(config.analysis.check_timeout_secs);
        let cache = ResultCache::from_config(&config.analysis);

        let checks = match self.checks_override {
            Some(checks) => checks,
            None => {
                let api = &config.api;
                let request_timeout = Duration::from_millis(config.network.request_timeout_ms);
                let lookup_ttl = Duration::from_secs(api.lookup_cache_ttl_secs);

                let transport: Arc<dyn Transport> = match self.transport_override {
                    Some(t) => t,
                    None => Arc::new(HttpTransport::new(&config.network)?),
                };
                let threat_lookup: Arc<dyn ThreatLookup> = match self.threat_lookup_override {
                    Some(lookup) => lookup,
                    None => Arc::new(SafeBrowsingClient::new(
                        api.safe_browsing_url.clone(),
                        api.safe_browsing_key.clone(),
                        request_timeout,
                    )?),
                };
                let age_lookup: Arc<dyn DomainAgeLookup> = match self.age_lookup_override {
                    Some(lookup) => lookup,
                    None => Arc::new(WhoisClient::new(
                        api.whois_url.clone(),
                        api.whois_key.clone(),
                        request_timeout,
                        lookup_ttl,
                    )?),
                };
                let reputation_lookup: Arc<dyn DomainReputationLookup> =
                    match self.reputation_lookup_override {
                        Some(lookup) => lookup,
                        None => Arc::new(VirusTotalClient::new(
                            api.virustotal_url.clone(),
                            api.virustotal_key.clone(),
                            request_timeout,
                            lookup_ttl,
                        )?),
                    };

                vec![
                    Arc::new(UrlExpansionCheck::new(
                        transport.clone(),
                        config.network.max_redirects,
                    )) as Arc<dyn Check>,
                    Arc::new(DomainReputationCheck::new(age_lookup)),
                    Arc::new(SslCheck::new(transport)),
                    Arc::new(TyposquattingCheck::new(reputation_lookup)),
                    Arc::new(PhishingPatternCheck::new()?),
                    Arc::new(ThreatDatabaseCheck::new(threat_lookup)),
                ]
            }
        };

        info!(
            checks = checks.len(),
            cache_enabled = config.analysis.cache_enabled,
            "Analysis engine ready"
        );
        Ok(AnalysisEngine {
            checks,
            cache,
            check_timeout,
        })
    }
}
