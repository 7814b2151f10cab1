//! Core domain types and service traits for qrshield
//!
//! This module defines the data structures exchanged between the checks, the
//! analysis engine and the reporting subsystem, together with the trait
//! contracts for the external collaborators the checks depend on.

use crate::lookup::LookupError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Stable identifier of a single check. Used as the aggregation key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CheckName {
    UrlExpansion,
    DomainReputation,
    Ssl,
    Typosquatting,
    PhishingPattern,
    ThreatDatabase,
}

impl CheckName {
    /// Every check, in aggregation order.
    pub const ALL: [CheckName; 6] = [
        CheckName::UrlExpansion,
        CheckName::DomainReputation,
        CheckName::Ssl,
        CheckName::Typosquatting,
        CheckName::PhishingPattern,
        CheckName::ThreatDatabase,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckName::UrlExpansion => "url-expansion",
            CheckName::DomainReputation => "domain-reputation",
            CheckName::Ssl => "ssl",
            CheckName::Typosquatting => "typosquatting",
            CheckName::PhishingPattern => "phishing-pattern",
            CheckName::ThreatDatabase => "threat-database",
        }
    }
}

impl fmt::Display for CheckName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Risk level reported by a single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Unknown,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// The settled result of one check.
///
/// A failed outcome never aborts an analysis; it contributes nothing to the
/// risk score and is rendered as "unknown".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CheckOutcome {
    Ok(CheckReport),
    Failed { message: String },
}

impl CheckOutcome {
    pub fn failed(message: impl Into<String>) -> Self {
        CheckOutcome::Failed {
            message: message.into(),
        }
    }

    /// Returns the report for a successful outcome.
    pub fn report(&self) -> Option<&CheckReport> {
        match self {
            CheckOutcome::Ok(report) => Some(report),
            CheckOutcome::Failed { .. } => None,
        }
    }

    /// The risk level, with failures surfaced as `Unknown`.
    pub fn risk_level(&self) -> RiskLevel {
        self.report()
            .map(|r| r.risk_level)
            .unwrap_or(RiskLevel::Unknown)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, CheckOutcome::Failed { .. })
    }
}

/// A successful check result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckReport {
    pub risk_level: RiskLevel,
    /// Human-readable explanation lines, in the order they were produced.
    pub details: Vec<String>,
    /// Structured fields specific to the check.
    pub data: CheckData,
}

impl CheckReport {
    pub fn new(risk_level: RiskLevel, details: Vec<String>, data: CheckData) -> Self {
        Self {
            risk_level,
            details,
            data,
        }
    }

    /// True when a low-risk result still carries something worth flagging.
    pub fn has_warnings(&self) -> bool {
        match &self.data {
            CheckData::UrlExpansion(d) => d.is_shortened,
            CheckData::DomainReputation(d) => !d.is_trusted && d.score < 50,
            CheckData::PhishingPattern(d) => !d.matches.is_empty(),
            CheckData::Ssl(_) | CheckData::Typosquatting(_) | CheckData::ThreatDatabase(_) => false,
        }
    }
}

/// Per-check structured fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "check", rename_all = "kebab-case")]
pub enum CheckData {
    UrlExpansion(ExpansionData),
    DomainReputation(ReputationData),
    Ssl(SslData),
    Typosquatting(TyposquatData),
    PhishingPattern(PhishingData),
    ThreatDatabase(ThreatData),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpansionData {
    pub is_shortened: bool,
    pub original: String,
    pub expanded: String,
    pub redirect_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReputationData {
    pub domain: String,
    pub root_domain: String,
    /// Heuristic reputation, 0 (worst) to 100 (best).
    pub score: u8,
    pub is_trusted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_age: Option<DomainAge>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SslData {
    pub has_ssl: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_cert: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TyposquatData {
    pub domain: String,
    pub is_typosquat: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suspected_target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<TyposquatRule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reputation: Option<DomainReputation>,
}

/// Which typosquatting rule produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TyposquatRule {
    Leetspeak,
    ContainsBrand,
    Similarity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhishingData {
    pub is_phishing: bool,
    pub score: u8,
    pub matches: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreatData {
    /// `None` when no threat database is configured.
    pub is_safe: Option<bool>,
    pub matches: Vec<ThreatMatch>,
}

/// A single match returned by a threat database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreatMatch {
    pub threat_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_type: Option<String>,
}

/// Registration data for a domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainAge {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registrar: Option<String>,
    pub created_date: String,
    pub age_in_days: i64,
}

/// Multi-engine reputation verdict for a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainReputation {
    pub malicious_count: u32,
    pub suspicious_count: u32,
    pub total_engines: u32,
}

impl DomainReputation {
    /// True when at least one engine flagged the domain.
    pub fn is_flagged(&self) -> bool {
        self.malicious_count.saturating_add(self.suspicious_count) > 0
    }
}

/// Overall verdict derived from the risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallSafety {
    Safe,
    Caution,
    Suspicious,
    Dangerous,
    /// Only produced when the engine could not reach a verdict at all.
    Unknown,
}

impl OverallSafety {
    /// Maps a risk score onto the four verdict bands (10/25/50 boundaries).
    pub fn from_score(score: u8) -> Self {
        match score {
            50.. => OverallSafety::Dangerous,
            25..=49 => OverallSafety::Suspicious,
            10..=24 => OverallSafety::Caution,
            _ => OverallSafety::Safe,
        }
    }
}

impl fmt::Display for OverallSafety {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OverallSafety::Safe => "safe",
            OverallSafety::Caution => "caution",
            OverallSafety::Suspicious => "suspicious",
            OverallSafety::Dangerous => "dangerous",
            OverallSafety::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// The combined verdict for one analysed URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeReport {
    pub url: String,
    /// RFC 3339 timestamp of when the analysis finished.
    pub timestamp: String,
    pub checks: BTreeMap<CheckName, CheckOutcome>,
    pub risk_score: u8,
    pub overall_safety: OverallSafety,
    pub recommendations: Vec<String>,
    /// Set when the report was produced without running the checks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CompositeReport {
    pub fn check(&self, name: CheckName) -> Option<&CheckOutcome> {
        self.checks.get(&name)
    }

    /// True when at least one check did not settle.
    pub fn has_failed_checks(&self) -> bool {
        self.checks.values().any(CheckOutcome::is_failed)
    }

    /// Structured data of a successful check, if any.
    pub fn data(&self, name: CheckName) -> Option<&CheckData> {
        self.check(name).and_then(|o| o.report()).map(|r| &r.data)
    }
}

// =============================================================================
// Collaborator Traits
// =============================================================================

/// Result of following a URL through its redirects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowResult {
    pub final_url: String,
    pub status_code: u16,
    pub redirect_count: u32,
}

/// Outbound HTTP transport used by the URL-expansion and SSL checks.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Follows redirects starting at `url`, up to `max_redirects` hops.
    async fn follow(&self, url: &str, max_redirects: u32) -> Result<FollowResult, LookupError>;

    /// Issues a single lightweight request and returns the status code.
    async fn probe(&self, url: &str) -> Result<u16, LookupError>;
}

/// External threat-matching service (Safe-Browsing style).
#[async_trait]
pub trait ThreatLookup: Send + Sync {
    /// Returns the matches found for `url`; an empty list means no match.
    ///
    /// # Returns
    /// * `Err(LookupError::NotConfigured)` without issuing a request when no
    ///   credential is available
    async fn query(&self, url: &str) -> Result<Vec<ThreatMatch>, LookupError>;
}

/// WHOIS-style registration lookup.
#[async_trait]
pub trait DomainAgeLookup: Send + Sync {
    async fn query(&self, domain: &str) -> Result<DomainAge, LookupError>;
}

/// Multi-engine domain reputation lookup, used to corroborate typosquatting.
#[async_trait]
pub trait DomainReputationLookup: Send + Sync {
    async fn query(&self, domain: &str) -> Result<DomainReputation, LookupError>;
}
