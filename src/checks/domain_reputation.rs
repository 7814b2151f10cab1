//! Heuristic domain reputation, optionally overlaid with registration age.

use crate::checks::{Check, CheckError};
use crate::core::{
    CheckData, CheckName, CheckReport, DomainAge, DomainAgeLookup, ReputationData, RiskLevel,
};
use crate::domain::{has_digit_run, host_of, is_ip_host, root_domain, subdomain_count, tld};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, instrument};
use url::Url;

/// Root domains that short-circuit to a trusted verdict.
pub const TRUSTED_DOMAINS: &[&str] = &[
    "amazon.com",
    "apple.com",
    "bing.com",
    "dropbox.com",
    "facebook.com",
    "github.com",
    "google.com",
    "instagram.com",
    "linkedin.com",
    "live.com",
    "microsoft.com",
    "netflix.com",
    "office.com",
    "paypal.com",
    "reddit.com",
    "twitter.com",
    "wikipedia.org",
    "x.com",
    "yahoo.com",
    "youtube.com",
];

/// Top-level domains disproportionately used for abuse.
pub const SUSPICIOUS_TLDS: &[&str] = &[
    "tk", "ml", "ga", "cf", "gq", "xyz", "top", "click", "link", "work", "zip", "country",
    "stream", "download", "review", "loan", "men",
];

const NEUTRAL_SCORE: i32 = 50;
const TRUSTED_SCORE: u8 = 90;
const MAX_DOMAIN_LENGTH: usize = 40;
const MAX_SUBDOMAINS: usize = 2;

/// Maps a heuristic score onto a risk level.
fn risk_from_score(score: u8) -> RiskLevel {
    match score {
        40.. => RiskLevel::Low,
        20..=39 => RiskLevel::Medium,
        _ => RiskLevel::High,
    }
}

/// Maps a registration age onto a risk level.
pub fn risk_from_age(age_in_days: i64) -> RiskLevel {
    if age_in_days < 30 {
        RiskLevel::High
    } else if age_in_days < 365 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

pub struct DomainReputationCheck {
    age_lookup: Arc<dyn DomainAgeLookup>,
}

impl DomainReputationCheck {
    pub fn new(age_lookup: Arc<dyn DomainAgeLookup>) -> Self {
        Self { age_lookup }
    }

    /// Applies the shape deductions and returns the score with its reasons.
    fn heuristic_score(host: &str) -> (u8, Vec<String>) {
        let mut score = NEUTRAL_SCORE;
        let mut details = Vec::new();

        if let Some(tld) = tld(host) {
            if SUSPICIOUS_TLDS.contains(&tld) {
                score -= 20;
                details.push(format!("Suspicious top-level domain .{}", tld));
            }
        }
        if host.len() > MAX_DOMAIN_LENGTH {
            score -= 10;
            details.push(format!("Unusually long domain ({} characters)", host.len()));
        }
        let subdomains = subdomain_count(host);
        if subdomains > MAX_SUBDOMAINS {
            score -= 15;
            details.push(format!("Excessive subdomains ({})", subdomains));
        }
        if has_digit_run(host, 3) {
            score -= 5;
            details.push("Domain contains a run of digits".to_string());
        }
        if details.is_empty() {
            details.push("No suspicious domain characteristics found".to_string());
        }

        (score.clamp(0, 100) as u8, details)
    }
}

#[async_trait]
impl Check for DomainReputationCheck {
    fn name(&self) -> CheckName {
        CheckName::DomainReputation
    }

    #[instrument(skip_all, fields(url = %url))]
    async fn analyze(&self, url: &Url) -> Result<CheckReport, CheckError> {
        let host = host_of(url).ok_or(CheckError::MissingHost)?;
        let root = root_domain(&host);

        if TRUSTED_DOMAINS.contains(&root.as_str()) {
            return Ok(CheckReport::new(
                RiskLevel::Low,
                vec![format!("{} is a well-known trusted domain", root)],
                CheckData::DomainReputation(ReputationData {
                    domain: host,
                    root_domain: root,
                    score: TRUSTED_SCORE,
                    is_trusted: true,
                    domain_age: None,
                }),
            ));
        }

        let (score, mut details) = Self::heuristic_score(&host);
        let mut risk_level = risk_from_score(score);
        let mut domain_age: Option<DomainAge> = None;

        if !is_ip_host(&host) {
            match self.age_lookup.query(&root).await {
                Ok(age) => {
                    risk_level = risk_from_age(age.age_in_days);
                    let registrar = age
                        .registrar
                        .as_deref()
                        .map(|r| format!(" via {}", r))
                        .unwrap_or_default();
                    details = vec![format!(
                        "Domain registered {} days ago{}",
                        age.age_in_days, registrar
                    )];
                    domain_age = Some(age);
                }
                Err(e) if e.is_not_configured() => {}
                Err(e) => {
                    debug!(domain = %root, error = %e, "Domain age lookup failed, using heuristics");
                }
            }
        }

        Ok(CheckReport::new(
            risk_level,
            details,
            CheckData::DomainReputation(ReputationData {
                domain: host,
                root_domain: root,
                score,
                is_trusted: false,
                domain_age,
            }),
        ))
    }
}
