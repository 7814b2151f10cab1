//! Look-alike detection against a curated list of high-value brands.

use crate::checks::{Check, CheckError};
use crate::core::{
    CheckData, CheckName, CheckReport, DomainReputationLookup, RiskLevel, TyposquatData,
    TyposquatRule,
};
use crate::domain::{host_of, is_ip_host, normalize_leetspeak, root_domain, strip_tld};
use crate::similarity::similarity;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use url::Url;

/// Brand domains, kept in lexicographic order. When several brands could
/// match, the first one in this order is reported.
pub const BRAND_DOMAINS: &[&str] = &[
    "amazon.com",
    "apple.com",
    "bankofamerica.com",
    "dropbox.com",
    "ebay.com",
    "facebook.com",
    "google.com",
    "instagram.com",
    "linkedin.com",
    "microsoft.com",
    "netflix.com",
    "outlook.com",
    "paypal.com",
    "twitter.com",
    "wellsfargo.com",
    "yahoo.com",
];

const LEETSPEAK_SCORE: u8 = 90;
const CONTAINS_BRAND_SCORE: u8 = 85;
const SIMILARITY_THRESHOLD: f64 = 0.75;

/// A heuristic look-alike match.
#[derive(Debug, Clone, PartialEq)]
pub struct TyposquatMatch {
    pub target: &'static str,
    pub score: u8,
    pub rule: TyposquatRule,
}

/// Matches a brand label (TLD already stripped) against the brand list.
///
/// Rules are tried per brand, strongest evidence first: an exact match after
/// undoing leetspeak, then containment of the brand label, then edit-distance
/// similarity strictly between 0.75 and 1.0.
pub fn find_typosquat(candidate: &str) -> Option<TyposquatMatch> {
    let candidate = candidate.to_lowercase();
    let normalized = normalize_leetspeak(&candidate);

    for &brand in BRAND_DOMAINS {
        let brand_root = strip_tld(brand);
        if candidate == brand_root {
            continue;
        }

        if normalized == brand_root {
            return Some(TyposquatMatch {
                target: brand,
                score: LEETSPEAK_SCORE,
                rule: TyposquatRule::Leetspeak,
            });
        }

        if candidate.contains(&brand_root) {
            return Some(TyposquatMatch {
                target: brand,
                score: CONTAINS_BRAND_SCORE,
                rule: TyposquatRule::ContainsBrand,
            });
        }

        let s = similarity(&candidate, &brand_root);
        if s > SIMILARITY_THRESHOLD && s < 1.0 {
            return Some(TyposquatMatch {
                target: brand,
                score: (s * 100.0).round() as u8,
                rule: TyposquatRule::Similarity,
            });
        }
    }

    None
}

pub struct TyposquattingCheck {
    reputation: Arc<dyn DomainReputationLookup>,
}

impl TyposquattingCheck {
    pub fn new(reputation: Arc<dyn DomainReputationLookup>) -> Self {
        Self { reputation }
    }

    fn clean(domain: String, detail: &str) -> CheckReport {
        CheckReport::new(
            RiskLevel::Low,
            vec![detail.to_string()],
            CheckData::Typosquatting(TyposquatData {
                domain,
                is_typosquat: false,
                suspected_target: None,
                score: None,
                rule: None,
                reputation: None,
            }),
        )
    }
}

#[async_trait]
impl Check for TyposquattingCheck {
    fn name(&self) -> CheckName {
        CheckName::Typosquatting
    }

    #[instrument(skip_all, fields(url = %url))]
    async fn analyze(&self, url: &Url) -> Result<CheckReport, CheckError> {
        let host = host_of(url).ok_or(CheckError::MissingHost)?;
        if is_ip_host(&host) {
            return Ok(Self::clean(host, "IP address host, no brand to impersonate"));
        }

        let root = root_domain(&host);
        if BRAND_DOMAINS.contains(&root.as_str()) {
            return Ok(Self::clean(root, "Domain is a legitimate brand domain"));
        }

        let candidate = strip_tld(&root);
        let found = match find_typosquat(&candidate) {
            Some(found) => found,
            None => return Ok(Self::clean(root, "No typosquatting detected")),
        };

        info!(domain = %root, target = found.target, score = found.score, "Possible typosquat");
        let mut details = vec![format!(
            "Domain resembles {} (similarity {}%)",
            found.target, found.score
        )];

        let (risk_level, reputation) = match self.reputation.query(&root).await {
            Ok(rep) if rep.is_flagged() => {
                details.push(format!(
                    "Reputation engines flagged this domain ({} malicious, {} suspicious of {})",
                    rep.malicious_count, rep.suspicious_count, rep.total_engines
                ));
                (RiskLevel::High, Some(rep))
            }
            Ok(rep) => {
                details.push("Reputation engines did not flag this domain".to_string());
                (RiskLevel::Medium, Some(rep))
            }
            Err(e) => {
                if !e.is_not_configured() {
                    warn!(domain = %root, error = %e, "Reputation lookup failed, keeping heuristic verdict");
                    details.push(format!("Reputation lookup unavailable: {}", e));
                }
                let risk = if found.score >= CONTAINS_BRAND_SCORE {
                    RiskLevel::High
                } else {
                    RiskLevel::Medium
                };
                (risk, None)
            }
        };

        Ok(CheckReport::new(
            risk_level,
            details,
            CheckData::Typosquatting(TyposquatData {
                domain: root,
                is_typosquat: true,
                suspected_target: Some(found.target.to_string()),
                score: Some(found.score),
                rule: Some(found.rule),
                reputation,
            }),
        ))
    }
}
