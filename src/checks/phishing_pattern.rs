//! Lexical phishing indicators in the full URL text.

use crate::checks::{Check, CheckError};
use crate::core::{CheckData, CheckName, CheckReport, PhishingData, RiskLevel};
use crate::patterns::{score_patterns, MatchMode, PatternTable};
use async_trait::async_trait;
use tracing::instrument;
use url::Url;

/// Score at which a URL is considered phishing.
pub const PHISHING_THRESHOLD: u8 = 40;
const MEDIUM_THRESHOLD: u8 = 20;

/// `(detector, description, weight, mode)` entries of the phishing table.
const PHISHING_PATTERNS: &[(&str, &str, u32, MatchMode)] = &[
    (
        r"(?i)(log-?in|sign-?in|verif(y|ication)|account|confirm|password|credential|authenticat|unlock|suspend|secure|update)",
        "Sensitive action terms",
        20,
        MatchMode::Presence,
    ),
    (
        r"(?i)\.(exe|scr|bat|cmd|msi|apk|jar|vbs|ps1|dmg)($|[?#])",
        "Executable file download",
        30,
        MatchMode::Presence,
    ),
    (
        r"(?i)[?&](redirect(_uri)?|redir|url|next|return(_?to|_url)?|goto|dest(ination)?|continue|target)=",
        "URL redirection parameter",
        15,
        MatchMode::Presence,
    ),
    (r"@", "Contains @ symbol", 25, MatchMode::Presence),
    (
        r"(?i)^[a-z][a-z0-9+.-]*://(\d{1,3}\.){3}\d{1,3}(:\d+)?($|[/?#])",
        "IP address used instead of a domain",
        30,
        MatchMode::Presence,
    ),
    (
        r"(?i)(free|prize|winner|bonus|gift|giveaway|reward|promo|lucky|claim)",
        "Marketing bait terms",
        10,
        MatchMode::Presence,
    ),
    (
        r"(?i)(bank|wallet|payment|billing|invoice|credit-?card|ssn|refund|crypto|bitcoin)",
        "Financial or sensitive terms",
        15,
        MatchMode::Presence,
    ),
    (
        r"(?i)(urgent|immediate|expire|alert|warning|locked|limited|action-?required|final-?notice)",
        "Urgency or fear tactics",
        15,
        MatchMode::Presence,
    ),
    (
        r"[-_]",
        "Excessive hyphens or underscores",
        10,
        MatchMode::CountThreshold(3),
    ),
];

fn risk_from_score(score: u8) -> RiskLevel {
    if score >= PHISHING_THRESHOLD {
        RiskLevel::High
    } else if score >= MEDIUM_THRESHOLD {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

pub struct PhishingPatternCheck {
    table: PatternTable,
}

impl PhishingPatternCheck {
    /// Compiles the phishing table.
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            table: PatternTable::new(PHISHING_PATTERNS)?,
        })
    }
}

#[async_trait]
impl Check for PhishingPatternCheck {
    fn name(&self) -> CheckName {
        CheckName::PhishingPattern
    }

    #[instrument(skip_all, fields(url = %url))]
    async fn analyze(&self, url: &Url) -> Result<CheckReport, CheckError> {
        let scored = score_patterns(url.as_str(), &self.table);
        let is_phishing = scored.score >= PHISHING_THRESHOLD;

        let details = if scored.matches.is_empty() {
            vec!["No phishing patterns detected".to_string()]
        } else {
            scored.matches.clone()
        };

        Ok(CheckReport::new(
            risk_from_score(scored.score),
            details,
            CheckData::PhishingPattern(PhishingData {
                is_phishing,
                score: scored.score,
                matches: scored.matches,
            }),
        ))
    }
}
