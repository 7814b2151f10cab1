//! Expands shortened URLs by following their redirects.

use crate::checks::{Check, CheckError};
use crate::core::{CheckData, CheckName, CheckReport, ExpansionData, RiskLevel, Transport};
use crate::domain::host_of;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, instrument};
use url::Url;

/// Known URL-shortener hosts.
pub const SHORTENER_DOMAINS: &[&str] = &[
    "adf.ly",
    "bit.do",
    "bit.ly",
    "buff.ly",
    "cutt.ly",
    "goo.gl",
    "is.gd",
    "lnkd.in",
    "ow.ly",
    "qrco.de",
    "rb.gy",
    "rebrand.ly",
    "s.id",
    "shorturl.at",
    "t.co",
    "t.ly",
    "tiny.cc",
    "tinyurl.com",
    "v.gd",
];

/// Redirect count above which a host-changing expansion is suspicious.
const REDIRECT_WARNING_THRESHOLD: u32 = 3;

pub fn is_shortener(host: &str) -> bool {
    let host = host.strip_prefix("www.").unwrap_or(host);
    SHORTENER_DOMAINS.contains(&host)
}

pub struct UrlExpansionCheck {
    transport: Arc<dyn Transport>,
    max_redirects: u32,
}

impl UrlExpansionCheck {
    pub fn new(transport: Arc<dyn Transport>, max_redirects: u32) -> Self {
        Self {
            transport,
            max_redirects,
        }
    }
}

#[async_trait]
impl Check for UrlExpansionCheck {
    fn name(&self) -> CheckName {
        CheckName::UrlExpansion
    }

    #[instrument(skip_all, fields(url = %url))]
    async fn analyze(&self, url: &Url) -> Result<CheckReport, CheckError> {
        let host = host_of(url).ok_or(CheckError::MissingHost)?;

        if !is_shortener(&host) {
            return Ok(CheckReport::new(
                RiskLevel::Low,
                vec!["URL is not shortened".to_string()],
                CheckData::UrlExpansion(ExpansionData {
                    is_shortened: false,
                    original: url.to_string(),
                    expanded: url.to_string(),
                    redirect_count: 0,
                }),
            ));
        }

        let followed = self.transport.follow(url.as_str(), self.max_redirects).await?;
        debug!(final_url = %followed.final_url, redirects = followed.redirect_count, "Expanded shortened URL");

        let expanded_host = Url::parse(&followed.final_url)
            .ok()
            .as_ref()
            .and_then(host_of);
        let host_changed = expanded_host.as_deref() != Some(host.as_str());

        let risk_level = if host_changed && followed.redirect_count > REDIRECT_WARNING_THRESHOLD {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        };

        let mut details = vec![
            format!("Shortened URL ({}) detected", host),
            format!("Expands to {}", followed.final_url),
            format!("{} redirect(s) followed", followed.redirect_count),
        ];
        if risk_level == RiskLevel::Medium {
            details.push("Long redirect chain to a different host".to_string());
        }

        Ok(CheckReport::new(
            risk_level,
            details,
            CheckData::UrlExpansion(ExpansionData {
                is_shortened: true,
                original: url.to_string(),
                expanded: followed.final_url,
                redirect_count: followed.redirect_count,
            }),
        ))
    }
}
