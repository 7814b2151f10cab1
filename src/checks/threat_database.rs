//! External threat-database lookup.

use crate::checks::{Check, CheckError};
use crate::core::{CheckData, CheckName, CheckReport, RiskLevel, ThreatData, ThreatLookup};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, instrument};
use url::Url;

pub struct ThreatDatabaseCheck {
    lookup: Arc<dyn ThreatLookup>,
}

impl ThreatDatabaseCheck {
    pub fn new(lookup: Arc<dyn ThreatLookup>) -> Self {
        Self { lookup }
    }
}

#[async_trait]
impl Check for ThreatDatabaseCheck {
    fn name(&self) -> CheckName {
        CheckName::ThreatDatabase
    }

    #[instrument(skip_all, fields(url = %url))]
    async fn analyze(&self, url: &Url) -> Result<CheckReport, CheckError> {
        let matches = match self.lookup.query(url.as_str()).await {
            Ok(matches) => matches,
            Err(e) if e.is_not_configured() => {
                return Ok(CheckReport::new(
                    RiskLevel::Unknown,
                    vec!["Threat database not configured, lookup skipped".to_string()],
                    CheckData::ThreatDatabase(ThreatData {
                        is_safe: None,
                        matches: Vec::new(),
                    }),
                ));
            }
            Err(e) => return Err(e.into()),
        };

        if matches.is_empty() {
            return Ok(CheckReport::new(
                RiskLevel::Low,
                vec!["No matches in threat database".to_string()],
                CheckData::ThreatDatabase(ThreatData {
                    is_safe: Some(true),
                    matches,
                }),
            ));
        }

        info!(matches = matches.len(), "URL found in threat database");
        let details = matches
            .iter()
            .map(|m| match &m.platform_type {
                Some(platform) => format!("Listed as {} ({})", m.threat_type, platform),
                None => format!("Listed as {}", m.threat_type),
            })
            .collect();

        Ok(CheckReport::new(
            RiskLevel::High,
            details,
            CheckData::ThreatDatabase(ThreatData {
                is_safe: Some(false),
                matches,
            }),
        ))
    }
}
