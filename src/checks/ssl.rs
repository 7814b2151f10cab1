//! HTTPS presence and reachability.
//!
//! This is a status-code proxy for a working TLS endpoint, not certificate
//! chain validation.

use crate::checks::{Check, CheckError};
use crate::core::{CheckData, CheckName, CheckReport, RiskLevel, SslData, Transport};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, instrument};
use url::Url;

pub struct SslCheck {
    transport: Arc<dyn Transport>,
}

impl SslCheck {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl Check for SslCheck {
    fn name(&self) -> CheckName {
        CheckName::Ssl
    }

    #[instrument(skip_all, fields(url = %url))]
    async fn analyze(&self, url: &Url) -> Result<CheckReport, CheckError> {
        if url.scheme() != "https" {
            return Ok(CheckReport::new(
                RiskLevel::High,
                vec!["Connection is not encrypted (no HTTPS)".to_string()],
                CheckData::Ssl(SslData {
                    has_ssl: false,
                    valid_cert: None,
                    status_code: None,
                }),
            ));
        }

        let (risk_level, valid_cert, status_code, detail) = match self.transport.probe(url.as_str()).await {
            Ok(status) if status < 400 => (
                RiskLevel::Low,
                true,
                Some(status),
                "HTTPS connection established".to_string(),
            ),
            Ok(status) => (
                RiskLevel::Medium,
                false,
                Some(status),
                format!("HTTPS endpoint responded with status {}", status),
            ),
            Err(e) => {
                debug!(error = %e, "HTTPS probe failed");
                (
                    RiskLevel::Medium,
                    false,
                    None,
                    format!("Could not verify HTTPS connection: {}", e),
                )
            }
        };

        Ok(CheckReport::new(
            risk_level,
            vec![detail],
            CheckData::Ssl(SslData {
                has_ssl: true,
                valid_cert: Some(valid_cert),
                status_code,
            }),
        ))
    }
}
