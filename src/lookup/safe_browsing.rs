//! Google Safe Browsing v4 client (`threatMatches:find`).

use crate::core::{ThreatLookup, ThreatMatch};
use crate::lookup::LookupError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, instrument, warn};

pub const DEFAULT_SAFE_BROWSING_URL: &str = "https://safebrowsing.googleapis.com";

const THREAT_TYPES: [&str; 4] = [
    "MALWARE",
    "SOCIAL_ENGINEERING",
    "UNWANTED_SOFTWARE",
    "POTENTIALLY_HARMFUL_APPLICATION",
];

/// Threat-database lookup against the Safe Browsing API.
pub struct SafeBrowsingClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl SafeBrowsingClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, LookupError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.filter(|k| !k.is_empty()),
        })
    }
}

#[derive(Debug, Deserialize)]
struct FindResponse {
    #[serde(default)]
    matches: Vec<RawMatch>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMatch {
    threat_type: String,
    #[serde(default)]
    platform_type: Option<String>,
}

#[async_trait]
impl ThreatLookup for SafeBrowsingClient {
    #[instrument(skip(self))]
    async fn query(&self, url: &str) -> Result<Vec<ThreatMatch>, LookupError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(LookupError::NotConfigured("safe browsing"))?;

        let body = json!({
            "client": { "clientId": "qrshield", "clientVersion": env!("CARGO_PKG_VERSION") },
            "threatInfo": {
                "threatTypes": THREAT_TYPES,
                "platformTypes": ["ANY_PLATFORM"],
                "threatEntryTypes": ["URL"],
                "threatEntries": [{ "url": url }],
            }
        });

        let endpoint = format!("{}/v4/threatMatches:find", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&endpoint)
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            warn!(status = %response.status(), "Safe Browsing lookup failed");
            return Err(LookupError::Status(response.status().as_u16()));
        }

        let parsed: FindResponse = response.json().await?;
        debug!(matches = parsed.matches.len(), "Safe Browsing lookup completed");
        Ok(parsed
            .matches
            .into_iter()
            .map(|m| ThreatMatch {
                threat_type: m.threat_type,
                platform_type: m.platform_type,
            })
            .collect())
    }
}
