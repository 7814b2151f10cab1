//! VirusTotal domain reputation client.

use crate::core::{DomainReputation, DomainReputationLookup};
use crate::lookup::LookupError;
use async_trait::async_trait;
use moka::future::Cache;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

pub const DEFAULT_VIRUSTOTAL_URL: &str = "https://www.virustotal.com";

/// Domain reputation lookup with per-domain memoisation.
pub struct VirusTotalClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    cache: Cache<String, DomainReputation>,
}

impl VirusTotalClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
        cache_ttl: Duration,
    ) -> Result<Self, LookupError> {
        let client = Client::builder().timeout(timeout).build()?;
        let cache = Cache::builder()
            .time_to_live(cache_ttl)
            .max_capacity(1_000)
            .build();
        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.filter(|k| !k.is_empty()),
            cache,
        })
    }

    async fn fetch(&self, api_key: &str, domain: &str) -> Result<DomainReputation, LookupError> {
        let endpoint = format!(
            "{}/api/v3/domains/{}",
            self.base_url.trim_end_matches('/'),
            domain
        );
        let response = self
            .client
            .get(&endpoint)
            .header("x-apikey", api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(LookupError::Status(response.status().as_u16()));
        }

        let report: DomainResponse = response.json().await?;
        let stats = report.data.attributes.last_analysis_stats;
        Ok(DomainReputation {
            malicious_count: stats.malicious,
            suspicious_count: stats.suspicious,
            total_engines: stats
                .malicious
                .saturating_add(stats.suspicious)
                .saturating_add(stats.harmless)
                .saturating_add(stats.undetected),
        })
    }
}

#[derive(Debug, Deserialize)]
struct DomainResponse {
    data: DomainObject,
}

#[derive(Debug, Deserialize)]
struct DomainObject {
    attributes: DomainAttributes,
}

#[derive(Debug, Deserialize)]
struct DomainAttributes {
    last_analysis_stats: AnalysisStats,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AnalysisStats {
    malicious: u32,
    suspicious: u32,
    harmless: u32,
    undetected: u32,
}

#[async_trait]
impl DomainReputationLookup for VirusTotalClient {
    #[instrument(skip(self))]
    async fn query(&self, domain: &str) -> Result<DomainReputation, LookupError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(LookupError::NotConfigured("virustotal"))?;

        let key = domain.to_lowercase();
        if let Some(cached) = self.cache.get(&key).await {
            debug!(domain, "VirusTotal cache hit");
            return Ok(cached);
        }

        let reputation = self.fetch(api_key, &key).await?;
        self.cache.insert(key, reputation).await;
        Ok(reputation)
    }
}
