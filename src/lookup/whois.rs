//! WHOIS JSON API client used for domain age lookups.

use crate::core::{DomainAge, DomainAgeLookup};
use crate::lookup::LookupError;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use moka::future::Cache;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

pub const DEFAULT_WHOIS_URL: &str = "https://www.whoisxmlapi.com";

/// Domain registration lookup with per-domain memoisation.
pub struct WhoisClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    cache: Cache<String, DomainAge>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WhoisResponse {
    whois_record: Option<WhoisRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WhoisRecord {
    created_date: Option<String>,
    registrar_name: Option<String>,
    registry_data: Option<RegistryData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegistryData {
    created_date: Option<String>,
}

impl WhoisClient {
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

    async fn fetch(&self, api_key: &str, domain: &str) -> Result<DomainAge, LookupError> {
        let endpoint = format!(
            "{}/whoisserver/WhoisService",
            self.base_url.trim_end_matches('/')
        );
        let response = self
            .client
            .get(&endpoint)
            .query(&[
                ("apiKey", api_key),
                ("domainName", domain),
                ("outputFormat", "JSON"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(LookupError::Status(response.status().as_u16()));
        }

        let parsed: WhoisResponse = response.json().await?;
        let record = parsed
            .whois_record
            .ok_or_else(|| LookupError::InvalidResponse("missing WhoisRecord".into()))?;
        let created = record
            .created_date
            .or_else(|| record.registry_data.and_then(|r| r.created_date))
            .ok_or_else(|| LookupError::InvalidResponse("missing createdDate".into()))?;

        let created_at = parse_created_date(&created)
            .ok_or_else(|| LookupError::InvalidResponse(format!("unparseable date {}", created)))?;

        Ok(DomainAge {
            registrar: record.registrar_name,
            created_date: created,
            age_in_days: (Utc::now() - created_at).num_days(),
        })
    }
}

/// Accepts RFC 3339, the `+0000` offset variant WHOIS servers emit, and bare
/// dates.
fn parse_created_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z") {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw.get(..10)?, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

#[async_trait]
impl DomainAgeLookup for WhoisClient {
    #[instrument(skip(self))]
    async fn query(&self, domain: &str) -> Result<DomainAge, LookupError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(LookupError::NotConfigured("whois"))?;

        let key = domain.to_lowercase();
        if let Some(cached) = self.cache.get(&key).await {
            debug!(domain, "WHOIS cache hit");
            return Ok(cached);
        }

        let age = self.fetch(api_key, &key).await?;
        self.cache.insert(key, age.clone()).await;
        Ok(age)
    }
}
