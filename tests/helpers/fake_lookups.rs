#![allow(dead_code)]
//! Fake lookup services for testing purposes.

use async_trait::async_trait;
use qrshield::core::{
    DomainAge, DomainAgeLookup, DomainReputation, DomainReputationLookup, ThreatLookup,
    ThreatMatch,
};
use qrshield::lookup::LookupError;
use std::collections::HashMap;

/// A threat database with a fixed answer for every URL.
pub struct FakeThreatLookup {
    pub result: Result<Vec<ThreatMatch>, LookupError>,
}

impl FakeThreatLookup {
    pub fn listing(threat_type: &str) -> Self {
        Self {
            result: Ok(vec![ThreatMatch {
                threat_type: threat_type.to_string(),
                platform_type: Some("ANY_PLATFORM".to_string()),
            }]),
        }
    }

    pub fn failing(error: LookupError) -> Self {
        Self { result: Err(error) }
    }
}

#[async_trait]
impl ThreatLookup for FakeThreatLookup {
    async fn query(&self, _url: &str) -> Result<Vec<ThreatMatch>, LookupError> {
        self.result.clone()
    }
}

/// Registration ages by root domain. Unknown domains fail the lookup.
#[derive(Default)]
pub struct FakeAgeLookup {
    ages: HashMap<String, i64>,
}

impl FakeAgeLookup {
    pub fn with_age(mut self, domain: &str, age_in_days: i64) -> Self {
        self.ages.insert(domain.to_string(), age_in_days);
        self
    }
}

#[async_trait]
impl DomainAgeLookup for FakeAgeLookup {
    async fn query(&self, domain: &str) -> Result<DomainAge, LookupError> {
        self.ages
            .get(domain)
            .map(|days| DomainAge {
                registrar: Some("Example Registrar".to_string()),
                created_date: "2026-10-01".to_string(),
                age_in_days: *days,
            })
            .ok_or(LookupError::Status(404))
    }
}

/// A reputation service with a fixed answer for every domain.
pub struct FakeReputationLookup {
    pub result: Result<DomainReputation, LookupError>,
}

impl FakeReputationLookup {
    pub fn flagged(malicious_count: u32) -> Self {
        Self {
            result: Ok(DomainReputation {
                malicious_count,
                suspicious_count: 0,
                total_engines: 90,
            }),
        }
    }

    pub fn clean() -> Self {
        Self::flagged(0)
    }
}

#[async_trait]
impl DomainReputationLookup for FakeReputationLookup {
    async fn query(&self, _domain: &str) -> Result<DomainReputation, LookupError> {
        self.result.clone()
    }
}
