//! External collaborators used by the checks.
//!
//! The checks only depend on the traits in `crate::core`; this module holds
//! the error type shared by every collaborator, a `NotConfigured` provider,
//! and the HTTP-backed implementations used by the binary.

pub mod http_transport;
pub mod safe_browsing;
pub mod virustotal;
pub mod whois;

pub use http_transport::HttpTransport;
pub use safe_browsing::SafeBrowsingClient;
pub use virustotal::VirusTotalClient;
pub use whois::WhoisClient;

use crate::core::{
    DomainAge, DomainAgeLookup, DomainReputation, DomainReputationLookup, ThreatLookup,
    ThreatMatch,
};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// The collaborator has no credential. Not a failure: callers fall back
    /// to heuristics silently.
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("request timed out")]
    Timeout,

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl LookupError {
    pub fn is_not_configured(&self) -> bool {
        matches!(self, LookupError::NotConfigured(_))
    }
}

impl From<reqwest::Error> for LookupError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LookupError::Timeout
        } else if e.is_decode() {
            LookupError::InvalidResponse(e.to_string())
        } else {
            LookupError::Http(e.to_string())
        }
    }
}

/// A provider for every optional collaborator that always answers
/// `NotConfigured`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotConfigured;

#[async_trait]
impl ThreatLookup for NotConfigured {
    async fn query(&self, _url: &str) -> Result<Vec<ThreatMatch>, LookupError> {
        Err(LookupError::NotConfigured("threat database"))
    }
}

#[async_trait]
impl DomainAgeLookup for NotConfigured {
    async fn query(&self, _domain: &str) -> Result<DomainAge, LookupError> {
        Err(LookupError::NotConfigured("domain age lookup"))
    }
}

#[async_trait]
impl DomainReputationLookup for NotConfigured {
    async fn query(&self, _domain: &str) -> Result<DomainReputation, LookupError> {
        Err(LookupError::NotConfigured("domain reputation lookup"))
    }
}
