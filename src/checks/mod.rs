//! The individual detection checks.
//!
//! Every check implements [`Check`]. Checks never fail the analysis as a
//! whole: [`run_check`] turns any error into a `CheckOutcome::Failed` for that
//! check alone.

pub mod domain_reputation;
pub mod phishing_pattern;
pub mod ssl;
pub mod threat_database;
pub mod typosquatting;
pub mod url_expansion;

pub use domain_reputation::DomainReputationCheck;
pub use phishing_pattern::PhishingPatternCheck;
pub use ssl::SslCheck;
pub use threat_database::ThreatDatabaseCheck;
pub use typosquatting::TyposquattingCheck;
pub use url_expansion::UrlExpansionCheck;

use crate::core::{CheckName, CheckOutcome, CheckReport};
use crate::lookup::LookupError;
use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckError {
    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error("URL has no host")]
    MissingHost,

    #[error("{0}")]
    Internal(String),
}

/// A single detection concern.
#[async_trait]
pub trait Check: Send + Sync {
    /// The stable name this check reports under.
    fn name(&self) -> CheckName;

    /// Analyses a URL.
    ///
    /// # Returns
    /// * `Ok(CheckReport)` for a settled verdict, including heuristic-only
    ///   verdicts when an optional collaborator is not configured
    /// * `Err` for runtime failures of the check or its collaborators
    async fn analyze(&self, url: &Url) -> Result<CheckReport, CheckError>;
}

/// Runs a check and converts its result into an outcome.
pub async fn run_check(check: &dyn Check, url: &Url) -> CheckOutcome {
    let name = check.name();
    match check.analyze(url).await {
        Ok(report) => {
            debug!(check = %name, risk = %report.risk_level, "Check completed");
            metrics::counter!("check_outcomes_total", "check" => name.as_str(), "status" => "ok")
                .increment(1);
            CheckOutcome::Ok(report)
        }
        Err(e) => {
            warn!(check = %name, error = %e, "Check failed");
            metrics::counter!("check_outcomes_total", "check" => name.as_str(), "status" => "failed")
                .increment(1);
            CheckOutcome::failed(e.to_string())
        }
    }
}
