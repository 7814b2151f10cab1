//! qrshield - composite threat analysis for URLs scanned from QR codes
//!
//! The library analyses a URL with a set of independent checks (short-link
//! expansion, domain reputation, HTTPS presence, typosquatting, phishing
//! patterns and an external threat database), combines them into a single
//! verdict, and lets users escalate suspicious URLs.

pub mod cache;
pub mod checks;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod engine;
pub mod formatting;
pub mod lookup;
pub mod patterns;
pub mod reporting;
pub mod similarity;
pub mod telemetry;

// Re-export core types for convenience
pub use crate::core::*;
pub use crate::engine::{AnalysisEngine, AnalysisEngineBuilder, AnalysisError};
