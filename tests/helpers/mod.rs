#![allow(dead_code)]
//! Shared fakes and builders for the integration tests.

pub mod fake_lookups;

use fake_transport::FakeTransport;
use qrshield::config::Config;
use qrshield::engine::{AnalysisEngine, AnalysisEngineBuilder};
use qrshield::lookup::NotConfigured;
use std::sync::Arc;

/// An engine builder with every collaborator faked or unconfigured, so no
/// test ever reaches the network.
pub fn offline_builder(config: Config, transport: Arc<FakeTransport>) -> AnalysisEngineBuilder {
    AnalysisEngine::builder(config)
        .transport_override(transport)
        .threat_lookup_override(Arc::new(NotConfigured))
        .age_lookup_override(Arc::new(NotConfigured))
        .reputation_lookup_override(Arc::new(NotConfigured))
}

/// An offline engine with the default configuration.
pub fn offline_engine(transport: Arc<FakeTransport>) -> AnalysisEngine {
    offline_builder(Config::default(), transport)
        .build()
        .expect("engine should build")
}
