//! Bounded, time-aware store of composite reports.
//!
//! Entries are evicted in insertion order once the cache is full, and each
//! entry expires independently after the configured TTL. Expired entries are
//! removed lazily when they are looked up.

use crate::config::AnalysisConfig;
use crate::core::CompositeReport;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Snapshot of the cache occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub max_size: usize,
    pub enabled: bool,
}

struct Entry {
    report: CompositeReport,
    created_at: Instant,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<String, Entry>,
    order: VecDeque<String>,
}

impl Inner {
    fn forget(&mut self, key: &str) {
        self.entries.remove(key);
        self.order.retain(|k| k != key);
    }
}

pub struct ResultCache {
    inner: Mutex<Inner>,
    max_size: usize,
    ttl: Duration,
    enabled: bool,
}

impl ResultCache {
    /// Creates a new `ResultCache`.
    ///
    /// # Arguments
    /// * `max_size` - Maximum number of entries held at once.
    /// * `ttl` - How long an entry stays visible after insertion.
    /// * `enabled` - When false, every lookup misses and inserts are ignored.
    pub fn new(max_size: usize, ttl: Duration, enabled: bool) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            max_size,
            ttl,
            enabled,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(
            config.cache_max_entries,
            Duration::from_secs(config.cache_ttl_secs),
            config.cache_enabled,
        )
    }

    /// Derives the cache key from the exact URL string.
    pub fn key(url: &str) -> String {
        blake3::hash(url.as_bytes()).to_hex().to_string()
    }

    /// Returns the live report cached for `url`, if any.
    pub async fn get(&self, url: &str) -> Option<CompositeReport> {
        if !self.enabled {
            return None;
        }
        let key = Self::key(url);
        let mut inner = self.inner.lock().await;

        let expired = match inner.entries.get(&key) {
            Some(entry) if entry.created_at.elapsed() < self.ttl => {
                return Some(entry.report.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            inner.forget(&key);
            metrics::gauge!("result_cache_entries").set(inner.entries.len() as f64);
        }
        None
    }

    /// Stores `report` under `url`, evicting the oldest insertion when full.
    ///
    /// Re-inserting an existing key replaces its value and restarts its TTL.
    pub async fn put(&self, url: &str, report: CompositeReport) {
        if !self.enabled || self.max_size == 0 {
            return;
        }
        let key = Self::key(url);
        let mut inner = self.inner.lock().await;

        if inner.entries.contains_key(&key) {
            inner.order.retain(|k| k != &key);
        } else if inner.entries.len() >= self.max_size {
            if let Some(oldest) = inner.order.pop_front() {
                inner.entries.remove(&oldest);
            }
        }

        inner.order.push_back(key.clone());
        inner.entries.insert(
            key,
            Entry {
                report,
                created_at: Instant::now(),
            },
        );
        metrics::gauge!("result_cache_entries").set(inner.entries.len() as f64);
    }

    pub async fn clear(&self) {
        let mut inner = self.inner.lock().await;
        inner.entries.clear();
        inner.order.clear();
        metrics::gauge!("result_cache_entries").set(0.0);
    }

    pub async fn stats(&self) -> CacheStats {
        let inner = self.inner.lock().await;
        CacheStats {
            size: inner.entries.len(),
            max_size: self.max_size,
            enabled: self.enabled,
        }
    }
}
