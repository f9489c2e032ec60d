//! Memoization of aggregate totals keyed by the exact input record sets.
//!
//! Two interchangeable backings sit behind one trait: an in-process map and a
//! shared HTTP key-value store. Callers never see which one is active, and a
//! cache failure is never allowed to fail a computation.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};

use super::domain::{OrderEvaluationRecord, SocialPerformanceRecord};
use super::scoring::ComputationOutcome;
use crate::config::BonusSettings;

/// Stable, order-sensitive serialization of the exact record sets. Two calls
/// with identical inputs produce identical keys.
pub fn cache_key(
    social: &[SocialPerformanceRecord],
    orders: &[OrderEvaluationRecord],
) -> Result<String, CacheError> {
    let payload = serde_json::json!({ "s": social, "o": orders });
    serde_json::to_string(&payload).map_err(|err| CacheError::Serialization(err.to_string()))
}

/// get/set/del contract shared by every backing. Expiry is lazy: an entry
/// past its TTL is treated as a miss on read.
pub trait ComputationCache: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<ComputationOutcome>, CacheError>;
    fn set(&self, key: &str, value: &ComputationOutcome, ttl: Duration) -> Result<(), CacheError>;
    fn del(&self, key: &str) -> Result<(), CacheError>;
}

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache unavailable: {0}")]
    Unavailable(String),
    #[error("cache serialization failed: {0}")]
    Serialization(String),
}

struct MemoryEntry {
    value: ComputationOutcome,
    expires_at: Instant,
}

/// In-process fallback cache.
#[derive(Default)]
pub struct InMemoryComputationCache {
    entries: Mutex<HashMap<String, MemoryEntry>>,
}

impl InMemoryComputationCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ComputationCache for InMemoryComputationCache {
    fn get(&self, key: &str) -> Result<Option<ComputationOutcome>, CacheError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| CacheError::Unavailable("cache mutex poisoned".to_string()))?;

        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &ComputationOutcome, ttl: Duration) -> Result<(), CacheError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| CacheError::Unavailable("cache mutex poisoned".to_string()))?;

        entries.insert(
            key.to_string(),
            MemoryEntry {
                value: value.clone(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    fn del(&self, key: &str) -> Result<(), CacheError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| CacheError::Unavailable("cache mutex poisoned".to_string()))?;
        entries.remove(key);
        Ok(())
    }
}

/// Shared network cache speaking a small HTTP key-value protocol:
/// `GET/PUT/DELETE {base}/v1/cache/{digest}`. Keys are long JSON blobs, so
/// entries are addressed by the SHA-256 of the key; the TTL rides along in
/// the PUT body and expiry stays the store's responsibility.
pub struct SharedComputationCache {
    agent: ureq::Agent,
    base_url: String,
}

impl SharedComputationCache {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(timeout)
            .timeout(timeout)
            .build();

        Self {
            agent,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn entry_url(&self, key: &str) -> String {
        let digest = Sha256::digest(key.as_bytes());
        let mut hex = String::with_capacity(64);
        for byte in digest {
            use std::fmt::Write;
            let _ = write!(hex, "{byte:02x}");
        }
        format!("{}/v1/cache/{hex}", self.base_url)
    }
}

impl ComputationCache for SharedComputationCache {
    fn get(&self, key: &str) -> Result<Option<ComputationOutcome>, CacheError> {
        match self.agent.get(&self.entry_url(key)).call() {
            Ok(response) => response
                .into_json::<ComputationOutcome>()
                .map(Some)
                .map_err(|err| CacheError::Serialization(err.to_string())),
            Err(ureq::Error::Status(404, _)) => Ok(None),
            Err(err) => Err(CacheError::Unavailable(err.to_string())),
        }
    }

    fn set(&self, key: &str, value: &ComputationOutcome, ttl: Duration) -> Result<(), CacheError> {
        let body = serde_json::json!({
            "ttl_seconds": ttl.as_secs(),
            "value": value,
        });

        self.agent
            .put(&self.entry_url(key))
            .send_json(body)
            .map(|_| ())
            .map_err(|err| CacheError::Unavailable(err.to_string()))
    }

    fn del(&self, key: &str) -> Result<(), CacheError> {
        match self.agent.delete(&self.entry_url(key)).call() {
            Ok(_) | Err(ureq::Error::Status(404, _)) => Ok(()),
            Err(err) => Err(CacheError::Unavailable(err.to_string())),
        }
    }
}

/// Backing chosen from configuration: the shared store when a URL is
/// configured, the in-process map otherwise. The choice never leaks past
/// this type.
pub enum CacheBackend {
    Memory(InMemoryComputationCache),
    Shared(SharedComputationCache),
}

impl CacheBackend {
    pub fn from_settings(settings: &BonusSettings) -> Self {
        match &settings.shared_cache_url {
            Some(url) => Self::Shared(SharedComputationCache::new(url.clone(), settings.cache_ttl)),
            None => Self::Memory(InMemoryComputationCache::new()),
        }
    }
}

impl ComputationCache for CacheBackend {
    fn get(&self, key: &str) -> Result<Option<ComputationOutcome>, CacheError> {
        match self {
            CacheBackend::Memory(cache) => cache.get(key),
            CacheBackend::Shared(cache) => cache.get(key),
        }
    }

    fn set(&self, key: &str, value: &ComputationOutcome, ttl: Duration) -> Result<(), CacheError> {
        match self {
            CacheBackend::Memory(cache) => cache.set(key, value, ttl),
            CacheBackend::Shared(cache) => cache.set(key, value, ttl),
        }
    }

    fn del(&self, key: &str) -> Result<(), CacheError> {
        match self {
            CacheBackend::Memory(cache) => cache.del(key),
            CacheBackend::Shared(cache) => cache.del(key),
        }
    }
}
