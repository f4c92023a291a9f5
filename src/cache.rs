//! The fingerprint cache: content-addressed reuse of structuring results.
//!
//! This is what bounds spend on the metered generative service. Callers
//! follow read-before-compute: check the cache, and only structure on a
//! miss. Entries are never mutated, only superseded by a newer write
//! under the same fingerprint (last write wins).

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::SystemTime;

use crate::error::CacheError;
use crate::model::{CacheEntry, CanonicalRecipe};

/// Key-value store of structuring results, keyed by input fingerprint.
///
/// Implementations must support concurrent reads and serializable writes;
/// per-key atomicity is the only locking requirement.
#[async_trait]
pub trait FingerprintCache: Send + Sync {
    async fn get(&self, fingerprint: &str) -> Result<Option<CacheEntry>, CacheError>;

    async fn put(
        &self,
        fingerprint: &str,
        recipe: CanonicalRecipe,
    ) -> Result<CacheEntry, CacheError>;
}

/// In-process cache backed by a `RwLock<HashMap>`.
///
/// Suits a single-process deployment and tests; a durable store slots in
/// behind the same trait.
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        MemoryCache::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl FingerprintCache for MemoryCache {
    async fn get(&self, fingerprint: &str) -> Result<Option<CacheEntry>, CacheError> {
        let entries = self
            .entries
            .read()
            .map_err(|e| CacheError(format!("cache lock poisoned: {}", e)))?;
        Ok(entries.get(fingerprint).cloned())
    }

    async fn put(
        &self,
        fingerprint: &str,
        recipe: CanonicalRecipe,
    ) -> Result<CacheEntry, CacheError> {
        let entry = CacheEntry {
            fingerprint: fingerprint.to_string(),
            recipe,
            created_at: SystemTime::now(),
        };
        let mut entries = self
            .entries
            .write()
            .map_err(|e| CacheError(format!("cache lock poisoned: {}", e)))?;
        entries.insert(fingerprint.to_string(), entry.clone());
        Ok(entry)
    }
}
