//! LRU caching for resolved authorization decisions
//!
//! The cache maps (role, resource, permission) triples to booleans. Entries
//! carry an expiry deadline and a configuration-version stamp; an entry is
//! served only while its stamp equals the cache's live version and its
//! deadline has not passed. Either failure is treated as a miss and the
//! entry is evicted lazily.
//!
//! [`DecisionCache::clear`] empties the store *and* bumps the version. A
//! resolution that started against the old configuration may still write its
//! result after the clear lands; its stamp no longer matches, so the stale
//! entry is discarded on the next read.

use blake3::Hasher;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

/// Cache key: BLAKE3 hash over the length-prefixed triple components.
///
/// The length prefix keeps distinct triples from ever aliasing — without
/// it, ("ab", "c") and ("a", "bc") would hash the same bytes.
type CacheKey = [u8; 32];

/// Cache tuning knobs
#[derive(Debug, Clone)]
pub struct CacheOptions {
    /// Whether decisions are cached at all
    pub enabled: bool,

    /// Maximum number of entries; the least-recently-used entry is evicted
    /// at capacity
    pub max_size: usize,

    /// Time-to-live for cached decisions
    pub ttl: Duration,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            max_size: 1000,
            ttl: Duration::from_secs(60),
        }
    }
}

/// Externally observable cache state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Whether caching is enabled
    pub enabled: bool,

    /// Current number of stored entries
    pub size: usize,
}

#[derive(Debug, Clone, Copy)]
struct CachedEntry {
    allowed: bool,
    expires_at: Instant,
    version: u64,
}

impl CachedEntry {
    fn is_live(&self, now: Instant, version: u64) -> bool {
        self.version == version && now < self.expires_at
    }
}

/// Bounded, time-expiring decision cache
pub struct DecisionCache {
    entries: Mutex<LruCache<CacheKey, CachedEntry>>,
    version: AtomicU64,
    ttl: Duration,
    enabled: bool,
}

impl DecisionCache {
    /// Create a cache from options. A zero `max_size` falls back to a
    /// single-entry store rather than failing.
    pub fn new(options: CacheOptions) -> Self {
        let capacity =
            NonZeroUsize::new(options.max_size).unwrap_or(NonZeroUsize::new(1).unwrap());

        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            version: AtomicU64::new(0),
            ttl: options.ttl,
            enabled: options.enabled,
        }
    }

    /// The live configuration version. Resolutions capture this before
    /// reading configuration state and stamp their writes with it.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// Look up a cached decision, promoting a live hit to most-recently-used.
    ///
    /// Expired or version-stale entries are popped and reported as misses.
    pub fn get(&self, role: &str, resource: &str, permission: &str) -> Option<bool> {
        if !self.enabled {
            return None;
        }

        let key = Self::compute_key(role, resource, permission);
        let live_version = self.version();
        let mut entries = self.entries.lock();

        let entry = *entries.get(&key)?;
        if !entry.is_live(Instant::now(), live_version) {
            entries.pop(&key);
            debug!(role, resource, permission, "cache entry expired or stale");
            return None;
        }

        debug!(role, resource, permission, allowed = entry.allowed, "cache hit");
        Some(entry.allowed)
    }

    /// Store a decision stamped with the version the resolution started at.
    ///
    /// If a `clear` raced the resolution, the stamp no longer matches the
    /// live version and the entry will be discarded on read.
    pub fn put(&self, role: &str, resource: &str, permission: &str, allowed: bool, version: u64) {
        if !self.enabled {
            return;
        }

        let key = Self::compute_key(role, resource, permission);
        let entry = CachedEntry {
            allowed,
            expires_at: Instant::now() + self.ttl,
            version,
        };
        self.entries.lock().put(key, entry);
    }

    /// Empty the store and bump the version counter
    pub fn clear(&self) {
        self.version.fetch_add(1, Ordering::AcqRel);
        self.entries.lock().clear();
        debug!("decision cache cleared");
    }

    /// Current number of stored entries
    pub fn len(&self) -> usize {
        if !self.enabled {
            return 0;
        }
        self.entries.lock().len()
    }

    /// Whether the store currently holds no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Externally observable state
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            enabled: self.enabled,
            size: self.len(),
        }
    }

    fn compute_key(role: &str, resource: &str, permission: &str) -> CacheKey {
        let mut hasher = Hasher::new();
        for component in [role, resource, permission] {
            hasher.update(&(component.len() as u64).to_le_bytes());
            hasher.update(component.as_bytes());
        }
        *hasher.finalize().as_bytes()
    }
}
