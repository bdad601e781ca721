//! Per-worker DNS cache
//!
//! Maps lowercased hostnames to one resolved address. Entries expire after
//! their TTL and are evicted lazily on lookup; failed resolutions are never
//! stored.

use chrono::Utc;
use dashmap::DashMap;

/// A cached address for one hostname
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsCacheEntry {
    pub address: String,
    /// When the address was obtained (Unix milliseconds)
    pub timestamp_ms: i64,
    /// How long the address stays valid (milliseconds)
    pub ttl_ms: i64,
}

impl DnsCacheEntry {
    /// Returns true while `timestamp_ms + ttl_ms >= now_ms`
    pub fn is_valid_at(&self, now_ms: i64) -> bool {
        self.timestamp_ms.saturating_add(self.ttl_ms) >= now_ms
    }
}

/// Hostname to address cache shared by all fetches of one worker
#[derive(Debug, Default)]
pub struct DnsCache {
    entries: DashMap<String, DnsCacheEntry>,
}

impl DnsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached address for `hostname` if it has not expired
    pub fn lookup(&self, hostname: &str) -> Option<String> {
        self.lookup_at(hostname, now_ms())
    }

    /// Same as [`DnsCache::lookup`] with an explicit clock
    pub fn lookup_at(&self, hostname: &str, now_ms: i64) -> Option<String> {
        let key = hostname.to_lowercase();

        if self
            .entries
            .remove_if(&key, |_, entry| !entry.is_valid_at(now_ms))
            .is_some()
        {
            tracing::trace!("Evicted expired DNS entry for {}", key);
            return None;
        }

        self.entries.get(&key).map(|entry| entry.address.clone())
    }

    /// Stores an address, replacing any previous entry for the hostname
    pub fn store(&self, hostname: &str, address: &str, timestamp_ms: i64, ttl_ms: i64) {
        self.entries.insert(
            hostname.to_lowercase(),
            DnsCacheEntry {
                address: address.to_string(),
                timestamp_ms,
                ttl_ms,
            },
        );
    }

    /// Number of entries, expired ones included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Current wall-clock time in Unix milliseconds
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}
