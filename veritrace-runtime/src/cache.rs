//! In-memory profile cache with lazy expiry

use async_trait::async_trait;
use dashmap::DashMap;
use std::time::{Duration, Instant};
use tracing::debug;

use veritrace_core::{AggregatedProfile, ProfileCache};

struct Entry {
    profile: AggregatedProfile,
    expires_at: Instant,
}

/// Process-local cache; entries are dropped when read after their TTL
#[derive(Default)]
pub struct MemoryCache {
    entries: DashMap<String, Entry>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn cache_key(target: &str) -> String {
    veritrace_core::normalize_target(target).to_lowercase()
}

#[async_trait]
impl ProfileCache for MemoryCache {
    async fn get(&self, target: &str) -> Option<AggregatedProfile> {
        let key = cache_key(target);
        let now = Instant::now();

        if let Some(entry) = self.entries.get(&key) {
            if entry.expires_at > now {
                return Some(entry.profile.clone());
            }
        }

        // Guard dropped above; removal must not hold a read lock on the shard
        if self.entries.remove_if(&key, |_, e| e.expires_at <= now).is_some() {
            debug!("Cache entry for {} expired", key);
        }
        None
    }

    async fn set(&self, target: &str, profile: &AggregatedProfile, ttl: Duration) {
        if ttl.is_zero() {
            return;
        }
        self.entries.insert(
            cache_key(target),
            Entry {
                profile: profile.clone(),
                expires_at: Instant::now() + ttl,
            },
        );
    }
}
