use std::{
    num::NonZeroUsize,
    time::{Duration, Instant},
};

use lru::LruCache;

/// Bounded, expiring cache of suggestion results keyed by normalized query.
///
/// Owned by whoever runs the lookups, never global, so separate sessions do
/// not see each other's entries.
pub struct SuggestionCache {
    ttl: Duration,
    entries: LruCache<String, (Instant, Vec<String>)>,
}

impl SuggestionCache {
    pub const DEFAULT_SIZE: usize = 100;
    pub const DEFAULT_TTL: Duration = Duration::from_secs(10 * 60);

    pub fn new(size: usize, ttl: Duration) -> Self {
        let size = NonZeroUsize::new(size).unwrap_or(NonZeroUsize::MIN);
        Self {
            ttl,
            entries: LruCache::new(size),
        }
    }

    pub fn get(&mut self, query: &str, now: Instant) -> Option<Vec<String>> {
        let key = normalize(query);
        match self.entries.get(&key) {
            Some((at, value)) if now.saturating_duration_since(*at) < self.ttl => {
                Some(value.clone())
            }
            Some(_) => {
                log::debug!("suggestion cache entry expired: {key:?}");
                self.entries.pop(&key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&mut self, query: &str, suggestions: Vec<String>, now: Instant) {
        self.entries.put(normalize(query), (now, suggestions));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for SuggestionCache {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SIZE, Self::DEFAULT_TTL)
    }
}

fn normalize(query: &str) -> String {
    query.trim().to_lowercase()
}
