use foundation::{Clock, TimestampMs};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::source::{Summary, SummarySource};
use crate::store::{CacheStore, KEY_PREFIX, StoreError};

pub const DEFAULT_TTL_MS: u64 = 24 * 60 * 60 * 1000;

/// Cache key for a place name: the part before the first comma, trimmed and
/// lowercased ("Mont Blanc, Alps" and "mont blanc" share an entry).
pub fn cache_key(name: &str) -> String {
    title_for(name).to_lowercase()
}

/// Page title a name is looked up under.
fn title_for(name: &str) -> &str {
    name.split(',').next().unwrap_or(name).trim()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    #[serde(rename = "data")]
    pub summary: Summary,
    #[serde(rename = "timestamp")]
    pub timestamp_ms: TimestampMs,
}

impl CacheEntry {
    pub fn is_fresh(&self, now: TimestampMs, ttl_ms: u64) -> bool {
        now.saturating_sub(self.timestamp_ms) < ttl_ms
    }
}

/// Read-through summary cache with a time-to-live.
///
/// Only successful lookups are stored. Not-found and failed lookups resolve to
/// `None` and are retried next time. Store failures never fail a lookup.
pub struct EnrichmentCache<S, K, C> {
    source: S,
    store: K,
    clock: C,
    ttl_ms: u64,
}

impl<S, K, C> EnrichmentCache<S, K, C>
where
    S: SummarySource,
    K: CacheStore,
    C: Clock,
{
    pub fn new(source: S, store: K, clock: C) -> Self {
        Self {
            source,
            store,
            clock,
            ttl_ms: DEFAULT_TTL_MS,
        }
    }

    pub fn with_ttl_ms(mut self, ttl_ms: u64) -> Self {
        self.ttl_ms = ttl_ms;
        self
    }

    pub fn ttl_ms(&self) -> u64 {
        self.ttl_ms
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn store(&self) -> &K {
        &self.store
    }

    /// Fresh cached summary for `name`, without any remote call.
    pub fn cached(&mut self, name: &str) -> Option<Summary> {
        let key = storage_key(name)?;
        let now = self.clock.now_ms();
        self.read_entry(&key)
            .filter(|e| e.is_fresh(now, self.ttl_ms))
            .map(|e| e.summary)
    }

    pub async fn lookup(&mut self, name: &str) -> Option<Summary> {
        let key = storage_key(name)?;

        let now = self.clock.now_ms();
        if let Some(entry) = self.read_entry(&key)
            && entry.is_fresh(now, self.ttl_ms)
        {
            debug!(key = %key, "summary cache hit");
            return Some(entry.summary);
        }
        debug!(key = %key, "summary cache miss");

        let summary = match self.source.fetch_summary(title_for(name)).await {
            Ok(Some(summary)) => summary,
            Ok(None) => {
                debug!(key = %key, "no summary found");
                return None;
            }
            Err(e) => {
                warn!(key = %key, "summary lookup failed: {e}");
                return None;
            }
        };

        let entry = CacheEntry {
            summary,
            timestamp_ms: self.clock.now_ms(),
        };
        match serde_json::to_string(&entry) {
            Ok(raw) => {
                if let Err(e) = self.store.set(&key, &raw) {
                    warn!(key = %key, "failed to store summary: {e}");
                }
            }
            Err(e) => warn!(key = %key, "failed to encode summary: {e}"),
        }
        Some(entry.summary)
    }

    /// Removes expired and unreadable entries under the summary prefix and
    /// returns how many were removed.
    pub fn purge_expired(&mut self) -> Result<usize, StoreError> {
        let now = self.clock.now_ms();
        let mut removed = 0;
        for key in self.store.keys()? {
            if !key.starts_with(KEY_PREFIX) {
                continue;
            }
            let keep = self
                .store
                .get(&key)?
                .and_then(|raw| serde_json::from_str::<CacheEntry>(&raw).ok())
                .is_some_and(|e| e.is_fresh(now, self.ttl_ms));
            if !keep && self.store.remove(&key)? {
                removed += 1;
            }
        }
        debug!(removed, "purged summary cache");
        Ok(removed)
    }

    fn read_entry(&mut self, key: &str) -> Option<CacheEntry> {
        let raw = match self.store.get(key) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(key = %key, "failed to read summary cache: {e}");
                return None;
            }
        };
        match serde_json::from_str::<CacheEntry>(&raw) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(key = %key, "dropping corrupt summary entry: {e}");
                if let Err(e) = self.store.remove(key) {
                    warn!(key = %key, "failed to remove corrupt entry: {e}");
                }
                None
            }
        }
    }
}

/// `None` for names with nothing to look up.
fn storage_key(name: &str) -> Option<String> {
    let key = cache_key(name);
    (!key.is_empty()).then(|| format!("{KEY_PREFIX}{key}"))
}

#[cfg(test)]
mod tests {
    use super::{CacheEntry, DEFAULT_TTL_MS, EnrichmentCache, cache_key};
    use crate::source::{BoxFuture, EnrichmentError, Summary, SummarySource};
    use crate::store::{CacheStore, InMemoryStore, StoreError};
    use foundation::ManualClock;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;

    /// Answers from a fixed table and records every title asked for.
    #[derive(Default)]
    struct FakeSource {
        calls: RefCell<Vec<String>>,
        fail: bool,
    }

    impl FakeSource {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        fn call_count(&self) -> usize {
            self.calls.borrow().len()
        }
    }

    impl SummarySource for FakeSource {
        fn fetch_summary<'a>(
            &'a self,
            title: &'a str,
        ) -> BoxFuture<'a, Result<Option<Summary>, EnrichmentError>> {
            Box::pin(async move {
                self.calls.borrow_mut().push(title.to_string());
                if self.fail {
                    return Err(EnrichmentError::Status(503));
                }
                if title == "Nowhere" {
                    return Ok(None);
                }
                Ok(Some(summary(title)))
            })
        }
    }

    /// Reads work; every write fails like a full `localStorage`.
    #[derive(Default)]
    struct FullStore;

    impl CacheStore for FullStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Ok(None)
        }
        fn set(&mut self, _key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Io("quota exceeded".to_string()))
        }
        fn remove(&mut self, _key: &str) -> Result<bool, StoreError> {
            Ok(false)
        }
        fn keys(&self) -> Result<Vec<String>, StoreError> {
            Ok(Vec::new())
        }
    }

    fn summary(title: &str) -> Summary {
        Summary {
            title: title.to_string(),
            description: Some(format!("About {title}")),
            extract: None,
            thumbnail_url: None,
            page_url: None,
        }
    }

    fn cache(
        source: FakeSource,
        clock: &ManualClock,
    ) -> EnrichmentCache<FakeSource, InMemoryStore, ManualClock> {
        EnrichmentCache::new(source, InMemoryStore::new(), clock.clone())
    }

    #[test]
    fn key_is_first_comma_part_lowercased() {
        assert_eq!(cache_key("Mont Blanc, Alps, France"), "mont blanc");
        assert_eq!(cache_key("  Denali "), "denali");
        assert_eq!(cache_key(", nothing"), "");
    }

    #[tokio::test]
    async fn hit_within_ttl_makes_one_remote_call() {
        let clock = ManualClock::new(1_000);
        let mut cache = cache(FakeSource::default(), &clock);

        let first = cache.lookup("Mont Blanc, Alps").await;
        clock.advance(DEFAULT_TTL_MS - 1);
        let second = cache.lookup("mont blanc").await;

        assert_eq!(first, Some(summary("Mont Blanc")));
        assert_eq!(second, first);
        assert_eq!(cache.source().call_count(), 1);
        assert_eq!(*cache.source().calls.borrow(), vec!["Mont Blanc".to_string()]);
    }

    #[tokio::test]
    async fn expired_entry_is_fetched_again() {
        let clock = ManualClock::new(0);
        let mut cache = cache(FakeSource::default(), &clock);

        cache.lookup("Denali").await;
        clock.advance(DEFAULT_TTL_MS);
        assert_eq!(cache.cached("Denali"), None);
        cache.lookup("Denali").await;

        assert_eq!(cache.source().call_count(), 2);
    }

    #[tokio::test]
    async fn not_found_and_failures_are_not_cached() {
        let clock = ManualClock::new(0);
        let mut cache = cache(FakeSource::default(), &clock);
        assert_eq!(cache.lookup("Nowhere").await, None);
        assert_eq!(cache.lookup("Nowhere").await, None);
        assert_eq!(cache.source().call_count(), 2);
        assert!(cache.store().is_empty());

        let mut failing = self::cache(FakeSource::failing(), &clock);
        assert_eq!(failing.lookup("Denali").await, None);
        assert!(failing.store().is_empty());
    }

    #[tokio::test]
    async fn corrupt_entry_is_a_miss_and_is_replaced() {
        let clock = ManualClock::new(0);
        let mut store = InMemoryStore::new();
        store.set("snowmap.summary.denali", "{not json").unwrap();
        let mut cache = EnrichmentCache::new(FakeSource::default(), store, clock.clone());

        assert_eq!(cache.lookup("Denali").await, Some(summary("Denali")));
        assert_eq!(cache.source().call_count(), 1);

        let raw = cache.store().get("snowmap.summary.denali").unwrap().unwrap();
        let entry: CacheEntry = serde_json::from_str(&raw).unwrap();
        assert_eq!(entry.timestamp_ms, 0);
    }

    #[tokio::test]
    async fn write_failure_still_returns_summary() {
        let clock = ManualClock::new(0);
        let mut cache = EnrichmentCache::new(FakeSource::default(), FullStore, clock);
        assert_eq!(cache.lookup("Denali").await, Some(summary("Denali")));
    }

    #[tokio::test]
    async fn empty_names_never_reach_the_source() {
        let clock = ManualClock::new(0);
        let mut cache = cache(FakeSource::default(), &clock);
        assert_eq!(cache.lookup("  , x").await, None);
        assert_eq!(cache.source().call_count(), 0);
    }

    #[tokio::test]
    async fn purge_removes_expired_and_corrupt_entries_only() {
        let clock = ManualClock::new(0);
        let mut cache = cache(FakeSource::default(), &clock).with_ttl_ms(1_000);
        cache.lookup("Denali").await;
        clock.advance(600);
        cache.lookup("Aconcagua").await;
        clock.advance(600);

        let mut store = std::mem::take(&mut cache.store);
        store.set("snowmap.summary.broken", "[]").unwrap();
        store.set("unrelated", "keep me").unwrap();
        cache.store = store;

        assert_eq!(cache.purge_expired().unwrap(), 2);
        assert_eq!(
            cache.store().keys().unwrap(),
            vec!["snowmap.summary.aconcagua".to_string(), "unrelated".to_string()]
        );
    }
}
