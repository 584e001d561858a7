//! Read-through caching and the `(value, is_loading)` pair published to sessions.

use crate::error::EntitlementError;
use moka::future::Cache;
use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use tripdesk_domain::config::CacheConfig;

/// Latest known value of an input plus the number of loads in flight.
///
/// A reload keeps the previous value visible, so readers never see a gap. Overlapping loads
/// are counted, so the input stays loading until the last one settles.
pub struct Lookup<T> {
    value: Option<Arc<T>>,
    pending: usize,
}

impl<T> Lookup<T> {
    /// Nothing loaded, nothing in flight.
    #[must_use]
    pub const fn idle() -> Self {
        Self { value: None, pending: 0 }
    }

    #[must_use]
    pub const fn ready(value: Arc<T>) -> Self {
        Self { value: Some(value), pending: 0 }
    }

    #[must_use]
    pub fn value(&self) -> Option<&T> {
        self.value.as_deref()
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.pending > 0
    }

    pub(crate) const fn start(&mut self) {
        self.pending += 1;
    }

    /// Settles one load, keeping the current value.
    pub(crate) const fn finish(&mut self) {
        self.pending = self.pending.saturating_sub(1);
    }

    /// Settles one load with a fresh value.
    pub(crate) fn resolve(&mut self, value: Arc<T>) {
        self.value = Some(value);
        self.finish();
    }
}

impl<T> Default for Lookup<T> {
    fn default() -> Self {
        Self::idle()
    }
}

impl<T> Clone for Lookup<T> {
    fn clone(&self) -> Self {
        Self { value: self.value.clone(), pending: self.pending }
    }
}

impl<T: fmt::Debug> fmt::Debug for Lookup<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lookup").field("value", &self.value).field("pending", &self.pending).finish()
    }
}

/// A bounded, TTL-evicting cache that loads missing entries on demand.
///
/// Concurrent loads of the same key are coalesced: the loader runs once and every waiter
/// receives its result.
pub(crate) struct ReadThrough<K, V> {
    cache: Cache<K, Arc<V>>,
}

impl<K, V> ReadThrough<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    pub(crate) fn new(config: CacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.capacity)
            .time_to_live(Duration::from_secs(config.ttl_seconds))
            .build();

        Self { cache }
    }

    pub(crate) async fn get_or_load<F>(&self, key: K, load: F) -> Result<Arc<V>, EntitlementError>
    where
        F: Future<Output = Result<V, EntitlementError>>,
    {
        self.cache.try_get_with(key, async { load.await.map(Arc::new) }).await.map_err(unshare)
    }

    pub(crate) async fn invalidate(&self, key: &K) {
        self.cache.invalidate(key).await;
    }

    pub(crate) fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }
}

/// Takes the error out of a failed load. Waiters that joined the load share it, so a copy
/// of the same variant is built when other holders remain.
fn unshare(err: Arc<EntitlementError>) -> EntitlementError {
    Arc::try_unwrap(err).unwrap_or_else(|shared| match &*shared {
        EntitlementError::Source { message, context } => {
            EntitlementError::Source { message: message.clone(), context: context.clone() }
        },
        EntitlementError::Json { source, context } => EntitlementError::Json {
            source: <serde_json::Error as serde::de::Error>::custom(source),
            context: context.clone(),
        },
        EntitlementError::Internal { message, context } => {
            EntitlementError::Internal { message: message.clone(), context: context.clone() }
        },
    })
}

impl<K, V> fmt::Debug for ReadThrough<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadThrough").field("entries", &self.cache.entry_count()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn cache() -> ReadThrough<u32, String> {
        ReadThrough::new(CacheConfig { capacity: 16, ttl_seconds: 60 })
    }

    #[test]
    fn lookup_keeps_value_while_reloading() {
        let mut lookup = Lookup::ready(Arc::new(7));
        lookup.start();
        assert!(lookup.is_loading());
        assert_eq!(lookup.value(), Some(&7));

        lookup.finish();
        assert!(!lookup.is_loading());
        assert_eq!(lookup.value(), Some(&7));
    }

    #[test]
    fn overlapping_loads_stay_loading_until_the_last_settles() {
        let mut lookup = Lookup::idle();
        lookup.start();
        lookup.start();

        lookup.resolve(Arc::new("first"));
        assert!(lookup.is_loading());
        assert_eq!(lookup.value(), Some(&"first"));

        lookup.finish();
        assert!(!lookup.is_loading());
        assert_eq!(lookup.value(), Some(&"first"));

        lookup.finish();
        assert!(!lookup.is_loading());
    }

    #[test]
    fn shared_errors_keep_their_variant() {
        let json = serde_json::from_str::<Vec<u32>>("{").unwrap_err();
        let err = Arc::new(EntitlementError::Json { source: json, context: Some("plans".into()) });
        let waiter = Arc::clone(&err);

        let taken = unshare(err);
        assert!(matches!(taken, EntitlementError::Json { context: Some(_), .. }));
        assert_eq!(taken.to_string(), waiter.to_string());

        let source = Arc::new(EntitlementError::Source { message: "down".into(), context: None });
        let _waiter = Arc::clone(&source);
        assert!(matches!(unshare(source), EntitlementError::Source { .. }));
    }

    #[tokio::test]
    async fn loads_once_then_serves_cached() {
        let cache = cache();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value = cache
                .get_or_load(1, async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok("one".to_owned())
                })
                .await
                .unwrap();
            assert_eq!(value.as_str(), "one");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_loads_are_not_cached() {
        let cache = cache();

        let err = cache
            .get_or_load(1, async { Err(EntitlementError::from("source down")) })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("source down"));

        let value = cache.get_or_load(1, async { Ok("back".to_owned()) }).await.unwrap();
        assert_eq!(value.as_str(), "back");
    }

    #[tokio::test]
    async fn invalidate_forces_reload() {
        let cache = cache();
        cache.get_or_load(1, async { Ok("old".to_owned()) }).await.unwrap();
        cache.invalidate(&1).await;

        let value = cache.get_or_load(1, async { Ok("new".to_owned()) }).await.unwrap();
        assert_eq!(value.as_str(), "new");
    }
}
