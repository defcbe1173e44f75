use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::shared::diagnostics::Outcome;

/// Identity of a cached query: its name plus the argument tuple.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub query: &'static str,
    pub args: Vec<String>,
}

impl CacheKey {
    pub fn new(query: &'static str) -> Self {
        Self {
            query,
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, value: impl ToString) -> Self {
        self.args.push(value.to_string());
        self
    }

    /// Absent arguments are keyed distinctly from empty strings.
    pub fn opt_arg<V: ToString>(mut self, value: Option<V>) -> Self {
        self.args.push(match value {
            Some(v) => format!("={}", v.to_string()),
            None => "-".to_string(),
        });
        self
    }
}

struct Entry {
    stored_at: Instant,
    value: Arc<dyn Any + Send + Sync>,
}

/// Memoization of aggregation results keyed by `CacheKey`.
///
/// Entries expire after `ttl`; callers can drop them earlier with
/// `invalidate`. Degraded outcomes are returned but never stored, so a failed
/// round trip does not pin an empty payload.
#[derive(Clone)]
pub struct QueryCache {
    entries: Arc<RwLock<HashMap<CacheKey, Entry>>>,
    ttl: Duration,
    retries: u32,
}

impl QueryCache {
    pub fn new(ttl: Duration, retries: u32) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
            retries,
        }
    }

    /// Fresh cached value for `key`, if any.
    pub async fn get<T: Clone + Send + Sync + 'static>(&self, key: &CacheKey) -> Option<T> {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        if entry.stored_at.elapsed() >= self.ttl {
            return None;
        }
        entry.value.downcast_ref::<T>().cloned()
    }

    /// Cached value for `key`, or the result of `load` (retried up to
    /// `retries` times while degraded).
    pub async fn get_or_load<T, F, Fut>(&self, key: CacheKey, mut load: F) -> T
    where
        T: Clone + Send + Sync + 'static,
        F: FnMut() -> Fut,
        Fut: Future<Output = Outcome<T>>,
    {
        if let Some(value) = self.get::<T>(&key).await {
            tracing::debug!("cache hit: {} {:?}", key.query, key.args);
            return value;
        }

        let mut outcome = load().await;
        let mut attempt = 0;
        while outcome.is_degraded() && attempt < self.retries {
            attempt += 1;
            tracing::warn!(
                "query {} degraded ({} failures), retry {}/{}",
                key.query,
                outcome.failures,
                attempt,
                self.retries
            );
            outcome = load().await;
        }

        if outcome.is_degraded() {
            return outcome.into_value();
        }

        let mut entries = self.entries.write().await;
        let ttl = self.ttl;
        entries.retain(|_, e| e.stored_at.elapsed() < ttl);
        entries.insert(
            key,
            Entry {
                stored_at: Instant::now(),
                value: Arc::new(outcome.value.clone()),
            },
        );
        outcome.into_value()
    }

    /// Drop every entry of one query; returns how many were removed.
    pub async fn invalidate(&self, query: &str) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|k, _| k.query != query);
        before - entries.len()
    }

    pub async fn invalidate_all(&self) -> usize {
        let mut entries = self.entries.write().await;
        let removed = entries.len();
        entries.clear();
        removed
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}
