//! Stale-while-revalidate certificate cache.
//!
//! Maps a certificate URL to the bytes last fetched from it. Freshness is
//! evaluated lazily at access time against the injected clock:
//!
//! - `age <= max_age`: served as-is
//! - `age <= max_age + stale_while_revalidate`: served as-is, and one
//!   detached refresh is started
//! - older, or absent: the caller waits for a fetch
//!
//! Per URL at most one fetch is in flight. Every fetch runs in its own
//! spawned task and publishes its result on a `watch` channel; callers that
//! need the result wait on that channel, so dropping one caller never
//! cancels the fetch for the others. The LRU map and the in-flight registry
//! share one mutex, which is never held across an `.await`.

use crate::client::http::CertificateFetcher;
use crate::clock::{Clock, SystemClock};
use crate::config::CacheConfig;
use crate::errors::FetchError;
use crate::VerificationError;
use chrono::{DateTime, TimeDelta, Utc};
use lru::LruCache;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

/// Immutable view of cached certificate bytes.
pub type CertificateBytes = Arc<[u8]>;

type FetchResult = Result<CertificateBytes, FetchError>;
type FetchReceiver = watch::Receiver<Option<FetchResult>>;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: CertificateBytes,
    fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Freshness {
    Fresh,
    Stale,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchMode {
    Blocking,
    Revalidate,
}

struct Inner {
    entries: LruCache<String, CacheEntry>,
    in_flight: HashMap<String, FetchReceiver>,
}

impl Inner {
    /// Receiver for a live fetch of `key`. A registration whose task died
    /// without publishing is dropped.
    fn in_flight(&mut self, key: &str) -> Option<FetchReceiver> {
        let live = self.in_flight.get(key)?.has_changed().is_ok();
        if live {
            self.in_flight.get(key).cloned()
        } else {
            self.in_flight.remove(key);
            None
        }
    }
}

/// Bounded, time-aware certificate cache with single-flight fetching.
pub struct CertificateCache {
    inner: Arc<Mutex<Inner>>,
    max_age: TimeDelta,
    stale_until: TimeDelta,
    clock: Arc<dyn Clock>,
}

impl CertificateCache {
    /// Create a cache on the system clock.
    pub fn new(config: &CacheConfig) -> Result<Self, VerificationError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a cache reading time from `clock`.
    pub fn with_clock(
        config: &CacheConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, VerificationError> {
        let capacity = NonZeroUsize::new(config.max_size).ok_or_else(|| {
            VerificationError::ConfigError("cache.maxSize must be at least 1".to_string())
        })?;
        let max_age = to_delta(config.max_age, "cache.maxAge")?;
        let stale_while_revalidate =
            to_delta(config.stale_while_revalidate, "cache.staleWhileRevalidate")?;
        let stale_until = max_age.checked_add(&stale_while_revalidate).ok_or_else(|| {
            VerificationError::ConfigError(
                "cache.maxAge + cache.staleWhileRevalidate out of range".to_string(),
            )
        })?;

        Ok(Self {
            inner: Arc::new(Mutex::new(Inner {
                entries: LruCache::new(capacity),
                in_flight: HashMap::new(),
            })),
            max_age,
            stale_until,
            clock,
        })
    }

    /// Return the certificate bytes for `key`, fetching through `fetcher`
    /// when there is no usable entry.
    ///
    /// Must be polled inside a Tokio runtime: fetches run as spawned tasks.
    ///
    /// # Errors
    /// Only a failed fetch on the waiting path is reported. Background
    /// refresh failures are logged and the stale entry keeps being served.
    pub async fn get_or_refresh<F>(
        &self,
        key: &str,
        fetcher: &Arc<F>,
    ) -> Result<CertificateBytes, FetchError>
    where
        F: CertificateFetcher + ?Sized + 'static,
    {
        let mut receiver = {
            let mut inner = self.lock();
            let now = self.clock.now_utc();

            let cached = inner
                .entries
                .get(key)
                .map(|entry| (entry.value.clone(), self.classify(now - entry.fetched_at)));

            match cached {
                Some((value, Freshness::Fresh)) => {
                    tracing::debug!(url = %key, "certificate cache hit");
                    return Ok(value);
                }
                Some((value, Freshness::Stale)) => {
                    if inner.in_flight(key).is_none() {
                        tracing::debug!(url = %key, "certificate stale, revalidating");
                        // Without a runtime the stale value is still served.
                        let _ = self.spawn_fetch(&mut inner, key, fetcher, FetchMode::Revalidate);
                    }
                    return Ok(value);
                }
                Some((_, Freshness::Expired)) => {
                    tracing::debug!(url = %key, "certificate expired past stale window");
                    inner.entries.pop(key);
                }
                None => {}
            }

            match inner.in_flight(key) {
                Some(receiver) => receiver,
                None => {
                    tracing::debug!(url = %key, "certificate cache miss");
                    self.spawn_fetch(&mut inner, key, fetcher, FetchMode::Blocking)?
                }
            }
        };

        let outcome = match receiver.wait_for(Option::is_some).await {
            Ok(published) => (*published).clone(),
            Err(_) => None,
        };
        outcome.unwrap_or(Err(FetchError::Abandoned))
    }

    /// Number of cached URLs, including stale ones.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// True when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Whether `key` has an entry. Does not touch recency.
    pub fn contains(&self, key: &str) -> bool {
        self.lock().entries.contains(key)
    }

    /// Whether a fetch for `key` is currently running.
    pub fn is_fetching(&self, key: &str) -> bool {
        self.lock().in_flight(key).is_some()
    }

    /// Drop the entry for `key`. An in-flight fetch still completes and
    /// stores its result.
    pub fn invalidate(&self, key: &str) -> bool {
        self.lock().entries.pop(key).is_some()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.lock().entries.clear();
    }

    fn classify(&self, age: TimeDelta) -> Freshness {
        if age <= self.max_age {
            Freshness::Fresh
        } else if age <= self.stale_until {
            Freshness::Stale
        } else {
            Freshness::Expired
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        lock(&self.inner)
    }

    /// Register a fetch for `key` and start it. Caller holds the lock.
    fn spawn_fetch<F>(
        &self,
        inner: &mut Inner,
        key: &str,
        fetcher: &Arc<F>,
        mode: FetchMode,
    ) -> Result<FetchReceiver, FetchError>
    where
        F: CertificateFetcher + ?Sized + 'static,
    {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| FetchError::Transport("no Tokio runtime available".to_string()))?;

        let (sender, receiver) = watch::channel(None);
        inner.in_flight.insert(key.to_string(), receiver.clone());

        let shared = Arc::clone(&self.inner);
        let clock = Arc::clone(&self.clock);
        let fetcher = Arc::clone(fetcher);
        let key = key.to_string();

        runtime.spawn(async move {
            let result: FetchResult = fetcher.fetch(&key).await.map(CertificateBytes::from);

            {
                let mut inner = lock(&shared);
                inner.in_flight.remove(&key);

                match &result {
                    Ok(value) => {
                        let entry = CacheEntry {
                            value: value.clone(),
                            fetched_at: clock.now_utc(),
                        };
                        if let Some((evicted, _)) = inner.entries.push(key.clone(), entry) {
                            if evicted != key {
                                tracing::debug!(url = %evicted, "certificate evicted");
                            }
                        }
                        tracing::debug!(url = %key, bytes = value.len(), "certificate stored");
                    }
                    Err(e) if mode == FetchMode::Revalidate => {
                        tracing::warn!(
                            url = %key,
                            error = %e,
                            "certificate revalidation failed, keeping stale entry"
                        );
                    }
                    Err(e) => {
                        tracing::debug!(url = %key, error = %e, "certificate fetch failed");
                    }
                }
            }

            // Nobody waiting is fine.
            let _ = sender.send(Some(result));
        });

        Ok(receiver)
    }
}

impl std::fmt::Debug for CertificateCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CertificateCache")
            .field("max_age", &self.max_age)
            .field("stale_until", &self.stale_until)
            .field("len", &self.len())
            .finish()
    }
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    // Entries are replaced whole, so a poisoned map is still consistent.
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

fn to_delta(duration: std::time::Duration, name: &str) -> Result<TimeDelta, VerificationError> {
    TimeDelta::from_std(duration)
        .map_err(|_| VerificationError::ConfigError(format!("{} out of range", name)))
}
