//! Time-boxed snapshot cache in front of the records source.
//!
//! Every user interaction reads one immutable snapshot. The cache keeps the
//! latest fetch fresh for a short window (60 s by default) to bound the
//! request rate against the hosted backend, and keeps serving the last
//! known-good snapshot — flagged stale — when a refresh fails.
//!
//! Invalidation bumps a generation counter rather than dropping the data,
//! so an invalidated snapshot still works as the stale fallback.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::types::{IncidentRecord, WeighRecord};

use super::{BackendError, RecordsSource};

/// One immutable fetch of the backend's state.
#[derive(Debug, Clone)]
pub struct RecordsSnapshot {
    pub weigh: Vec<WeighRecord>,
    pub incidents: Vec<IncidentRecord>,
    pub fetched_at: DateTime<Utc>,
}

/// What a cache read hands back: the snapshot plus whether it is stale
/// (served because a refresh failed).
#[derive(Clone)]
pub struct CachedRead {
    pub snapshot: Arc<RecordsSnapshot>,
    pub stale: bool,
}

struct CacheEntry {
    snapshot: Arc<RecordsSnapshot>,
    fetched: Instant,
    generation: u64,
}

/// TTL cache over a [`RecordsSource`].
pub struct SnapshotCache {
    source: Arc<dyn RecordsSource>,
    ttl: Duration,
    entry: ArcSwapOption<CacheEntry>,
    generation: AtomicU64,
}

impl SnapshotCache {
    pub fn new(source: Arc<dyn RecordsSource>, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            entry: ArcSwapOption::empty(),
            generation: AtomicU64::new(0),
        }
    }

    /// Current snapshot: cached when fresh, fetched otherwise, stale
    /// fallback when the fetch fails and an older snapshot exists.
    pub async fn read(&self) -> Result<CachedRead, BackendError> {
        let current_generation = self.generation.load(Ordering::Acquire);

        if let Some(entry) = self.entry.load_full() {
            if entry.generation == current_generation && entry.fetched.elapsed() < self.ttl {
                return Ok(CachedRead {
                    snapshot: Arc::clone(&entry.snapshot),
                    stale: false,
                });
            }
        }

        match self.fetch().await {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                self.entry.store(Some(Arc::new(CacheEntry {
                    snapshot: Arc::clone(&snapshot),
                    fetched: Instant::now(),
                    generation: current_generation,
                })));
                debug!(
                    weigh = snapshot.weigh.len(),
                    incidents = snapshot.incidents.len(),
                    "records snapshot refreshed"
                );
                Ok(CachedRead {
                    snapshot,
                    stale: false,
                })
            }
            Err(e) => match self.entry.load_full() {
                Some(entry) => {
                    warn!(error = %e, "backend refresh failed, serving last known-good snapshot");
                    Ok(CachedRead {
                        snapshot: Arc::clone(&entry.snapshot),
                        stale: true,
                    })
                }
                None => Err(e),
            },
        }
    }

    /// Force the next read to hit the backend. Called after a successful
    /// write and by the explicit refresh endpoint.
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::Release);
    }

    async fn fetch(&self) -> Result<RecordsSnapshot, BackendError> {
        let weigh = self.source.fetch_weigh_records().await?;
        let incidents = self.source.fetch_incidents().await?;
        Ok(RecordsSnapshot {
            weigh,
            incidents,
            fetched_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{NewIncident, NewWeighRecord};
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering as AtomicOrdering;

    /// Source that counts fetches and can be switched into failure mode.
    #[derive(Default)]
    struct CountingSource {
        fetches: AtomicUsize,
        failing: std::sync::atomic::AtomicBool,
    }

    impl CountingSource {
        fn fetch_count(&self) -> usize {
            self.fetches.load(AtomicOrdering::SeqCst)
        }

        fn set_failing(&self, failing: bool) {
            self.failing.store(failing, AtomicOrdering::SeqCst);
        }
    }

    #[async_trait]
    impl RecordsSource for CountingSource {
        async fn fetch_weigh_records(&self) -> Result<Vec<WeighRecord>, BackendError> {
            if self.failing.load(AtomicOrdering::SeqCst) {
                return Err(BackendError::Status {
                    status: 503,
                    message: "down".to_string(),
                });
            }
            self.fetches.fetch_add(1, AtomicOrdering::SeqCst);
            Ok(Vec::new())
        }

        async fn fetch_incidents(&self) -> Result<Vec<IncidentRecord>, BackendError> {
            Ok(Vec::new())
        }

        async fn insert_weigh_record(
            &self,
            _payload: &NewWeighRecord,
        ) -> Result<WeighRecord, BackendError> {
            unreachable!("not used in cache tests")
        }

        async fn insert_incident(
            &self,
            _payload: &NewIncident,
        ) -> Result<IncidentRecord, BackendError> {
            unreachable!("not used in cache tests")
        }
    }

    #[tokio::test]
    async fn test_second_read_within_ttl_hits_cache() {
        let source = Arc::new(CountingSource::default());
        let cache = SnapshotCache::new(source.clone(), Duration::from_secs(60));

        cache.read().await.unwrap();
        cache.read().await.unwrap();
        assert_eq!(source.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let source = Arc::new(CountingSource::default());
        let cache = SnapshotCache::new(source.clone(), Duration::from_secs(60));

        cache.read().await.unwrap();
        cache.invalidate();
        cache.read().await.unwrap();
        assert_eq!(source.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_failed_refresh_serves_stale_snapshot() {
        let source = Arc::new(CountingSource::default());
        let cache = SnapshotCache::new(source.clone(), Duration::from_secs(60));

        let fresh = cache.read().await.unwrap();
        assert!(!fresh.stale);

        source.set_failing(true);
        cache.invalidate();
        let fallback = cache.read().await.unwrap();
        assert!(fallback.stale, "failed refresh must fall back to stale data");
    }

    #[tokio::test]
    async fn test_failure_with_no_snapshot_is_an_error() {
        let source = Arc::new(CountingSource::default());
        source.set_failing(true);
        let cache = SnapshotCache::new(source, Duration::from_secs(60));
        assert!(cache.read().await.is_err());
    }

    #[tokio::test]
    async fn test_zero_ttl_always_refetches() {
        let source = Arc::new(CountingSource::default());
        let cache = SnapshotCache::new(source.clone(), Duration::from_secs(0));

        cache.read().await.unwrap();
        cache.read().await.unwrap();
        assert_eq!(source.fetch_count(), 2);
    }
}
