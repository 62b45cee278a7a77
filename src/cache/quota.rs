use chrono::{DateTime, Utc};
use moka::future::Cache;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::{CacheConfig, MAX_CACHE_TTL_SECS};
use crate::models::MetricBlock;
use crate::upstream::{ExportQuery, ExportResult};

/// One stored export response. Entries are replaced wholesale, never mutated.
#[derive(Debug)]
pub struct CacheEntry {
    pub fetched_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub payload: Vec<MetricBlock>,
}

/// Export response cache keyed by query shape.
///
/// The TTL is long (a day by default) so repeated requests for the same
/// query shape stay inside the upstream's daily call quota. Failed fetches
/// are never stored and never evict an existing entry.
#[derive(Clone)]
pub struct QuotaCache {
    entries: Cache<ExportQuery, Arc<CacheEntry>>,
    ttl: Duration,
}

impl QuotaCache {
    /// TTLs above [`MAX_CACHE_TTL_SECS`] are capped.
    pub fn new(ttl: Duration, max_entries: u64) -> Self {
        let ttl = ttl.min(Duration::from_secs(MAX_CACHE_TTL_SECS));
        let entries = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .build();

        Self { entries, ttl }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.ttl(), config.max_entries)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Unexpired entry for `query`, without fetching
    pub async fn cached(&self, query: &ExportQuery) -> Option<Arc<CacheEntry>> {
        self.entries.get(query).await
    }

    /// Return the cached payload for `query`, calling `fetch` on a miss or
    /// when `force` is set.
    ///
    /// Concurrent misses on the same key share a single `fetch` call.
    /// Forced refreshes always call `fetch` and overwrite the entry on
    /// success.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        query: &ExportQuery,
        fetch: F,
        force: bool,
    ) -> ExportResult<Arc<CacheEntry>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ExportResult<Vec<MetricBlock>>>,
    {
        if force {
            let payload = fetch().await.inspect_err(|e| {
                warn!(%query, error = %e, "forced export refresh failed, keeping cached entry");
            })?;
            let entry = self.entry(payload);
            self.entries.insert(query.clone(), Arc::clone(&entry)).await;
            info!(%query, blocks = entry.payload.len(), "export cache refreshed");
            return Ok(entry);
        }

        if let Some(entry) = self.entries.get(query).await {
            debug!(%query, "export cache hit");
            return Ok(entry);
        }

        debug!(%query, "export cache miss");
        self.entries
            .try_get_with(query.clone(), async { fetch().await.map(|p| self.entry(p)) })
            .await
            .map_err(|e| {
                warn!(%query, error = %e, "export fetch failed");
                (*e).clone()
            })
    }

    fn entry(&self, payload: Vec<MetricBlock>) -> Arc<CacheEntry> {
        let fetched_at = Utc::now();
        Arc::new(CacheEntry {
            fetched_at,
            expires_at: fetched_at + chrono::Duration::milliseconds(self.ttl.as_millis() as i64),
            payload,
        })
    }
}
