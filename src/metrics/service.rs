use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use super::{aggregate, RowFilter};
use crate::cache::{CacheEntry, QuotaCache};
use crate::models::{BlockSchema, MetricBlock, MetricsReport, RefreshSummary, Row};
use crate::upstream::{DimensionProfile, ExportError, ExportFetcher, ExportQuery};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Upstream(#[from] ExportError),
    #[error("{0}")]
    MalformedInput(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Entry point used by the HTTP handlers and the CLI
pub struct MetricsService {
    fetcher: Arc<dyn ExportFetcher>,
    cache: QuotaCache,
    max_url_length: usize,
}

impl MetricsService {
    pub fn new(fetcher: Arc<dyn ExportFetcher>, cache: QuotaCache, max_url_length: usize) -> Self {
        Self {
            fetcher,
            cache,
            max_url_length,
        }
    }

    /// Aggregate the export rows for `target_url`.
    ///
    /// `filter` defaults to the profile's own classifier. Input is validated
    /// before any upstream call is made.
    pub async fn compute_metrics(
        &self,
        target_url: &str,
        days: i64,
        profile: DimensionProfile,
        filter: Option<RowFilter>,
    ) -> ServiceResult<MetricsReport> {
        self.validate_target(target_url)?;

        let filter = filter.unwrap_or_else(|| profile.default_filter());
        if !profile.supports(filter) {
            return Err(ServiceError::MalformedInput(format!(
                "filter '{filter}' cannot be applied to profile '{profile}'"
            )));
        }

        let query = profile.query(days);
        let entry = self.load(&query, false).await?;

        let matches = |row: &Row| filter.matches(row);
        let predicate: Option<&dyn Fn(&Row) -> bool> = match filter {
            RowFilter::None => None,
            _ => Some(&matches),
        };
        let record = aggregate(&entry.payload, target_url, predicate);

        Ok(MetricsReport {
            days: query.days(),
            profile,
            filter,
            record,
        })
    }

    /// Bypass the cache and re-fetch the export for `profile`
    pub async fn refresh(
        &self,
        profile: DimensionProfile,
        days: i64,
    ) -> ServiceResult<RefreshSummary> {
        let query = profile.query(days);
        let entry = self.load(&query, true).await?;

        info!(
            %query,
            blocks = entry.payload.len(),
            expires_at = %entry.expires_at,
            "export refreshed"
        );

        Ok(RefreshSummary {
            query,
            block_count: entry.payload.len(),
            fetched_at: entry.fetched_at,
            expires_at: entry.expires_at,
        })
    }

    /// Field names of the first row in every block of the URL-only export
    pub async fn schema_snapshot(&self, days: i64) -> ServiceResult<Vec<BlockSchema>> {
        let query = DimensionProfile::Url.query(days);
        let entry = self.load(&query, false).await?;

        Ok(entry.payload.iter().map(BlockSchema::from_block).collect())
    }

    /// Raw blocks for an arbitrary export query, through the same cache
    pub async fn export(
        &self,
        query: &ExportQuery,
        force: bool,
    ) -> ServiceResult<Vec<MetricBlock>> {
        let entry = self.load(query, force).await?;
        Ok(entry.payload.clone())
    }

    async fn load(&self, query: &ExportQuery, force: bool) -> ServiceResult<Arc<CacheEntry>> {
        let entry = self
            .cache
            .get_or_fetch(query, || self.fetcher.fetch(query), force)
            .await?;
        Ok(entry)
    }

    fn validate_target(&self, target_url: &str) -> ServiceResult<()> {
        let target_url = target_url.trim();
        if target_url.is_empty() {
            return Err(ServiceError::MalformedInput("url is required".to_string()));
        }
        if target_url.len() > self.max_url_length {
            return Err(ServiceError::MalformedInput(format!(
                "url exceeds maximum length of {} bytes",
                self.max_url_length
            )));
        }
        Ok(())
    }
}
