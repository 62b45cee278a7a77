use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::metrics::RowFilter;
use crate::upstream::{DimensionProfile, ExportQuery};

/// Sums for one click/error category block
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMetrics {
    pub sessions_count: f64,
    pub sessions_with_metric_percentage: f64,
    pub sessions_without_metric_percentage: f64,
    pub pages_views: f64,
    pub sub_total: f64,
}

/// Aggregated metrics for a single normalized target
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedRecord {
    /// Normalized key the rows were matched against
    pub url: String,
    pub matched_rows: u64,

    pub total_session_count: f64,
    pub total_bot_session_count: f64,
    pub distinct_user_count: f64,
    pub pages_per_session_percentage: f64,

    pub total_time: f64,
    pub active_time: f64,
    pub average_scroll_depth: f64,

    pub avg_session_duration_sec: f64,
    pub active_time_per_session_sec: f64,

    pub rage_click: GroupMetrics,
    pub dead_click: GroupMetrics,
    pub excessive_scroll: GroupMetrics,
    pub quickback_click: GroupMetrics,
    pub script_error: GroupMetrics,
    pub error_click: GroupMetrics,
}

/// Record returned to API callers, with the query shape that produced it
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsReport {
    pub days: u8,
    pub profile: DimensionProfile,
    pub filter: RowFilter,
    #[serde(flatten)]
    pub record: AggregatedRecord,
}

/// Outcome of a forced cache refresh
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshSummary {
    pub query: ExportQuery,
    pub block_count: usize,
    pub fetched_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}
