pub mod export;
pub mod record;

pub use export::{BlockSchema, MetricBlock, Row};
pub use record::{AggregatedRecord, GroupMetrics, MetricsReport, RefreshSummary};
