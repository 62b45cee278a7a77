//! Normalization and aggregation of export rows

pub mod aggregator;
pub mod classify;
pub mod coerce;
pub mod normalize;
pub mod service;

pub use aggregator::aggregate;
pub use classify::{is_google_cpc, is_paid_search_channel, RowFilter};
pub use coerce::{coerce, pick_first_non_zero};
pub use normalize::normalize_url;
pub use service::{MetricsService, ServiceError, ServiceResult};
