//! Upstream export API boundary
//!
//! The export endpoint is heavily rate limited, so callers are expected to
//! go through [`crate::cache::QuotaCache`] rather than hitting a fetcher
//! directly.

pub mod http;
pub mod query;
pub mod trait_def;

pub use http::HttpExportFetcher;
pub use query::{
    clamp_days, Dimension, DimensionProfile, ExportQuery, MAX_DAYS, MAX_DIMENSIONS,
    MIN_DAYS,
};
pub use trait_def::{truncate_body, ExportError, ExportFetcher, ExportResult};
