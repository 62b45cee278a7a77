use async_trait::async_trait;
use thiserror::Error;

use super::ExportQuery;
use crate::models::MetricBlock;

/// Upstream bodies attached to errors are cut to this many characters
pub const MAX_ERROR_BODY_CHARS: usize = 512;

#[derive(Debug, Clone, Error)]
pub enum ExportError {
    #[error("upstream returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("upstream request failed: {0}")]
    Transport(String),
    #[error("upstream response could not be decoded: {0}")]
    Decode(String),
}

impl ExportError {
    /// HTTP status reported by the upstream, if it answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            ExportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type ExportResult<T> = Result<T, ExportError>;

#[async_trait]
pub trait ExportFetcher: Send + Sync {
    /// Issue one export call for the given query shape
    async fn fetch(&self, query: &ExportQuery) -> ExportResult<Vec<MetricBlock>>;
}

pub fn truncate_body(body: &str) -> String {
    match body.char_indices().nth(MAX_ERROR_BODY_CHARS) {
        Some((idx, _)) => body[..idx].to_string(),
        None => body.to_string(),
    }
}
