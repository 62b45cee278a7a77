use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};
use url::Url;

use super::{truncate_body, ExportError, ExportFetcher, ExportQuery, ExportResult};
use crate::config::UpstreamConfig;
use crate::models::MetricBlock;

const EXPORT_PATH: &str = "project-live-insights";

/// reqwest-backed client for the export API
#[derive(Clone)]
pub struct HttpExportFetcher {
    client: Client,
    endpoint: Url,
    api_token: String,
}

impl HttpExportFetcher {
    pub fn from_config(config: &UpstreamConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("lumen/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build HTTP client for export API")?;

        let base = format!("{}/", config.base_url.trim_end_matches('/'));
        let endpoint = Url::parse(&base)
            .and_then(|base| base.join(EXPORT_PATH))
            .with_context(|| format!("invalid UPSTREAM_BASE_URL '{}'", config.base_url))?;

        Ok(Self {
            client,
            endpoint,
            api_token: config.api_token.clone(),
        })
    }

    fn request_url(&self, query: &ExportQuery) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("numOfDays", &query.days().to_string());
            for (idx, dimension) in query.dimensions().enumerate() {
                pairs.append_pair(&format!("dimension{}", idx + 1), dimension.as_str());
            }
        }
        url
    }
}

#[async_trait]
impl ExportFetcher for HttpExportFetcher {
    async fn fetch(&self, query: &ExportQuery) -> ExportResult<Vec<MetricBlock>> {
        let url = self.request_url(query);
        debug!(%query, "requesting export data");

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(|e| ExportError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ExportError::Transport(e.to_string()))?;

        if !status.is_success() {
            warn!(%query, status = status.as_u16(), "export API returned an error status");
            return Err(ExportError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| ExportError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::DimensionProfile;

    fn fetcher(base_url: &str) -> HttpExportFetcher {
        HttpExportFetcher::from_config(&UpstreamConfig {
            base_url: base_url.to_string(),
            api_token: "token".to_string(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[test]
    fn test_request_url_carries_query_shape() {
        let fetcher = fetcher("https://api.example.com/export-data/api/v1/");
        let url = fetcher.request_url(&DimensionProfile::SourceMedium.query(9));

        assert_eq!(url.path(), "/export-data/api/v1/project-live-insights");
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("numOfDays".to_string(), "3".to_string()),
                ("dimension1".to_string(), "Source".to_string()),
                ("dimension2".to_string(), "Medium".to_string()),
                ("dimension3".to_string(), "URL".to_string()),
            ]
        );
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let result = HttpExportFetcher::from_config(&UpstreamConfig {
            base_url: "not a url".to_string(),
            api_token: "token".to_string(),
            timeout_secs: 5,
        });
        assert!(result.is_err());
    }
}
