use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use lumen::api;
use lumen::auth::AuthService;
use lumen::cache::QuotaCache;
use lumen::config::Config;
use lumen::metrics::MetricsService;
use lumen::upstream::HttpExportFetcher;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!("Loaded configuration");

    // Upstream client and response cache
    let fetcher = Arc::new(HttpExportFetcher::from_config(&config.upstream)?);
    info!("Using export API at {}", config.upstream.base_url);

    let cache = QuotaCache::from_config(&config.cache);
    info!(
        "Export cache TTL: {}s ({:?} profile), capacity {}",
        cache.ttl().as_secs(),
        config.cache.ttl_profile,
        config.cache.max_entries
    );

    let service = Arc::new(MetricsService::new(fetcher, cache, config.max_url_length));

    // Initialize auth service
    let auth_service = Arc::new(AuthService::new(&config.auth));
    if auth_service.is_enabled() {
        info!("🔐 Shared-secret authentication enabled (X-API-Key header)");
    } else {
        info!("🔓 Authentication is disabled - all API requests are allowed");
    }

    let api_router = api::create_api_router(service, auth_service, &config.cors);

    let api_addr = format!("{}:{}", config.api_server.host, config.api_server.port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr).await?;
    info!("🚀 API server listening on http://{}", api_addr);
    info!("   - Metrics available at http://{}/api/metrics?url=...", api_addr);

    axum::serve(api_listener, api_router).await?;

    Ok(())
}
