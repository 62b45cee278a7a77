use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lumen::cache::QuotaCache;
use lumen::config::Config;
use lumen::metrics::{MetricsService, RowFilter};
use lumen::upstream::{Dimension, DimensionProfile, ExportQuery, HttpExportFetcher};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lumen-cli")]
#[command(about = "Query the analytics export API without running the server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate metrics for a single page
    Metrics {
        /// Target page URL
        url: String,
        /// Number of days (clamped to 1-3)
        #[arg(long, default_value_t = 1)]
        days: i64,
        /// Dimension profile: url, channel, source_medium
        #[arg(long, default_value = "url")]
        profile: DimensionProfile,
        /// Row filter: none, paid_search, google_cpc (defaults to the profile's)
        #[arg(long)]
        filter: Option<RowFilter>,
    },
    /// Fetch an export and report how many blocks came back
    Refresh {
        #[arg(long, default_value = "url")]
        profile: DimensionProfile,
        #[arg(long, default_value_t = 1)]
        days: i64,
    },
    /// Print the field names of the first row of every block
    Schema {
        #[arg(long, default_value_t = 1)]
        days: i64,
    },
    /// Print the raw blocks of an export grouped by any dimensions
    Export {
        /// Dimension to group by, in order (1-3), e.g. --dimension browser --dimension url
        #[arg(long = "dimension", required = true)]
        dimensions: Vec<Dimension>,
        #[arg(long, default_value_t = 1)]
        days: i64,
        /// Skip the cache and call the export API
        #[arg(long)]
        refresh: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let fetcher = Arc::new(HttpExportFetcher::from_config(&config.upstream)?);
    let service = MetricsService::new(
        fetcher,
        QuotaCache::from_config(&config.cache),
        config.max_url_length,
    );

    let output = match cli.command {
        Commands::Metrics {
            url,
            days,
            profile,
            filter,
        } => {
            let report = service
                .compute_metrics(&url, days, profile, filter)
                .await
                .context("failed to compute metrics")?;
            serde_json::to_string_pretty(&report)?
        }
        Commands::Refresh { profile, days } => {
            let summary = service
                .refresh(profile, days)
                .await
                .context("failed to refresh export")?;
            serde_json::to_string_pretty(&summary)?
        }
        Commands::Schema { days } => {
            let schema = service
                .schema_snapshot(days)
                .await
                .context("failed to fetch export schema")?;
            serde_json::to_string_pretty(&schema)?
        }
        Commands::Export {
            dimensions,
            days,
            refresh,
        } => {
            let query =
                ExportQuery::from_dimensions(days, &dimensions).map_err(anyhow::Error::msg)?;
            let blocks = service
                .export(&query, refresh)
                .await
                .with_context(|| format!("failed to fetch export ({query})"))?;
            serde_json::to_string_pretty(&blocks)?
        }
    };

    println!("{output}");
    Ok(())
}
