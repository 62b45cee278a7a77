use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api_server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub cache: CacheConfig,
    pub auth: AuthConfig,
    pub cors: CorsConfig,
    /// Longest target URL accepted by the metrics endpoint
    pub max_url_length: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    pub base_url: String,
    #[serde(skip_serializing)]
    pub api_token: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheTtlProfile {
    /// One day; keeps each query shape to roughly one upstream call per day
    Daily,
    /// Ten minutes, for deployments with quota headroom
    Short,
}

impl CacheTtlProfile {
    pub const fn ttl(&self) -> Duration {
        match self {
            CacheTtlProfile::Daily => Duration::from_secs(24 * 60 * 60),
            CacheTtlProfile::Short => Duration::from_secs(10 * 60),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub ttl_profile: CacheTtlProfile,
    /// Overrides the profile TTL when set
    #[serde(default)]
    pub ttl_secs: Option<u64>,
    #[serde(default = "CacheConfig::default_max_entries")]
    pub max_entries: u64,
}

/// Longest accepted `CACHE_TTL_SECS` override (30 days)
pub const MAX_CACHE_TTL_SECS: u64 = 30 * 24 * 60 * 60;

impl CacheConfig {
    const fn default_max_entries() -> u64 {
        256
    }

    /// Effective TTL. Overrides above [`MAX_CACHE_TTL_SECS`] are capped.
    pub fn ttl(&self) -> Duration {
        self.ttl_secs
            .map(|secs| Duration::from_secs(secs.min(MAX_CACHE_TTL_SECS)))
            .unwrap_or_else(|| self.ttl_profile.ttl())
    }

    /// Parse a raw `CACHE_TTL_SECS` value. Unset or `0` means no override.
    pub fn parse_ttl_override(raw: Option<&str>) -> anyhow::Result<Option<u64>> {
        let Some(raw) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
            return Ok(None);
        };
        let secs = raw.parse::<u64>().with_context(|| {
            format!("CACHE_TTL_SECS must be a whole number of seconds, got '{raw}'")
        })?;
        if secs > MAX_CACHE_TTL_SECS {
            anyhow::bail!(
                "CACHE_TTL_SECS must be at most {MAX_CACHE_TTL_SECS} (30 days), got {secs}"
            );
        }
        Ok(Some(secs).filter(|secs| *secs > 0))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    None,
    ApiKey,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub mode: AuthMode,
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Empty means any origin
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

pub const DEFAULT_UPSTREAM_BASE_URL: &str = "https://www.clarity.ms/export-data/api/v1";
pub const DEFAULT_MAX_URL_LENGTH: usize = 2048;

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let api_host = std::env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let api_port = std::env::var("API_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .context("API_PORT must be a valid port number")?;

        let base_url = std::env::var("UPSTREAM_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_UPSTREAM_BASE_URL.to_string());
        let api_token =
            std::env::var("UPSTREAM_API_TOKEN").context("UPSTREAM_API_TOKEN must be set")?;
        let timeout_secs = std::env::var("UPSTREAM_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(30);

        let ttl_profile = match std::env::var("CACHE_TTL_PROFILE")
            .unwrap_or_else(|_| "daily".to_string())
            .to_lowercase()
            .as_str()
        {
            "daily" => CacheTtlProfile::Daily,
            "short" => CacheTtlProfile::Short,
            other => {
                tracing::warn!(
                    "Unknown CACHE_TTL_PROFILE '{other}', falling back to 'daily'. Supported values: daily, short"
                );
                CacheTtlProfile::Daily
            }
        };
        let ttl_secs =
            CacheConfig::parse_ttl_override(std::env::var("CACHE_TTL_SECS").ok().as_deref())?;
        let max_entries = std::env::var("CACHE_MAX_ENTRIES")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or_else(CacheConfig::default_max_entries);

        let auth_mode = match std::env::var("AUTH_MODE")
            .unwrap_or_else(|_| "none".to_string())
            .to_lowercase()
            .replace('-', "_")
            .as_str()
        {
            "none" => AuthMode::None,
            "api_key" | "apikey" => AuthMode::ApiKey,
            other => {
                tracing::warn!(
                    "Unknown AUTH_MODE '{other}', falling back to 'none'. Supported values: none, api_key"
                );
                AuthMode::None
            }
        };

        let api_key = if matches!(auth_mode, AuthMode::ApiKey) {
            let key = std::env::var("API_KEY").context("API_KEY must be set when AUTH_MODE=api_key")?;
            if key.trim().is_empty() {
                anyhow::bail!("API_KEY must not be empty when AUTH_MODE=api_key");
            }
            Some(key)
        } else {
            None
        };

        let allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(|origin| origin.trim().to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let max_url_length = std::env::var("MAX_URL_LENGTH")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(DEFAULT_MAX_URL_LENGTH);

        Ok(Config {
            api_server: ServerConfig {
                host: api_host,
                port: api_port,
            },
            upstream: UpstreamConfig {
                base_url,
                api_token,
                timeout_secs,
            },
            cache: CacheConfig {
                ttl_profile,
                ttl_secs,
                max_entries,
            },
            auth: AuthConfig {
                mode: auth_mode,
                api_key,
            },
            cors: CorsConfig { allowed_origins },
            max_url_length,
        })
    }
}
