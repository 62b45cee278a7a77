use axum::{
    extract::Request,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use subtle::ConstantTimeEq;

use crate::api::handlers::ErrorResponse;
use crate::config::{AuthConfig, AuthMode};

pub const API_KEY_HEADER: &str = "X-API-Key";

/// Single shared-secret gate for the API routes
pub struct AuthService {
    api_key: Option<Vec<u8>>,
}

impl AuthService {
    pub fn new(config: &AuthConfig) -> Self {
        let api_key = match config.mode {
            AuthMode::None => None,
            AuthMode::ApiKey => config.api_key.as_ref().map(|k| k.as_bytes().to_vec()),
        };
        Self { api_key }
    }

    pub fn disabled() -> Self {
        Self { api_key: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn validate_key(&self, key: &str) -> bool {
        match &self.api_key {
            None => true,
            Some(expected) => bool::from(expected.as_slice().ct_eq(key.as_bytes())),
        }
    }
}

pub async fn auth_middleware(
    auth_service: Arc<AuthService>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Response {
    let api_key = headers
        .get(API_KEY_HEADER)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("");

    if auth_service.validate_key(api_key) {
        next.run(request).await
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: "Invalid or missing API key".to_string(),
                upstream_status: None,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_auth_allows_everything() {
        let auth = AuthService::new(&AuthConfig {
            mode: AuthMode::None,
            api_key: Some("ignored".to_string()),
        });
        assert!(!auth.is_enabled());
        assert!(auth.validate_key(""));
    }

    #[test]
    fn test_api_key_must_match_exactly() {
        let auth = AuthService::new(&AuthConfig {
            mode: AuthMode::ApiKey,
            api_key: Some("s3cret".to_string()),
        });
        assert!(auth.is_enabled());
        assert!(auth.validate_key("s3cret"));
        assert!(!auth.validate_key("s3cre"));
        assert!(!auth.validate_key("s3cret "));
        assert!(!auth.validate_key(""));
    }
}
