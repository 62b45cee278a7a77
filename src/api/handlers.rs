use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::metrics::{MetricsService, RowFilter, ServiceError};
use crate::models::{BlockSchema, MetricsReport, RefreshSummary};
use crate::upstream::DimensionProfile;

pub struct AppState {
    pub service: Arc<MetricsService>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream_status: Option<u16>,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

#[derive(Debug, Deserialize)]
pub struct MetricsQuery {
    pub url: Option<String>,
    #[serde(default = "default_days")]
    pub days: i64,
    #[serde(default)]
    pub profile: DimensionProfile,
    pub filter: Option<RowFilter>,
}

#[derive(Debug, Deserialize)]
pub struct RefreshQuery {
    #[serde(default)]
    pub profile: DimensionProfile,
    #[serde(default = "default_days")]
    pub days: i64,
}

#[derive(Debug, Deserialize)]
pub struct SchemaQuery {
    #[serde(default = "default_days")]
    pub days: i64,
}

fn default_days() -> i64 {
    1
}

fn error_response(err: ServiceError) -> (StatusCode, Json<ErrorResponse>) {
    match err {
        ServiceError::MalformedInput(message) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: message,
                upstream_status: None,
            }),
        ),
        ServiceError::Upstream(e) => {
            tracing::error!("Export API request failed: {}", e);
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse {
                    error: e.to_string(),
                    upstream_status: e.status(),
                }),
            )
        }
    }
}

/// Unparseable query parameters (unknown profile, non-numeric days, ...)
fn rejection_response(rejection: QueryRejection) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: rejection.body_text(),
            upstream_status: None,
        }),
    )
}

/// Aggregated metrics for one target URL
pub async fn get_metrics(
    State(state): State<Arc<AppState>>,
    params: Result<Query<MetricsQuery>, QueryRejection>,
) -> ApiResult<MetricsReport> {
    let Query(params) = params.map_err(rejection_response)?;
    let url = params.url.unwrap_or_default();

    state
        .service
        .compute_metrics(&url, params.days, params.profile, params.filter)
        .await
        .map(Json)
        .map_err(error_response)
}

/// Force a re-fetch of the export for a profile
pub async fn refresh_export(
    State(state): State<Arc<AppState>>,
    params: Result<Query<RefreshQuery>, QueryRejection>,
) -> ApiResult<RefreshSummary> {
    let Query(params) = params.map_err(rejection_response)?;
    state
        .service
        .refresh(params.profile, params.days)
        .await
        .map(Json)
        .map_err(error_response)
}

/// First-row field names per block, for spotting upstream schema drift
pub async fn get_schema(
    State(state): State<Arc<AppState>>,
    params: Result<Query<SchemaQuery>, QueryRejection>,
) -> ApiResult<Vec<BlockSchema>> {
    let Query(params) = params.map_err(rejection_response)?;
    state
        .service
        .schema_snapshot(params.days)
        .await
        .map(Json)
        .map_err(error_response)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    #[derive(Serialize)]
    struct HealthResponse {
        status: String,
    }

    Json(HealthResponse {
        status: "OK".to_string(),
    })
}
