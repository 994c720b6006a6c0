//! REST API endpoints.
//!
//! Axum-based HTTP API for running tournaments, recording votes and
//! reading leaderboards. The server holds no session state: tournament
//! state travels with each request.

pub mod routes;
pub mod state;

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::catalog::CatalogError;
use crate::models::{UnknownSortKey, ValidationError};
use crate::stats::{StatsError, StoreError};
use crate::tournament::TournamentError;

pub use state::AppState;

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Contract violation: {0}")]
    ContractViolation(String),

    #[error("Stats store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::ContractViolation(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "CONTRACT_VIOLATION")
            }
            ApiError::StoreUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "STORE_UNAVAILABLE"),
            ApiError::UpstreamUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "UPSTREAM_UNAVAILABLE")
            }
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        if status.is_server_error() {
            error!("{}", self);
        }

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

impl From<UnknownSortKey> for ApiError {
    fn from(e: UnknownSortKey) -> Self {
        ApiError::ContractViolation(e.to_string())
    }
}

impl From<TournamentError> for ApiError {
    fn from(e: TournamentError) -> Self {
        ApiError::ContractViolation(e.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Unavailable(msg) => ApiError::StoreUnavailable(msg),
            corrupt @ StoreError::Corrupt { .. } => ApiError::Internal(corrupt.to_string()),
        }
    }
}

impl From<StatsError> for ApiError {
    fn from(e: StatsError) -> Self {
        match e {
            StatsError::Validation(v) => v.into(),
            StatsError::Store(s) => s.into(),
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::UnknownCollection(id) => {
                ApiError::NotFound(format!("collection {}", id))
            }
            other => {
                warn!("Catalog failure (retryable: {}): {}", other.is_retryable(), other);
                ApiError::UpstreamUnavailable(other.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        ApiError::BadRequest(e.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(e: QueryRejection) -> Self {
        ApiError::BadRequest(e.body_text())
    }
}

/// Build the application router.
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/api/catalog/:collection_id", get(routes::catalog::get_catalog))
        .route(
            "/api/tournament/:collection_id/start",
            post(routes::tournament::start),
        )
        .route("/api/tournament/vote", post(routes::tournament::vote))
        .route("/api/tournament/restart", post(routes::tournament::restart))
        .route("/api/vote", post(routes::vote::record_vote))
        .route("/api/stats", get(routes::vote::item_stats))
        .route(
            "/api/leaderboard/:collection_id",
            get(routes::leaderboard::get_leaderboard),
        )
        .with_state(state)
        .layer(cors_layer(cors_origin))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    match origin {
        "*" => layer.allow_origin(Any),
        other => match HeaderValue::from_str(other) {
            Ok(value) => layer.allow_origin(value),
            Err(_) => {
                warn!("Ignoring invalid cors_origin {:?}, allowing any origin", other);
                layer.allow_origin(Any)
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CollectionId;

    fn status_of(e: impl Into<ApiError>) -> StatusCode {
        e.into().into_response().status()
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            status_of(ValidationError::Missing("winnerId")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(TournamentError::AlreadyComplete),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(UnknownSortKey("elo".to_string())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(StoreError::Unavailable("down".to_string())),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(CatalogError::UnknownCollection(
                CollectionId::parse("nope").unwrap()
            )),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(CatalogError::Unavailable("timeout".to_string())),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_stats_error_keeps_its_kind() {
        let validation: ApiError = StatsError::from(ValidationError::Missing("limit")).into();
        assert!(matches!(validation, ApiError::BadRequest(_)));

        let store: ApiError = StatsError::from(StoreError::Unavailable("x".to_string())).into();
        assert!(matches!(store, ApiError::StoreUnavailable(_)));
    }
}
