use crate::config::{ApiConfig, EventsConfig};
use crate::db::repositories::EventsRepository;
use crate::error::Error;
use crate::services::{AnalyticsService, PaginationService};
use anyhow::Result;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use log::{error, info};
use serde::Serialize;
use sqlx::SqlitePool;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};

pub mod events_controller;
pub mod legacy_controller;

// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db_pool: Arc<SqlitePool>,
    pub events_repo: EventsRepository,
    pub pagination: PaginationService,
    pub analytics: AnalyticsService,
    pub events_config: EventsConfig,
}

impl AppState {
    pub fn new(db_pool: Arc<SqlitePool>, events_config: &EventsConfig) -> Result<Self, Error> {
        let events_repo = EventsRepository::new(Arc::clone(&db_pool), events_config.time_zone()?);

        Ok(Self {
            db_pool,
            pagination: PaginationService::new(events_repo.clone()),
            analytics: AnalyticsService::new(events_repo.clone()),
            events_repo,
            events_config: events_config.clone(),
        })
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub message: String,
    pub status: u16,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: status.as_u16(),
        }
    }

    /// Log the cause and answer with a generic message
    pub fn read_failure(context: &str, err: Error) -> Self {
        error!("{}: {}", context, err);
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, context)
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = match err {
            Error::Validation(_) | Error::Config(_) => StatusCode::BAD_REQUEST,
            Error::Storage(_) | Error::Fetch(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        ApiError {
            message: err.to_string(),
            status: status.as_u16(),
        }
    }
}

/// Malformed or mistyped request bodies are client errors like any other invalid field
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::from(Error::Validation(rejection.body_text()))
    }
}

/// Implement IntoResponse for ApiError
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = Json(self);
        (status, body).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    if crate::db::health_check(&state.db_pool).await {
        (StatusCode::OK, Json(HealthResponse { status: "ok" }))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "unavailable",
            }),
        )
    }
}

/// Build the complete application router
pub fn router(state: AppState) -> Router {
    // The dashboard is served from another origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .allow_credentials(false)
        .max_age(Duration::from_secs(3600));

    Router::new()
        .route("/health", get(health))
        .merge(events_controller::create_router())
        .merge(legacy_controller::create_router())
        .with_state(state)
        .layer(cors)
}

pub struct RestApi {
    config: ApiConfig,
    state: AppState,
}

impl RestApi {
    pub fn new(config: &ApiConfig, state: AppState) -> Self {
        Self {
            config: config.clone(),
            state,
        }
    }

    /// Serve until `shutdown` resolves, then drain in-flight requests
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = router(self.state);

        let addr: SocketAddr = format!("{}:{}", self.config.address, self.config.port).parse()?;
        info!("API server listening on {}", addr);

        axum::Server::try_bind(&addr)?
            .serve(app.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("API server stopped");
        Ok(())
    }
}
