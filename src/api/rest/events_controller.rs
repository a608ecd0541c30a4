use crate::api::rest::{ApiError, ApiResult, AppState};
use crate::db::models::{Event, NewEvent};
use crate::services::{AdminSummary, Page, PageRequest, WeeklyHistogram};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use chrono::Utc;
use log::{error, info};
use serde::{Deserialize, Serialize};

/// Body of `POST /events` responses
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreatedEvent {
    pub id: i64,
    pub event_type: String,
    pub description: String,
    pub camera_id: String,
}

/// Page query parameters; kept as strings so bad values fall back to defaults
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SinceParams {
    pub limit: Option<String>,
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/events", get(list_events).post(create_event))
        .route("/events/weekly-stats", get(weekly_stats))
        .route("/events/admin-summary", get(admin_summary))
        .route("/events/latest", get(latest_event))
        .route("/events/since/:last_id", get(events_since))
}

/// Record an event from a producer
pub async fn create_event(
    State(state): State<AppState>,
    payload: Result<Json<NewEvent>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CreatedEvent>)> {
    let Json(request) = payload?;
    let event = request.validate()?;

    let id = state.events_repo.append(&request).await.map_err(|e| {
        error!("Failed to store {} event: {}", event.event_type, e);
        ApiError::from(e)
    })?;

    info!(
        "Stored event {} ({}) from camera {}",
        id, event.event_type, event.camera_id
    );

    Ok((
        StatusCode::CREATED,
        Json(CreatedEvent {
            id,
            event_type: event.event_type,
            description: event.description,
            camera_id: event.camera_id,
        }),
    ))
}

/// Most recent events first, paged
pub async fn list_events(
    Query(params): Query<ListParams>,
    State(state): State<AppState>,
) -> ApiResult<Json<Page>> {
    let request = PageRequest::from_params(params.page.as_deref(), params.limit.as_deref());

    let page = state
        .pagination
        .get_page(request)
        .await
        .map_err(|e| ApiError::read_failure("Failed to load events", e))?;

    Ok(Json(page))
}

pub async fn weekly_stats(State(state): State<AppState>) -> ApiResult<Json<WeeklyHistogram>> {
    let histogram = state
        .analytics
        .weekly_histogram(Utc::now())
        .await
        .map_err(|e| ApiError::read_failure("Failed to load weekly statistics", e))?;

    Ok(Json(histogram))
}

pub async fn admin_summary(State(state): State<AppState>) -> ApiResult<Json<AdminSummary>> {
    let summary = state
        .analytics
        .admin_summary(Utc::now())
        .await
        .map_err(|e| ApiError::read_failure("Failed to load event summary", e))?;

    Ok(Json(summary))
}

/// The highest-id event, or `null` for an empty log
pub async fn latest_event(State(state): State<AppState>) -> ApiResult<Json<Option<Event>>> {
    let latest = state
        .events_repo
        .latest()
        .await
        .map_err(|e| ApiError::read_failure("Failed to load latest event", e))?;

    Ok(Json(latest))
}

/// Events newer than `last_id`, oldest first
pub async fn events_since(
    Path(last_id): Path<i64>,
    Query(params): Query<SinceParams>,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Event>>> {
    let config = &state.events_config;
    let limit = params
        .limit
        .as_deref()
        .and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|limit| *limit >= 1)
        .unwrap_or(config.since_limit_default)
        .min(config.since_limit_max);

    let events = state
        .events_repo
        .list_newer_than(last_id, limit)
        .await
        .map_err(|e| ApiError::read_failure("Failed to load new events", e))?;

    Ok(Json(events))
}
