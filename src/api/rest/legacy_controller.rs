//! Routes of the first backend revision, still used by deployed edge detectors.

use crate::api::rest::AppState;
use crate::db::models::NewEvent;
use crate::error::Error;
use crate::services::WeeklyHistogram;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use chrono::Utc;
use log::{error, info};
use serde_json::{json, Value};

/// Number of rows returned by `GET /api/logs`
const RECENT_LOGS_LIMIT: i64 = 100;

type LegacyResult<T> = std::result::Result<Json<T>, (StatusCode, Json<Value>)>;

fn legacy_error(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "error": message.into() })))
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/api/log", post(log_event))
        .route("/api/logs", get(recent_logs))
        .route("/api/stats", get(stats))
}

pub async fn log_event(
    State(state): State<AppState>,
    payload: Result<Json<NewEvent>, JsonRejection>,
) -> LegacyResult<Value> {
    let Json(request) =
        payload.map_err(|rejection| legacy_error(StatusCode::BAD_REQUEST, rejection.body_text()))?;
    let id = match state.events_repo.append(&request).await {
        Ok(id) => id,
        Err(Error::Validation(message)) => {
            return Err(legacy_error(StatusCode::BAD_REQUEST, message));
        }
        Err(e) => {
            error!("Failed to store legacy log entry: {}", e);
            return Err(legacy_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
        }
    };

    info!("Stored legacy log entry {}", id);

    Ok(Json(json!({
        "message": "Log entry created",
        "id": id,
        "data": {
            "event_type": request.event_type,
            "description": request.description,
            "camera_id": request.camera_id,
        }
    })))
}

pub async fn recent_logs(State(state): State<AppState>) -> LegacyResult<Value> {
    let logs = state
        .events_repo
        .list_page(0, RECENT_LOGS_LIMIT)
        .await
        .map_err(|e| {
            error!("Failed to load recent logs: {}", e);
            legacy_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load logs")
        })?;

    Ok(Json(json!({ "logs": logs })))
}

pub async fn stats(State(state): State<AppState>) -> LegacyResult<WeeklyHistogram> {
    let histogram = state
        .analytics
        .weekly_histogram(Utc::now())
        .await
        .map_err(|e| {
            error!("Failed to load stats: {}", e);
            legacy_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load stats")
        })?;

    Ok(Json(histogram))
}
