use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use ji_core::RecordKind;
use serde_json::{json, Map, Value};
use tracing::{error, info, warn};

use crate::AppState;

pub type ApiResponse = (StatusCode, Json<Value>);

fn error_response(status: StatusCode, message: impl ToString) -> ApiResponse {
    (status, Json(json!({ "error": message.to_string() })))
}

fn busy() -> ApiResponse {
    warn!("Rejected refresh: another refresh is running");
    error_response(StatusCode::CONFLICT, "A refresh is already running")
}

/// Runs news, courses and trainers in order.
pub async fn refresh_all(State(state): State<Arc<AppState>>) -> ApiResponse {
    let Ok(_guard) = state.refresh_lock.try_lock() else {
        return busy();
    };

    info!("Refreshing all collections");
    let outcome = state.manager.refresh_all().await;
    let mut body = Map::new();
    let status = match &outcome.error {
        None => {
            body.insert("message".into(), json!("Data refreshed successfully"));
            StatusCode::OK
        }
        Some(e) => {
            body.insert("error".into(), json!(e));
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    for (kind, count) in &outcome.counts {
        body.insert(kind.count_key().into(), json!(count));
    }
    (status, Json(Value::Object(body)))
}

pub async fn refresh_kind(State(state): State<Arc<AppState>>, Path(kind): Path<String>) -> ApiResponse {
    let kind = match RecordKind::from_str(&kind) {
        Ok(kind) => kind,
        Err(e) => return error_response(StatusCode::NOT_FOUND, e),
    };
    let Ok(_guard) = state.refresh_lock.try_lock() else {
        return busy();
    };

    info!("Refreshing {}", kind);
    match state.manager.run_kind(kind).await {
        Ok(run) => {
            let mut body = Map::new();
            body.insert("message".into(), json!(format!("{} refreshed successfully", kind)));
            body.insert(kind.count_key().into(), json!(run.accumulator.len()));
            (StatusCode::OK, Json(Value::Object(body)))
        }
        Err(e) => {
            error!("Refresh of {} failed: {}", kind, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e)
        }
    }
}

async fn list(state: &AppState, kind: RecordKind) -> ApiResponse {
    match state.manager.records(kind).await {
        Ok(records) => (StatusCode::OK, Json(json!(records))),
        Err(e) => {
            error!("Failed to read {}: {}", kind, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e)
        }
    }
}

pub async fn list_news(State(state): State<Arc<AppState>>) -> ApiResponse {
    list(&state, RecordKind::News).await
}

pub async fn list_courses(State(state): State<Arc<AppState>>) -> ApiResponse {
    list(&state, RecordKind::Courses).await
}

pub async fn list_trainers(State(state): State<Arc<AppState>>) -> ApiResponse {
    list(&state, RecordKind::Trainers).await
}

pub async fn counts(State(state): State<Arc<AppState>>) -> ApiResponse {
    match state.manager.counts().await {
        Ok(counts) => {
            let body: Map<String, Value> = counts
                .into_iter()
                .map(|(kind, count)| (kind.count_key().to_string(), json!(count)))
                .collect();
            (StatusCode::OK, Json(Value::Object(body)))
        }
        Err(e) => {
            error!("Failed to count collections: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e)
        }
    }
}
