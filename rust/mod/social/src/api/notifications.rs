use axum::extract::{Path, Query, State};
use axum::routing::{get, put};
use axum::{Json, Router};

use chirp_core::{Page, PageParams, ServiceError};

use super::{AppState, Caller};
use crate::model::{NotificationId, NotificationView};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(list))
        .route("/notifications/unread-count", get(unread_count))
        .route("/notifications/read-all", put(mark_all_read))
        .route("/notifications/{id}/read", put(mark_read))
}

async fn list(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<NotificationView>>, ServiceError> {
    Ok(Json(state.service.list_notifications(caller, &params)?))
}

async fn unread_count(
    State(state): State<AppState>,
    Caller(caller): Caller,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let count = state.service.unread_count(caller)?;
    Ok(Json(serde_json::json!({ "count": count })))
}

async fn mark_read(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let id: NotificationId = id.parse()?;
    state.service.mark_read(caller, id)?;
    Ok(Json(serde_json::json!({ "read": true })))
}

async fn mark_all_read(
    State(state): State<AppState>,
    Caller(caller): Caller,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let updated = state.service.mark_all_read(caller)?;
    Ok(Json(serde_json::json!({ "updated": updated })))
}
