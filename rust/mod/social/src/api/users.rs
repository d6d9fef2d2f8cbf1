use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};

use chirp_core::{Page, PageParams, ServiceError};

use super::{AppState, Caller};
use crate::model::{NewUser, ProfileUpdate, ProfileView, TweetView, UserId, UserView};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", post(register))
        .route("/users/search", get(search_users))
        .route("/users/{id}", get(get_profile))
        .route("/users/{id}/tweets", get(list_by_user))
        .route("/users/{id}/follow", post(follow).delete(unfollow))
        .route("/me", get(me))
        .route("/me/profile", put(update_profile))
}

// ---------------------------------------------------------------------------
// POST /users
// ---------------------------------------------------------------------------

async fn register(
    State(state): State<AppState>,
    Json(req): Json<NewUser>,
) -> Result<(StatusCode, Json<UserView>), ServiceError> {
    let user = state.service.register_user(req)?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn search_users(
    State(state): State<AppState>,
    _caller: Caller,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<UserView>>, ServiceError> {
    Ok(Json(state.service.search_users(&params)?))
}

// ---------------------------------------------------------------------------
// GET /users/{id}, GET /me
// ---------------------------------------------------------------------------

async fn get_profile(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
) -> Result<Json<ProfileView>, ServiceError> {
    let id: UserId = id.parse()?;
    Ok(Json(state.service.get_profile(caller, id)?))
}

async fn me(
    State(state): State<AppState>,
    Caller(caller): Caller,
) -> Result<Json<UserView>, ServiceError> {
    Ok(Json(state.service.get_user(caller)?))
}

async fn update_profile(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<UserView>, ServiceError> {
    Ok(Json(state.service.update_profile(caller, update)?))
}

async fn list_by_user(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<TweetView>>, ServiceError> {
    let id: UserId = id.parse()?;
    Ok(Json(state.service.list_by_user(caller, id, &params)?))
}

// ---------------------------------------------------------------------------
// POST/DELETE /users/{id}/follow
// ---------------------------------------------------------------------------

async fn follow(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let target: UserId = id.parse()?;
    state.service.follow_user(caller, target)?;
    Ok(Json(serde_json::json!({ "following": true })))
}

async fn unfollow(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let target: UserId = id.parse()?;
    state.service.unfollow_user(caller, target)?;
    Ok(Json(serde_json::json!({ "following": false })))
}
