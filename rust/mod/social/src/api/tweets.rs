use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};

use chirp_core::{Page, PageParams, ServiceError};

use super::{AppState, Caller};
use crate::model::{NewTweet, TweetDetail, TweetId, TweetView};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tweets", post(create_tweet))
        .route("/tweets/search", get(search_tweets))
        .route("/tweets/{id}", get(get_tweet).delete(delete_tweet))
        .route("/tweets/{id}/like", post(like).delete(unlike))
        .route("/timeline", get(timeline))
}

// ---------------------------------------------------------------------------
// POST /tweets
// ---------------------------------------------------------------------------

async fn create_tweet(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Json(req): Json<NewTweet>,
) -> Result<(StatusCode, Json<TweetView>), ServiceError> {
    let tweet = state.service.create_tweet(caller, req)?;
    Ok((StatusCode::CREATED, Json(tweet)))
}

// ---------------------------------------------------------------------------
// GET /timeline, GET /tweets/search
// ---------------------------------------------------------------------------

async fn timeline(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<TweetView>>, ServiceError> {
    Ok(Json(state.service.list_timeline(caller, &params)?))
}

async fn search_tweets(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<TweetView>>, ServiceError> {
    Ok(Json(state.service.search_tweets(caller, &params)?))
}

// ---------------------------------------------------------------------------
// GET/DELETE /tweets/{id}
// ---------------------------------------------------------------------------

async fn get_tweet(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
) -> Result<Json<TweetDetail>, ServiceError> {
    let id: TweetId = id.parse()?;
    Ok(Json(state.service.get_tweet(caller, id)?))
}

async fn delete_tweet(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let id: TweetId = id.parse()?;
    state.service.delete_tweet(caller, id)?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}

// ---------------------------------------------------------------------------
// POST/DELETE /tweets/{id}/like
// ---------------------------------------------------------------------------

async fn like(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let id: TweetId = id.parse()?;
    state.service.like_tweet(caller, id)?;
    Ok(Json(serde_json::json!({ "liked": true })))
}

async fn unlike(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let id: TweetId = id.parse()?;
    state.service.unlike_tweet(caller, id)?;
    Ok(Json(serde_json::json!({ "liked": false })))
}
