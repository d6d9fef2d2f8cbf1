//! Route registration: module routes plus system endpoints.

use axum::Router;
use axum::response::IntoResponse;
use axum::routing::get;

/// Mount each module under `/{name}` next to `/health` and `/version`.
pub fn build_router(module_routes: Vec<(&str, Router)>) -> Router {
    let mut app = Router::new()
        .route("/health", get(health))
        .route("/version", get(version));

    for (name, router) in module_routes {
        app = app.nest(&format!("/{name}"), router);
    }
    app
}

async fn health() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "status": "ok",
    }))
}

async fn version() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "name": "chirpd",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chirp_core::{Module, SystemClock, TrustedHeader};
    use chirp_kv::RedbStore;
    use chirp_social::{FeedConfig, SocialModule};
    use tower::ServiceExt;

    async fn get_json(app: &Router, uri: &str, caller: Option<&str>) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().uri(uri);
        if let Some(id) = caller {
            builder = builder.header("x-caller", id);
        }
        let resp = app.clone().oneshot(builder.body(Body::empty()).unwrap()).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(serde_json::json!(null)))
    }

    #[tokio::test]
    async fn system_and_module_routes_are_mounted() {
        let dir = tempfile::tempdir().unwrap();
        let kv = RedbStore::open(&dir.path().join("routes.redb")).unwrap();
        let social = SocialModule::new(
            Arc::new(kv),
            Arc::new(SystemClock),
            FeedConfig::default(),
            Arc::new(TrustedHeader::new("X-Caller")),
        );
        let app = build_router(vec![(social.name(), social.routes())]);

        let (status, body) = get_json(&app, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        let (_, body) = get_json(&app, "/version", None).await;
        assert_eq!(body["name"], "chirpd");

        let (status, body) = get_json(&app, "/social/timeline", Some("1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["items"], serde_json::json!([]));

        let (status, _) = get_json(&app, "/social/timeline", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
