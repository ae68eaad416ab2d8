//! HTTP API module
//!
//! This module contains the demo endpoints served behind the drain machinery.

pub mod handlers;
pub mod responses;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router() -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/work", get(work_handler))
        .fallback(not_found_handler)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_root() {
        let response = create_router()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_work_reports_elapsed_time() {
        let response = create_router()
            .oneshot(Request::get("/work?ms=20").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let work: responses::WorkResponse = serde_json::from_slice(&body).unwrap();
        assert!(work.elapsed_ms >= 20);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let response = create_router()
            .oneshot(Request::get("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
