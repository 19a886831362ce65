//! 路由定义
//!
//! - 健康检查：GET /healthz
//! - 上行接入：POST /ingest
//! - 指标快照：GET /metrics

use crate::AppState;
use crate::handlers::*;
use crate::middleware::request_context;
use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

/// 创建应用路由（含请求上下文与追踪中间件）
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/ingest", post(ingest_uplink))
        .route("/metrics", get(get_metrics))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_context))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        response::Response,
    };
    use http_body_util::BodyExt;
    use regenfass_pipeline::PipelineConfig;
    use regenfass_storage::{FailurePoint, InMemoryIngestStore};
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    const EUI: &str = "70B3D57ED005A1B2";

    fn app() -> (InMemoryIngestStore, Router) {
        let store = InMemoryIngestStore::new();
        store.register_device(EUI).expect("register");
        let state = AppState::new(Arc::new(store.clone()), PipelineConfig::default());
        (store, create_router(state))
    }

    fn uplink(dev_eui: &str, frm_payload: &str) -> Request<Body> {
        let body = serde_json::json!({
            "end_device_ids": { "dev_eui": dev_eui },
            "uplink_message": {
                "frm_payload": frm_payload,
                "received_at": "2024-06-01T12:00:00Z"
            }
        });
        Request::builder()
            .method("POST")
            .uri("/ingest")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn ingest_commits_and_returns_no_content() {
        let (store, app) = app();
        // 10 01 21 00 00 00 00 → 通道 1 布尔 true，通道 2 浮点 0.0
        let response = app.oneshot(uplink(EUI, "EAEhAAAAAA==")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.headers().contains_key("x-request-id"));
        assert!(response.headers().contains_key("x-trace-id"));
        let rows = store.measurements();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].value, "true");
        assert_eq!(rows[1].value, "0.0");
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let (store, app) = app();
        let request = Request::builder()
            .method("POST")
            .uri("/ingest")
            .header("content-type", "application/json")
            .body(Body::from("{\"end_device_ids\":"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "INVALID.REQUEST");
        assert_eq!(store.stats().begun, 0);
    }

    #[tokio::test]
    async fn bad_base64_is_bad_request() {
        let (_store, app) = app();
        let response = app.oneshot(uplink(EUI, "%%%")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn undecodable_payload_is_bad_request_and_rolled_back() {
        let (store, app) = app();
        // 0C：未知类型 12
        let response = app.oneshot(uplink(EUI, "DAAAAAA=")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(store.measurements().is_empty());
        assert_eq!(store.stats().rolled_back, 1);
    }

    #[tokio::test]
    async fn unknown_device_is_server_error() {
        let (store, app) = app();
        let response = app.oneshot(uplink("0000000000000000", "EAE=")).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "INTERNAL.ERROR");
        assert_eq!(store.stats().rolled_back, 1);
    }

    #[tokio::test]
    async fn commit_failure_is_server_error() {
        let (store, app) = app();
        store.fail_at(Some(FailurePoint::Commit));
        let response = app.oneshot(uplink(EUI, "EAE=")).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(store.measurements().is_empty());
    }

    #[tokio::test]
    async fn upstream_request_id_is_echoed() {
        let (_store, app) = app();
        let request = Request::builder()
            .uri("/healthz")
            .header("x-request-id", "ttn-uplink-7")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.headers()["x-request-id"], "ttn-uplink-7");
        assert!(response.headers().contains_key("x-trace-id"));
    }

    #[tokio::test]
    async fn healthz_reports_ok() {
        let (_store, app) = app();
        let request = Request::builder().uri("/healthz").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"ok");
    }

    #[tokio::test]
    async fn metrics_snapshot_is_wrapped() {
        let (_store, app) = app();
        let request = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        assert!(body["data"]["uplinksReceived"].is_number());
    }
}
