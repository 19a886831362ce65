//! 接入指标快照。
//!
//! - GET /metrics

use api_contract::{ApiResponse, MetricsSnapshotDto};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use regenfass_telemetry::metrics;

pub async fn get_metrics() -> Response {
    let snapshot = metrics().snapshot();
    (
        StatusCode::OK,
        Json(ApiResponse::success(MetricsSnapshotDto {
            uplinks_received: snapshot.uplinks_received,
            uplinks_committed: snapshot.uplinks_committed,
            uplinks_rejected: snapshot.uplinks_rejected,
            uplinks_failed: snapshot.uplinks_failed,
            data_points_written: snapshot.data_points_written,
            ingest_latency_ms_total: snapshot.ingest_latency_ms_total,
            ingest_latency_ms_count: snapshot.ingest_latency_ms_count,
        })),
    )
        .into_response()
}
