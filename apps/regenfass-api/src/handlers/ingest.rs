//! 上行接入
//!
//! - POST /ingest：网络服务器 webhook 推送上行
//!
//! 响应：
//! - 204：全部数据点已在同一事务内提交
//! - 400：请求体、base64 或负载不合法
//! - 500：设备解析、写入、提交失败或超时

use crate::AppState;
use crate::utils::{bad_request_error, ingest_error};
use api_contract::UplinkRequest;
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use regenfass_pipeline::ErrorClass;
use regenfass_telemetry::{
    record_ingest_latency_ms, record_uplink_committed, record_uplink_failed,
    record_uplink_received, record_uplink_rejected,
};
use std::time::Instant;
use tracing::{error, warn};

pub async fn ingest_uplink(
    State(state): State<AppState>,
    payload: Result<Json<UplinkRequest>, JsonRejection>,
) -> Response {
    record_uplink_received();
    let Json(req) = match payload {
        Ok(req) => req,
        Err(rejection) => {
            record_uplink_rejected();
            warn!(
                target: "regenfass.ingest",
                stage = "envelope",
                error = %rejection.body_text(),
                "uplink_rejected"
            );
            return bad_request_error(rejection.body_text());
        }
    };

    let device_eui = req.end_device_ids.dev_eui;
    // 未携带接收时间时以服务端时间为准
    let received_at = req.uplink_message.received_at.unwrap_or_else(Utc::now);
    let started = Instant::now();
    let result = state
        .pipeline
        .ingest_uplink(&device_eui, &req.uplink_message.frm_payload, received_at)
        .await;
    record_ingest_latency_ms(started.elapsed().as_millis() as u64);

    match result {
        Ok(receipt) => {
            record_uplink_committed(receipt.points);
            StatusCode::NO_CONTENT.into_response()
        }
        Err(err) => {
            match err.class() {
                ErrorClass::Client => {
                    record_uplink_rejected();
                    warn!(
                        target: "regenfass.ingest",
                        device_eui = %device_eui,
                        stage = %err.stage(),
                        error = %err,
                        "uplink_rejected"
                    );
                }
                ErrorClass::Server => {
                    record_uplink_failed();
                    error!(
                        target: "regenfass.ingest",
                        device_eui = %device_eui,
                        stage = %err.stage(),
                        error = %err,
                        "uplink_failed"
                    );
                }
            }
            ingest_error(&err)
        }
    }
}
