//! 稳定的 DTO 与 API 响应契约。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 标准 API 响应封装。
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

/// 失败响应的错误体。
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError {
                code: code.into(),
                message: message.into(),
            }),
        }
    }
}

/// 网络服务器（TTN）webhook 上行请求体。
///
/// 只声明接入需要的字段，其余字段忽略。
#[derive(Debug, Deserialize)]
pub struct UplinkRequest {
    pub end_device_ids: EndDeviceIds,
    pub uplink_message: UplinkMessage,
}

/// 终端设备标识。
#[derive(Debug, Deserialize)]
pub struct EndDeviceIds {
    pub dev_eui: String,
}

/// 上行消息。
#[derive(Debug, Deserialize)]
pub struct UplinkMessage {
    /// base64 编码的二进制负载
    #[serde(default)]
    pub frm_payload: String,
    pub received_at: Option<DateTime<Utc>>,
}

/// 接入指标快照。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshotDto {
    pub uplinks_received: u64,
    pub uplinks_committed: u64,
    pub uplinks_rejected: u64,
    pub uplinks_failed: u64,
    pub data_points_written: u64,
    pub ingest_latency_ms_total: u64,
    pub ingest_latency_ms_count: u64,
}
