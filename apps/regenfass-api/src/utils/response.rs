//! HTTP 响应辅助函数
//!
//! 所有错误返回统一的 ApiResponse 格式：
//! - 400：INVALID.REQUEST
//! - 500：INTERNAL.ERROR

use api_contract::ApiResponse;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use regenfass_pipeline::{ErrorClass, IngestError};
use regenfass_storage::StorageError;

/// 错误请求响应
pub fn bad_request_error(message: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::<()>::error("INVALID.REQUEST", message.into())),
    )
        .into_response()
}

/// 服务端错误响应
pub fn internal_error(message: impl Into<String>) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiResponse::<()>::error("INTERNAL.ERROR", message.into())),
    )
        .into_response()
}

/// 存储错误响应
pub fn storage_error(err: StorageError) -> Response {
    internal_error(err.to_string())
}

/// 接入错误响应：只暴露粗粒度分类与简短说明，细节留在日志
pub fn ingest_error(err: &IngestError) -> Response {
    match err.class() {
        ErrorClass::Client => bad_request_error(err.to_string()),
        ErrorClass::Server => internal_error(format!("ingest failed at {}", err.stage())),
    }
}
