//! 健康检查
//!
//! - GET /healthz：数据库可达返回 200 `ok`，否则 500

use crate::AppState;
use crate::utils::storage_error;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::warn;

pub async fn healthz(State(state): State<AppState>) -> Response {
    match state.store.ping().await {
        Ok(()) => (StatusCode::OK, "ok").into_response(),
        Err(err) => {
            warn!(target: "regenfass.api", error = %err, "health_check_failed");
            storage_error(err)
        }
    }
}
