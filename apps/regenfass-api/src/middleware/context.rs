//! 请求上下文中间件
//!
//! - 上游（网络服务器或反向代理）带来 `x-request-id` 时沿用，否则新生成
//! - trace_id 总是新生成
//! - 请求结束记录状态码与耗时，并把两个 ID 写回响应头

use axum::{
    body::Body,
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use regenfass_telemetry::new_request_ids;
use std::time::Instant;
use tracing::{Instrument, info, info_span};

pub const REQUEST_ID_HEADER: &str = "x-request-id";
pub const TRACE_ID_HEADER: &str = "x-trace-id";

/// 沿用的上游 ID 最大长度
const MAX_INBOUND_ID_LEN: usize = 128;

pub async fn request_context(mut req: Request<Body>, next: Next) -> Response {
    let mut ids = new_request_ids();
    if let Some(upstream) = inbound_id(req.headers(), REQUEST_ID_HEADER) {
        ids.request_id = upstream;
    }
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    req.extensions_mut().insert(ids.clone());

    let span = info_span!(
        "request",
        request_id = %ids.request_id,
        trace_id = %ids.trace_id,
        method = %method,
        path = %path
    );
    let started = Instant::now();
    let mut response = next.run(req).instrument(span.clone()).await;
    span.in_scope(|| {
        info!(
            target: "regenfass.api",
            status = response.status().as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "request_completed"
        )
    });

    set_header(&mut response, REQUEST_ID_HEADER, &ids.request_id);
    set_header(&mut response, TRACE_ID_HEADER, &ids.trace_id);
    response
}

fn inbound_id(headers: &HeaderMap, name: &str) -> Option<String> {
    let value = headers.get(name)?.to_str().ok()?.trim();
    if value.is_empty() || value.len() > MAX_INBOUND_ID_LEN {
        return None;
    }
    Some(value.to_string())
}

fn set_header(response: &mut Response, name: &'static str, value: &str) {
    if let Ok(value) = HeaderValue::from_str(value) {
        response.headers_mut().insert(name, value);
    }
}
