//! 追踪、请求 ID 生成与接入指标。

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::{EnvFilter, fmt};

/// 请求级追踪标识。
#[derive(Debug, Clone)]
pub struct RequestIds {
    pub request_id: String,
    pub trace_id: String,
}

/// 接入指标快照。
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsSnapshot {
    pub uplinks_received: u64,
    pub uplinks_committed: u64,
    pub uplinks_rejected: u64,
    pub uplinks_failed: u64,
    pub data_points_written: u64,
    pub ingest_latency_ms_total: u64,
    pub ingest_latency_ms_count: u64,
}

/// 接入指标。
pub struct TelemetryMetrics {
    uplinks_received: AtomicU64,
    uplinks_committed: AtomicU64,
    uplinks_rejected: AtomicU64,
    uplinks_failed: AtomicU64,
    data_points_written: AtomicU64,
    ingest_latency_ms_total: AtomicU64,
    ingest_latency_ms_count: AtomicU64,
}

impl TelemetryMetrics {
    pub fn new() -> Self {
        Self {
            uplinks_received: AtomicU64::new(0),
            uplinks_committed: AtomicU64::new(0),
            uplinks_rejected: AtomicU64::new(0),
            uplinks_failed: AtomicU64::new(0),
            data_points_written: AtomicU64::new(0),
            ingest_latency_ms_total: AtomicU64::new(0),
            ingest_latency_ms_count: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            uplinks_received: self.uplinks_received.load(Ordering::Relaxed),
            uplinks_committed: self.uplinks_committed.load(Ordering::Relaxed),
            uplinks_rejected: self.uplinks_rejected.load(Ordering::Relaxed),
            uplinks_failed: self.uplinks_failed.load(Ordering::Relaxed),
            data_points_written: self.data_points_written.load(Ordering::Relaxed),
            ingest_latency_ms_total: self.ingest_latency_ms_total.load(Ordering::Relaxed),
            ingest_latency_ms_count: self.ingest_latency_ms_count.load(Ordering::Relaxed),
        }
    }
}

impl Default for TelemetryMetrics {
    fn default() -> Self {
        Self::new()
    }
}

static METRICS: OnceLock<TelemetryMetrics> = OnceLock::new();

/// 获取全局指标实例。
pub fn metrics() -> &'static TelemetryMetrics {
    METRICS.get_or_init(TelemetryMetrics::new)
}

/// 初始化 tracing。
///
/// 优先使用 `RUST_LOG`，未设置时回退到 `default_level`。
pub fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

/// 生成新的 request_id 与 trace_id。
pub fn new_request_ids() -> RequestIds {
    RequestIds {
        request_id: uuid::Uuid::new_v4().to_string(),
        trace_id: uuid::Uuid::new_v4().to_string(),
    }
}

/// 记录上行接收次数。
pub fn record_uplink_received() {
    metrics().uplinks_received.fetch_add(1, Ordering::Relaxed);
}

/// 记录上行提交成功次数与写入的数据点数。
pub fn record_uplink_committed(points: usize) {
    let metrics = metrics();
    metrics.uplinks_committed.fetch_add(1, Ordering::Relaxed);
    metrics
        .data_points_written
        .fetch_add(points as u64, Ordering::Relaxed);
}

/// 记录因输入不合法被拒绝的次数（400）。
pub fn record_uplink_rejected() {
    metrics().uplinks_rejected.fetch_add(1, Ordering::Relaxed);
}

/// 记录因依赖失败或超时失败的次数（500）。
pub fn record_uplink_failed() {
    metrics().uplinks_failed.fetch_add(1, Ordering::Relaxed);
}

/// 记录单次接入耗时（毫秒）。
pub fn record_ingest_latency_ms(latency_ms: u64) {
    let metrics = metrics();
    metrics
        .ingest_latency_ms_total
        .fetch_add(latency_ms, Ordering::Relaxed);
    metrics
        .ingest_latency_ms_count
        .fetch_add(1, Ordering::Relaxed);
}
