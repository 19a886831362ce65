//! Regenfass 上行接入 HTTP 服务。
//!
//! 启动流程：加载 .env → 读取配置 → 初始化日志 → 连接数据库并确认可达 →
//! 装配接入流水线 → 监听 HTTP。

mod handlers;
mod middleware;
mod routes;
mod utils;

use regenfass_config::AppConfig;
use regenfass_pipeline::{IngestPipeline, PipelineConfig};
use regenfass_storage::{IngestStore, PgIngestStore};
use regenfass_telemetry::init_tracing;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<IngestPipeline>,
    pub store: Arc<dyn IngestStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn IngestStore>, config: PipelineConfig) -> Self {
        let pipeline = Arc::new(IngestPipeline::with_config(store.clone(), config));
        Self { pipeline, store }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 加载本地 .env（如存在），便于直接 cargo run 启动
    dotenvy::dotenv().ok();
    // 从环境变量加载运行配置
    let config = AppConfig::from_env()?;
    // 初始化结构化日志
    init_tracing(&config.log_level);

    // Postgres 接入存储（需先执行 devices/measurements 建表）
    let store = PgIngestStore::connect(&config.database_url, config.db_max_connections).await?;
    store.ping().await?;
    info!(target: "regenfass.api", "database is reachable");

    let state = AppState::new(
        Arc::new(store),
        PipelineConfig {
            deadline: config.ingest_timeout,
            ..PipelineConfig::default()
        },
    );
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.http_addr).await?;
    info!(target: "regenfass.api", http_addr = %config.http_addr, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}
