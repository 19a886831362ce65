//! 应用运行配置加载。

use std::env;
use std::time::Duration;

/// 配置加载错误。
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env: {0}")]
    Missing(String),
    #[error("invalid value for {0}: {1}")]
    Invalid(String, String),
}

/// 应用运行配置。
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub http_addr: String,
    pub database_url: String,
    pub log_level: String,
    pub db_max_connections: u32,
    /// 单次接入的截止时间；配置为 0 表示不限制
    pub ingest_timeout: Option<Duration>,
}

impl AppConfig {
    /// 从环境变量读取配置。
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = read_optional("REGENFASS_DATABASE_URL")
            .ok_or_else(|| ConfigError::Missing("REGENFASS_DATABASE_URL".to_string()))?;
        let http_addr =
            env::var("REGENFASS_HTTP_ADDR").unwrap_or_else(|_| "0.0.0.0:64000".to_string());
        let log_level = read_optional("REGENFASS_LOG_LEVEL").unwrap_or_else(|| "info".to_string());
        let db_max_connections = read_u32_with_default("REGENFASS_DB_MAX_CONNECTIONS", 8)?;
        if db_max_connections == 0 {
            return Err(ConfigError::Invalid(
                "REGENFASS_DB_MAX_CONNECTIONS".to_string(),
                "0".to_string(),
            ));
        }
        let ingest_timeout = Some(read_u64_with_default("REGENFASS_INGEST_TIMEOUT_MS", 10_000)?)
            .filter(|millis| *millis > 0)
            .map(Duration::from_millis);

        Ok(Self {
            http_addr,
            database_url,
            log_level,
            db_max_connections,
            ingest_timeout,
        })
    }
}

fn read_u32_with_default(key: &str, default: u32) -> Result<u32, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<u32>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_u64_with_default(key: &str, default: u64) -> Result<u64, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<u64>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_optional(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(value) if !value.is_empty() => Some(value),
        _ => None,
    }
}
