//! 存储接口 Trait 定义
//!
//! 定义接入链路依赖的异步接口：
//! - IngestStore：开启事务、健康检查
//! - IngestTransaction：事务内的设备解析、批量写入与提交/回滚
//!
//! 设计原则：
//! - 所有写操作都在调用方持有的事务内执行
//! - 所有接口返回 StorageError
//! - 使用 async_trait 支持动态分发

use crate::error::StorageError;
use crate::models::{DeviceRecord, NewMeasurement};
use async_trait::async_trait;

/// 接入存储接口
#[async_trait]
pub trait IngestStore: Send + Sync {
    /// 开启事务（SERIALIZABLE、READ WRITE、NOT DEFERRABLE）
    async fn begin(&self) -> Result<Box<dyn IngestTransaction>, StorageError>;

    /// 检查存储可达性
    async fn ping(&self) -> Result<(), StorageError>;
}

/// 接入事务接口
///
/// 提交或回滚之后事务即结束：
/// - 结束后再调用 `resolve_device_by_eui`、`insert_measurements`、`commit` 返回错误
/// - 结束后再调用 `rollback` 为空操作，返回 `Ok(())`
#[async_trait]
pub trait IngestTransaction: Send {
    /// 根据外部 EUI 查找设备
    async fn resolve_device_by_eui(
        &mut self,
        device_eui: &str,
    ) -> Result<Option<DeviceRecord>, StorageError>;

    /// 批量写入测量记录（单次操作），返回写入行数
    async fn insert_measurements(&mut self, batch: &[NewMeasurement]) -> Result<u64, StorageError>;

    /// 提交事务
    async fn commit(&mut self) -> Result<(), StorageError>;

    /// 回滚事务（幂等）
    async fn rollback(&mut self) -> Result<(), StorageError>;

    /// 事务是否已结束
    fn is_finished(&self) -> bool;
}
