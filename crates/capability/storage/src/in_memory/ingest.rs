//! 接入存储内存实现
//!
//! 仅用于本地测试。
//!
//! 功能：
//! - 设备注册与按 EUI 解析
//! - 事务内写入先暂存，提交时一次性可见，回滚或丢弃时作废
//! - 故障注入（开启事务、解析、写入中途、提交）与人为延迟（解析、回滚）
//! - 事务计数（开启、提交、回滚）

use crate::error::StorageError;
use crate::models::{DeviceRecord, NewMeasurement};
use crate::traits::{IngestStore, IngestTransaction};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use uuid::Uuid;

/// 注入故障的位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePoint {
    Begin,
    Resolve,
    /// 暂存 `after_rows` 行后写入失败
    Insert { after_rows: usize },
    Commit,
}

/// 事务计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransactionStats {
    pub begun: u64,
    pub committed: u64,
    pub rolled_back: u64,
}

#[derive(Default)]
struct InMemoryState {
    devices: HashMap<String, DeviceRecord>,
    measurements: Vec<NewMeasurement>,
    stats: TransactionStats,
    failure: Option<FailurePoint>,
    resolve_delay: Option<Duration>,
    rollback_delay: Option<Duration>,
}

/// 接入内存存储
///
/// 使用 `Arc<RwLock<..>>` 共享状态，事务对象持有同一份状态。
#[derive(Clone, Default)]
pub struct InMemoryIngestStore {
    state: Arc<RwLock<InMemoryState>>,
}

impl InMemoryIngestStore {
    /// 创建空存储
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册设备，返回内部 ID
    pub fn register_device(&self, device_eui: &str) -> Result<Uuid, StorageError> {
        let record = DeviceRecord::new(Uuid::new_v4(), device_eui);
        let device_id = record.device_id;
        let mut state = self.write()?;
        if state.devices.contains_key(device_eui) {
            return Err(StorageError::new("device exists"));
        }
        state.devices.insert(device_eui.to_string(), record);
        Ok(device_id)
    }

    /// 设置故障注入点（None 清除）
    pub fn fail_at(&self, failure: Option<FailurePoint>) {
        if let Ok(mut state) = self.state.write() {
            state.failure = failure;
        }
    }

    /// 设备解析前的人为延迟（用于截止时间测试）
    pub fn delay_resolve(&self, delay: Option<Duration>) {
        if let Ok(mut state) = self.state.write() {
            state.resolve_delay = delay;
        }
    }

    /// 回滚前的人为延迟（用于回滚超时测试）
    pub fn delay_rollback(&self, delay: Option<Duration>) {
        if let Ok(mut state) = self.state.write() {
            state.rollback_delay = delay;
        }
    }

    /// 已提交的测量记录
    pub fn measurements(&self) -> Vec<NewMeasurement> {
        self.state
            .read()
            .map(|state| state.measurements.clone())
            .unwrap_or_default()
    }

    /// 当前事务计数
    pub fn stats(&self) -> TransactionStats {
        self.state
            .read()
            .map(|state| state.stats)
            .unwrap_or_default()
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, InMemoryState>, StorageError> {
        self.state
            .write()
            .map_err(|_| StorageError::new("lock failed"))
    }
}

#[async_trait::async_trait]
impl IngestStore for InMemoryIngestStore {
    async fn begin(&self) -> Result<Box<dyn IngestTransaction>, StorageError> {
        let mut state = self.write()?;
        if state.failure == Some(FailurePoint::Begin) {
            return Err(StorageError::new("injected failure: begin"));
        }
        state.stats.begun += 1;
        Ok(Box::new(InMemoryIngestTransaction {
            state: self.state.clone(),
            staged: Vec::new(),
            finished: false,
        }))
    }

    async fn ping(&self) -> Result<(), StorageError> {
        self.state
            .read()
            .map(|_| ())
            .map_err(|_| StorageError::new("lock failed"))
    }
}

/// 接入内存事务
pub struct InMemoryIngestTransaction {
    state: Arc<RwLock<InMemoryState>>,
    staged: Vec<NewMeasurement>,
    finished: bool,
}

impl InMemoryIngestTransaction {
    fn ensure_active(&self) -> Result<(), StorageError> {
        if self.finished {
            return Err(StorageError::transaction_finished());
        }
        Ok(())
    }

    fn failure(&self) -> Option<FailurePoint> {
        self.state.read().ok().and_then(|state| state.failure)
    }
}

#[async_trait::async_trait]
impl IngestTransaction for InMemoryIngestTransaction {
    async fn resolve_device_by_eui(
        &mut self,
        device_eui: &str,
    ) -> Result<Option<DeviceRecord>, StorageError> {
        self.ensure_active()?;
        let delay = self.state.read().ok().and_then(|state| state.resolve_delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failure() == Some(FailurePoint::Resolve) {
            return Err(StorageError::new("injected failure: resolve"));
        }
        let state = self
            .state
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(state.devices.get(device_eui).cloned())
    }

    async fn insert_measurements(&mut self, batch: &[NewMeasurement]) -> Result<u64, StorageError> {
        self.ensure_active()?;
        if let Some(FailurePoint::Insert { after_rows }) = self.failure() {
            self.staged
                .extend(batch.iter().take(after_rows).cloned());
            return Err(StorageError::new("injected failure: insert"));
        }
        self.staged.extend(batch.iter().cloned());
        Ok(batch.len() as u64)
    }

    async fn commit(&mut self) -> Result<(), StorageError> {
        self.ensure_active()?;
        self.finished = true;
        let mut state = self
            .state
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        if state.failure == Some(FailurePoint::Commit) {
            self.staged.clear();
            return Err(StorageError::new("injected failure: commit"));
        }
        state.measurements.append(&mut self.staged);
        state.stats.committed += 1;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), StorageError> {
        if self.finished {
            return Ok(());
        }
        let delay = self.state.read().ok().and_then(|state| state.rollback_delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.finished = true;
        self.staged.clear();
        let mut state = self
            .state
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        state.stats.rolled_back += 1;
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.finished
    }
}
