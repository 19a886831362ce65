//! 事务守卫
//!
//! 持有事务句柄，约定：
//! - 只有成功路径调用 `commit`
//! - 其他所有退出路径显式调用 `rollback`
//! - `rollback` 幂等，提交之后调用为空操作

use regenfass_storage::{IngestTransaction, StorageError};
use tracing::warn;

pub struct TransactionGuard {
    tx: Option<Box<dyn IngestTransaction>>,
}

impl TransactionGuard {
    pub fn new(tx: Box<dyn IngestTransaction>) -> Self {
        Self { tx: Some(tx) }
    }

    /// 当前活动事务；已结束时返回错误。
    pub fn transaction(
        &mut self,
    ) -> Result<&mut (dyn IngestTransaction + 'static), StorageError> {
        self.tx
            .as_deref_mut()
            .ok_or_else(StorageError::transaction_finished)
    }

    /// 提交事务。无论成功与否，守卫此后都处于结束状态。
    pub async fn commit(&mut self) -> Result<(), StorageError> {
        let mut tx = self.tx.take().ok_or_else(StorageError::transaction_finished)?;
        tx.commit().await
    }

    /// 回滚事务；已结束时为空操作。
    pub async fn rollback(&mut self) -> Result<(), StorageError> {
        match self.tx.take() {
            Some(mut tx) => tx.rollback().await,
            None => Ok(()),
        }
    }

    /// 守卫已交出事务，或底层事务已提交/回滚。
    pub fn is_finished(&self) -> bool {
        self.tx.as_ref().is_none_or(|tx| tx.is_finished())
    }
}

impl Drop for TransactionGuard {
    fn drop(&mut self) {
        if !self.is_finished() {
            // 请求 future 被丢弃；由事务实现自身在 drop 时作废未提交数据
            warn!(target: "regenfass.ingest", "transaction_guard_dropped_unfinished");
        }
    }
}
