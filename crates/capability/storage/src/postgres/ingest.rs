//! Postgres 接入事务实现
//!
//! 设计要点：
//! - 事务开启后第一条语句设置隔离级别（SERIALIZABLE、READ WRITE、NOT DEFERRABLE）
//! - 测量记录使用单条多行 INSERT 批量写入
//! - 事务句柄提交/回滚后置空，之后的回滚为空操作

use crate::connection::{connect_pool, ping};
use crate::error::StorageError;
use crate::models::{DeviceRecord, NewMeasurement};
use crate::traits::{IngestStore, IngestTransaction};
use sqlx::{PgPool, Postgres, QueryBuilder, Row, Transaction};

pub struct PgIngestStore {
    pub pool: PgPool,
}

impl PgIngestStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StorageError> {
        let pool = connect_pool(database_url, max_connections).await?;
        Ok(Self { pool })
    }
}

#[async_trait::async_trait]
impl IngestStore for PgIngestStore {
    async fn begin(&self) -> Result<Box<dyn IngestTransaction>, StorageError> {
        let mut tx = self.pool.begin().await?;
        let isolation = sqlx::query(
            "set transaction isolation level serializable, read write, not deferrable",
        )
        .execute(&mut *tx)
        .await;
        if let Err(err) = isolation {
            tx.rollback().await?;
            return Err(err.into());
        }
        Ok(Box::new(PgIngestTransaction { tx: Some(tx) }))
    }

    async fn ping(&self) -> Result<(), StorageError> {
        ping(&self.pool).await
    }
}

/// Postgres 接入事务
pub struct PgIngestTransaction {
    tx: Option<Transaction<'static, Postgres>>,
}

impl PgIngestTransaction {
    fn active(&mut self) -> Result<&mut Transaction<'static, Postgres>, StorageError> {
        self.tx.as_mut().ok_or_else(StorageError::transaction_finished)
    }
}

#[async_trait::async_trait]
impl IngestTransaction for PgIngestTransaction {
    async fn resolve_device_by_eui(
        &mut self,
        device_eui: &str,
    ) -> Result<Option<DeviceRecord>, StorageError> {
        let tx = self.active()?;
        let row = sqlx::query("select id, device_eui from devices where device_eui = $1")
            .bind(device_eui)
            .fetch_optional(&mut **tx)
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(DeviceRecord {
            device_id: row.try_get("id")?,
            device_eui: row.try_get("device_eui")?,
        }))
    }

    async fn insert_measurements(&mut self, batch: &[NewMeasurement]) -> Result<u64, StorageError> {
        let tx = self.active()?;
        if batch.is_empty() {
            return Ok(0);
        }
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "insert into measurements (device_id, measurement_type, channel_id, value, received_at) ",
        );
        builder.push_values(batch, |mut row, measurement| {
            row.push_bind(measurement.device_id)
                .push_bind(i16::from(measurement.kind.code()))
                .push_bind(i16::from(measurement.channel.value()))
                .push_bind(measurement.value.as_str())
                .push_bind(measurement.received_at);
        });
        let result = builder.build().execute(&mut **tx).await?;
        Ok(result.rows_affected())
    }

    async fn commit(&mut self) -> Result<(), StorageError> {
        let tx = self.tx.take().ok_or_else(StorageError::transaction_finished)?;
        tx.commit().await?;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), StorageError> {
        if let Some(tx) = self.tx.take() {
            tx.rollback().await?;
        }
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.tx.is_none()
    }
}
