//! 上行接入流水线：开启事务 → 解析设备 → 解码负载 → 批量写入 → 提交。
//!
//! 每个请求独立执行，请求之间不共享内存状态，并发写入的协调交给存储层的
//! SERIALIZABLE 隔离。流水线内部不做重试，一次失败即一次失败结果。

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use domain::UplinkEnvelope;
use regenfass_protocol::decode;
use regenfass_storage::{IngestStore, NewMeasurement, StorageError};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

mod error;
mod guard;

pub use error::{ErrorClass, IngestError, IngestStage};
pub use guard::TransactionGuard;

/// 接入成功结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReceipt {
    pub device_id: Uuid,
    pub points: usize,
}

/// Pipeline 参数。
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// 单次接入的截止时间（None 表示不限制）
    pub deadline: Option<Duration>,
    /// 失败路径上回滚的最长等待；超时后放弃等待，由事务句柄在 drop 时回滚
    pub rollback_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            deadline: Some(Duration::from_secs(10)),
            rollback_timeout: Duration::from_secs(2),
        }
    }
}

/// 上行接入流水线。
#[derive(Clone)]
pub struct IngestPipeline {
    store: Arc<dyn IngestStore>,
    config: PipelineConfig,
}

impl IngestPipeline {
    pub fn new(store: Arc<dyn IngestStore>) -> Self {
        Self::with_config(store, PipelineConfig::default())
    }

    pub fn with_config(store: Arc<dyn IngestStore>, config: PipelineConfig) -> Self {
        Self { store, config }
    }

    /// HTTP 层入口：base64 解码负载后接入。
    pub async fn ingest_uplink(
        &self,
        device_eui: &str,
        payload_base64: &str,
        received_at: DateTime<Utc>,
    ) -> Result<IngestReceipt, IngestError> {
        let device_eui = device_eui.trim();
        if device_eui.is_empty() {
            return Err(IngestError::InvalidEnvelope("dev_eui required".to_string()));
        }
        let payload = STANDARD
            .decode(payload_base64.trim())
            .map_err(|err| IngestError::InvalidEnvelope(format!("frm_payload: {err}")))?;
        debug!(
            target: "regenfass.ingest",
            device_eui = %device_eui,
            decoded = %hex::encode(&payload),
            raw = %payload_base64,
            "parsed_payload"
        );
        self.ingest(UplinkEnvelope::new(device_eui, payload, received_at))
            .await
    }

    /// 使用配置的截止时间接入。
    pub async fn ingest(&self, envelope: UplinkEnvelope) -> Result<IngestReceipt, IngestError> {
        let deadline = self.config.deadline.map(|timeout| Instant::now() + timeout);
        self.ingest_until(envelope, deadline).await
    }

    /// 在给定截止时间前完成接入；超时则回滚。
    ///
    /// 截止时间在提交前再检查一次：调用方已经放弃的请求不会被提交。
    pub async fn ingest_until(
        &self,
        envelope: UplinkEnvelope,
        deadline: Option<Instant>,
    ) -> Result<IngestReceipt, IngestError> {
        let tx = within(deadline, IngestStage::Begin, self.store.begin()).await?;
        let mut guard = TransactionGuard::new(tx);

        let receipt = match persist(&mut guard, &envelope, deadline).await {
            Ok(receipt) => receipt,
            Err(err) => {
                self.abort(&mut guard, &envelope, &err).await;
                return Err(err);
            }
        };

        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            let err = IngestError::Cancelled {
                stage: IngestStage::Commit,
            };
            self.abort(&mut guard, &envelope, &err).await;
            return Err(err);
        }

        guard
            .commit()
            .await
            .map_err(|source| IngestError::storage(IngestStage::Commit, source))?;

        info!(
            target: "regenfass.ingest",
            device_eui = %envelope.device_eui,
            device_id = %receipt.device_id,
            points = receipt.points,
            received_at = %envelope.received_at,
            "uplink_committed"
        );
        Ok(receipt)
    }

    /// 失败路径回滚。
    ///
    /// 截止时间可能已经过去，回滚单独受 `rollback_timeout` 约束；
    /// 超时即丢弃回滚 future，连同其中的事务句柄一起 drop。
    async fn abort(
        &self,
        guard: &mut TransactionGuard,
        envelope: &UplinkEnvelope,
        err: &IngestError,
    ) {
        match tokio::time::timeout(self.config.rollback_timeout, guard.rollback()).await {
            Ok(Ok(())) => {}
            Ok(Err(rollback_err)) => warn!(
                target: "regenfass.ingest",
                device_eui = %envelope.device_eui,
                stage = %err.stage(),
                error = %rollback_err,
                "rollback_failed"
            ),
            Err(_) => warn!(
                target: "regenfass.ingest",
                device_eui = %envelope.device_eui,
                stage = %err.stage(),
                timeout_ms = self.config.rollback_timeout.as_millis() as u64,
                "rollback_timed_out"
            ),
        }
    }
}

async fn persist(
    guard: &mut TransactionGuard,
    envelope: &UplinkEnvelope,
    deadline: Option<Instant>,
) -> Result<IngestReceipt, IngestError> {
    let tx = guard
        .transaction()
        .map_err(|source| IngestError::storage(IngestStage::Resolve, source))?;
    let device = within(
        deadline,
        IngestStage::Resolve,
        tx.resolve_device_by_eui(&envelope.device_eui),
    )
    .await?
    .ok_or_else(|| IngestError::DeviceNotFound(envelope.device_eui.clone()))?;
    debug!(
        target: "regenfass.ingest",
        device_eui = %envelope.device_eui,
        device_id = %device.device_id,
        "device_resolved"
    );

    let points = decode(&envelope.payload)?;
    let batch: Vec<NewMeasurement> = points
        .iter()
        .map(|point| NewMeasurement::from_point(device.device_id, point, envelope.received_at))
        .collect();

    let tx = guard
        .transaction()
        .map_err(|source| IngestError::storage(IngestStage::Persist, source))?;
    let written = within(deadline, IngestStage::Persist, tx.insert_measurements(&batch)).await?;
    if written != batch.len() as u64 {
        return Err(IngestError::storage(
            IngestStage::Persist,
            StorageError::new(format!("wrote {written} of {} measurements", batch.len())),
        ));
    }

    Ok(IngestReceipt {
        device_id: device.device_id,
        points: batch.len(),
    })
}

async fn within<T, F>(
    deadline: Option<Instant>,
    stage: IngestStage,
    operation: F,
) -> Result<T, IngestError>
where
    F: Future<Output = Result<T, StorageError>>,
{
    let result = match deadline {
        Some(deadline) => tokio::time::timeout_at(deadline, operation)
            .await
            .map_err(|_| IngestError::Cancelled { stage })?,
        None => operation.await,
    };
    result.map_err(|source| IngestError::storage(stage, source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use regenfass_storage::{FailurePoint, InMemoryIngestStore};

    const EUI: &str = "70B3D57ED005A1B2";

    fn setup(config: PipelineConfig) -> (InMemoryIngestStore, IngestPipeline) {
        let store = InMemoryIngestStore::new();
        store.register_device(EUI).expect("register");
        let pipeline = IngestPipeline::with_config(Arc::new(store.clone()), config);
        (store, pipeline)
    }

    fn received_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn ingests_float_and_boolean_points() {
        let (store, pipeline) = setup(PipelineConfig::default());
        // 01 00 00 80 3F 10 01
        let receipt = pipeline
            .ingest_uplink(EUI, "AQAAgD8QAQ==", received_at())
            .await
            .expect("ingest");
        assert_eq!(receipt.points, 2);

        let rows = store.measurements();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].value, "1.0");
        assert_eq!(rows[1].value, "true");
        assert_eq!(rows[1].channel.value(), 1);
        assert!(rows.iter().all(|row| row.device_id == receipt.device_id));
        assert!(rows.iter().all(|row| row.received_at == received_at()));
    }

    #[tokio::test]
    async fn empty_payload_commits_nothing() {
        let (store, pipeline) = setup(PipelineConfig::default());
        let receipt = pipeline
            .ingest_uplink(EUI, "", received_at())
            .await
            .expect("ingest");
        assert_eq!(receipt.points, 0);
        assert!(store.measurements().is_empty());
        assert_eq!(store.stats().committed, 1);
    }

    #[tokio::test]
    async fn bad_base64_is_client_error_without_transaction() {
        let (store, pipeline) = setup(PipelineConfig::default());
        let err = pipeline
            .ingest_uplink(EUI, "not base64!", received_at())
            .await
            .expect_err("invalid");
        assert_eq!(err.class(), ErrorClass::Client);
        assert_eq!(err.stage(), IngestStage::Envelope);
        assert_eq!(store.stats().begun, 0);
    }

    #[tokio::test]
    async fn blank_device_eui_is_client_error() {
        let (_store, pipeline) = setup(PipelineConfig::default());
        let err = pipeline
            .ingest_uplink("  ", "EAE=", received_at())
            .await
            .expect_err("invalid");
        assert!(matches!(err, IngestError::InvalidEnvelope(_)));
    }

    #[tokio::test]
    async fn undecodable_payload_rolls_back_as_client_error() {
        let (store, pipeline) = setup(PipelineConfig::default());
        let err = pipeline
            .ingest(UplinkEnvelope::new(EUI, vec![0x10, 0x01, 0x01], received_at()))
            .await
            .expect_err("truncated");
        assert_eq!(err.class(), ErrorClass::Client);
        assert_eq!(err.stage(), IngestStage::Decode);
        assert_eq!(store.stats().rolled_back, 1);
        assert!(store.measurements().is_empty());
    }

    #[tokio::test]
    async fn storage_failures_are_server_errors() {
        let cases = [
            (FailurePoint::Begin, IngestStage::Begin),
            (FailurePoint::Resolve, IngestStage::Resolve),
            (FailurePoint::Insert { after_rows: 1 }, IngestStage::Persist),
            (FailurePoint::Commit, IngestStage::Commit),
        ];
        for (failure, stage) in cases {
            let (store, pipeline) = setup(PipelineConfig::default());
            store.fail_at(Some(failure));
            let err = pipeline
                .ingest(UplinkEnvelope::new(
                    EUI,
                    vec![0x10, 0x01, 0x20, 0x00],
                    received_at(),
                ))
                .await
                .expect_err("failure");
            assert_eq!(err.class(), ErrorClass::Server, "{failure:?}");
            assert_eq!(err.stage(), stage, "{failure:?}");
            assert!(store.measurements().is_empty(), "{failure:?}");
        }
    }

    #[tokio::test]
    async fn deadline_during_resolve_rolls_back() {
        let (store, pipeline) = setup(PipelineConfig {
            deadline: Some(Duration::from_millis(20)),
            ..PipelineConfig::default()
        });
        store.delay_resolve(Some(Duration::from_millis(500)));
        let err = pipeline
            .ingest(UplinkEnvelope::new(EUI, vec![0x10, 0x01], received_at()))
            .await
            .expect_err("cancelled");
        assert!(matches!(
            err,
            IngestError::Cancelled {
                stage: IngestStage::Resolve
            }
        ));
        assert_eq!(err.class(), ErrorClass::Server);
        assert_eq!(store.stats().rolled_back, 1);
        assert_eq!(store.stats().committed, 0);
    }

    #[tokio::test]
    async fn elapsed_deadline_never_commits() {
        let (store, pipeline) = setup(PipelineConfig {
            deadline: None,
            ..PipelineConfig::default()
        });
        let err = pipeline
            .ingest_until(
                UplinkEnvelope::new(EUI, vec![0x10, 0x01], received_at()),
                Some(Instant::now()),
            )
            .await
            .expect_err("cancelled");
        assert_eq!(err.class(), ErrorClass::Server);
        assert_eq!(store.stats().committed, 0);
        assert_eq!(store.stats().rolled_back, 1);
        assert!(store.measurements().is_empty());
    }

    #[tokio::test]
    async fn hung_rollback_does_not_outlive_its_timeout() {
        let (store, pipeline) = setup(PipelineConfig {
            deadline: Some(Duration::from_millis(20)),
            rollback_timeout: Duration::from_millis(50),
        });
        store.delay_resolve(Some(Duration::from_millis(500)));
        store.delay_rollback(Some(Duration::from_secs(30)));

        let started = Instant::now();
        let err = pipeline
            .ingest(UplinkEnvelope::new(EUI, vec![0x10, 0x01], received_at()))
            .await
            .expect_err("cancelled");
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(err.stage(), IngestStage::Resolve);
        assert_eq!(store.stats().committed, 0);
        assert!(store.measurements().is_empty());
    }
}
