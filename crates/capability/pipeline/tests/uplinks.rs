use chrono::{TimeZone, Utc};
use domain::{ChannelId, DataPoint, MeasurementKind, UplinkEnvelope};
use regenfass_pipeline::{ErrorClass, IngestError, IngestPipeline, IngestStage};
use regenfass_protocol::encode;
use regenfass_storage::{FailurePoint, InMemoryIngestStore};
use std::sync::Arc;

const EUI: &str = "70B3D57ED005A1B2";

fn barrel_points() -> Vec<DataPoint> {
    let ch = |value| ChannelId::new(value).expect("channel");
    vec![
        DataPoint::measurement(MeasurementKind::Distance, ch(0), 0.82).expect("point"),
        DataPoint::measurement(MeasurementKind::Distance, ch(1), 0.12).expect("point"),
        DataPoint::measurement(MeasurementKind::Voltage, ch(0), 3.71).expect("point"),
        DataPoint::measurement(MeasurementKind::Temperature, ch(0), 14.5).expect("point"),
        DataPoint::boolean(ch(2), false),
    ]
}

fn envelope(device_eui: &str) -> UplinkEnvelope {
    UplinkEnvelope::new(
        device_eui,
        encode(&barrel_points()),
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
    )
}

#[tokio::test]
async fn unknown_device_commits_nothing() {
    let store = InMemoryIngestStore::new();
    store.register_device(EUI).expect("register");
    let pipeline = IngestPipeline::new(Arc::new(store.clone()));

    let err = pipeline
        .ingest(envelope("FFFFFFFFFFFFFFFF"))
        .await
        .expect_err("unknown device");
    assert!(matches!(err, IngestError::DeviceNotFound(ref eui) if eui == "FFFFFFFFFFFFFFFF"));
    assert_eq!(err.class(), ErrorClass::Server);
    assert_eq!(err.stage(), IngestStage::Resolve);
    assert!(store.measurements().is_empty());
    assert_eq!(store.stats().committed, 0);
    assert_eq!(store.stats().rolled_back, 1);
}

#[tokio::test]
async fn every_point_is_persisted_with_one_device_and_timestamp() {
    let store = InMemoryIngestStore::new();
    let device_id = store.register_device(EUI).expect("register");
    let pipeline = IngestPipeline::new(Arc::new(store.clone()));
    let envelope = envelope(EUI);
    let received_at = envelope.received_at;

    let receipt = pipeline.ingest(envelope).await.expect("ingest");
    assert_eq!(receipt.device_id, device_id);
    assert_eq!(receipt.points, barrel_points().len());

    let rows = store.measurements();
    assert_eq!(rows.len(), barrel_points().len());
    assert!(rows.iter().all(|row| row.device_id == device_id));
    assert!(rows.iter().all(|row| row.received_at == received_at));
    let values: Vec<&str> = rows.iter().map(|row| row.value.as_str()).collect();
    assert_eq!(values, ["0.82", "0.12", "3.71", "14.5", "false"]);
    assert_eq!(store.stats().committed, 1);
}

#[tokio::test]
async fn mid_batch_failure_leaves_no_rows() {
    let store = InMemoryIngestStore::new();
    store.register_device(EUI).expect("register");
    store.fail_at(Some(FailurePoint::Insert { after_rows: 3 }));
    let pipeline = IngestPipeline::new(Arc::new(store.clone()));

    let err = pipeline.ingest(envelope(EUI)).await.expect_err("insert fails");
    assert_eq!(err.stage(), IngestStage::Persist);
    assert!(store.measurements().is_empty());
    assert_eq!(store.stats().rolled_back, 1);

    store.fail_at(None);
    pipeline.ingest(envelope(EUI)).await.expect("retry by caller");
    assert_eq!(store.measurements().len(), barrel_points().len());
}

#[tokio::test]
async fn concurrent_uplinks_are_independent() {
    let store = InMemoryIngestStore::new();
    store.register_device(EUI).expect("register");
    let pipeline = IngestPipeline::new(Arc::new(store.clone()));

    let mut handles = Vec::new();
    for index in 0..8 {
        let pipeline = pipeline.clone();
        let device_eui = if index % 4 == 3 { "0000000000000000" } else { EUI };
        handles.push(tokio::spawn(async move {
            pipeline.ingest(envelope(device_eui)).await
        }));
    }
    let mut failed = 0;
    for handle in handles {
        if handle.await.expect("join").is_err() {
            failed += 1;
        }
    }

    assert_eq!(failed, 2);
    assert_eq!(store.stats().committed, 6);
    assert_eq!(store.stats().rolled_back, 2);
    assert_eq!(store.measurements().len(), 6 * barrel_points().len());
}
