//! 数据模型
//!
//! 定义接入链路使用的存储数据结构：
//! - 设备模型：DeviceRecord（外部 EUI → 内部 ID）
//! - 测量模型：NewMeasurement（待写入的一条测量记录）

use chrono::{DateTime, Utc};
use domain::{ChannelId, DataPoint, DataValue, MeasurementKind};
use uuid::Uuid;

/// 设备记录（仅包含接入链路需要的字段）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRecord {
    pub device_id: Uuid,
    pub device_eui: String,
}

impl DeviceRecord {
    pub fn new(device_id: Uuid, device_eui: impl Into<String>) -> Self {
        Self {
            device_id,
            device_eui: device_eui.into(),
        }
    }
}

/// 待写入的测量记录。
///
/// `value` 为取值的序列化形态，布尔与浮点共用同一存储列。
#[derive(Debug, Clone, PartialEq)]
pub struct NewMeasurement {
    pub device_id: Uuid,
    pub kind: MeasurementKind,
    pub channel: ChannelId,
    pub value: String,
    pub received_at: DateTime<Utc>,
}

impl NewMeasurement {
    /// 由解码后的数据点构造测量记录。
    pub fn from_point(device_id: Uuid, point: &DataPoint, received_at: DateTime<Utc>) -> Self {
        Self {
            device_id,
            kind: point.kind(),
            channel: point.channel(),
            value: serialize_value(point.value()),
            received_at,
        }
    }
}

/// 取值序列化为 JSON 文本：布尔为 `true`/`false`，浮点按 f32 最短表示，
/// NaN 与无穷为 `null`。
pub fn serialize_value(value: DataValue) -> String {
    let json = match value {
        DataValue::Boolean(v) => serde_json::to_string(&v),
        DataValue::Measurement(v) => serde_json::to_string(&v),
    };
    json.unwrap_or_else(|_| "null".to_string())
}
