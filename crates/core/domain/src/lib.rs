//! Regenfass 领域模型：上行报文、测量类型、通道与数据点。

pub mod data;

pub use data::{
    ChannelId, DataPoint, DataValue, DomainError, MeasurementKind, UplinkEnvelope,
};
