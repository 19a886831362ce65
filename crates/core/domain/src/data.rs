use chrono::{DateTime, Utc};

/// 领域模型构造错误。
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    #[error("unknown measurement kind code: {0}")]
    UnknownKind(u8),
    #[error("channel id out of range: {0}")]
    ChannelOutOfRange(u8),
    #[error("value does not match measurement kind {0:?}")]
    ValueKindMismatch(MeasurementKind),
}

/// 测量类型（帧字节低 4 位）。
///
/// 0..=11 为已定义类型，12..=15 保留；保留值不是合法类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MeasurementKind {
    Boolean = 0b0000,
    Float = 0b0001,
    Pressure = 0b0010,
    Voltage = 0b0011,
    Distance = 0b0100,
    Temperature = 0b0101,
    PPx = 0b0110,
    Brightness = 0b0111,
    Resistance = 0b1000,
    Humidity = 0b1001,
    PH = 0b1010,
    SoundLevel = 0b1011,
}

impl MeasurementKind {
    /// 全部已定义类型，按编码升序。
    pub const ALL: [MeasurementKind; 12] = [
        MeasurementKind::Boolean,
        MeasurementKind::Float,
        MeasurementKind::Pressure,
        MeasurementKind::Voltage,
        MeasurementKind::Distance,
        MeasurementKind::Temperature,
        MeasurementKind::PPx,
        MeasurementKind::Brightness,
        MeasurementKind::Resistance,
        MeasurementKind::Humidity,
        MeasurementKind::PH,
        MeasurementKind::SoundLevel,
    ];

    /// 线上编码（0..=11）。
    pub fn code(self) -> u8 {
        self as u8
    }

    /// 从 4 位编码解析类型；保留值返回 None。
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(usize::from(code)).copied()
    }

    /// 值区域字节宽度。
    pub fn width(self) -> usize {
        match self {
            MeasurementKind::Boolean => 1,
            MeasurementKind::Float
            | MeasurementKind::Pressure
            | MeasurementKind::Voltage
            | MeasurementKind::Distance
            | MeasurementKind::Temperature
            | MeasurementKind::PPx
            | MeasurementKind::Brightness
            | MeasurementKind::Resistance
            | MeasurementKind::Humidity
            | MeasurementKind::PH
            | MeasurementKind::SoundLevel => 4,
        }
    }

    pub fn is_boolean(self) -> bool {
        matches!(self, MeasurementKind::Boolean)
    }

    /// 日志与存储使用的稳定名称。
    pub fn as_str(self) -> &'static str {
        match self {
            MeasurementKind::Boolean => "boolean",
            MeasurementKind::Float => "float",
            MeasurementKind::Pressure => "pressure",
            MeasurementKind::Voltage => "voltage",
            MeasurementKind::Distance => "distance",
            MeasurementKind::Temperature => "temperature",
            MeasurementKind::PPx => "ppx",
            MeasurementKind::Brightness => "brightness",
            MeasurementKind::Resistance => "resistance",
            MeasurementKind::Humidity => "humidity",
            MeasurementKind::PH => "ph",
            MeasurementKind::SoundLevel => "sound_level",
        }
    }
}

impl TryFrom<u8> for MeasurementKind {
    type Error = DomainError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or(DomainError::UnknownKind(code))
    }
}

impl std::fmt::Display for MeasurementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 传感器通道（帧字节高 4 位，0..=15）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(u8);

impl ChannelId {
    pub const MAX: u8 = 0x0F;

    pub fn new(value: u8) -> Result<Self, DomainError> {
        if value > Self::MAX {
            return Err(DomainError::ChannelOutOfRange(value));
        }
        Ok(Self(value))
    }

    /// 取帧字节的高 4 位。
    pub fn from_framing_byte(byte: u8) -> Self {
        Self(byte >> 4)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 数据点取值：布尔或单精度测量值。
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DataValue {
    Boolean(bool),
    Measurement(f32),
}

/// 解码后的单个数据点。
///
/// 类型与取值一一对应：Boolean 类型只能携带 `DataValue::Boolean`，
/// 其余类型只能携带 `DataValue::Measurement`。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataPoint {
    kind: MeasurementKind,
    channel: ChannelId,
    value: DataValue,
}

impl DataPoint {
    pub fn new(
        kind: MeasurementKind,
        channel: ChannelId,
        value: DataValue,
    ) -> Result<Self, DomainError> {
        let consistent = match value {
            DataValue::Boolean(_) => kind.is_boolean(),
            DataValue::Measurement(_) => !kind.is_boolean(),
        };
        if !consistent {
            return Err(DomainError::ValueKindMismatch(kind));
        }
        Ok(Self {
            kind,
            channel,
            value,
        })
    }

    /// 构造布尔数据点。
    pub fn boolean(channel: ChannelId, value: bool) -> Self {
        Self {
            kind: MeasurementKind::Boolean,
            channel,
            value: DataValue::Boolean(value),
        }
    }

    /// 构造测量数据点（kind 不能是 Boolean）。
    pub fn measurement(
        kind: MeasurementKind,
        channel: ChannelId,
        value: f32,
    ) -> Result<Self, DomainError> {
        Self::new(kind, channel, DataValue::Measurement(value))
    }

    pub fn kind(&self) -> MeasurementKind {
        self.kind
    }

    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    pub fn value(&self) -> DataValue {
        self.value
    }
}

/// 一次上行请求的报文（仅在请求期间存在）。
#[derive(Debug, Clone)]
pub struct UplinkEnvelope {
    pub device_eui: String,
    pub payload: Vec<u8>,
    pub received_at: DateTime<Utc>,
}

impl UplinkEnvelope {
    pub fn new(
        device_eui: impl Into<String>,
        payload: Vec<u8>,
        received_at: DateTime<Utc>,
    ) -> Self {
        Self {
            device_eui: device_eui.into(),
            payload,
            received_at,
        }
    }
}
