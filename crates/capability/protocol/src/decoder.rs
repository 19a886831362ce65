//! 负载解码
//!
//! 以显式偏移作为游标，在不可变字节切片上逐条解码；
//! 每条记录消耗 `1 + width(kind)` 字节，整段负载必须恰好消耗完。

use crate::error::DecodeError;
use domain::{ChannelId, DataPoint, MeasurementKind};

/// 解码整段负载
///
/// 空输入返回空列表。任一记录不合法时整体失败，不返回部分结果。
///
/// # 参数
/// - `bytes`：base64 解码后的原始负载
///
/// # 返回
/// - `Result<Vec<DataPoint>, DecodeError>`：按帧字节出现顺序排列的数据点
pub fn decode(bytes: &[u8]) -> Result<Vec<DataPoint>, DecodeError> {
    let mut points = Vec::new();
    let mut offset = 0;
    while offset < bytes.len() {
        let (point, next) = decode_one(bytes, offset)?;
        points.push(point);
        offset = next;
    }
    Ok(points)
}

/// 从 `offset` 处解码一条记录
///
/// 返回数据点和下一条记录的起始偏移。
pub fn decode_one(bytes: &[u8], offset: usize) -> Result<(DataPoint, usize), DecodeError> {
    let framing = *bytes
        .get(offset)
        .ok_or(DecodeError::MissingFramingByte { offset })?;
    let code = framing & 0x0F;
    let kind =
        MeasurementKind::from_code(code).ok_or(DecodeError::UnknownKind { offset, code })?;
    let channel = ChannelId::from_framing_byte(framing);
    let start = offset + 1;

    let point = match kind {
        MeasurementKind::Boolean => {
            let [flag] = take::<1>(bytes, start, offset, kind)?;
            DataPoint::boolean(channel, flag != 0)
        }
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
        | MeasurementKind::SoundLevel => {
            let raw = take::<4>(bytes, start, offset, kind)?;
            DataPoint::measurement(kind, channel, f32::from_le_bytes(raw))?
        }
    };

    Ok((point, start + kind.width()))
}

fn take<const N: usize>(
    bytes: &[u8],
    start: usize,
    offset: usize,
    kind: MeasurementKind,
) -> Result<[u8; N], DecodeError> {
    bytes
        .get(start..)
        .and_then(|rest| rest.get(..N))
        .and_then(|region| region.try_into().ok())
        .ok_or(DecodeError::Truncated {
            offset,
            kind,
            needed: N,
            available: bytes.len().saturating_sub(start),
        })
}
