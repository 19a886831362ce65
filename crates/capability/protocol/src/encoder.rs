//! 负载编码（与传感器固件的打包逻辑对应）

use domain::{DataPoint, DataValue};

/// 计算帧字节：高 4 位通道，低 4 位类型。
pub fn framing_byte(point: &DataPoint) -> u8 {
    (point.channel().value() << 4) | point.kind().code()
}

/// 打包后的总字节数
pub fn packed_len(points: &[DataPoint]) -> usize {
    points.iter().map(|point| 1 + point.kind().width()).sum()
}

/// 把数据点追加写入 `out`
pub fn encode_into(points: &[DataPoint], out: &mut Vec<u8>) {
    out.reserve(packed_len(points));
    for point in points {
        out.push(framing_byte(point));
        match point.value() {
            DataValue::Boolean(value) => out.push(u8::from(value)),
            DataValue::Measurement(value) => out.extend_from_slice(&value.to_le_bytes()),
        }
    }
}

/// 把数据点打包为负载字节
pub fn encode(points: &[DataPoint]) -> Vec<u8> {
    let mut out = Vec::with_capacity(packed_len(points));
    encode_into(points, &mut out);
    out
}
