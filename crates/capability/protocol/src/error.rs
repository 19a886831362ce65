//! 负载解码错误类型定义

use domain::{DomainError, MeasurementKind};

/// 负载解码错误
///
/// 所有变体都属于输入错误（上游报文不合法），不可重试。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// 期望帧字节处没有剩余数据
    #[error("invalid data: missing framing byte at offset {offset}")]
    MissingFramingByte { offset: usize },

    /// 帧字节低 4 位不是已定义的测量类型
    #[error("invalid data: unknown measurement kind {code} at offset {offset}")]
    UnknownKind { offset: usize, code: u8 },

    /// 取值区域字节不足（包括末尾残留字节）
    #[error(
        "invalid data: truncated {kind} record at offset {offset}: need {needed} bytes, {available} available"
    )]
    Truncated {
        offset: usize,
        kind: MeasurementKind,
        needed: usize,
        available: usize,
    },

    /// 领域模型构造失败
    #[error("invalid data: {0}")]
    Domain(#[from] DomainError),
}

impl DecodeError {
    /// 出错记录的帧字节偏移（领域错误没有偏移）。
    pub fn offset(&self) -> Option<usize> {
        match self {
            DecodeError::MissingFramingByte { offset }
            | DecodeError::UnknownKind { offset, .. }
            | DecodeError::Truncated { offset, .. } => Some(*offset),
            DecodeError::Domain(_) => None,
        }
    }
}
