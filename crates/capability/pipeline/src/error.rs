use regenfass_protocol::DecodeError;
use regenfass_storage::StorageError;

/// 接入阶段。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestStage {
    Envelope,
    Begin,
    Resolve,
    Decode,
    Persist,
    Commit,
}

impl IngestStage {
    pub fn as_str(self) -> &'static str {
        match self {
            IngestStage::Envelope => "envelope",
            IngestStage::Begin => "begin",
            IngestStage::Resolve => "resolve",
            IngestStage::Decode => "decode",
            IngestStage::Persist => "persist",
            IngestStage::Commit => "commit",
        }
    }
}

impl std::fmt::Display for IngestStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 对调用方暴露的粗粒度错误分类。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// 上游输入不合法（400）
    Client,
    /// 依赖失败或请求被取消（500）
    Server,
}

/// 接入错误。
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("invalid envelope: {0}")]
    InvalidEnvelope(String),
    #[error("invalid payload: {0}")]
    InvalidPayload(#[from] DecodeError),
    #[error("device not found: {0}")]
    DeviceNotFound(String),
    #[error("storage error during {stage}: {source}")]
    Storage {
        stage: IngestStage,
        #[source]
        source: StorageError,
    },
    #[error("deadline exceeded during {stage}")]
    Cancelled { stage: IngestStage },
}

impl IngestError {
    pub fn storage(stage: IngestStage, source: StorageError) -> Self {
        IngestError::Storage { stage, source }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            IngestError::InvalidEnvelope(_) | IngestError::InvalidPayload(_) => ErrorClass::Client,
            IngestError::DeviceNotFound(_)
            | IngestError::Storage { .. }
            | IngestError::Cancelled { .. } => ErrorClass::Server,
        }
    }

    pub fn stage(&self) -> IngestStage {
        match self {
            IngestError::InvalidEnvelope(_) => IngestStage::Envelope,
            IngestError::InvalidPayload(_) => IngestStage::Decode,
            IngestError::DeviceNotFound(_) => IngestStage::Resolve,
            IngestError::Storage { stage, .. } | IngestError::Cancelled { stage } => *stage,
        }
    }
}
