//! 内存存储实现模块
//!
//! 仅用于本地测试。
//!
//! 包含以下实现：
//! - IngestStore / IngestTransaction: InMemoryIngestStore

pub mod ingest;

pub use ingest::*;
