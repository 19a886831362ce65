//! Handlers 模块

pub mod health;
pub mod ingest;
pub mod metrics;

pub use health::*;
pub use ingest::*;
pub use metrics::*;
