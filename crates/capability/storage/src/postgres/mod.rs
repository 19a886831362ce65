//! # PostgreSQL 存储实现模块
//!
//! 本模块提供接入存储接口的 PostgreSQL 实现，用于生产环境。
//!
//! ## 设计原则
//!
//! 1. **事务隔离**：每次上行请求一个事务，隔离级别 SERIALIZABLE，READ WRITE，NOT DEFERRABLE
//! 2. **参数化查询**：所有 SQL 查询使用参数绑定，防止 SQL 注入攻击
//! 3. **批量写入**：同一上行的所有测量记录使用一条多行 INSERT 写入
//! 4. **连接池管理**：使用连接池复用数据库连接
//!
//! ## 包含的实现
//!
//! - **IngestStore** (`ingest.rs`)：开启事务、健康检查
//! - **IngestTransaction** (`ingest.rs`)：设备解析、测量写入、提交/回滚
//!
//! ## 数据库模式要求
//!
//! 本模块依赖以下数据库表（由外部迁移工具维护）：
//!
//! - `devices`：设备表（id uuid, device_eui text unique, ...）
//! - `measurements`：测量表（device_id uuid, measurement_type smallint,
//!   channel_id smallint, value text, received_at timestamptz）
//!
//! `measurement_type` 与 `channel_id` 保存线上编码（分别为帧字节低/高 4 位），
//! `value` 保存取值的 JSON 文本（`true`/`false` 或数字，非有限浮点为 `null`）。
//!
//! ## 事务与取消
//!
//! 事务句柄在提交或回滚后置空。请求 future 被丢弃时，sqlx 的
//! `Transaction` 在 drop 时发起回滚，未提交的数据不会可见。
//!
//! ## 错误处理
//!
//! 所有存储操作返回 `Result<T, StorageError>`：
//!
//! - `sqlx::Error`：自动转换为 `StorageError`
//! - 返回 `Option<T>` 表示"可能不存在"（设备解析）

pub mod ingest;

pub use ingest::*;
