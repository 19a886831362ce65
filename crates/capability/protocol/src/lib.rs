//! # LoRa 上行负载编解码
//!
//! 传感器固件把多个读数紧凑打包为一段字节流，本模块负责双向转换：
//! - **解码**：字节流 → 有序 `DataPoint` 列表（接入链路使用）
//! - **编码**：`DataPoint` 列表 → 字节流（与固件打包逻辑一致，用于测试和工具）
//!
//! ## 线上格式
//!
//! ```text
//! ┌──────────── 帧字节 ────────────┐┌──────── 取值 ────────┐
//! │ bit 7..4 通道 │ bit 3..0 类型  ││ Boolean: 1 字节       │
//! │   (0..=15)    │   (0..=11)     ││ 其他类型: 4 字节 LE f32│
//! └───────────────┴────────────────┘└──────────────────────┘
//! ```
//!
//! 记录首尾相接，无填充、无总长度前缀、无校验和。
//! 没有长度字段，因此未知类型会让剩余字节流无法继续解析，直接报错。
//!
//! ## 使用示例
//!
//! ```rust
//! use regenfass_protocol::decode;
//!
//! let points = decode(&[0x01, 0x00, 0x00, 0x80, 0x3F]).expect("decode");
//! assert_eq!(points.len(), 1);
//! ```

mod decoder;
mod encoder;
mod error;

pub use decoder::{decode, decode_one};
pub use encoder::{encode, encode_into, framing_byte, packed_len};
pub use error::DecodeError;
