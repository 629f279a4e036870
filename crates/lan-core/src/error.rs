//! 统一错误类型定义.
//!
//! 所有 Lan crate 共用的错误类型, 支持跨模块传播.
//!
//! 设计原则: 位游标与 Golomb/VLC 原语除构造外均为全函数 (不返回错误,
//! 越界读取以零填充), 只有构造与 NAL 分割走常规 Result 通道.

use thiserror::Error;

/// Lan 框架统一错误类型
#[derive(Debug, Error)]
pub enum LanError {
    /// 无效参数
    #[error("无效参数: {0}")]
    InvalidArgument(String),

    /// 缓冲区/长度组合会导致内部尺寸运算溢出
    #[error("无效尺寸: {0}")]
    InvalidSize(String),

    /// 无效数据 (损坏的码流, 非法起始码/转义模式等)
    #[error("无效数据: {0}")]
    InvalidData(String),

    /// 已到达流末尾
    #[error("已到达流末尾")]
    Eof,

    /// 内部错误 (不应发生)
    #[error("内部错误: {0}")]
    Internal(String),
}

/// Lan 框架统一 Result 类型
pub type LanResult<T> = Result<T, LanError>;
