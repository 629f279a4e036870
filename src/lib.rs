//! # Lan (澜)
//!
//! 纯 Rust 实现的比特流解码引擎, 对标 FFmpeg 的 bitstream/golomb/h2645
//! 公共解析层.
//!
//! Lan 提供码流解析的三层基础能力:
//! - **位游标**: 33-64 位窗口的位级读/窥/跳, 软末尾零填充, 可配置位序
//! - **熵编码原语**: Exp-Golomb 与 Golomb-Rice 读写, VLC 多级表解码
//! - **NAL 分割**: Annex B/长度前缀封装分割与 RBSP 去转义
//!
//! # 快速开始
//!
//! ```rust
//! use lan::core::BitCursor;
//! use lan::core::golomb::read_ue_golomb;
//!
//! // 码字序列: 1 | 010 | 011 (值 0, 1, 2)
//! let data = [0b10100110];
//! let mut bc = BitCursor::from_bytes(&data).unwrap();
//! assert_eq!(read_ue_golomb(&mut bc), 0);
//! assert_eq!(read_ue_golomb(&mut bc), 1);
//! assert_eq!(read_ue_golomb(&mut bc), 2);
//! ```
//!
//! # Crate 结构
//!
//! | Crate | 功能 |
//! |-------|------|
//! | `lan-core` | 位游标, 位写入器, Golomb/VLC 原语 |
//! | `lan-codec` | NAL 单元分割与 RBSP 去转义 |

/// 位级读写与熵编码原语 (对标 libavutil/bitstream 层)
pub use lan_core as core;

/// NAL 分割与 RBSP 去转义 (对标 libavcodec 的 h2645 解析层)
pub use lan_codec as codec;

/// 获取 Lan 版本号
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
