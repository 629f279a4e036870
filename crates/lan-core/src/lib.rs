//! # lan-core
//!
//! 澜比特流引擎核心库: 位游标、位写入器、Exp-Golomb/Golomb-Rice 编解码
//! 与 VLC 表驱动解码.
//!
//! 本 crate 对标 FFmpeg 的 bitstream/golomb 层, 为上层码流解析
//! (如 `lan-codec` 的 NAL 分割) 提供位级读写基础设施.
//!
//! ## 设计约定
//!
//! - 位游标构造后所有读/窥/跳操作均为全函数: 越过流末尾读取返回
//!   零填充位, 不报错也不 panic, 使流尾附近的推测性窥视无需特判.
//! - 位序 (高位在前/低位在前) 为构造期配置, 影响所有位级操作.
//! - 查找表延迟构建一次, 此后只读, 可跨解码器共享.

pub mod bitcursor;
pub mod bitwriter;
pub mod error;
pub mod golomb;
pub mod vlc;

// 重导出常用类型
pub use bitcursor::{BitCursor, BitOrder};
pub use bitwriter::BitWriter;
pub use error::{LanError, LanResult};
pub use golomb::INVALID_CODE;
pub use vlc::{RlVlcEntry, RlVlcTable, VlcEntry, VlcTable};
