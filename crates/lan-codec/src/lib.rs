//! # lan-codec
//!
//! 澜比特流引擎码流层: NAL 单元分割、RBSP 去转义与类型分类.
//!
//! 本 crate 对标 FFmpeg 的 h2645 公共解析层, 把传输包切分为带
//! 位游标的 NAL 单元, 供 H.264/HEVC 语法解析器消费.
//!
//! ## 使用示例
//!
//! ```rust
//! use lan_codec::{split_packet, NalCodec, NalFraming};
//!
//! let buf = [0x00, 0x00, 0x01, 0x26, 0x01, 0xAF];
//! let pkt = split_packet(&buf, NalFraming::AnnexB, NalCodec::Hevc).unwrap();
//! assert_eq!(pkt.len(), 1);
//! assert_eq!(pkt.nals[0].nal_type, 19);
//! ```

pub mod nal;
pub mod types;

// 重导出常用类型
pub use nal::{extract_rbsp, split_packet, NalCodec, NalFraming, NalPacket, NalUnit, RBSP_PADDING};
pub use types::{H264NalType, HevcNalType};
