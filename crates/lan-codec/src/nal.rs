//! NAL (Network Abstraction Layer) 单元分割与 RBSP 去转义.
//!
//! 支持 H.264 与 HEVC 两种 NAL 头部, 以及两种封装:
//!
//! - **Annex B**: 起始码 `00 00 01` 分隔, 容忍前导零 (`00 00 00 01`);
//! - **长度前缀** (AVCC/HVCC 风格): 每单元前置 1-4 字节大端长度.
//!
//! # RBSP 去转义
//!
//! 码流内以 `00 00 03` 转义序列防止载荷冒充起始码, 去转义即
//! `00 00 03 → 00 00` 的 3 换 2 替换. 转义极罕见 (约 1:2^22),
//! 无转义时输出直接借用输入切片, 零分配零拷贝.

use std::borrow::Cow;

use log::{debug, error};

use lan_core::{BitCursor, LanError, LanResult};

use crate::types::{H264NalType, HevcNalType};

/// RBSP 缓冲区尾部零填充字节数, 供下游越读安全
pub const RBSP_PADDING: usize = 32;

/// NAL 头部语法选择
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NalCodec {
    /// H.264/AVC: 1 字节头部
    H264,
    /// H.265/HEVC: 2 字节头部
    Hevc,
}

/// NAL 单元封装方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NalFraming {
    /// `00 00 01` 起始码分隔
    AnnexB,
    /// 大端长度前缀, 参数为前缀字节数 (1-4)
    LengthPrefixed(u8),
}

/// 一个已分割并去转义的 NAL 单元
#[derive(Debug, Clone)]
pub struct NalUnit<'a> {
    /// 原始 (含转义) 字节跨度, 指向调用方的包缓冲区
    pub raw: &'a [u8],
    /// RBSP 数据: 无转义时借用 raw, 有转义时为去转义副本
    pub data: Cow<'a, [u8]>,
    /// 去除停止位与尾随零之后的位长度
    pub size_bits: u32,
    /// NAL 单元类型编号
    pub nal_type: u8,
    /// 时域层 id (HEVC: temporal_id_plus1 - 1; H.264 恒为 0)
    pub temporal_id: u8,
    /// 参考重要性 (H.264; HEVC 恒为 0)
    pub ref_idc: u8,
    /// nuh_layer_id (HEVC; 分割结果中恒为 0, 非零单元已被丢弃)
    pub layer_id: u8,
    /// 头部语法 (决定 cursor 跳过的头部位数)
    codec: NalCodec,
}

impl NalUnit<'_> {
    /// RBSP 字节数据
    pub fn rbsp(&self) -> &[u8] {
        &self.data
    }

    /// 头部占用的位数
    pub fn header_bits(&self) -> u32 {
        match self.codec {
            NalCodec::H264 => 8,
            NalCodec::Hevc => 16,
        }
    }

    /// 构造定位在头部之后的位游标, 供语法元素解析使用
    pub fn cursor(&self) -> LanResult<BitCursor<'_>> {
        let mut bc = BitCursor::new(&self.data, self.size_bits)?;
        bc.skip_bits(self.header_bits());
        Ok(bc)
    }
}

/// 一个传输包分割出的 NAL 单元集合
#[derive(Debug, Default)]
pub struct NalPacket<'a> {
    /// 分割出的单元 (被丢弃的单元不在其中)
    pub nals: Vec<NalUnit<'a>>,
}

impl<'a> NalPacket<'a> {
    /// 单元数量
    pub fn len(&self) -> usize {
        self.nals.len()
    }

    /// 是否不含任何单元
    pub fn is_empty(&self) -> bool {
        self.nals.is_empty()
    }

    /// 遍历单元
    pub fn iter(&self) -> std::slice::Iter<'_, NalUnit<'a>> {
        self.nals.iter()
    }
}

/// 在 `src[..length]` 内定位首个 `00 00 0X (X ≤ 3)` 三元组.
///
/// 8 字节一组做 SWAR 零字节粗筛, 命中后标量定位; 与逐字节扫描
/// 语义等价, 但对无零数据每次跳过 8 字节. 返回 (截断后的长度,
/// 首个转义位置): X < 3 是起始码, 截断长度; X == 3 是转义.
fn scan_escape(src: &[u8], mut length: usize) -> (usize, Option<usize>) {
    let mut i = 0usize;
    while i + 2 < length {
        if src[i] != 0 {
            if i + 8 <= length {
                let w = u64::from_ne_bytes(src[i..i + 8].try_into().unwrap());
                if (!w & w.wrapping_sub(0x0101_0101_0101_0101)) & 0x8080_8080_8080_8080 == 0 {
                    // 8 字节内无零
                    i += 8;
                    continue;
                }
            }
            i += 1;
            continue;
        }
        if src[i + 1] == 0 && src[i + 2] <= 3 {
            if src[i + 2] != 3 {
                // 起始码: 本单元到此为止
                length = i;
                return (length, None);
            }
            return (length, Some(i));
        }
        i += 1;
    }
    (length, None)
}

/// 提取 RBSP: 去除 `00 00 03` 转义, 遇到下一个起始码则截断.
///
/// 返回 (RBSP 数据, 消费的原始字节数). 无转义时借用输入且
/// `消费数 == RBSP 长度`; 有转义时分配 [`RBSP_PADDING`] 余量的
/// 副本 (填充零写入容量后截掉, 长度保持语义长度).
pub fn extract_rbsp(src: &[u8]) -> (Cow<'_, [u8]>, usize) {
    let (length, escape) = scan_escape(src, src.len());

    let i = match escape {
        None => return (Cow::Borrowed(&src[..length]), length),
        Some(i) => i,
    };

    let mut dst = Vec::with_capacity(length + RBSP_PADDING);
    dst.extend_from_slice(&src[..i]);

    let mut si = i;
    let mut next_start = false;
    while si + 2 < length {
        // 转义极罕见: 两字节快进
        if src[si + 2] > 3 {
            dst.push(src[si]);
            dst.push(src[si + 1]);
            si += 2;
        } else if src[si] == 0 && src[si + 1] == 0 && src[si + 2] != 0 {
            if src[si + 2] == 3 {
                dst.push(0);
                dst.push(0);
                si += 3;
                continue;
            } else {
                // 下一个起始码
                next_start = true;
                break;
            }
        }
        dst.push(src[si]);
        si += 1;
    }
    if !next_start {
        while si < length {
            dst.push(src[si]);
            si += 1;
        }
    }

    let size = dst.len();
    dst.resize(size + RBSP_PADDING, 0);
    dst.truncate(size);

    (Cow::Owned(dst), si)
}

/// 计算去除停止位与尾随零之后的位长度
fn get_bit_length(data: &[u8], skip_trailing_zeros: bool) -> LanResult<u32> {
    let mut size = data.len();
    while skip_trailing_zeros && size > 0 && data[size - 1] == 0 {
        size -= 1;
    }
    if size == 0 {
        return Ok(0);
    }
    if size > (i32::MAX / 8) as usize {
        return Err(LanError::InvalidSize(format!("NAL 单元过大: {} 字节", size)));
    }

    let v = data[size - 1];
    let mut bits = (size * 8) as u32;
    // 去掉停止位及其后的零位; v == 0 (未裁剪的受损码流) 保持原样
    if v != 0 {
        bits -= v.trailing_zeros() + 1;
    }
    Ok(bits)
}

/// 头部解析结论: 保留或丢弃该单元
enum HeaderVerdict {
    Keep,
    Skip,
}

struct NalHeader {
    nal_type: u8,
    temporal_id: u8,
    ref_idc: u8,
    layer_id: u8,
    verdict: HeaderVerdict,
}

fn parse_hevc_header(bc: &mut BitCursor) -> LanResult<NalHeader> {
    if bc.read_bit() != 0 {
        return Err(LanError::InvalidData("HEVC: forbidden_zero_bit 非零".into()));
    }
    let nal_type = bc.read_bits(6) as u8;
    let layer_id = bc.read_bits(6) as u8;
    let temporal_id_plus1 = bc.read_bits(3);
    if temporal_id_plus1 == 0 {
        return Err(LanError::InvalidData(
            "HEVC: nuh_temporal_id_plus1 为 0".into(),
        ));
    }

    debug!(
        "nal_unit_type: {}, nuh_layer_id: {}, temporal_id: {}",
        nal_type,
        layer_id,
        temporal_id_plus1 - 1
    );

    Ok(NalHeader {
        nal_type,
        temporal_id: (temporal_id_plus1 - 1) as u8,
        ref_idc: 0,
        layer_id,
        // 基本层之外的单元不进入输出
        verdict: if layer_id == 0 {
            HeaderVerdict::Keep
        } else {
            HeaderVerdict::Skip
        },
    })
}

fn parse_h264_header(bc: &mut BitCursor) -> LanResult<NalHeader> {
    if bc.read_bit() != 0 {
        return Err(LanError::InvalidData(
            "H.264: forbidden_zero_bit 非零".into(),
        ));
    }
    let ref_idc = bc.read_bits(2) as u8;
    let nal_type = bc.read_bits(5) as u8;

    debug!("nal_unit_type: {}, nal_ref_idc: {}", nal_type, ref_idc);

    Ok(NalHeader {
        nal_type,
        temporal_id: 0,
        ref_idc,
        layer_id: 0,
        verdict: HeaderVerdict::Keep,
    })
}

/// 将一个传输包分割为 NAL 单元序列.
///
/// 封装层错误 (非法起始码, 长度前缀越界或为零) 中止整个分割;
/// 头部层错误 (forbidden 位, 非法 temporal_id) 仅丢弃该单元并
/// 记录日志, 分割继续 —— 由上层依据剩余单元决定怎么处置.
pub fn split_packet<'a>(
    buf: &'a [u8],
    framing: NalFraming,
    codec: NalCodec,
) -> LanResult<NalPacket<'a>> {
    if let NalFraming::LengthPrefixed(n) = framing {
        if n == 0 || n > 4 {
            return Err(LanError::InvalidArgument(format!(
                "长度前缀字节数 {} 不在 1-4 之内",
                n
            )));
        }
    }

    let mut pkt = NalPacket::default();
    let mut buf = buf;

    while buf.len() >= 4 {
        let extract_length;
        match framing {
            NalFraming::LengthPrefixed(n) => {
                let n = n as usize;
                let mut len = 0usize;
                for &b in &buf[..n] {
                    len = (len << 8) | b as usize;
                }
                buf = &buf[n..];

                if len > buf.len() {
                    error!("无效的 NAL 单元长度: {} > 剩余 {}", len, buf.len());
                    return Err(LanError::InvalidData(format!(
                        "NAL 单元长度 {} 超出剩余缓冲区",
                        len
                    )));
                }
                if len == 0 {
                    return Err(LanError::InvalidData("NAL 单元长度为 0".into()));
                }
                extract_length = len;
            }
            NalFraming::AnnexB => {
                if buf[2] == 0 {
                    // 容忍前导零 (00 00 00 01), 一次退让一个字节
                    buf = &buf[1..];
                    continue;
                }
                if buf[0] != 0 || buf[1] != 0 || buf[2] != 1 {
                    return Err(LanError::InvalidData("未找到 Annex B 起始码".into()));
                }
                buf = &buf[3..];
                extract_length = buf.len();
            }
        }

        let (data, consumed) = extract_rbsp(&buf[..extract_length]);

        // 遗留复用模式: 单元后紧跟 00 00 01 E0 时不裁剪尾随零
        let skip_trailing_zeros = !(consumed + 4 <= buf.len()
            && buf[consumed] == 0x00
            && buf[consumed + 1] == 0x00
            && buf[consumed + 2] == 0x01
            && buf[consumed + 3] == 0xE0);

        let size_bits = get_bit_length(&data, skip_trailing_zeros)?;

        let mut bc = BitCursor::new(&data, size_bits)?;
        let header = match codec {
            NalCodec::Hevc => parse_hevc_header(&mut bc),
            NalCodec::H264 => parse_h264_header(&mut bc),
        };

        match header {
            Ok(h) => match h.verdict {
                HeaderVerdict::Keep => {
                    match codec {
                        NalCodec::H264 => {
                            debug!("保留单元: {}", H264NalType::from_type_id(h.nal_type))
                        }
                        NalCodec::Hevc => {
                            debug!("保留单元: {}", HevcNalType::from_type_id(h.nal_type))
                        }
                    }
                    pkt.nals.push(NalUnit {
                        raw: &buf[..consumed],
                        data,
                        size_bits,
                        nal_type: h.nal_type,
                        temporal_id: h.temporal_id,
                        ref_idc: h.ref_idc,
                        layer_id: h.layer_id,
                        codec,
                    })
                }
                HeaderVerdict::Skip => {
                    debug!("丢弃 nuh_layer_id 非零的 NAL 单元, type={}", h.nal_type);
                }
            },
            Err(e) => {
                error!("无效的 NAL 单元, 丢弃: {}", e);
            }
        }

        buf = &buf[consumed..];
    }

    Ok(pkt)
}
