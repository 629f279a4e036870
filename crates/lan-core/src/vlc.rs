//! VLC (变长编码) 表构建与多级解码.
//!
//! 表为稠密的 `2^bits` 一级数组, 后接按需追加的子表; 逃逸条目的
//! `len` 存 `-sub_bits`, 符号槽存子表基址. 表构建一次后只读,
//! 可在多个解码器之间共享.
//!
//! 普通符号表与 (level, run) 游程表共用同一套构建与逐级升级算法,
//! 仅条目布局不同.

use std::collections::BTreeMap;

use log::warn;

use crate::bitcursor::BitCursor;
use crate::{LanError, LanResult};

/// 普通 VLC 条目
///
/// `len > 0`: 终结码, 消费 len 位得到 sym;
/// `len < 0`: 逃逸, 再取 -len 位并以 sym 为子表基址重查;
/// `len == 0`: 非法码字 (sym 固定为 -1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VlcEntry {
    pub sym: i16,
    pub len: i8,
}

/// 游程 VLC 条目 (DCT 系数类 level+run 联合码)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RlVlcEntry {
    pub level: i16,
    pub run: u8,
    pub len: i8,
}

/// 条目布局抽象: 构建器与解码器对两种条目共用同一套算法
trait VlcEntryKind: Copy {
    type Payload: Copy;

    fn invalid() -> Self;
    fn terminal(payload: Self::Payload, len: i8) -> Self;
    fn escape(base: usize, sub_bits: i8) -> Self;
    fn len(&self) -> i8;
    /// 逃逸条目的子表基址 (终结条目上无意义)
    fn base(&self) -> usize;
}

impl VlcEntryKind for VlcEntry {
    type Payload = i16;

    fn invalid() -> Self {
        Self { sym: -1, len: 0 }
    }
    fn terminal(payload: i16, len: i8) -> Self {
        Self { sym: payload, len }
    }
    fn escape(base: usize, sub_bits: i8) -> Self {
        Self {
            sym: base as i16,
            len: -sub_bits,
        }
    }
    fn len(&self) -> i8 {
        self.len
    }
    fn base(&self) -> usize {
        self.sym as u16 as usize
    }
}

impl VlcEntryKind for RlVlcEntry {
    type Payload = (i16, u8);

    fn invalid() -> Self {
        Self {
            level: 0,
            run: 0,
            len: 0,
        }
    }
    fn terminal((level, run): (i16, u8), len: i8) -> Self {
        Self { level, run, len }
    }
    fn escape(base: usize, sub_bits: i8) -> Self {
        Self {
            level: base as i16,
            run: 0,
            len: -sub_bits,
        }
    }
    fn len(&self) -> i8 {
        self.len
    }
    fn base(&self) -> usize {
        self.level as u16 as usize
    }
}

/// 构建期的一条待分配码字 (右对齐码字 + 剩余长度 + 载荷)
#[derive(Clone, Copy)]
struct CodeDesc<P: Copy> {
    len: u32,
    code: u32,
    payload: P,
}

/// 递归构建一级/子表, 返回本级在 `table` 中的基址.
///
/// 终结码按 `2^(nb_bits-len)` 展开填充; 更长的码按 nb_bits 前缀
/// 分组, 每组建一个子表, 子表位宽取组内最大剩余长度与 nb_bits
/// 的较小者.
fn build_table<E: VlcEntryKind>(
    table: &mut Vec<E>,
    nb_bits: u32,
    codes: &[CodeDesc<E::Payload>],
) -> LanResult<usize> {
    let base = table.len();
    table.resize(base + (1usize << nb_bits), E::invalid());

    let mut groups: BTreeMap<u32, Vec<CodeDesc<E::Payload>>> = BTreeMap::new();

    for c in codes {
        if c.len == 0 {
            continue;
        }
        if c.len <= nb_bits {
            let padding = nb_bits - c.len;
            let start = (c.code as usize) << padding;
            for extra in 0..(1usize << padding) {
                let slot = base + (start | extra);
                if table[slot].len() != 0 {
                    warn!("VLC 码字冲突: code={:#x} len={}", c.code, c.len);
                    return Err(LanError::InvalidData(format!(
                        "VLC 码字冲突: code={:#x} len={}",
                        c.code, c.len
                    )));
                }
                table[slot] = E::terminal(c.payload, c.len as i8);
            }
        } else {
            let rest = c.len - nb_bits;
            groups.entry(c.code >> rest).or_default().push(CodeDesc {
                len: rest,
                code: c.code & ((1 << rest) - 1),
                payload: c.payload,
            });
        }
    }

    for (prefix, subcodes) in groups {
        let slot = base + prefix as usize;
        if table[slot].len() != 0 {
            warn!("VLC 前缀冲突: prefix={:#x}", prefix);
            return Err(LanError::InvalidData(format!(
                "VLC 前缀冲突: prefix={:#x}",
                prefix
            )));
        }
        let max_rest = subcodes.iter().map(|c| c.len).max().unwrap_or(1);
        let sub_bits = max_rest.min(nb_bits);
        let sub_base = build_table(table, sub_bits, &subcodes)?;
        if sub_base > i16::MAX as usize {
            return Err(LanError::InvalidSize(format!(
                "VLC 表过大: 子表基址 {} 超出条目容量",
                sub_base
            )));
        }
        table[slot] = E::escape(sub_base, sub_bits as i8);
    }

    Ok(base)
}

fn check_code(len: u8, code: u32) -> LanResult<()> {
    if len > 32 {
        return Err(LanError::InvalidArgument(format!("VLC 码长 {} 超过 32", len)));
    }
    if len > 0 && len < 32 && code >= (1 << len) {
        return Err(LanError::InvalidArgument(format!(
            "VLC 码字 {:#x} 超出 {} 位",
            code, len
        )));
    }
    Ok(())
}

/// 普通符号 VLC 表
pub struct VlcTable {
    bits: u32,
    table: Vec<VlcEntry>,
}

impl VlcTable {
    /// 从 (码长, 码字, 符号) 列表构建, `bits` 为一级表位宽
    pub fn new(bits: u32, codes: &[(u8, u32, i16)]) -> LanResult<Self> {
        if bits == 0 || bits > 16 {
            return Err(LanError::InvalidArgument(format!(
                "VLC 一级表位宽 {} 不在 1-16 之内",
                bits
            )));
        }
        let mut descs = Vec::with_capacity(codes.len());
        for &(len, code, sym) in codes {
            check_code(len, code)?;
            descs.push(CodeDesc {
                len: len as u32,
                code,
                payload: sym,
            });
        }
        let mut table = Vec::new();
        build_table(&mut table, bits, &descs)?;
        Ok(Self { bits, table })
    }

    /// 一级表位宽
    pub fn bits(&self) -> u32 {
        self.bits
    }
}

/// 游程 VLC 表 (level + run 联合码)
pub struct RlVlcTable {
    bits: u32,
    table: Vec<RlVlcEntry>,
}

impl RlVlcTable {
    /// 从 (码长, 码字, level, run) 列表构建
    pub fn new(bits: u32, codes: &[(u8, u32, i16, u8)]) -> LanResult<Self> {
        if bits == 0 || bits > 16 {
            return Err(LanError::InvalidArgument(format!(
                "VLC 一级表位宽 {} 不在 1-16 之内",
                bits
            )));
        }
        let mut descs = Vec::with_capacity(codes.len());
        for &(len, code, level, run) in codes {
            check_code(len, code)?;
            descs.push(CodeDesc {
                len: len as u32,
                code,
                payload: (level, run),
            });
        }
        let mut table = Vec::new();
        build_table(&mut table, bits, &descs)?;
        Ok(Self { bits, table })
    }

    /// 一级表位宽
    pub fn bits(&self) -> u32 {
        self.bits
    }
}

/// 逐级升级解码: 两种条目布局共用的协议
///
/// 一级窥视 bits 位; 命中逃逸条目且还有深度预算时, 消费 bits 位,
/// 再取 -len 位叠加子表基址重查, 最多升级到 max_depth 级; 最终
/// 消费终结码长 (非法码字码长为 0, 即一级非法码不消费任何位).
fn read_vlc_generic<E: VlcEntryKind>(
    bc: &mut BitCursor,
    table: &[E],
    bits: u32,
    max_depth: u32,
) -> E {
    let mut index = bc.peek_bits(bits) as usize;
    let mut entry = table[index];
    let mut n = entry.len() as i32;

    if n < 0 && max_depth > 1 {
        bc.skip_bits(bits);
        let nb = (-n) as u32;
        index = bc.peek_bits(nb) as usize + entry.base();
        entry = table[index];
        n = entry.len() as i32;

        if n < 0 && max_depth > 2 {
            bc.skip_bits(nb);
            let nb = (-n) as u32;
            index = bc.peek_bits(nb) as usize + entry.base();
            entry = table[index];
            n = entry.len() as i32;
        }
    }

    bc.skip_bits(n.max(0) as u32);
    entry
}

/// 解码一个符号, 非法码字返回 -1
pub fn read_vlc(bc: &mut BitCursor, table: &VlcTable, bits: u32, max_depth: u32) -> i32 {
    debug_assert_eq!(bits, table.bits);
    read_vlc_generic(bc, &table.table, bits, max_depth).sym as i32
}

/// 解码一个 (level, run) 对, 非法码字返回 (0, 0)
pub fn read_rl_vlc(
    bc: &mut BitCursor,
    table: &RlVlcTable,
    bits: u32,
    max_depth: u32,
) -> (i32, u8) {
    debug_assert_eq!(bits, table.bits);
    let e = read_vlc_generic(bc, &table.table, bits, max_depth);
    (e.level as i32, e.run)
}
