//! Exp-Golomb 与 Golomb-Rice 码读写原语.
//!
//! 全部读取函数以 [`BitCursor`] 为底座, 写入函数以 [`BitWriter`] 为底座,
//! 自身无状态; 同名读写对严格互逆.
//!
//! # 两段式解码
//!
//! ue/se 读取先窥视 9 位: 高 5 位非零时命中 512 项查找表 (快路径,
//! 一次查表 + 一次跳位); 否则退回 "窥视 32 位 + 前导零计数" 的通用慢路径.
//! 交织 (svq3/dirac) 变体使用 8 位交织表, 表未命中时按半字节对累积.
//!
//! # 错误语义
//!
//! 码流畸形时这些原语产出无意义但不崩溃的值; 仅两类例外:
//! - 交织变体在停止位出现前耗尽流或超出续读轮数上限时返回
//!   [`INVALID_CODE`];
//! - jpegls 一元前缀在 limit 内未终止时返回 `InvalidData`.

use std::sync::OnceLock;

use crate::bitcursor::BitCursor;
use crate::bitwriter::BitWriter;
use crate::{LanError, LanResult};

/// 结构性非法码字的哨兵值, 保留在正常取值域之外
pub const INVALID_CODE: u32 = 0x8000_0000;

/// 交织慢路径的防御性迭代上限: 每轮累积 4 位尾数, 超过 8 轮必然溢出 32 位
const INTERLEAVED_MAX_ROUNDS: u32 = 8;

// ============================================================
// 预计算表
// ============================================================

/// 9 位前缀 Exp-Golomb 查找表 (快路径)
struct ExpGolombTables {
    /// 码长 (对超出 9 位可判定范围的前缀为推算长度)
    vlc_len: [u8; 512],
    /// 无符号解码值
    ue_code: [u8; 512],
    /// 有符号解码值
    se_code: [i8; 512],
    /// 写入侧: 值 0-255 的 ue 码长
    ue_len: [u8; 256],
}

/// 8 位前缀交织 Exp-Golomb 查找表
struct InterleavedTables {
    /// 码长, 9 表示 "8 位内未终止, 续读"
    len: [u8; 256],
    /// 无符号解码值 (len == 9 的项假定第 9 位为停止位)
    ue_code: [u8; 256],
    /// 已聚集的尾数位 (供慢路径逐轮累积)
    dirac_code: [u8; 256],
}

fn exp_golomb_tables() -> &'static ExpGolombTables {
    static TABLES: OnceLock<ExpGolombTables> = OnceLock::new();
    TABLES.get_or_init(build_exp_golomb_tables)
}

fn interleaved_tables() -> &'static InterleavedTables {
    static TABLES: OnceLock<InterleavedTables> = OnceLock::new();
    TABLES.get_or_init(build_interleaved_tables)
}

fn build_exp_golomb_tables() -> ExpGolombTables {
    let mut t = ExpGolombTables {
        vlc_len: [0; 512],
        ue_code: [0; 512],
        se_code: [0; 512],
        ue_len: [0; 256],
    };

    for i in 0..512u32 {
        // i 视作 9 位模式, 前导零数决定码长 2*lz+1
        let lz = if i == 0 { 9 } else { 9 - (32 - i.leading_zeros()) };
        let len = 2 * lz + 1;
        t.vlc_len[i as usize] = len as u8;

        let ue = if len <= 9 {
            // 码字完整落在 9 位内: 去掉隐含最高位即为值
            (i >> (9 - len)) - 1
        } else if i == 8 {
            // 11 位码 "00000 1 00000" 的 9 位前缀, 是 ≤31 约束内
            // 唯一可判定的长码 (get_ue_golomb_31 依赖此项)
            31
        } else {
            // 超出 9 位可判定范围, 填充越界值
            32
        };
        t.ue_code[i as usize] = ue as u8;
        t.se_code[i as usize] = ue_to_se(ue) as i8;
    }

    for v in 0..256u32 {
        t.ue_len[v as usize] = (2 * log2_u32(v + 1) + 1) as u8;
    }

    t
}

fn build_interleaved_tables() -> InterleavedTables {
    let mut t = InterleavedTables {
        len: [0; 256],
        ue_code: [0; 256],
        dirac_code: [0; 256],
    };

    for i in 0..256u32 {
        // 交织码: (续读标志, 数据位) 成对排布, 标志 1 为停止
        let mut data = 0u32;
        let mut nbits = 0u32;
        let mut terminated_len = None;
        for pair in 0..4u32 {
            let flag = (i >> (7 - 2 * pair)) & 1;
            if flag == 1 {
                terminated_len = Some(2 * pair + 1);
                break;
            }
            data = (data << 1) | ((i >> (6 - 2 * pair)) & 1);
            nbits += 1;
        }

        match terminated_len {
            Some(len) => {
                t.len[i as usize] = len as u8;
                t.ue_code[i as usize] = (((1 << nbits) | data) - 1) as u8;
            }
            None => {
                // 4 对之内未终止: 慢路径续读; 快路径命中此项时
                // 第 9 位必为停止位 (由 0xAA800000 掩码保证)
                t.len[i as usize] = 9;
                t.ue_code[i as usize] = (((1 << 4) | data) - 1) as u8;
            }
        }
        t.dirac_code[i as usize] = data as u8;
    }

    t
}

/// ue 值到 se 值的规范映射: 奇数取正半轴, 偶数取负半轴
fn ue_to_se(k: u32) -> i32 {
    if k & 1 == 1 {
        ((k >> 1) + 1) as i32
    } else {
        -((k >> 1) as i32)
    }
}

/// 向下取整的 log2, 约定 log2(0) = 0
fn log2_u32(v: u32) -> u32 {
    if v == 0 { 0 } else { 31 - v.leading_zeros() }
}

// ============================================================
// Exp-Golomb 读取
// ============================================================

/// 读取无符号 Exp-Golomb 码 (值域 0..=65534)
pub fn read_ue_golomb(bc: &mut BitCursor) -> u32 {
    let t = exp_golomb_tables();
    let buf = bc.peek_bits(9) as usize;

    if buf >= (1 << 4) {
        bc.skip_bits(t.vlc_len[buf] as u32);
        t.ue_code[buf] as u32
    } else {
        let buf2 = bc.peek_bits(32);
        let log = 2 * log2_u32(buf2) as i32 - 31;
        if log < 0 {
            // 窗口前导零过多: 流已耗尽或码流损坏
            bc.skip_bits(32);
            return 0;
        }
        let v = (buf2 >> log) - 1;
        bc.skip_bits(32 - log as u32);
        v
    }
}

/// 读取无符号 Exp-Golomb 码, 值域扩展到 0..=u32::MAX-1
pub fn read_ue_golomb_long(bc: &mut BitCursor) -> u32 {
    let buf = bc.peek_bits(32);
    let log = 31 - log2_u32(buf);
    bc.skip_bits(log);
    bc.read_bits(log + 1).wrapping_sub(1)
}

/// 读取无符号 Exp-Golomb 码, 调用方保证值不超过 31
///
/// 存储值超过 31 时结果未定义 (调用方契约, 不做强制).
pub fn read_ue_golomb_31(bc: &mut BitCursor) -> u32 {
    let t = exp_golomb_tables();
    let buf = (bc.peek_bits(32) >> (32 - 9)) as usize;
    bc.skip_bits(t.vlc_len[buf] as u32);
    t.ue_code[buf] as u32
}

/// 读取交织 (svq3/dirac) 无符号 Exp-Golomb 码
///
/// 流在停止位之前耗尽, 或续读轮数超过 32 位值域上限时返回
/// [`INVALID_CODE`].
pub fn read_ue_golomb_interleaved(bc: &mut BitCursor) -> u32 {
    let t = interleaved_tables();
    let mut buf = bc.peek_bits(32);

    if buf & 0xAA80_0000 != 0 {
        let idx = (buf >> 24) as usize;
        bc.skip_bits(t.len[idx] as u32);
        return t.ue_code[idx] as u32;
    }

    // 全零窗口是合法的续读 (大值的高位尾数可以全零), 不能据此判错;
    // 只有流耗尽或轮数超过 32 位值域上限才返回哨兵
    let mut ret: u32 = 1;
    let mut rounds = 0u32;
    loop {
        let idx = (buf >> 24) as usize;
        bc.skip_bits((t.len[idx] as u32).min(8));

        if t.len[idx] != 9 {
            ret <<= (t.len[idx] as u32 - 1) >> 1;
            ret |= t.dirac_code[idx] as u32;
            return ret - 1;
        }
        ret = (ret << 4) | t.dirac_code[idx] as u32;

        rounds += 1;
        if bc.bits_left() <= 0 || rounds >= INTERLEAVED_MAX_ROUNDS {
            return INVALID_CODE;
        }
        buf = bc.peek_bits(32);
    }
}

/// 读取截断 Exp-Golomb 码 (range ≥ 1; range == 1 时不消费任何位)
pub fn read_te0_golomb(bc: &mut BitCursor, range: u32) -> u32 {
    debug_assert!(range >= 1);
    if range == 1 {
        0
    } else if range == 2 {
        bc.read_bit() ^ 1
    } else {
        read_ue_golomb(bc)
    }
}

/// 读取截断 Exp-Golomb 码 (range == 2 之外退化为普通 ue)
pub fn read_te_golomb(bc: &mut BitCursor, range: u32) -> u32 {
    debug_assert!(range >= 1);
    if range == 2 {
        bc.read_bit() ^ 1
    } else {
        read_ue_golomb(bc)
    }
}

/// 读取有符号 Exp-Golomb 码
pub fn read_se_golomb(bc: &mut BitCursor) -> i32 {
    let t = exp_golomb_tables();
    let buf = bc.peek_bits(9) as usize;

    if buf >= (1 << 4) {
        bc.skip_bits(t.vlc_len[buf] as u32);
        t.se_code[buf] as i32
    } else {
        let buf2 = bc.peek_bits(32);
        let log = 2 * log2_u32(buf2) as i32 - 31;
        if log < 0 {
            bc.skip_bits(32);
            return 0;
        }
        // 此处保留隐含最高位: x = k+1, x 为奇时取负半轴
        let x = buf2 >> log;
        bc.skip_bits(32 - log as u32);
        if x & 1 == 1 {
            -((x >> 1) as i32)
        } else {
            (x >> 1) as i32
        }
    }
}

/// 读取有符号 Exp-Golomb 码 (长值域)
pub fn read_se_golomb_long(bc: &mut BitCursor) -> i32 {
    ue_to_se(read_ue_golomb_long(bc))
}

/// 读取交织 (svq3) 有符号 Exp-Golomb 码
///
/// 非法码字返回 `INVALID_CODE as i32` (即 i32::MIN).
pub fn read_se_golomb_interleaved(bc: &mut BitCursor) -> i32 {
    let k = read_ue_golomb_interleaved(bc);
    if k == INVALID_CODE {
        return INVALID_CODE as i32;
    }
    ue_to_se(k)
}

/// 读取 dirac 有符号 Exp-Golomb 码: 交织无符号值后跟一个符号位
///
/// 值为 0 时没有符号位; 符号位为 1 取负. 非法码字返回
/// `INVALID_CODE as i32`.
pub fn read_se_golomb_dirac(bc: &mut BitCursor) -> i32 {
    let v = read_ue_golomb_interleaved(bc);
    if v == INVALID_CODE {
        return INVALID_CODE as i32;
    }
    if v == 0 {
        return 0;
    }
    let sign = -(bc.read_bit() as i32);
    ((v as i32) ^ sign) - sign
}

// ============================================================
// Golomb-Rice 读取
// ============================================================

/// 读取无符号 Golomb-Rice 码 (ffv1 风格)
///
/// 一元前缀决定指数桶, 随后 k 位余数; 前缀达到 limit 时走逃逸路径,
/// 读取 esc_len 位字面量并叠加偏移 limit-1.
pub fn read_ur_golomb(bc: &mut BitCursor, k: u32, limit: u32, esc_len: u32) -> u32 {
    let buf = bc.peek_bits(32);
    let log = log2_u32(buf);

    if log as i32 > 31 - limit as i32 {
        let v = (buf.wrapping_shr(log.wrapping_sub(k)) as i64) + (((30 - log as i64) << k) as i64);
        bc.skip_bits(32 + k - log);
        v as u32
    } else {
        bc.skip_bits(limit);
        bc.read_bits(esc_len) + limit - 1
    }
}

/// 读取无符号 Golomb-Rice 码 (jpegls 风格)
///
/// 与 ffv1 风格不同, 慢路径逐位扫描终止位 (k == 0 时前导零计数
/// 快捷式不可用), 以 limit 与剩余位数双重约束; 在 limit 内未终止
/// 的前缀是 `InvalidData`.
pub fn read_ur_golomb_jpegls(
    bc: &mut BitCursor,
    k: u32,
    limit: u32,
    esc_len: u32,
) -> LanResult<u32> {
    debug_assert!(limit >= 1);
    let buf = bc.peek_bits(32);
    let log = log2_u32(buf);

    if log as i32 - k as i32 >= 1 && 32 - log < limit {
        let v = (buf >> (log - k)) as i64 + ((30 - log as i64) << k);
        bc.skip_bits(32 + k - log);
        Ok(v as u32)
    } else {
        let mut i = 0u32;
        while i < limit && bc.peek_bits(1) == 0 && bc.bits_left() > 0 {
            bc.skip_bits(1);
            i += 1;
        }
        bc.skip_bits(1);

        if i < limit - 1 {
            let v = if k > 0 { bc.read_bits(k) } else { 0 };
            Ok(v + (i << k))
        } else if i == limit - 1 {
            Ok(bc.read_bits(esc_len) + 1)
        } else {
            Err(LanError::InvalidData(
                "jpegls 一元前缀在 limit 内未终止".into(),
            ))
        }
    }
}

/// 读取有符号 Golomb-Rice 码 (ffv1 风格)
pub fn read_sr_golomb(bc: &mut BitCursor, k: u32, limit: u32, esc_len: u32) -> i32 {
    let v = read_ur_golomb(bc, k, limit, esc_len).wrapping_add(1);
    if v & 1 == 1 {
        (v >> 1) as i32
    } else {
        -((v >> 1) as i32)
    }
}

/// 读取有符号 Golomb-Rice 码 (flac/jpegls 风格, zig-zag 逆映射)
pub fn read_sr_golomb_flac(
    bc: &mut BitCursor,
    k: u32,
    limit: u32,
    esc_len: u32,
) -> LanResult<i32> {
    let v = read_ur_golomb_jpegls(bc, k, limit, esc_len)? as i32;
    Ok((v >> 1) ^ -(v & 1))
}

/// 读取无符号 Golomb-Rice 码 (shorten 风格: 无逃逸)
pub fn read_ur_golomb_shorten(bc: &mut BitCursor, k: u32) -> LanResult<u32> {
    read_ur_golomb_jpegls(bc, k, i32::MAX as u32, 0)
}

/// 读取有符号 Golomb-Rice 码 (shorten 风格)
pub fn read_sr_golomb_shorten(bc: &mut BitCursor, k: u32) -> LanResult<i32> {
    let uvar = read_ur_golomb_jpegls(bc, k + 1, i32::MAX as u32, 0)?;
    if uvar & 1 == 1 {
        Ok(!((uvar >> 1) as i32))
    } else {
        Ok((uvar >> 1) as i32)
    }
}

// ============================================================
// 写入
// ============================================================

/// 写入无符号 Exp-Golomb 码
pub fn write_ue_golomb(bw: &mut BitWriter, v: u32) {
    debug_assert!(v < u32::MAX, "write_ue_golomb: v+1 溢出");

    if v < 256 {
        let t = exp_golomb_tables();
        bw.write_bits(v + 1, t.ue_len[v as usize] as u32);
    } else {
        let e = log2_u32(v + 1);
        bw.write_bits64((v + 1) as u64, 2 * e + 1);
    }
}

/// 写入截断 Exp-Golomb 码
pub fn write_te_golomb(bw: &mut BitWriter, v: u32, range: u32) {
    debug_assert!(range >= 1 && v <= range);
    if range == 2 {
        bw.write_bit(v ^ 1);
    } else {
        write_ue_golomb(bw, v);
    }
}

/// 写入有符号 Exp-Golomb 码
pub fn write_se_golomb(bw: &mut BitWriter, v: i32) {
    // 正半轴映射到奇数, 负半轴映射到偶数
    let mut k = 2i64 * v as i64 - 1;
    if k < 0 {
        k ^= -1;
    }
    write_ue_golomb(bw, k as u32);
}

/// 写入无符号 Golomb-Rice 码 (ffv1 风格)
pub fn write_ur_golomb(bw: &mut BitWriter, v: u32, k: u32, limit: u32, esc_len: u32) {
    let e = v >> k;
    if e < limit {
        bw.write_bits64(((1u64 << k) + (v & ((1 << k) - 1)) as u64) as u64, e + k + 1);
    } else {
        bw.write_bits64((v - limit + 1) as u64, limit + esc_len);
    }
}

/// 写入无符号 Golomb-Rice 码 (jpegls 风格)
pub fn write_ur_golomb_jpegls(bw: &mut BitWriter, v: u32, k: u32, limit: u32, esc_len: u32) {
    let mut e = (v >> k) + 1;
    if e < limit {
        while e > 31 {
            bw.write_bits(0, 31);
            e -= 31;
        }
        bw.write_bits(1, e);
        if k > 0 {
            bw.write_bits(v & ((1 << k) - 1), k);
        }
    } else {
        let mut limit = limit;
        while limit > 31 {
            bw.write_bits(0, 31);
            limit -= 31;
        }
        bw.write_bits(1, limit);
        bw.write_bits(v - 1, esc_len);
    }
}

/// 写入有符号 Golomb-Rice 码 (ffv1 风格)
pub fn write_sr_golomb(bw: &mut BitWriter, v: i32, k: u32, limit: u32, esc_len: u32) {
    let mut m = -2 * v - 1;
    m ^= m >> 31;
    write_ur_golomb(bw, m as u32, k, limit, esc_len);
}

/// 写入有符号 Golomb-Rice 码 (flac/jpegls 风格)
pub fn write_sr_golomb_flac(bw: &mut BitWriter, v: i32, k: u32, limit: u32, esc_len: u32) {
    let mut m = -2 * v - 1;
    m ^= m >> 31;
    write_ur_golomb_jpegls(bw, m as u32, k, limit, esc_len);
}
