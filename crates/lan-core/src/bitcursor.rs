//! 位游标: 带 64 位缓存窗口的比特流读取器.
//!
//! 与朴素的逐字节读取不同, 游标维护一个最多 64 位的缓存窗口, 每次以
//! 4/8 字节为单位从源缓冲区刷新, 是 VLC/Golomb 解码的性能基础.
//!
//! # 软末尾语义
//!
//! 除构造之外所有操作都是全函数: 越过声明的位长度继续读取/窥视会得到
//! 零填充的结果而不是错误. 这一行为是有意设计的, 使得 VLC/Golomb 在
//! 流末尾附近的投机性 peek 不需要任何特判.
//!
//! # 位序
//!
//! 默认按大端位序 (MSB first) 读取; 构造时可选择小端位序 (LSB first),
//! 两种位序只在刷新与提取两处分叉, 由 [`BitOrder`] 在运行时选择.

use crate::{LanError, LanResult};

/// 位序策略
///
/// 多数多媒体码流 (H.264/HEVC, FLAC, MPEG 音频) 按 MSB first 排布;
/// 少数格式 (如部分 RIFF 系编码) 按 LSB first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BitOrder {
    /// 大端位序: 每字节从最高位开始消费
    #[default]
    MsbFirst,
    /// 小端位序: 每字节从最低位开始消费
    LsbFirst,
}

/// 位游标
///
/// 持有源缓冲区的只读引用, 所有读取操作只修改游标自身的窗口状态.
///
/// # 示例
/// ```
/// use lan_core::bitcursor::BitCursor;
///
/// let data = [0b10110001, 0b01010101];
/// let mut bc = BitCursor::from_bytes(&data).unwrap();
/// assert_eq!(bc.read_bits(4), 0b1011);
/// assert_eq!(bc.read_bits(4), 0b0001);
/// assert_eq!(bc.read_bits(8), 0b01010101);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct BitCursor<'a> {
    /// 源数据
    data: &'a [u8],
    /// 刷新上限 (由声明的位长度换算出的字节数, 不超过 data.len())
    end: usize,
    /// 下一次刷新的字节位置 (可越过 end, 刷新时检查)
    pos: usize,
    /// 缓存窗口: 尚未消费的位
    cache: u64,
    /// 窗口中有效位数, 始终在 [0, 64]
    bits_left: u32,
    /// 逻辑位区域总长
    size_in_bits: u32,
    /// 位序
    order: BitOrder,
}

impl<'a> BitCursor<'a> {
    /// 以位长度构造游标 (大端位序)
    ///
    /// 失败条件只有一个: `bit_size` 换算字节数会溢出内部尺寸运算.
    pub fn new(data: &'a [u8], bit_size: u32) -> LanResult<Self> {
        Self::with_order(data, bit_size, BitOrder::MsbFirst)
    }

    /// 以位长度与指定位序构造游标
    pub fn with_order(data: &'a [u8], bit_size: u32, order: BitOrder) -> LanResult<Self> {
        if bit_size > i32::MAX as u32 - 7 {
            return Err(LanError::InvalidSize(format!(
                "bit_size={} 超出可寻址范围",
                bit_size,
            )));
        }

        let byte_size = ((bit_size as usize) + 7) >> 3;
        let mut bc = Self {
            data,
            end: byte_size.min(data.len()),
            pos: 0,
            cache: 0,
            bits_left: 0,
            size_in_bits: bit_size,
            order,
        };
        bc.refill_64();
        Ok(bc)
    }

    /// 以字节长度构造游标 (大端位序)
    pub fn from_bytes(data: &'a [u8]) -> LanResult<Self> {
        if data.len() > (i32::MAX / 8) as usize {
            return Err(LanError::InvalidSize(format!(
                "byte_size={} 超出可寻址范围",
                data.len(),
            )));
        }
        Self::new(data, (data.len() * 8) as u32)
    }

    // ------------------------------------------------------------
    // 窗口刷新
    // ------------------------------------------------------------

    /// 从 pos 起按位序加载至多 8 字节, 不足部分零填充
    fn load_64(&self) -> u64 {
        let mut raw = [0u8; 8];
        let avail = self.end.saturating_sub(self.pos).min(8);
        raw[..avail].copy_from_slice(&self.data[self.pos..self.pos + avail]);
        match self.order {
            BitOrder::MsbFirst => u64::from_be_bytes(raw),
            BitOrder::LsbFirst => u64::from_le_bytes(raw),
        }
    }

    /// 从 pos 起按位序加载至多 4 字节, 不足部分零填充
    fn load_32(&self) -> u32 {
        let mut raw = [0u8; 4];
        let avail = self.end.saturating_sub(self.pos).min(4);
        raw[..avail].copy_from_slice(&self.data[self.pos..self.pos + avail]);
        match self.order {
            BitOrder::MsbFirst => u32::from_be_bytes(raw),
            BitOrder::LsbFirst => u32::from_le_bytes(raw),
        }
    }

    /// 整窗刷新: 仅在窗口已空时调用
    fn refill_64(&mut self) {
        if self.pos >= self.end {
            return;
        }
        self.cache = self.load_64();
        self.pos += 8;
        self.bits_left = 64;
    }

    /// 半窗刷新: 向窗口追加 32 位, 调用前 bits_left 必须不超过 32
    fn refill_32(&mut self) {
        if self.pos >= self.end {
            return;
        }
        let word = self.load_32() as u64;
        match self.order {
            BitOrder::MsbFirst => self.cache |= word << (32 - self.bits_left),
            BitOrder::LsbFirst => self.cache |= word << self.bits_left,
        }
        self.pos += 4;
        self.bits_left += 32;
    }

    /// 从窗口提取并消费 n 位, n 在 [1, 63] 且不超过 bits_left
    fn take(&mut self, n: u32) -> u64 {
        debug_assert!(n >= 1 && n < 64);
        let ret;
        match self.order {
            BitOrder::MsbFirst => {
                ret = self.cache >> (64 - n);
                self.cache <<= n;
            }
            BitOrder::LsbFirst => {
                ret = self.cache & ((1u64 << n) - 1);
                self.cache >>= n;
            }
        }
        self.bits_left -= n;
        ret
    }

    /// 丢弃窗口内的 n 位, n 不超过 bits_left
    fn skip_remaining(&mut self, n: u32) {
        match self.order {
            BitOrder::MsbFirst => self.cache = checked_shl(self.cache, n),
            BitOrder::LsbFirst => self.cache = checked_shr(self.cache, n),
        }
        self.bits_left -= n;
    }

    // ------------------------------------------------------------
    // 读取
    // ------------------------------------------------------------

    /// 读取 1 个位
    pub fn read_bit(&mut self) -> u32 {
        if self.bits_left == 0 {
            self.refill_64();
            if self.bits_left == 0 {
                // 软末尾
                return 0;
            }
        }
        self.take(1) as u32
    }

    /// 读取 N 个位 (0 ≤ N ≤ 32)
    pub fn read_bits(&mut self, n: u32) -> u32 {
        debug_assert!(n <= 32, "read_bits: n={} 超过 32 位", n);
        if n == 0 {
            return 0;
        }
        if n > self.bits_left {
            self.refill_32();
            if self.bits_left < n {
                // 源已耗尽, 窗口空余位本就是零, 允许提取继续
                self.bits_left = n;
            }
        }
        self.take(n) as u32
    }

    /// 读取 N 个位 (0 ≤ N ≤ 63), 用于最长 63 位的码字
    pub fn read_bits64(&mut self, n: u32) -> u64 {
        debug_assert!(n <= 63, "read_bits64: n={} 超过 63 位", n);
        if n == 0 {
            return 0;
        }

        let mut n = n;
        let mut ret: u64 = 0;
        let mut low_bits: u32 = 0;
        if n > self.bits_left {
            n -= self.bits_left;
            low_bits = self.bits_left;
            if self.bits_left > 0 {
                ret = self.take(self.bits_left);
            }
            self.refill_64();
            if self.bits_left < n {
                self.bits_left = n;
            }
        }

        match self.order {
            BitOrder::MsbFirst => self.take(n) | ret << n,
            BitOrder::LsbFirst => self.take(n) << low_bits | ret,
        }
    }

    /// 读取有符号整数 (二进制补码, 0 ≤ N ≤ 32)
    pub fn read_signed(&mut self, n: u32) -> i32 {
        sign_extend(self.read_bits(n), n)
    }

    /// 读取 MPEG DC 风格码字 (符号位 + 去掉隐含最高位的尾数)
    ///
    /// 最高位为 0 时取负. 等价于通用的有符号读取加修正, 但通过一次
    /// 32 位 peek 与位运算在 O(1) 内完成.
    pub fn read_xbits(&mut self, n: u32) -> i32 {
        debug_assert!(n >= 1 && n <= 25, "read_xbits: n={} 越界", n);
        let cache = self.peek_bits(32) as i32;
        let sign = !cache >> 31;
        self.skip_bits(n);
        ((((sign ^ cache) as u32) >> (32 - n)) as i32 ^ sign) - sign
    }

    // ------------------------------------------------------------
    // 窥视
    // ------------------------------------------------------------

    /// 窥视 N 个位 (0 ≤ N ≤ 32), 不移动逻辑位置
    ///
    /// 可能触发内部窗口刷新 (只影响缓冲状态, 不影响 tell).
    pub fn peek_bits(&mut self, n: u32) -> u32 {
        debug_assert!(n <= 32, "peek_bits: n={} 超过 32 位", n);
        if n == 0 {
            return 0;
        }
        if n > self.bits_left {
            self.refill_32();
        }
        match self.order {
            BitOrder::MsbFirst => (self.cache >> (64 - n)) as u32,
            BitOrder::LsbFirst => (self.cache & ((1u64 << n) - 1)) as u32,
        }
    }

    /// 窥视 N 个位 (0 ≤ N ≤ 63), 不移动逻辑位置
    pub fn peek_bits64(&self, n: u32) -> u64 {
        debug_assert!(n <= 63, "peek_bits64: n={} 超过 63 位", n);
        // 游标是纯值类型, 在副本上读取即是窥视
        let mut probe = *self;
        probe.read_bits64(n)
    }

    /// 窥视有符号整数 (0 ≤ N ≤ 32)
    pub fn peek_signed(&mut self, n: u32) -> i32 {
        sign_extend(self.peek_bits(n), n)
    }

    // ------------------------------------------------------------
    // 跳转
    // ------------------------------------------------------------

    /// 跳过 N 个位, N 可任意大
    ///
    /// 超出窗口的部分按 "清空窗口 → 整字节快进 → 刷新 → 跳余数" 分解.
    pub fn skip_bits(&mut self, n: u32) {
        if n <= self.bits_left {
            self.skip_remaining(n);
        } else {
            let mut n = n - self.bits_left;
            self.skip_remaining(self.bits_left);
            if n >= 64 {
                let skip = (n / 8) as usize;
                n -= (skip * 8) as u32;
                self.pos += skip;
            }
            self.refill_64();
            if n > 0 {
                if self.bits_left < n {
                    self.bits_left = n;
                }
                self.skip_remaining(n);
            }
        }
    }

    /// 定位到绝对位位置
    ///
    /// 回退只能通过重置后线性前跳实现, 没有更快的随机后退.
    pub fn seek(&mut self, bit_pos: u32) {
        self.pos = 0;
        self.cache = 0;
        self.bits_left = 0;
        self.skip_bits(bit_pos);
    }

    /// 前跳到下一个字节边界, 返回从该边界到逻辑末尾的原始字节
    ///
    /// 用于把剩余数据移交给面向字节的消费者.
    pub fn align_to_byte(&mut self) -> &'a [u8] {
        let n = (self.tell() as u32).wrapping_neg() & 7;
        if n > 0 {
            self.skip_bits(n);
        }
        let byte_pos = (self.tell() / 8) as usize;
        &self.data[byte_pos.min(self.end)..self.end]
    }

    // ------------------------------------------------------------
    // 位置与容量
    // ------------------------------------------------------------

    /// 已消费的位数
    pub fn tell(&self) -> u64 {
        (self.pos as u64) * 8 - self.bits_left as u64
    }

    /// 逻辑位区域总长
    pub fn tell_size(&self) -> u32 {
        self.size_in_bits
    }

    /// 剩余可读位数 (过量跳转后可为负)
    pub fn bits_left(&self) -> i64 {
        self.size_in_bits as i64 - self.tell() as i64
    }

    // ------------------------------------------------------------
    // 截断一元码
    // ------------------------------------------------------------

    /// 解码取值 0, 1, 2 的截断一元码
    pub fn decode012(&mut self) -> u32 {
        if self.read_bit() == 0 {
            0
        } else {
            self.read_bit() + 1
        }
    }

    /// 解码取值 2, 1, 0 的截断一元码
    pub fn decode210(&mut self) -> u32 {
        if self.read_bit() == 1 {
            0
        } else {
            2 - self.read_bit()
        }
    }
}

/// 从第 n-1 位做符号扩展
fn sign_extend(val: u32, n: u32) -> i32 {
    if n == 0 {
        return 0;
    }
    let shift = 32 - n;
    ((val << shift) as i32) >> shift
}

/// 左移, 移位量达到 64 时直接清零 (清空满窗时触及)
fn checked_shl(v: u64, n: u32) -> u64 {
    if n >= 64 { 0 } else { v << n }
}

/// 右移, 移位量达到 64 时直接清零
fn checked_shr(v: u64, n: u32) -> u64 {
    if n >= 64 { 0 } else { v >> n }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_bits_basic() {
        let data = [0b10110001, 0b01010101];
        let mut bc = BitCursor::from_bytes(&data).unwrap();

        assert_eq!(bc.read_bits(1), 1);
        assert_eq!(bc.read_bits(1), 0);
        assert_eq!(bc.read_bits(2), 0b11);
        assert_eq!(bc.read_bits(4), 0b0001);
        assert_eq!(bc.read_bits(8), 0b01010101);
        assert_eq!(bc.bits_left(), 0);
    }

    #[test]
    fn test_read_bits_32位() {
        let data = [0xFF, 0x00, 0xFF, 0x00];
        let mut bc = BitCursor::from_bytes(&data).unwrap();
        assert_eq!(bc.read_bits(32), 0xFF00FF00);
    }

    #[test]
    fn test_read_bits_跨窗口() {
        // 9 字节: 首窗 64 位耗尽后需要半窗刷新
        let data = [0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC, 0xDE, 0xF0, 0xAB];
        let mut bc = BitCursor::from_bytes(&data).unwrap();
        assert_eq!(bc.read_bits(32), 0x12345678);
        assert_eq!(bc.read_bits(28), 0x9ABCDEF);
        assert_eq!(bc.read_bits(12), 0x0AB);
        assert_eq!(bc.tell(), 72);
    }

    #[test]
    fn test_read_bits64() {
        let data = [0xFF, 0x00, 0xFF, 0x00, 0xAA, 0xBB, 0xCC, 0xDD];
        let mut bc = BitCursor::from_bytes(&data).unwrap();
        bc.skip_bits(1);
        assert_eq!(bc.read_bits64(63), 0x7F00FF00AABBCCDD);
    }

    #[test]
    fn test_lsb_first() {
        // LSB first: 每字节从最低位开始
        let data = [0b10110001, 0b01010101];
        let mut bc =
            BitCursor::with_order(&data, 16, BitOrder::LsbFirst).unwrap();
        assert_eq!(bc.read_bits(4), 0b0001);
        assert_eq!(bc.read_bits(4), 0b1011);
        assert_eq!(bc.read_bits(8), 0b01010101);
    }

    #[test]
    fn test_peek_幂等() {
        let data = [0b10110001, 0x55];
        let mut bc = BitCursor::from_bytes(&data).unwrap();

        assert_eq!(bc.peek_bits(4), 0b1011);
        assert_eq!(bc.peek_bits(4), 0b1011);
        assert_eq!(bc.tell(), 0);
        assert_eq!(bc.read_bits(4), 0b1011);
        assert_eq!(bc.peek_bits(4), 0b0001);
    }

    #[test]
    fn test_peek_bits64_不动位置() {
        let data = [0xDE, 0xAD, 0xBE, 0xEF, 0x12, 0x34, 0x56, 0x78, 0x9A];
        let mut bc = BitCursor::from_bytes(&data).unwrap();
        bc.skip_bits(4);
        let a = bc.peek_bits64(60);
        let b = bc.peek_bits64(60);
        assert_eq!(a, b);
        assert_eq!(bc.tell(), 4);
        assert_eq!(bc.read_bits64(60), a);
    }

    #[test]
    fn test_read_signed() {
        let data = [0b11111000];
        let mut bc = BitCursor::from_bytes(&data).unwrap();
        assert_eq!(bc.read_signed(5), -1);

        let data2 = [0b01010101];
        let mut bc2 = BitCursor::from_bytes(&data2).unwrap();
        assert_eq!(bc2.read_signed(5), 10);
        assert_eq!(bc2.peek_signed(3), -3); // 剩余 101 按补码扩展
    }

    #[test]
    fn test_read_xbits() {
        // MPEG DC 码: 最高位为 1 取正 (值即尾数), 为 0 取负
        let data = [0b10110000];
        let mut bc = BitCursor::from_bytes(&data).unwrap();
        assert_eq!(bc.read_xbits(4), 0b1011);

        // 0100 = ~1011 → -11
        let data2 = [0b01000000];
        let mut bc2 = BitCursor::from_bytes(&data2).unwrap();
        assert_eq!(bc2.read_xbits(4), -11);
    }

    #[test]
    fn test_skip_大跨度() {
        let mut data = vec![0u8; 64];
        data[40] = 0xA5;
        let mut bc = BitCursor::from_bytes(&data).unwrap();
        bc.skip_bits(40 * 8);
        assert_eq!(bc.read_bits(8), 0xA5);
        assert_eq!(bc.tell(), 41 * 8);
    }

    #[test]
    fn test_seek() {
        let data = [0x12, 0x34, 0x56, 0x78];
        let mut bc = BitCursor::from_bytes(&data).unwrap();
        bc.read_bits(24);
        bc.seek(4);
        assert_eq!(bc.read_bits(8), 0x23);
        bc.seek(0);
        assert_eq!(bc.read_bits(8), 0x12);
    }

    #[test]
    fn test_align_to_byte() {
        let data = [0x12, 0x34, 0x56];
        let mut bc = BitCursor::from_bytes(&data).unwrap();
        bc.read_bits(3);
        let rest = bc.align_to_byte();
        assert_eq!(bc.tell(), 8);
        assert_eq!(rest, &[0x34, 0x56]);

        // 已对齐时不动
        let rest2 = bc.align_to_byte();
        assert_eq!(bc.tell(), 8);
        assert_eq!(rest2, &[0x34, 0x56]);
    }

    #[test]
    fn test_软末尾_零填充() {
        let data = [0xFF];
        let mut bc = BitCursor::from_bytes(&data).unwrap();
        assert_eq!(bc.read_bits(8), 0xFF);
        // 越界读取: 零填充, 不报错
        assert_eq!(bc.read_bits(32), 0);
        assert_eq!(bc.read_bits64(63), 0);
        assert_eq!(bc.peek_bits(32), 0);
        assert_eq!(bc.read_bit(), 0);
    }

    #[test]
    fn test_位长度非字节对齐() {
        // 声明 12 位: tell_size 反映逻辑长度
        let data = [0xAB, 0xCD];
        let mut bc = BitCursor::new(&data, 12).unwrap();
        assert_eq!(bc.tell_size(), 12);
        assert_eq!(bc.read_bits(12), 0xABC);
        assert_eq!(bc.bits_left(), 0);
    }

    #[test]
    fn test_init_尺寸溢出() {
        let data = [0u8; 4];
        assert!(BitCursor::new(&data, u32::MAX).is_err());
        assert!(BitCursor::new(&data, i32::MAX as u32 - 7).is_ok());
    }

    #[test]
    fn test_decode012_decode210() {
        let data = [0b01110000];
        let mut bc = BitCursor::from_bytes(&data).unwrap();
        assert_eq!(bc.decode012(), 0); // 0
        assert_eq!(bc.decode012(), 2); // 11
        assert_eq!(bc.decode012(), 1); // 10

        let data2 = [0b10100000];
        let mut bc2 = BitCursor::from_bytes(&data2).unwrap();
        assert_eq!(bc2.decode210(), 0); // 1
        assert_eq!(bc2.decode210(), 1); // 01
    }

    #[test]
    fn test_lsb_first_跨窗口() {
        let data: Vec<u8> = (0..12).map(|i| i as u8 | 0x80).collect();
        let mut bc = BitCursor::with_order(&data, 96, BitOrder::LsbFirst).unwrap();
        // 小端位序下逐字节读 8 位应原样还原每个字节
        for &b in &data {
            assert_eq!(bc.read_bits(8), b as u32);
        }
    }
}
