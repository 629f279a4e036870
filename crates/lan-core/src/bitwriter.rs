//! 位写入器: 位游标的编码侧镜像.
//!
//! 主要服务于 Golomb 写入原语与读写往返测试; 与 [`crate::bitcursor`]
//! 共用同一套 [`BitOrder`] 位序策略, 保证两个方向精确互逆.

use crate::bitcursor::BitOrder;

/// 位写入器
///
/// # 示例
/// ```
/// use lan_core::bitwriter::BitWriter;
///
/// let mut bw = BitWriter::new();
/// bw.write_bits(0b1011, 4);
/// bw.write_bits(0b0001, 4);
/// assert_eq!(bw.finish(), vec![0b10110001]);
/// ```
pub struct BitWriter {
    /// 输出缓冲区
    data: Vec<u8>,
    /// 正在填充的当前字节
    current_byte: u8,
    /// 当前字节中已填充的位数 (0-7)
    bit_count: u8,
    /// 位序
    order: BitOrder,
}

impl BitWriter {
    /// 创建新的位写入器 (大端位序)
    pub fn new() -> Self {
        Self::with_order(BitOrder::MsbFirst)
    }

    /// 以指定位序创建位写入器
    pub fn with_order(order: BitOrder) -> Self {
        Self {
            data: Vec::new(),
            current_byte: 0,
            bit_count: 0,
            order,
        }
    }

    /// 已写入的总位数
    pub fn bits_written(&self) -> usize {
        self.data.len() * 8 + self.bit_count as usize
    }

    /// 写入 1 个位
    pub fn write_bit(&mut self, bit: u32) {
        match self.order {
            BitOrder::MsbFirst => {
                self.current_byte = (self.current_byte << 1) | (bit & 1) as u8;
            }
            BitOrder::LsbFirst => {
                self.current_byte |= ((bit & 1) as u8) << self.bit_count;
            }
        }
        self.bit_count += 1;
        if self.bit_count >= 8 {
            self.data.push(self.current_byte);
            self.current_byte = 0;
            self.bit_count = 0;
        }
    }

    /// 写入 N 个位 (0 ≤ N ≤ 32), 值的低 N 位有效
    pub fn write_bits(&mut self, value: u32, n: u32) {
        debug_assert!(n <= 32, "write_bits: n={} 超过 32 位", n);

        let mut remaining = n;
        let mut value = value;
        while remaining > 0 {
            let available = 8 - self.bit_count as u32;
            let to_write = remaining.min(available);
            let mask = if to_write >= 32 {
                u32::MAX
            } else {
                (1u32 << to_write) - 1
            };

            match self.order {
                BitOrder::MsbFirst => {
                    // 高位在前: 先取 value 的最高 to_write 位
                    let bits = ((value >> (remaining - to_write)) & mask) as u8;
                    if to_write >= 8 {
                        // 整字节写入 (此时 bit_count 必定为 0)
                        self.current_byte = bits;
                    } else {
                        self.current_byte = (self.current_byte << to_write) | bits;
                    }
                }
                BitOrder::LsbFirst => {
                    // 低位在前: 先取 value 的最低 to_write 位
                    let bits = (value & mask) as u8;
                    self.current_byte |= bits << self.bit_count;
                    value >>= to_write;
                }
            }

            self.bit_count += to_write as u8;
            if self.bit_count >= 8 {
                self.data.push(self.current_byte);
                self.current_byte = 0;
                self.bit_count = 0;
            }
            remaining -= to_write;
        }
    }

    /// 写入 N 个位 (0 ≤ N ≤ 64)
    pub fn write_bits64(&mut self, value: u64, n: u32) {
        debug_assert!(n <= 64, "write_bits64: n={} 超过 64 位", n);
        if n <= 32 {
            self.write_bits(value as u32, n);
            return;
        }
        match self.order {
            BitOrder::MsbFirst => {
                self.write_bits((value >> 32) as u32, n - 32);
                self.write_bits(value as u32, 32);
            }
            BitOrder::LsbFirst => {
                self.write_bits(value as u32, 32);
                self.write_bits((value >> 32) as u32, n - 32);
            }
        }
    }

    /// 写入有符号整数 (二进制补码)
    pub fn write_signed(&mut self, value: i32, n: u32) {
        let mask = ((1u64 << n) - 1) as u32;
        self.write_bits((value as u32) & mask, n);
    }

    /// 对齐到字节边界 (用 0 填充)
    pub fn align_to_byte(&mut self) {
        if self.bit_count > 0 {
            if self.order == BitOrder::MsbFirst {
                self.current_byte <<= 8 - self.bit_count;
            }
            self.data.push(self.current_byte);
            self.current_byte = 0;
            self.bit_count = 0;
        }
    }

    /// 完成写入, 返回字节数据
    ///
    /// 如果当前不在字节边界, 自动用 0 填充.
    pub fn finish(mut self) -> Vec<u8> {
        self.align_to_byte();
        self.data
    }

    /// 已完成的字节数据引用 (不含正在填充的当前字节)
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl Default for BitWriter {
    fn default() -> Self {
        Self::new()
    }
}
