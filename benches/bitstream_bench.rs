//! Lan 比特流引擎性能基准测试.
//!
//! 覆盖位游标读取、Exp-Golomb 解码、VLC 多级查表与 NAL 分割等核心路径.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use lan::codec::{NalCodec, NalFraming, split_packet};
use lan::core::golomb::{read_se_golomb, read_ue_golomb, write_se_golomb, write_ue_golomb};
use lan::core::vlc::{VlcTable, read_vlc};
use lan::core::{BitCursor, BitWriter};

/// 生成一段伪随机字节 (固定种子, 结果可复现)
fn make_noise(len: usize) -> Vec<u8> {
    let mut state = 0x2545_F491_4F6C_DD1Du64;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state >> 32) as u8
        })
        .collect()
}

/// 生成含 4096 个 ue/se 交替码字的码流
fn make_golomb_stream() -> Vec<u8> {
    let mut bw = BitWriter::new();
    for i in 0..4096u32 {
        write_ue_golomb(&mut bw, i % 512);
        write_se_golomb(&mut bw, (i as i32 % 255) - 127);
    }
    bw.finish()
}

fn bench_read_bits(c: &mut Criterion) {
    let data = make_noise(8192);
    c.bench_function("bitcursor_read_bits_mixed", |b| {
        b.iter(|| {
            let mut bc = BitCursor::from_bytes(black_box(&data)).unwrap();
            let mut acc = 0u64;
            while bc.bits_left() > 64 {
                acc = acc.wrapping_add(bc.read_bits(5) as u64);
                acc = acc.wrapping_add(bc.read_bits(17) as u64);
                acc = acc.wrapping_add(bc.read_bits64(42));
            }
            acc
        });
    });
}

fn bench_ue_golomb(c: &mut Criterion) {
    let data = make_golomb_stream();
    c.bench_function("golomb_ue_se_decode_4096", |b| {
        b.iter(|| {
            let mut bc = BitCursor::from_bytes(black_box(&data)).unwrap();
            let mut acc = 0i64;
            for _ in 0..4096 {
                acc = acc.wrapping_add(read_ue_golomb(&mut bc) as i64);
                acc = acc.wrapping_add(read_se_golomb(&mut bc) as i64);
            }
            acc
        });
    });
}

fn bench_vlc_decode(c: &mut Criterion) {
    // 完备前缀码, 一级 4 位, 6/7 位长码进入 "1111" 子表
    let codes: &[(u8, u32, i16)] = &[
        (2, 0b00, 0),
        (2, 0b01, 1),
        (2, 0b10, 2),
        (3, 0b110, 3),
        (4, 0b1110, 4),
        (6, 0b111100, 5),
        (6, 0b111101, 6),
        (7, 0b1111100, 7),
        (7, 0b1111101, 8),
        (7, 0b1111110, 9),
        (7, 0b1111111, 10),
    ];
    let table = VlcTable::new(4, codes).unwrap();
    let data = make_noise(4096);
    c.bench_function("vlc_decode_two_level", |b| {
        b.iter(|| {
            let mut bc = BitCursor::from_bytes(black_box(&data)).unwrap();
            let mut acc = 0i64;
            while bc.bits_left() > 16 {
                acc = acc.wrapping_add(read_vlc(&mut bc, &table, 4, 2) as i64);
                bc.skip_bits(1);
            }
            acc
        });
    });
}

fn bench_nal_split(c: &mut Criterion) {
    // 64 个 Annex B 单元, 每个约 1 KiB, 无转义 (直通路径)
    let mut buf = Vec::new();
    for i in 0..64u8 {
        buf.extend_from_slice(&[0x00, 0x00, 0x01, 0x41]);
        let payload: Vec<u8> = (0..1024u32).map(|j| ((j % 200) as u8) + 1 + (i % 50)).collect();
        buf.extend_from_slice(&payload);
    }
    c.bench_function("nal_split_annexb_64x1k", |b| {
        b.iter(|| {
            let pkt = split_packet(black_box(&buf), NalFraming::AnnexB, NalCodec::H264).unwrap();
            pkt.len()
        });
    });
}

criterion_group!(
    benches,
    bench_read_bits,
    bench_ue_golomb,
    bench_vlc_decode,
    bench_nal_split
);
criterion_main!(benches);
