//! 比特流引擎集成测试.
//!
//! 测试完整的码流管线:
//! BitWriter 编码 → 字节流 → NAL 封装 → split_packet 分割
//! → NalUnit 游标 → Golomb/位级解码还原语法元素.

use std::borrow::Cow;

use lan::codec::{H264NalType, NalCodec, NalFraming, split_packet};
use lan::core::golomb::{read_se_golomb, read_ue_golomb, write_se_golomb, write_ue_golomb};
use lan::core::{BitCursor, BitWriter};

/// 构造一个带停止位的 RBSP: 头字节 + 若干语法元素 + rbsp_trailing_bits
fn make_rbsp(header: u8, build: impl FnOnce(&mut BitWriter)) -> Vec<u8> {
    let mut bw = BitWriter::new();
    bw.write_bits(header as u32, 8);
    build(&mut bw);
    bw.write_bit(1); // 停止位
    bw.finish() // 字节对齐补零即尾随零位
}

#[test]
fn test_编码_封装_分割_解码_闭环() {
    let _ = env_logger::builder().is_test(true).try_init();

    // 伪 SPS: ue(7) se(-9) ue(300) 三个语法元素
    let rbsp = make_rbsp(0x67, |bw| {
        write_ue_golomb(bw, 7);
        write_se_golomb(bw, -9);
        write_ue_golomb(bw, 300);
    });

    // Annex B 封装 (RBSP 不含 00 00 0X 模式, 无需转义)
    let mut packet = vec![0x00, 0x00, 0x00, 0x01];
    packet.extend_from_slice(&rbsp);

    let pkt = split_packet(&packet, NalFraming::AnnexB, NalCodec::H264).unwrap();
    assert_eq!(pkt.len(), 1);

    let nal = &pkt.nals[0];
    assert_eq!(nal.nal_type, 7);
    assert_eq!(nal.ref_idc, 3);
    assert!(H264NalType::from_type_id(nal.nal_type) == H264NalType::Sps);
    assert!(matches!(nal.data, Cow::Borrowed(_)));

    // 游标已定位到头部之后, 依次还原语法元素
    let mut bc = nal.cursor().unwrap();
    assert_eq!(read_ue_golomb(&mut bc), 7);
    assert_eq!(read_se_golomb(&mut bc), -9);
    assert_eq!(read_ue_golomb(&mut bc), 300);

    // 停止位恰好是位长度边界: 语法元素读完后不多不少
    assert_eq!(bc.tell(), nal.size_bits as u64);
    assert_eq!(bc.bits_left(), 0);
}

#[test]
fn test_转义载荷经分割后还原() {
    // 语法元素凑出 00 00 00 字节模式, 封装时手工转义
    let rbsp = make_rbsp(0x41, |bw| {
        bw.write_bits(0x00, 8);
        bw.write_bits(0x00, 8);
        bw.write_bits(0xAB, 8);
    });
    assert_eq!(&rbsp[1..4], &[0x00, 0x00, 0xAB]);

    let mut packet = vec![0x00, 0x00, 0x01];
    packet.push(rbsp[0]);
    packet.extend_from_slice(&[0x00, 0x00, 0x03]); // 转义插入
    packet.extend_from_slice(&rbsp[3..]);

    let pkt = split_packet(&packet, NalFraming::AnnexB, NalCodec::H264).unwrap();
    assert_eq!(pkt.len(), 1);
    let nal = &pkt.nals[0];
    assert!(matches!(nal.data, Cow::Owned(_)));
    assert_eq!(nal.rbsp(), &rbsp[..]);

    let mut bc = nal.cursor().unwrap();
    assert_eq!(bc.read_bits(8), 0x00);
    assert_eq!(bc.read_bits(8), 0x00);
    assert_eq!(bc.read_bits(8), 0xAB);
}

#[test]
fn test_长度前缀多单元管线() {
    let sps = make_rbsp(0x67, |bw| write_ue_golomb(bw, 31));
    let pps = make_rbsp(0x68, |bw| write_ue_golomb(bw, 0));

    let mut packet = Vec::new();
    for unit in [&sps, &pps] {
        packet.extend_from_slice(&(unit.len() as u32).to_be_bytes());
        packet.extend_from_slice(unit);
    }

    let pkt = split_packet(&packet, NalFraming::LengthPrefixed(4), NalCodec::H264).unwrap();
    assert_eq!(pkt.len(), 2);
    assert_eq!(pkt.nals[0].nal_type, 7);
    assert_eq!(pkt.nals[1].nal_type, 8);

    let mut bc = pkt.nals[0].cursor().unwrap();
    assert_eq!(read_ue_golomb(&mut bc), 31);
    let mut bc = pkt.nals[1].cursor().unwrap();
    assert_eq!(read_ue_golomb(&mut bc), 0);
}

#[test]
fn test_流尾软填充不影响管线() {
    // 声明位长之外的窥视返回零填充, 不报错
    let rbsp = make_rbsp(0x41, |bw| write_ue_golomb(bw, 2));
    let mut packet = vec![0x00, 0x00, 0x01];
    packet.extend_from_slice(&rbsp);

    let pkt = split_packet(&packet, NalFraming::AnnexB, NalCodec::H264).unwrap();
    let mut bc = pkt.nals[0].cursor().unwrap();
    assert_eq!(read_ue_golomb(&mut bc), 2);
    assert_eq!(bc.bits_left(), 0);
    // 声明位长之后: 同一字节内仍是真实位 (停止位), 字节之外零填充
    assert_eq!(bc.read_bit(), 1);
    assert_eq!(bc.read_bits(4), 0);
    assert_eq!(bc.peek_bits(32), 0);
    assert_eq!(bc.read_bits(16), 0);

    // 独立游标: 位长为 0 的空流
    let empty: [u8; 0] = [];
    let mut bc = BitCursor::from_bytes(&empty).unwrap();
    assert_eq!(bc.read_bits(32), 0);
    assert_eq!(bc.bits_left(), 0);
}
