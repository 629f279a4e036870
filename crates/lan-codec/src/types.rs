//! NAL 单元类型分类.
//!
//! [`crate::nal`] 分割出的单元只携带裸类型编号; 这里提供 H.264 与
//! HEVC 的类型枚举, 供日志与上层语法解析器做分类判断.

/// H.264 NAL 单元类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum H264NalType {
    /// 非 IDR 图像切片 (P/B slice)
    Slice,
    /// 数据分区 A
    SliceDpa,
    /// 数据分区 B
    SliceDpb,
    /// 数据分区 C
    SliceDpc,
    /// IDR 图像切片 (关键帧)
    SliceIdr,
    /// 增补增强信息 (SEI)
    Sei,
    /// 序列参数集 (SPS)
    Sps,
    /// 图像参数集 (PPS)
    Pps,
    /// 访问单元分隔符 (AUD)
    Aud,
    /// 序列结束
    EndOfSequence,
    /// 流结束
    EndOfStream,
    /// 填充数据
    FillerData,
    /// 未知类型
    Unknown(u8),
}

impl H264NalType {
    /// 从 NAL 类型编号创建
    pub fn from_type_id(type_id: u8) -> Self {
        match type_id {
            1 => Self::Slice,
            2 => Self::SliceDpa,
            3 => Self::SliceDpb,
            4 => Self::SliceDpc,
            5 => Self::SliceIdr,
            6 => Self::Sei,
            7 => Self::Sps,
            8 => Self::Pps,
            9 => Self::Aud,
            10 => Self::EndOfSequence,
            11 => Self::EndOfStream,
            12 => Self::FillerData,
            _ => Self::Unknown(type_id),
        }
    }

    /// 是否为 VCL (Video Coding Layer) 单元
    pub fn is_vcl(&self) -> bool {
        matches!(
            self,
            Self::Slice | Self::SliceDpa | Self::SliceDpb | Self::SliceDpc | Self::SliceIdr
        )
    }

    /// 是否为关键帧 (IDR)
    pub fn is_idr(&self) -> bool {
        matches!(self, Self::SliceIdr)
    }
}

impl std::fmt::Display for H264NalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Slice => write!(f, "Slice"),
            Self::SliceDpa => write!(f, "SliceDPA"),
            Self::SliceDpb => write!(f, "SliceDPB"),
            Self::SliceDpc => write!(f, "SliceDPC"),
            Self::SliceIdr => write!(f, "IDR"),
            Self::Sei => write!(f, "SEI"),
            Self::Sps => write!(f, "SPS"),
            Self::Pps => write!(f, "PPS"),
            Self::Aud => write!(f, "AUD"),
            Self::EndOfSequence => write!(f, "EndOfSeq"),
            Self::EndOfStream => write!(f, "EndOfStream"),
            Self::FillerData => write!(f, "Filler"),
            Self::Unknown(id) => write!(f, "Unknown({id})"),
        }
    }
}

/// HEVC NAL 单元类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum HevcNalType {
    /// 尾随图像 (TRAIL_N/TRAIL_R 等, 编号 0-15 的 VCL 单元)
    Vcl(u8),
    /// BLA (Broken Link Access, 16-18)
    Bla(u8),
    /// IDR_W_RADL
    IdrWRadl,
    /// IDR_N_LP
    IdrNLp,
    /// CRA (Clean Random Access)
    Cra,
    /// VPS (Video Parameter Set)
    Vps,
    /// SPS (Sequence Parameter Set)
    Sps,
    /// PPS (Picture Parameter Set)
    Pps,
    /// AUD (Access Unit Delimiter)
    Aud,
    /// EOS (End of Sequence)
    Eos,
    /// EOB (End of Bitstream)
    Eob,
    /// 填充数据
    FillerData,
    /// SEI (前缀/后缀)
    Sei,
    /// 未知类型
    Unknown(u8),
}

impl HevcNalType {
    /// 从 NAL 类型编号创建
    pub fn from_type_id(type_id: u8) -> Self {
        match type_id {
            0..=15 => Self::Vcl(type_id),
            16..=18 => Self::Bla(type_id),
            19 => Self::IdrWRadl,
            20 => Self::IdrNLp,
            21 => Self::Cra,
            32 => Self::Vps,
            33 => Self::Sps,
            34 => Self::Pps,
            35 => Self::Aud,
            36 => Self::Eos,
            37 => Self::Eob,
            38 => Self::FillerData,
            39 | 40 => Self::Sei,
            _ => Self::Unknown(type_id),
        }
    }

    /// 是否为 VCL 单元 (编号 0-31)
    pub fn is_vcl(&self) -> bool {
        matches!(
            self,
            Self::Vcl(_) | Self::Bla(_) | Self::IdrWRadl | Self::IdrNLp | Self::Cra
        )
    }

    /// 是否为 IRAP (随机访问点, 编号 16-23)
    pub fn is_irap(&self) -> bool {
        matches!(self, Self::Bla(_) | Self::IdrWRadl | Self::IdrNLp | Self::Cra)
    }

    /// 是否为 IDR
    pub fn is_idr(&self) -> bool {
        matches!(self, Self::IdrWRadl | Self::IdrNLp)
    }
}

impl std::fmt::Display for HevcNalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Vcl(id) => write!(f, "VCL({id})"),
            Self::Bla(id) => write!(f, "BLA({id})"),
            Self::IdrWRadl => write!(f, "IDR_W_RADL"),
            Self::IdrNLp => write!(f, "IDR_N_LP"),
            Self::Cra => write!(f, "CRA"),
            Self::Vps => write!(f, "VPS"),
            Self::Sps => write!(f, "SPS"),
            Self::Pps => write!(f, "PPS"),
            Self::Aud => write!(f, "AUD"),
            Self::Eos => write!(f, "EOS"),
            Self::Eob => write!(f, "EOB"),
            Self::FillerData => write!(f, "Filler"),
            Self::Sei => write!(f, "SEI"),
            Self::Unknown(id) => write!(f, "Unknown({id})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_h264_类型分类() {
        assert_eq!(H264NalType::from_type_id(5), H264NalType::SliceIdr);
        assert_eq!(H264NalType::from_type_id(7), H264NalType::Sps);
        assert!(H264NalType::from_type_id(1).is_vcl());
        assert!(H264NalType::from_type_id(5).is_idr());
        assert!(!H264NalType::from_type_id(7).is_vcl());
        assert_eq!(H264NalType::from_type_id(23), H264NalType::Unknown(23));
    }

    #[test]
    fn test_hevc_类型分类() {
        assert_eq!(HevcNalType::from_type_id(19), HevcNalType::IdrWRadl);
        assert_eq!(HevcNalType::from_type_id(33), HevcNalType::Sps);
        assert!(HevcNalType::from_type_id(19).is_idr());
        assert!(HevcNalType::from_type_id(21).is_irap());
        assert!(HevcNalType::from_type_id(0).is_vcl());
        assert!(!HevcNalType::from_type_id(32).is_vcl());
        assert_eq!(format!("{}", HevcNalType::from_type_id(19)), "IDR_W_RADL");
    }
}
