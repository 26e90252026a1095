use std::fmt;

/// `nal_unit_type` as defined by ITU-T H.265 Table 7-1: the six bits following
/// `forbidden_zero_bit` in the first header byte.
///
/// The value is kept raw. Reserved and unspecified types are ordinary values, nothing
/// here rejects them; [`NalUnitType::INVALID`] is the out-of-band "no unit" sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NalUnitType(u8);

/// Coarse grouping of NAL unit types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NalCategory {
    /// Coded slice segment, 0-9 and 16-21.
    Slice,
    /// Reserved VCL types, 10-15 and 22-31.
    ReservedVcl,
    /// VPS, SPS or PPS.
    ParameterSet,
    AccessUnitDelimiter,
    EndOfSequence,
    EndOfBitstream,
    FillerData,
    /// Prefix or suffix SEI.
    SupplementalEnhancementInformation,
    ReservedNonVcl,
    Unspecified,
    Invalid,
}

impl NalUnitType {
    pub const TRAIL_N: Self = Self(0);
    pub const TRAIL_R: Self = Self(1);
    pub const TSA_N: Self = Self(2);
    pub const TSA_R: Self = Self(3);
    pub const STSA_N: Self = Self(4);
    pub const STSA_R: Self = Self(5);
    pub const RADL_N: Self = Self(6);
    pub const RADL_R: Self = Self(7);
    pub const RASL_N: Self = Self(8);
    pub const RASL_R: Self = Self(9);

    pub const BLA_W_LP: Self = Self(16);
    pub const BLA_W_RADL: Self = Self(17);
    pub const BLA_N_LP: Self = Self(18);
    pub const IDR_W_RADL: Self = Self(19);
    pub const IDR_N_LP: Self = Self(20);
    pub const CRA: Self = Self(21);
    pub const RESERVED_IRAP_VCL22: Self = Self(22);
    pub const RESERVED_IRAP_VCL23: Self = Self(23);

    pub const VPS: Self = Self(32);
    pub const SPS: Self = Self(33);
    pub const PPS: Self = Self(34);
    pub const ACCESS_UNIT_DELIMITER: Self = Self(35);
    pub const EOS: Self = Self(36);
    pub const EOB: Self = Self(37);
    pub const FILLER_DATA: Self = Self(38);
    pub const PREFIX_SEI: Self = Self(39);
    pub const SUFFIX_SEI: Self = Self(40);

    /// Not a six-bit value; stands for "no NAL unit found".
    pub const INVALID: Self = Self(64);

    /// Decodes bits 1-6 of the first header byte. The disposability mark in the top bit and
    /// the layer bit at the bottom do not affect the result.
    pub const fn from_header_byte(header: u8) -> Self {
        Self((header & 0x7F) >> 1)
    }

    pub const fn from_raw(value: u8) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u8 {
        self.0
    }

    /// Places the type into an otherwise zeroed first header byte.
    pub const fn to_header_byte(self) -> u8 {
        (self.0 & 0x3F) << 1
    }

    pub fn category(self) -> NalCategory {
        match self.0 {
            0..=9 | 16..=21 => NalCategory::Slice,
            10..=15 | 22..=31 => NalCategory::ReservedVcl,
            32..=34 => NalCategory::ParameterSet,
            35 => NalCategory::AccessUnitDelimiter,
            36 => NalCategory::EndOfSequence,
            37 => NalCategory::EndOfBitstream,
            38 => NalCategory::FillerData,
            39 | 40 => NalCategory::SupplementalEnhancementInformation,
            41..=47 => NalCategory::ReservedNonVcl,
            48..=63 => NalCategory::Unspecified,
            _ => NalCategory::Invalid,
        }
    }

    /// Any type in the VCL half of the table, reserved ones included.
    pub fn is_vcl(self) -> bool {
        self.0 <= 31
    }

    /// Coded slice segment types, the only ones that receive the disposability mark.
    pub fn is_vcl_slice(self) -> bool {
        self.category() == NalCategory::Slice
    }

    /// Intra random access point: BLA, IDR, CRA and the two reserved IRAP types.
    pub fn is_irap(self) -> bool {
        (16..=23).contains(&self.0)
    }

    pub fn is_idr(self) -> bool {
        self == Self::IDR_W_RADL || self == Self::IDR_N_LP
    }

    pub fn is_parameter_set(self) -> bool {
        self.category() == NalCategory::ParameterSet
    }

    pub fn is_sei(self) -> bool {
        self.category() == NalCategory::SupplementalEnhancementInformation
    }

    /// Sub-layer non-reference picture: the even `_N` types below 16.
    pub fn is_sub_layer_non_reference(self) -> bool {
        self.0 <= 14 && self.0 % 2 == 0
    }

    pub fn name(self) -> &'static str {
        match self.0 {
            0 => "TRAIL_N",
            1 => "TRAIL_R",
            2 => "TSA_N",
            3 => "TSA_R",
            4 => "STSA_N",
            5 => "STSA_R",
            6 => "RADL_N",
            7 => "RADL_R",
            8 => "RASL_N",
            9 => "RASL_R",
            16 => "BLA_W_LP",
            17 => "BLA_W_RADL",
            18 => "BLA_N_LP",
            19 => "IDR_W_RADL",
            20 => "IDR_N_LP",
            21 => "CRA_NUT",
            32 => "VPS",
            33 => "SPS",
            34 => "PPS",
            35 => "AUD",
            36 => "EOS",
            37 => "EOB",
            38 => "FD",
            39 => "PREFIX_SEI",
            40 => "SUFFIX_SEI",
            10..=15 | 22..=31 | 41..=47 => "RESERVED",
            48..=63 => "UNSPECIFIED",
            _ => "INVALID",
        }
    }
}

impl fmt::Display for NalUnitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name(), self.0)
    }
}

impl From<NalUnitType> for u8 {
    fn from(value: NalUnitType) -> Self {
        value.0
    }
}
