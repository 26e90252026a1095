use std::ops::Range;

use crate::nal_unit_type::NalUnitType;

/// `NalUnit` is a view of one NAL unit inside an Annex-B buffer: the start code that
/// introduces it, the two-byte NAL unit header and the payload up to the next start code.
/// The bytes are borrowed, never copied.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct NalUnit<'a> {
    data: &'a [u8],

    /// Offset of the start code, including a leading `zero_byte` for the four-byte form.
    start: usize,

    /// Offset of the first NAL unit header byte.
    ///
    /// ```text
    ///  +---------------+
    ///  |7|6|5|4|3|2|1|0|
    ///  +-+-----------+-+
    ///  |D|   Type    |L|
    ///  +-+-----------+-+
    /// ```
    ///
    /// `D` is `forbidden_zero_bit` in the standard. Past the encoder it carries the
    /// disposability mark for VCL units (see [`NalUnit::DISPOSABLE_FLAG`]). `L` is the high
    /// bit of `nuh_layer_id`.
    header: usize,

    /// Offset of the next start code, or the end of the buffer.
    end: usize,
}

impl<'a> NalUnit<'a> {
    /// A unique sequence of three bytes equal to `0x000001` embedded in the byte stream as a
    /// prefix to each `NalUnit`. The location of a `START_CODE_PREFIX` marks the beginning of
    /// a new NAL unit and the end of the previous one.
    pub const START_CODE_PREFIX: [u8; 3] = [0x00, 0x00, 0x01];

    /// The four-byte form, a `zero_byte` followed by `START_CODE_PREFIX`. Used ahead of
    /// parameter sets and the first NAL unit of an access unit.
    pub const START_CODE: [u8; 4] = [0x00, 0x00, 0x00, 0x01];

    /// Disposability mark carried in the most significant bit of the first header byte.
    ///
    /// This overlays `forbidden_zero_bit` on purpose. Set means no other picture references
    /// this one and it may be dropped under backpressure. It is only ever written on VCL
    /// slice units; parameter sets and other non-VCL units keep a compliant header.
    pub const DISPOSABLE_FLAG: u8 = 0x80;

    pub(crate) fn new(data: &'a [u8], start: usize, header: usize, end: usize) -> Self {
        debug_assert!(start < header && header < end && end <= data.len());
        Self {
            data,
            start,
            header,
            end,
        }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn header_offset(&self) -> usize {
        self.header
    }

    pub fn end(&self) -> usize {
        self.end
    }

    /// `start..end`, start code included.
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn start_code_len(&self) -> usize {
        self.header - self.start
    }

    pub fn header_byte(&self) -> u8 {
        self.data[self.header]
    }

    pub fn nal_unit_type(&self) -> NalUnitType {
        NalUnitType::from_header_byte(self.header_byte())
    }

    /// Whether the unit is a VCL slice carrying the disposability mark.
    pub fn is_disposable(&self) -> bool {
        self.nal_unit_type().is_vcl_slice() && self.header_byte() & Self::DISPOSABLE_FLAG != 0
    }

    /// The unit with its start code.
    pub fn bytes(&self) -> &'a [u8] {
        &self.data[self.start..self.end]
    }

    /// The unit from its header onwards, without the start code.
    pub fn payload(&self) -> &'a [u8] {
        &self.data[self.header..self.end]
    }

    /// `first_slice_segment_in_pic_flag`, the first bit after the two-byte header of a VCL
    /// unit. `None` for non-VCL units or when the unit is too short to carry it.
    pub fn first_slice_segment_in_pic(&self) -> Option<bool> {
        if !self.nal_unit_type().is_vcl() {
            return None;
        }

        self.payload().get(2).map(|byte| byte & 0x80 != 0)
    }

    /// Returns `header` with its disposability mark replaced by `disposable`. The NAL unit
    /// type and layer bits are left untouched, so applying it twice is the same as once.
    pub const fn with_disposable_flag(header: u8, disposable: bool) -> u8 {
        (header & !Self::DISPOSABLE_FLAG) | ((disposable as u8) << 7)
    }
}
