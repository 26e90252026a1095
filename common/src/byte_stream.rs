use std::sync::LazyLock;

use memchr::memmem::Finder;

use crate::nal_unit::NalUnit;
use crate::nal_unit_type::NalUnitType;

/// Returns the offset of the first three-byte `START_CODE_PREFIX` lying entirely inside
/// `data[begin..end]`. When there is none, returns `end` (clamped to `data.len()`).
pub fn find_start_code_prefix(data: &[u8], begin: usize, end: usize) -> usize {
    static FINDER: LazyLock<Finder> = LazyLock::new(|| Finder::new(&NalUnit::START_CODE_PREFIX));

    let end = end.min(data.len());
    if begin >= end {
        return end;
    }

    FINDER
        .find(&data[begin..end])
        .map_or(end, |offset| begin + offset)
}

/// Finds the next Annex-B start code in `data[begin..end]`.
///
/// Both the three-byte form `0x00 0x00 0x01` and the four-byte form `0x00 0x00 0x00 0x01`
/// are recognized: when the byte just before a three-byte prefix is zero and still inside
/// the range, the returned offset points at that byte instead.
///
/// Not finding a start code is not an error. The scan simply reaches the end of the range
/// and `end` (clamped to `data.len()`) is returned, so callers compare against it.
pub fn find_start_code(data: &[u8], begin: usize, end: usize) -> usize {
    let end = end.min(data.len());
    let found = find_start_code_prefix(data, begin, end);

    if begin < found && found < end && data[found - 1] == 0x00 {
        found - 1
    } else {
        found
    }
}

/// Steps over the start code at `start_code` and returns the offset of the NAL header's
/// first byte, or `None` when the buffer ends first.
///
/// Leading zero bytes and the terminating `0x01` are consumed, so both start code forms
/// (and any extra `zero_byte` padding in front of them) land on the header.
pub fn header_offset(data: &[u8], start_code: usize) -> Option<usize> {
    let mut cursor = start_code;

    while cursor < data.len() {
        let byte = data[cursor];
        cursor += 1;
        if byte != 0x00 {
            break;
        }
    }

    (cursor < data.len()).then_some(cursor)
}

/// Iterator over the NAL units of an Annex-B buffer. Nothing is copied: each item is a
/// view into the borrowed buffer.
///
/// Bytes before the first start code are ignored, and a start code directly followed by
/// another one yields no unit.
#[derive(Debug, Clone)]
pub struct NalUnits<'a> {
    data: &'a [u8],
    cursor: usize,
}

impl<'a> NalUnits<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            cursor: find_start_code(data, 0, data.len()),
        }
    }
}

impl<'a> Iterator for NalUnits<'a> {
    type Item = NalUnit<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let start = self.cursor;
            let header = header_offset(self.data, start)?;
            let end = find_start_code(self.data, header, self.data.len());
            self.cursor = end;

            if end > header {
                return Some(NalUnit::new(self.data, start, header, end));
            }
        }
    }
}

/// Scans `data` for an IDR slice (`IDR_W_RADL` or `IDR_N_LP`).
///
/// Encoder sessions report IDR pictures in their frame-type flags and that remains the
/// primary signal; this is for streams that arrive without one.
pub fn is_keyframe(data: &[u8]) -> bool {
    NalUnits::new(data).any(|nal| nal.nal_unit_type().is_idr())
}

/// Returns the first NAL unit of `nal_unit_type` in `data`.
pub fn find_nal_unit(data: &[u8], nal_unit_type: NalUnitType) -> Option<NalUnit<'_>> {
    NalUnits::new(data).find(|nal| nal.nal_unit_type() == nal_unit_type)
}
