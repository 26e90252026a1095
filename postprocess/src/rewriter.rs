use common::{find_start_code, header_offset, NalUnit, NalUnitType};

/// What a disposability pass saw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RewriteOutcome {
    /// At least one coded slice segment is present.
    pub contains_vcl: bool,
    /// Number of slice headers that carry the requested mark after the pass.
    pub vcl_units: usize,
}

/// Writes `is_disposable` into the disposability bit of every VCL slice header in `data`.
///
/// Single linear pass, in place, no allocation. The bit is assigned rather than toggled so
/// the pass can be repeated. Non-VCL headers and the NAL unit type bits are never touched,
/// and unknown or reserved types are passed over.
///
/// An empty buffer is reported as containing no VCL data and left alone.
pub fn mark_disposability(data: &mut [u8], is_disposable: bool) -> RewriteOutcome {
    let mut outcome = RewriteOutcome::default();

    if data.is_empty() {
        return outcome;
    }

    let end = data.len();
    let mut cursor = find_start_code(data, 0, end);

    while let Some(header) = header_offset(data, cursor) {
        let next = find_start_code(data, header, end);

        // a start code immediately followed by another one has no header of its own
        if next > header && NalUnitType::from_header_byte(data[header]).is_vcl_slice() {
            data[header] = NalUnit::with_disposable_flag(data[header], is_disposable);
            outcome.contains_vcl = true;
            outcome.vcl_units += 1;
        }

        cursor = next;
    }

    outcome
}
