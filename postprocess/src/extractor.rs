use common::{NalUnitType, NalUnits};

use crate::errors::HeaderError;

/// Borrowed VPS, SPS and PPS bytes as an encoder session exposes them. The borrow is only
/// good until the session is reconfigured, so callers copy out of it right away with
/// [`extract_headers`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParameterSets<'a> {
    pub vps: &'a [u8],
    pub sps: &'a [u8],
    pub pps: &'a [u8],
}

impl<'a> ParameterSets<'a> {
    pub fn new(vps: &'a [u8], sps: &'a [u8], pps: &'a [u8]) -> Self {
        Self { vps, sps, pps }
    }

    /// Builds the set from scratch buffers whose valid length is reported separately, the
    /// way hardware sessions hand them out. Each length must fit its buffer.
    pub fn from_lengths(
        vps: (&'a [u8], usize),
        sps: (&'a [u8], usize),
        pps: (&'a [u8], usize),
    ) -> Result<Self, HeaderError> {
        Ok(Self {
            vps: truncate("VPS", vps)?,
            sps: truncate("SPS", sps)?,
            pps: truncate("PPS", pps)?,
        })
    }

    pub fn len(&self) -> usize {
        self.vps.len() + self.sps.len() + self.pps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn truncate<'a>(
    kind: &'static str,
    (buf, len): (&'a [u8], usize),
) -> Result<&'a [u8], HeaderError> {
    buf.get(..len).ok_or(HeaderError::LengthOutOfBounds {
        kind,
        len,
        available: buf.len(),
    })
}

/// Out-of-band headers owned by the caller: the parameter-set blob and the SEI blob.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExtractedHeaders {
    parameter_sets: Vec<u8>,
    sei: Vec<u8>,
}

impl ExtractedHeaders {
    /// VPS, SPS and PPS back to back, nothing in between.
    pub fn parameter_sets(&self) -> &[u8] {
        &self.parameter_sets
    }

    pub fn sei(&self) -> &[u8] {
        &self.sei
    }

    pub fn len(&self) -> usize {
        self.parameter_sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameter_sets.is_empty()
    }
}

/// Concatenates VPS, SPS and PPS, in that order, into a newly allocated buffer.
///
/// Session-level SEI is not produced yet, so the SEI blob is always empty.
/// [`split_access_unit`] is the scanning variant that also collects SEI units.
pub fn extract_headers(parameter_sets: ParameterSets<'_>) -> ExtractedHeaders {
    let mut header = Vec::with_capacity(parameter_sets.len());
    header.extend_from_slice(parameter_sets.vps);
    header.extend_from_slice(parameter_sets.sps);
    header.extend_from_slice(parameter_sets.pps);

    ExtractedHeaders {
        parameter_sets: header,
        sei: Vec::new(),
    }
}

/// An access unit split into its leading headers and the coded payload behind them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitAccessUnit<'a> {
    /// Leading VPS/SPS/PPS units with their start codes, in stream order.
    pub parameter_sets: Vec<u8>,
    /// Leading prefix SEI units with their start codes.
    pub sei: Vec<u8>,
    /// Everything from the first unit that is not a leading header. Not copied.
    pub payload: &'a [u8],
}

/// Walks the leading non-VCL units of `data` and copies parameter sets and prefix SEI out.
///
/// The leading run ends at the first unit of any other type and the payload starts there,
/// so parameter sets or SEI further into the unit stay in the payload and the three parts
/// never overlap. Access unit delimiters inside the leading run are dropped, as are bytes
/// before the first start code.
pub fn split_access_unit(data: &[u8]) -> SplitAccessUnit<'_> {
    let mut parameter_sets = Vec::new();
    let mut sei = Vec::new();
    let mut payload_start = data.len();

    for nal in NalUnits::new(data) {
        let nal_unit_type = nal.nal_unit_type();

        if nal_unit_type.is_parameter_set() {
            parameter_sets.extend_from_slice(nal.bytes());
        } else if nal_unit_type == NalUnitType::PREFIX_SEI {
            sei.extend_from_slice(nal.bytes());
        } else if nal_unit_type != NalUnitType::ACCESS_UNIT_DELIMITER {
            payload_start = nal.start();
            break;
        }
    }

    SplitAccessUnit {
        parameter_sets,
        sei,
        payload: &data[payload_start..],
    }
}
