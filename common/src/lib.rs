mod byte_stream;
mod nal_unit;
mod nal_unit_type;

pub use byte_stream::{
    find_nal_unit, find_start_code, find_start_code_prefix, header_offset, is_keyframe,
    NalUnits,
};
pub use nal_unit::NalUnit;
pub use nal_unit_type::{NalCategory, NalUnitType};
