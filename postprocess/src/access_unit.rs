use common::NalUnits;

use crate::frame_type::{FrameType, Priority};
use crate::rewriter::{mark_disposability, RewriteOutcome};

/// One encoded frame as it comes out of an encoder session: an Annex-B buffer holding one
/// or more NAL units, its presentation timestamp and the encoder's frame-type flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessUnit {
    data: Vec<u8>,
    pts: i64,
    frame_type: FrameType,
}

impl AccessUnit {
    pub fn new(data: Vec<u8>, pts: i64, frame_type: FrameType) -> Self {
        Self {
            data,
            pts,
            frame_type,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn pts(&self) -> i64 {
        self.pts
    }

    pub fn frame_type(&self) -> FrameType {
        self.frame_type
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Keyframe status comes from the encoder's IDR flag, not from scanning NAL unit types.
    pub fn is_keyframe(&self) -> bool {
        self.frame_type.is_keyframe()
    }

    pub fn priority(&self) -> Priority {
        Priority::from_frame_type(self.frame_type)
    }

    pub fn nal_units(&self) -> NalUnits<'_> {
        NalUnits::new(&self.data)
    }

    /// Marks every slice header according to this unit's own priority.
    pub fn mark_disposability(&mut self) -> RewriteOutcome {
        let is_disposable = self.priority().is_disposable();
        mark_disposability(&mut self.data, is_disposable)
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

/// A post-processed access unit ready to be handed downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub data: Vec<u8>,
    pub pts: i64,
    pub keyframe: bool,
    pub priority: Priority,
}
