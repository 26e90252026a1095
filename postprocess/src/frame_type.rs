use bitflags::bitflags;
use common::NalUnits;

bitflags! {
    /// Frame-type mask an encoder session reports with every encoded access unit. Bit values
    /// follow the hardware SDK: the low byte describes the first field (or the frame), the
    /// `X*` flags in the high byte the second field.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FrameType: u16 {
        const I = 0x0001;
        const P = 0x0002;
        const B = 0x0004;
        const S = 0x0008;
        const REF = 0x0040;
        const IDR = 0x0080;

        const XI = 0x0100;
        const XP = 0x0200;
        const XB = 0x0400;
        const XS = 0x0800;
        const XREF = 0x4000;
        const XIDR = 0x8000;
    }
}

impl FrameType {
    /// Best-effort frame type for access units that arrive without encoder flags.
    ///
    /// Only NAL unit types are looked at, slice headers are not parsed, so P and B are told
    /// apart by the sub-layer reference property alone: reference slices count as `P | REF`
    /// and sub-layer non-reference slices as `B`.
    pub fn from_nal_types(data: &[u8]) -> Self {
        let mut frame_type = FrameType::empty();

        for nal in NalUnits::new(data) {
            let nal_unit_type = nal.nal_unit_type();

            if nal_unit_type.is_idr() {
                return FrameType::I | FrameType::IDR | FrameType::REF;
            }

            if nal_unit_type.is_irap() {
                frame_type = FrameType::I | FrameType::REF;
            } else if nal_unit_type.is_vcl() && !frame_type.contains(FrameType::I) {
                if nal_unit_type.is_sub_layer_non_reference() {
                    if frame_type.is_empty() {
                        frame_type = FrameType::B;
                    }
                } else {
                    frame_type = FrameType::P | FrameType::REF;
                }
            }
        }

        frame_type
    }

    pub fn is_keyframe(self) -> bool {
        self.contains(FrameType::IDR)
    }
}

/// How much downstream consumers should protect an access unit when they have to drop data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Priority {
    Disposable = 0,
    /// Never derived by [`Priority::from_frame_type`]; kept so the value space matches what
    /// consumers already understand.
    Low = 1,
    High = 2,
    Highest = 3,
}

impl Priority {
    /// Intra pictures are `Highest`, P or reference pictures `High`, anything else
    /// `Disposable`. Checked in that order.
    pub fn from_frame_type(frame_type: FrameType) -> Self {
        if frame_type.contains(FrameType::I) {
            Priority::Highest
        } else if frame_type.intersects(FrameType::P | FrameType::REF) {
            Priority::High
        } else {
            Priority::Disposable
        }
    }

    pub fn is_disposable(self) -> bool {
        self == Priority::Disposable
    }

    pub fn name(self) -> &'static str {
        match self {
            Priority::Disposable => "disposable",
            Priority::Low => "low",
            Priority::High => "high",
            Priority::Highest => "highest",
        }
    }
}

impl From<Priority> for u8 {
    fn from(priority: Priority) -> Self {
        priority as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_policy() {
        assert_eq!(Priority::from_frame_type(FrameType::I), Priority::Highest);
        assert_eq!(
            Priority::from_frame_type(FrameType::I | FrameType::IDR | FrameType::REF),
            Priority::Highest
        );
        assert_eq!(Priority::from_frame_type(FrameType::P), Priority::High);
        assert_eq!(
            Priority::from_frame_type(FrameType::B | FrameType::REF),
            Priority::High
        );
        assert_eq!(Priority::from_frame_type(FrameType::B), Priority::Disposable);
        assert_eq!(
            Priority::from_frame_type(FrameType::empty()),
            Priority::Disposable
        );
    }

    #[test]
    fn test_priority_values() {
        let values: Vec<u8> = [
            Priority::Disposable,
            Priority::Low,
            Priority::High,
            Priority::Highest,
        ]
        .into_iter()
        .map(u8::from)
        .collect();

        assert_eq!(values, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_keyframe_follows_idr_flag() {
        assert!((FrameType::I | FrameType::IDR).is_keyframe());
        assert!(!(FrameType::I | FrameType::REF).is_keyframe());
        assert_eq!(FrameType::from_bits_truncate(0x0080), FrameType::IDR);
    }

    #[test]
    fn test_from_nal_types() {
        let idr = vec![
            0x00, 0x00, 0x00, 0x01, 0x40, 0x01, 0x0C, // VPS
            0x00, 0x00, 0x01, 0x26, 0x01, 0xAF, // IDR_W_RADL
        ];
        let cra = vec![0x00, 0x00, 0x01, 0x2A, 0x01, 0xAF];
        let trail_r = vec![0x00, 0x00, 0x01, 0x02, 0x01, 0xD0];
        let trail_n = vec![0x00, 0x00, 0x01, 0x00, 0x01, 0xD0];
        let aud = vec![0x00, 0x00, 0x01, 0x46, 0x01, 0x50];

        assert_eq!(
            FrameType::from_nal_types(&idr),
            FrameType::I | FrameType::IDR | FrameType::REF
        );
        assert_eq!(
            FrameType::from_nal_types(&cra),
            FrameType::I | FrameType::REF
        );
        assert_eq!(
            FrameType::from_nal_types(&trail_r),
            FrameType::P | FrameType::REF
        );
        assert_eq!(FrameType::from_nal_types(&trail_n), FrameType::B);
        assert_eq!(FrameType::from_nal_types(&aud), FrameType::empty());
    }
}
