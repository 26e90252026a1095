use std::fs::File;
use std::path::Path;

use common::{NalUnitType, NalUnits};
use log::debug;
use memmap::Mmap;

use crate::errors::StreamError;

/// A raw Annex-B elementary stream mapped into memory.
pub struct AnnexBFile {
    data: Mmap,
}

impl AnnexBFile {
    pub fn from_file(file: File) -> Result<Self, StreamError> {
        let mmap = unsafe { Mmap::map(&file)? };
        debug!("mapped {} bytes of Annex-B data", mmap.len());
        Ok(Self { data: mmap })
    }

    pub fn from_file_path(file_path: impl AsRef<Path>) -> Result<Self, StreamError> {
        let file_path = file_path.as_ref();
        if file_path.is_dir() {
            return Err(StreamError::UnrecognizedFilePath(
                file_path.display().to_string(),
            ));
        }

        let file = File::open(file_path)?;
        AnnexBFile::from_file(file)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn nal_units(&self) -> NalUnits<'_> {
        NalUnits::new(&self.data)
    }

    pub fn access_units(&self) -> AccessUnitSpans<'_> {
        AccessUnitSpans::new(&self.data)
    }
}

/// Splits an elementary stream into access units.
///
/// Once the current access unit holds a slice, the next one begins at an access unit
/// delimiter, a parameter set, a prefix SEI, a reserved (41-44) or unspecified (48-55)
/// non-VCL unit, or a slice segment that starts a new picture.
///
/// Spans are contiguous and cover the whole buffer. Bytes before the first start code
/// belong to the first span, and start codes with no header behind them stay in the span
/// they appear in.
pub struct AccessUnitSpans<'a> {
    data: &'a [u8],
    nal_units: std::iter::Peekable<NalUnits<'a>>,
    cursor: usize,
}

impl<'a> AccessUnitSpans<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            nal_units: NalUnits::new(data).peekable(),
            cursor: 0,
        }
    }
}

fn starts_access_unit(nal_unit_type: NalUnitType) -> bool {
    matches!(nal_unit_type.value(), 32..=35 | 39 | 41..=44 | 48..=55)
}

impl<'a> Iterator for AccessUnitSpans<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.data.len() {
            return None;
        }
        let start = self.cursor;

        if let Some(first) = self.nal_units.next() {
            let mut seen_vcl = first.nal_unit_type().is_vcl();

            while let Some(nal) = self.nal_units.peek() {
                let nal_unit_type = nal.nal_unit_type();

                if seen_vcl
                    && (starts_access_unit(nal_unit_type)
                        || nal.first_slice_segment_in_pic() == Some(true))
                {
                    break;
                }

                seen_vcl |= nal_unit_type.is_vcl();
                self.nal_units.next();
            }
        }

        let end = self
            .nal_units
            .peek()
            .map_or(self.data.len(), |nal| nal.start());
        self.cursor = end;

        Some(&self.data[start..end])
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn stream() -> Vec<u8> {
        vec![
            0x00, 0x00, 0x00, 0x01, 0x40, 0x01, 0x0C, // VPS
            0x00, 0x00, 0x00, 0x01, 0x42, 0x01, 0x01, // SPS
            0x00, 0x00, 0x00, 0x01, 0x44, 0x01, 0xC1, // PPS
            0x00, 0x00, 0x01, 0x26, 0x01, 0xAF, 0x11, // IDR, first slice
            0x00, 0x00, 0x01, 0x26, 0x01, 0x2F, 0x11, // IDR, second slice
            0x00, 0x00, 0x01, 0x50, 0x01, 0x05, 0x04, // suffix SEI
            0x00, 0x00, 0x00, 0x01, 0x46, 0x01, 0x50, // AUD
            0x00, 0x00, 0x01, 0x02, 0x01, 0xD0, 0x21, // TRAIL_R, first slice
            0x00, 0x00, 0x01, 0x00, 0x01, 0xD0, 0x42, // TRAIL_N, first slice
        ]
    }

    #[test]
    fn test_access_units() {
        let data = stream();

        let units: Vec<&[u8]> = AccessUnitSpans::new(&data).collect();

        assert_eq!(units, vec![&data[0..42], &data[42..56], &data[56..]]);
    }

    #[test]
    fn test_access_units_empty() {
        assert_eq!(AccessUnitSpans::new(&[]).count(), 0);

        let garbage = [0x12, 0x34];
        let units: Vec<&[u8]> = AccessUnitSpans::new(&garbage).collect();
        assert_eq!(units, vec![garbage.as_slice()]);
    }

    #[test]
    fn test_access_units_cover_every_byte() {
        let data = vec![
            0x55, 0xAA, // garbage before the first start code
            0x00, 0x00, 0x00, 0x01, 0x26, 0x01, 0xAF, 0x11, // IDR
            0x00, 0x00, 0x00, 0x01, // empty start code
            0x00, 0x00, 0x01, 0x02, 0x01, 0xD0, 0x21, // TRAIL_R, first slice
            0x00, 0x00, 0x01, // trailing start code
        ];

        let units: Vec<&[u8]> = AccessUnitSpans::new(&data).collect();

        assert_eq!(units, vec![&data[..14], &data[14..]]);
        assert_eq!(units.concat(), data);
    }

    #[test]
    fn test_from_file_path() -> Result<(), StreamError> {
        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(&stream())?;

        let annexb = AnnexBFile::from_file_path(file.path())?;

        assert_eq!(annexb.bytes(), stream().as_slice());
        assert_eq!(annexb.nal_units().count(), 9);
        assert_eq!(annexb.access_units().count(), 3);

        Ok(())
    }

    #[test]
    fn test_directory_is_rejected() -> Result<(), StreamError> {
        let dir = tempfile::tempdir()?;

        assert!(matches!(
            AnnexBFile::from_file_path(dir.path()),
            Err(StreamError::UnrecognizedFilePath(_))
        ));

        Ok(())
    }
}
