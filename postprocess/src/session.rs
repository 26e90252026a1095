use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, trace, warn};

use crate::access_unit::{AccessUnit, Packet};
use crate::errors::SessionError;
use crate::extractor::{extract_headers, ExtractedHeaders, ParameterSets};

/// Handle to the hardware device that every encoder session in the process shares.
///
/// Only opening, reconfiguring and closing a session go through the lock. Bitstream
/// post-processing works on buffers the caller owns and never takes it.
#[derive(Debug, Clone, Default)]
pub struct SharedDevice {
    lock: Arc<Mutex<()>>,
}

impl SharedDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock(&self) -> Result<MutexGuard<'_, ()>, SessionError> {
        self.lock.lock().map_err(|_| SessionError::DevicePoisoned)
    }
}

/// The encoder that produces access units. Opening, reconfiguring and submitting frames
/// belong to the implementation; the post-processor only asks it for parameter sets.
pub trait EncoderSession: Sized {
    type Params;

    fn open(params: &Self::Params) -> Result<Self, SessionError>;

    fn reconfigure(&mut self, params: &Self::Params) -> Result<(), SessionError>;

    /// VPS, SPS and PPS of the current configuration, borrowed from the session's own
    /// buffers until the next reconfiguration.
    fn parameter_sets(&self) -> Result<ParameterSets<'_>, SessionError>;
}

/// Per-session post-processing state: the session itself, the device it shares with
/// other sessions, and the out-of-band headers copied from it.
#[derive(Debug)]
pub struct PostProcessor<S> {
    session: S,
    device: SharedDevice,
    headers: ExtractedHeaders,
}

impl<S: EncoderSession> PostProcessor<S> {
    pub fn open(device: SharedDevice, params: &S::Params) -> Result<Self, SessionError> {
        let session = {
            let _guard = device.lock()?;
            S::open(params).inspect_err(|err| warn!("failed to open encoder session: {err}"))?
        };

        let headers = load_headers(&session)?;

        Ok(Self {
            session,
            device,
            headers,
        })
    }

    /// Applies new parameters and replaces the cached headers, since resolution or profile
    /// changes produce new parameter sets.
    ///
    /// If the session rejects the parameters it keeps its old configuration, and so do the
    /// cached headers. If it accepts them but the new headers cannot be read, the cache is
    /// emptied: the old headers no longer describe the session's output.
    pub fn reconfigure(&mut self, params: &S::Params) -> Result<(), SessionError> {
        {
            let _guard = self.device.lock()?;
            self.session
                .reconfigure(params)
                .inspect_err(|err| warn!("Failed to reconfigure: {err}"))?;
        }

        match load_headers(&self.session) {
            Ok(headers) => {
                self.headers = headers;
                Ok(())
            }
            Err(err) => {
                warn!("reconfigured session has unreadable parameter sets: {err}");
                self.headers = ExtractedHeaders::default();
                Err(err)
            }
        }
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn headers(&self) -> &ExtractedHeaders {
        &self.headers
    }

    /// The VPS/SPS/PPS blob for container or stream headers.
    pub fn extra_data(&self) -> &[u8] {
        self.headers.parameter_sets()
    }

    pub fn sei(&self) -> Option<&[u8]> {
        Some(self.headers.sei()).filter(|sei| !sei.is_empty())
    }

    /// Turns an encoder output buffer into a packet.
    ///
    /// An empty buffer means the encoder produced nothing this cycle and yields `None`, as
    /// does a buffer without any slice data. Otherwise every slice header is marked
    /// according to the unit's priority before the packet is built.
    pub fn process(&self, mut access_unit: AccessUnit) -> Option<Packet> {
        if access_unit.is_empty() {
            trace!("no encoder output at pts {}", access_unit.pts());
            return None;
        }

        let priority = access_unit.priority();
        let outcome = access_unit.mark_disposability();

        trace!(
            "pts {}: {} bytes, {} slice segments, priority {}",
            access_unit.pts(),
            access_unit.data().len(),
            outcome.vcl_units,
            priority.name()
        );

        if !outcome.contains_vcl {
            return None;
        }

        Some(Packet {
            keyframe: access_unit.is_keyframe(),
            pts: access_unit.pts(),
            priority,
            data: access_unit.into_data(),
        })
    }

    pub fn close(self) -> Result<(), SessionError> {
        let Self {
            session, device, ..
        } = self;

        let guard = device.lock()?;
        drop(session);
        drop(guard);

        Ok(())
    }
}

fn load_headers<S: EncoderSession>(session: &S) -> Result<ExtractedHeaders, SessionError> {
    let headers = extract_headers(session.parameter_sets()?);
    debug!("loaded {} bytes of parameter sets", headers.len());
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::HeaderError;
    use crate::frame_type::{FrameType, Priority};

    #[derive(Debug)]
    struct FakeParams {
        width: u8,
        fail: bool,
    }

    #[derive(Debug)]
    struct FakeSession {
        vps: Vec<u8>,
        sps: [u8; 8],
        sps_len: usize,
        pps: Vec<u8>,
    }

    impl EncoderSession for FakeSession {
        type Params = FakeParams;

        fn open(params: &FakeParams) -> Result<Self, SessionError> {
            if params.fail {
                return Err(SessionError::Open("no device".to_string()));
            }

            let mut sps = [0u8; 8];
            sps[0] = params.width;
            Ok(Self {
                vps: vec![0xAA],
                sps,
                sps_len: 2,
                pps: vec![0xCC],
            })
        }

        fn reconfigure(&mut self, params: &FakeParams) -> Result<(), SessionError> {
            if params.fail {
                return Err(SessionError::Reconfigure("busy".to_string()));
            }

            self.sps[0] = params.width;
            self.sps_len = if params.width > 0xF0 { 9 } else { 1 };
            Ok(())
        }

        fn parameter_sets(&self) -> Result<ParameterSets<'_>, SessionError> {
            Ok(ParameterSets::from_lengths(
                (self.vps.as_slice(), self.vps.len()),
                (self.sps.as_slice(), self.sps_len),
                (self.pps.as_slice(), self.pps.len()),
            )?)
        }
    }

    fn open(width: u8) -> Result<PostProcessor<FakeSession>, SessionError> {
        PostProcessor::open(SharedDevice::new(), &FakeParams { width, fail: false })
    }

    #[test]
    fn test_open_loads_headers() -> Result<(), SessionError> {
        let processor = open(0xBB)?;

        assert_eq!(processor.extra_data(), &[0xAA, 0xBB, 0x00, 0xCC]);
        assert_eq!(processor.sei(), None);
        assert_eq!(processor.session().sps_len, 2);

        processor.close()
    }

    #[test]
    fn test_open_failure() {
        let result = PostProcessor::<FakeSession>::open(
            SharedDevice::new(),
            &FakeParams {
                width: 0,
                fail: true,
            },
        );
        assert!(matches!(result, Err(SessionError::Open(_))));
    }

    #[test]
    fn test_reconfigure_replaces_headers() -> Result<(), SessionError> {
        let mut processor = open(0xBB)?;

        processor.reconfigure(&FakeParams {
            width: 0x11,
            fail: false,
        })?;
        assert_eq!(processor.extra_data(), &[0xAA, 0x11, 0xCC]);

        let failed = processor.reconfigure(&FakeParams {
            width: 0x22,
            fail: true,
        });
        assert!(matches!(failed, Err(SessionError::Reconfigure(_))));
        assert_eq!(processor.extra_data(), &[0xAA, 0x11, 0xCC]);

        let oversized = processor.reconfigure(&FakeParams {
            width: 0xF8,
            fail: false,
        });
        assert!(matches!(
            oversized,
            Err(SessionError::Headers(HeaderError::LengthOutOfBounds { .. }))
        ));
        assert!(processor.extra_data().is_empty());

        Ok(())
    }

    #[test]
    fn test_unreadable_headers_drop_stale_blob() -> Result<(), SessionError> {
        let mut processor = open(0xBB)?;

        let result = processor.reconfigure(&FakeParams {
            width: 0xF8,
            fail: false,
        });
        assert!(result.is_err());
        assert_eq!(processor.session().sps[0], 0xF8);
        assert_eq!(processor.extra_data(), &[] as &[u8]);
        assert!(processor.headers().is_empty());

        processor.reconfigure(&FakeParams {
            width: 0x33,
            fail: false,
        })?;
        assert_eq!(processor.extra_data(), &[0xAA, 0x33, 0xCC]);

        Ok(())
    }

    #[test]
    fn test_process() -> Result<(), SessionError> {
        let processor = open(0xBB)?;

        let idr = vec![0x00, 0x00, 0x00, 0x01, 0x26, 0x01, 0xAF];
        let packet = processor.process(AccessUnit::new(
            idr.clone(),
            0,
            FrameType::I | FrameType::IDR | FrameType::REF,
        ));
        assert_eq!(
            packet,
            Some(Packet {
                data: idr,
                pts: 0,
                keyframe: true,
                priority: Priority::Highest,
            })
        );

        let b = vec![0x00, 0x00, 0x01, 0x00, 0x01, 0xD0];
        let packet = processor.process(AccessUnit::new(b, 2, FrameType::B));
        assert_eq!(packet.as_ref().map(|p| p.priority), Some(Priority::Disposable));
        assert_eq!(packet.map(|p| p.data[3]), Some(0x80));

        Ok(())
    }

    #[test]
    fn test_process_without_slices() -> Result<(), SessionError> {
        let processor = open(0xBB)?;

        assert_eq!(processor.process(AccessUnit::new(vec![], 0, FrameType::I)), None);

        let aud = vec![0x00, 0x00, 0x00, 0x01, 0x46, 0x01, 0x50];
        assert_eq!(processor.process(AccessUnit::new(aud, 1, FrameType::B)), None);

        Ok(())
    }

    #[test]
    fn test_process_does_not_take_device_lock() -> Result<(), SessionError> {
        let device = SharedDevice::new();
        let processor = PostProcessor::<FakeSession>::open(
            device.clone(),
            &FakeParams {
                width: 0xBB,
                fail: false,
            },
        )?;

        let _held = device.lock()?;
        let p = vec![0x00, 0x00, 0x01, 0x02, 0x01, 0xD0];
        assert!(processor
            .process(AccessUnit::new(p, 1, FrameType::P))
            .is_some());

        Ok(())
    }

    #[test]
    fn test_poisoned_device() {
        let device = SharedDevice::new();

        let poisoner = device.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.lock.lock();
            panic!("poison the device lock");
        })
        .join();

        let result = PostProcessor::<FakeSession>::open(
            device,
            &FakeParams {
                width: 0,
                fail: false,
            },
        );
        assert!(matches!(result, Err(SessionError::DevicePoisoned)));
    }
}
