//! Post-processing for HEVC Annex-B encoder output: priority classification, disposability
//! marking of slice headers, and out-of-band header extraction.

mod access_unit;
mod errors;
mod extractor;
mod frame_type;
mod rewriter;
mod session;
mod stream;

pub use access_unit::{AccessUnit, Packet};
pub use errors::{HeaderError, PostProcessError, SessionError, StreamError};
pub use extractor::{
    extract_headers, split_access_unit, ExtractedHeaders, ParameterSets, SplitAccessUnit,
};
pub use frame_type::{FrameType, Priority};
pub use rewriter::{mark_disposability, RewriteOutcome};
pub use session::{EncoderSession, PostProcessor, SharedDevice};
pub use stream::{AccessUnitSpans, AnnexBFile};
