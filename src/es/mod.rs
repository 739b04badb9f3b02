//! Elementary streams.
//!
//! An [`ElementaryStream`](struct.ElementaryStream.html) reassembles the PES units of
//! a single PID and hands the payload of each completed unit to a parser selected by
//! its [`StreamType`](enum.StreamType.html).
pub use self::options::{EsOptions, TS_IGNORE_HEADER_LENGTH};
pub use self::packet::{EsContent, EsPacket, StreamInfo};
pub use self::stream::{ElementaryStream, Fragment};
pub use self::stream_id::StreamId;
pub use self::stream_type::StreamType;

pub mod content {
    //! Stream type specific contents of elementary stream packets.

    pub use super::audio::AudioFrame;
    pub use super::subtitle::{
        DisplaySet, PageComposition, PageState, RegionPlacement, Segment, SegmentType,
    };
    pub use super::teletext::TeletextUnit;
    pub use super::video::{VideoUnit, VideoUnits};
}

mod audio;
mod options;
mod packet;
mod stream;
mod stream_id;
mod stream_type;
pub(crate) mod subtitle;
mod teletext;
mod video;
