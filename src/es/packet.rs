use crate::es::audio::AudioFrame;
use crate::es::subtitle::DisplaySet;
use crate::es::teletext::TeletextUnit;
use crate::es::video::VideoUnits;
use crate::es::{StreamId, StreamType};
use crate::time::Timestamp;
use crate::ts::Pid;

/// Elementary stream packet, produced once per completed unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EsPacket {
    /// PID of the stream that produced the packet.
    pub pid: Pid,

    /// Content type of the stream.
    pub stream_type: StreamType,

    /// Stream ID of the PES unit the packet was extracted from.
    pub stream_id: StreamId,

    /// Presentation timestamp.
    pub pts: Option<Timestamp>,

    /// Decoding timestamp.
    pub dts: Option<Timestamp>,

    /// Payload bytes. `content` ranges index into this.
    pub data: Vec<u8>,

    /// Stream type specific description of `data`.
    pub content: EsContent,

    /// `true` if the stream information changed while producing this packet.
    pub stream_change: bool,
}

/// Stream type specific content of an `EsPacket`.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EsContent {
    Subtitle(DisplaySet),
    Teletext(Vec<TeletextUnit>),
    Audio(Vec<AudioFrame>),
    Video(VideoUnits),
}

/// Properties of an elementary stream.
///
/// Audio and video fields are learnt from the payload, the others are supplied by the
/// demultiplexer (typically from program map table descriptors).
#[allow(missing_docs)]
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StreamInfo {
    pub language: Option<String>,
    pub composition_page_id: Option<u16>,
    pub ancillary_page_id: Option<u16>,
    pub sample_rate: Option<u32>,
    pub channels: Option<u8>,
    pub bit_rate: Option<u32>,
    pub width: Option<u16>,
    pub height: Option<u16>,
    pub aspect_ratio_code: Option<u8>,
    pub frame_rate_code: Option<u8>,
}

/// Output of a payload parser for one completed unit.
#[derive(Debug)]
pub(crate) struct Extracted {
    pub stream_id: StreamId,
    pub pts: Option<Timestamp>,
    pub dts: Option<Timestamp>,
    pub data: Vec<u8>,
    pub content: EsContent,
}
