//! Video start code scanning.
use crate::es::packet::{EsContent, Extracted, StreamInfo};
use crate::es::StreamType;
use crate::pes::PesHeader;
use crate::Result;

const START_CODE_PREFIX: [u8; 3] = [0x00, 0x00, 0x01];

const MPEG2_PICTURE_START_CODE: u8 = 0x00;
const MPEG2_SEQUENCE_HEADER_CODE: u8 = 0xB3;
const MPEG2_I_PICTURE: u8 = 1;
const H264_IDR_SLICE: u8 = 5;

/// Start-code delimited units of a video access unit.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct VideoUnits {
    /// `true` if the data contains a random access picture
    /// (MPEG-2 I-picture, H.264 IDR slice, or HEVC IRAP picture).
    pub keyframe: bool,

    /// Units in stream order.
    pub units: Vec<VideoUnit>,
}

/// A start-code delimited unit (MPEG-2 start code, or H.264/HEVC NAL unit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VideoUnit {
    /// Offset of the start code prefix in the packet data.
    pub offset: usize,

    /// Length including the start code prefix.
    pub len: usize,

    /// MPEG-2 start code value, or the NAL unit type for H.264/HEVC.
    pub unit_type: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Syntax {
    Mpeg2,
    H264,
    Hevc,
}

/// Locates start codes in the payload of each PES unit.
#[derive(Debug)]
pub(crate) struct VideoParser {
    syntax: Syntax,
}
impl VideoParser {
    pub fn new(stream_type: StreamType) -> Self {
        let syntax = match stream_type {
            StreamType::H264 => Syntax::H264,
            StreamType::Hevc => Syntax::Hevc,
            _ => Syntax::Mpeg2,
        };
        VideoParser { syntax }
    }

    pub fn parse_payload(
        &mut self,
        header: &PesHeader,
        payload: &[u8],
        info: &mut StreamInfo,
    ) -> Result<Option<Extracted>> {
        if payload.is_empty() {
            return Ok(None);
        }

        let starts = find_start_codes(payload);
        let mut units = VideoUnits::default();
        for (i, &offset) in starts.iter().enumerate() {
            let end = starts.get(i + 1).cloned().unwrap_or_else(|| payload.len());
            let body = &payload[offset + START_CODE_PREFIX.len()..end];
            let code = match body.first() {
                Some(&b) => b,
                None => continue,
            };
            let unit_type = match self.syntax {
                Syntax::Mpeg2 => code,
                Syntax::H264 => code & 0x1F,
                Syntax::Hevc => (code >> 1) & 0x3F,
            };
            if self.is_keyframe(unit_type, body) {
                units.keyframe = true;
            }
            if self.syntax == Syntax::Mpeg2 && unit_type == MPEG2_SEQUENCE_HEADER_CODE {
                read_sequence_header(body, info);
            }
            units.units.push(VideoUnit {
                offset,
                len: end - offset,
                unit_type,
            });
        }

        Ok(Some(Extracted {
            stream_id: header.stream_id,
            pts: header.pts,
            dts: header.dts,
            data: payload.to_vec(),
            content: EsContent::Video(units),
        }))
    }

    fn is_keyframe(&self, unit_type: u8, body: &[u8]) -> bool {
        match self.syntax {
            Syntax::Mpeg2 => {
                unit_type == MPEG2_PICTURE_START_CODE
                    && body.len() > 2
                    && (body[2] >> 3) & 0b111 == MPEG2_I_PICTURE
            }
            Syntax::H264 => unit_type == H264_IDR_SLICE,
            Syntax::Hevc => 16 <= unit_type && unit_type <= 21,
        }
    }
}

fn find_start_codes(data: &[u8]) -> Vec<usize> {
    let mut starts = Vec::new();
    let mut i = 0;
    while i + START_CODE_PREFIX.len() <= data.len() {
        if data[i..].starts_with(&START_CODE_PREFIX) {
            starts.push(i);
            i += START_CODE_PREFIX.len();
        } else {
            i += 1;
        }
    }
    starts
}

fn read_sequence_header(body: &[u8], info: &mut StreamInfo) {
    // body[0] is the start code value.
    if body.len() < 5 {
        return;
    }
    let width = (u16::from(body[1]) << 4) | (u16::from(body[2]) >> 4);
    let height = (u16::from(body[2] & 0x0F) << 8) | u16::from(body[3]);
    info.width = Some(width);
    info.height = Some(height);
    info.aspect_ratio_code = Some(body[4] >> 4);
    info.frame_rate_code = Some(body[4] & 0x0F);
}
