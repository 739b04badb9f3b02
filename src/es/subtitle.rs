//! DVB subtitles (ETSI EN 300 743).
use byteorder::{BigEndian, ReadBytesExt};
use std::collections::VecDeque;
use std::ops::Range;

use crate::es::packet::{EsContent, Extracted};
use crate::es::StreamId;
use crate::pes::PesHeader;
use crate::time::Timestamp;
use crate::{ErrorKind, Result};

const DATA_IDENTIFIER: [u8; 2] = [0x20, 0x00];
const SYNC_BYTE: u8 = 0x0F;
const END_OF_PES_DATA_FIELD_MARKER: u8 = 0xFF;
const SEGMENT_HEADER_LEN: usize = 6;

/// Subtitle segment type.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentType {
    PageComposition,
    RegionComposition,
    ClutDefinition,
    ObjectData,
    DisplayDefinition,
    DisparitySignalling,
    EndOfDisplaySet,
    Stuffing,
    Other(u8),
}
impl SegmentType {
    /// Makes a `SegmentType` from its code.
    pub fn from_u8(n: u8) -> Self {
        match n {
            0x10 => SegmentType::PageComposition,
            0x11 => SegmentType::RegionComposition,
            0x12 => SegmentType::ClutDefinition,
            0x13 => SegmentType::ObjectData,
            0x14 => SegmentType::DisplayDefinition,
            0x15 => SegmentType::DisparitySignalling,
            0x80 => SegmentType::EndOfDisplaySet,
            0xFF => SegmentType::Stuffing,
            _ => SegmentType::Other(n),
        }
    }

    /// Returns the code of the segment type.
    pub fn as_u8(&self) -> u8 {
        match *self {
            SegmentType::PageComposition => 0x10,
            SegmentType::RegionComposition => 0x11,
            SegmentType::ClutDefinition => 0x12,
            SegmentType::ObjectData => 0x13,
            SegmentType::DisplayDefinition => 0x14,
            SegmentType::DisparitySignalling => 0x15,
            SegmentType::EndOfDisplaySet => 0x80,
            SegmentType::Stuffing => 0xFF,
            SegmentType::Other(n) => n,
        }
    }
}

/// A subtitling segment of a display set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Segment type.
    pub segment_type: SegmentType,

    /// Page the segment belongs to.
    pub page_id: u16,

    /// Position of the whole segment (header included) in the packet data.
    pub range: Range<usize>,
}

/// Segments between two end-of-display-set segments.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DisplaySet {
    /// Segments in stream order, the end-of-display-set segment included.
    pub segments: Vec<Segment>,

    /// Decoded page composition, if the set carried one.
    pub page: Option<PageComposition>,
}

/// Page composition segment body.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageComposition {
    pub page_id: u16,

    /// Seconds the page stays on screen.
    pub time_out: u8,
    pub version: u8,
    pub state: PageState,
    pub regions: Vec<RegionPlacement>,
}
impl PageComposition {
    fn read_from(page_id: u16, body: &[u8]) -> Result<Self> {
        track_assert!(
            body.len() >= 2 && (body.len() - 2) % 6 == 0,
            ErrorKind::MalformedSegment,
            "Unexpected page composition length: {}",
            body.len()
        );
        let mut reader = body;
        let time_out = track_io!(reader.read_u8())?;
        let b = track_io!(reader.read_u8())?;
        let version = b >> 4;
        let state = PageState::from_u8((b >> 2) & 0b11);

        let mut regions = Vec::with_capacity(reader.len() / 6);
        while !reader.is_empty() {
            let region_id = track_io!(reader.read_u8())?;
            let _reserved = track_io!(reader.read_u8())?;
            let x = track_io!(reader.read_u16::<BigEndian>())?;
            let y = track_io!(reader.read_u16::<BigEndian>())?;
            regions.push(RegionPlacement { region_id, x, y });
        }
        Ok(PageComposition {
            page_id,
            time_out,
            version,
            state,
            regions,
        })
    }
}

/// Page state of a page composition.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageState {
    NormalCase,
    AcquisitionPoint,
    ModeChange,
    Reserved,
}
impl PageState {
    fn from_u8(n: u8) -> Self {
        match n {
            0 => PageState::NormalCase,
            1 => PageState::AcquisitionPoint,
            2 => PageState::ModeChange,
            _ => PageState::Reserved,
        }
    }
}

/// Position of a region on the page.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegionPlacement {
    pub region_id: u8,
    pub x: u16,
    pub y: u16,
}

#[derive(Debug)]
struct PendingSet {
    stream_id: StreamId,
    pts: Option<Timestamp>,
    dts: Option<Timestamp>,
    data: Vec<u8>,
    display_set: DisplaySet,
}

/// Collects subtitle segments into display sets.
///
/// A display set may span several PES units. It is stamped with the timestamps of
/// the unit that carried its first segment. Sets completed beyond the first one
/// in a single unit are queued and handed out by later calls.
#[derive(Debug, Default)]
pub(crate) struct SubtitleParser {
    pending: Option<PendingSet>,
    completed: VecDeque<PendingSet>,
}
impl SubtitleParser {
    pub fn new() -> Self {
        SubtitleParser::default()
    }

    /// Drops the set being collected. Completed sets stay queued.
    pub fn reset(&mut self) {
        self.pending = None;
    }

    /// Pops the oldest completed set that has not been handed out yet.
    pub fn take_completed(&mut self) -> Option<Extracted> {
        self.completed.pop_front().map(PendingSet::into_extracted)
    }

    /// Returns `true` if `payload` (of a unit without a declared length) is known to be complete.
    ///
    /// That is the case when the buffered segments end with an end-of-display-set segment,
    /// when the end-of-PES-data marker is reached, or when the segment structure is broken.
    pub fn unit_complete(payload: &[u8]) -> bool {
        if payload.len() < DATA_IDENTIFIER.len() && DATA_IDENTIFIER.starts_with(payload) {
            return false;
        }
        let mut pos = if payload.starts_with(&DATA_IDENTIFIER) {
            DATA_IDENTIFIER.len()
        } else {
            0
        };
        let mut last_segment_type = None;
        while pos < payload.len() {
            match payload[pos] {
                END_OF_PES_DATA_FIELD_MARKER => return true,
                SYNC_BYTE => {}
                _ => return true,
            }
            if payload.len() - pos < SEGMENT_HEADER_LEN {
                return false;
            }
            let segment_len = (payload[pos + 4] as usize) << 8 | payload[pos + 5] as usize;
            last_segment_type = Some(SegmentType::from_u8(payload[pos + 1]));
            pos += SEGMENT_HEADER_LEN + segment_len;
        }
        pos == payload.len() && last_segment_type == Some(SegmentType::EndOfDisplaySet)
    }

    pub fn parse_payload(&mut self, header: &PesHeader, payload: &[u8]) -> Result<Option<Extracted>> {
        let result = self.parse_segments(header, payload);
        if result.is_err() {
            self.pending = None;
        }
        result
    }

    fn parse_segments(&mut self, header: &PesHeader, payload: &[u8]) -> Result<Option<Extracted>> {
        let mut pos = if payload.starts_with(&DATA_IDENTIFIER) {
            DATA_IDENTIFIER.len()
        } else {
            0
        };

        while pos < payload.len() && payload[pos] != END_OF_PES_DATA_FIELD_MARKER {
            let mut reader = &payload[pos..];
            let sync_byte = track_io!(reader.read_u8())?;
            track_assert_eq!(
                sync_byte,
                SYNC_BYTE,
                ErrorKind::MalformedSegment,
                "Unexpected sync byte at offset {}",
                pos
            );
            track_assert!(
                reader.len() >= SEGMENT_HEADER_LEN - 1,
                ErrorKind::MalformedSegment,
                "Truncated segment header at offset {}",
                pos
            );
            let segment_type = SegmentType::from_u8(track_io!(reader.read_u8())?);
            let page_id = track_io!(reader.read_u16::<BigEndian>())?;
            let segment_len = track_io!(reader.read_u16::<BigEndian>())? as usize;
            track_assert!(
                reader.len() >= segment_len,
                ErrorKind::MalformedSegment,
                "Segment overruns payload: segment_len={}, remaining={}",
                segment_len,
                reader.len()
            );
            let end = pos + SEGMENT_HEADER_LEN + segment_len;
            let segment_bytes = &payload[pos..end];
            pos = end;
            if segment_type == SegmentType::Stuffing {
                continue;
            }

            let pending = self.pending.get_or_insert_with(|| PendingSet {
                stream_id: header.stream_id,
                pts: header.pts,
                dts: header.dts,
                data: Vec::new(),
                display_set: DisplaySet::default(),
            });
            if segment_type == SegmentType::PageComposition {
                let body = &segment_bytes[SEGMENT_HEADER_LEN..];
                pending.display_set.page = Some(track!(PageComposition::read_from(page_id, body))?);
            }
            let offset = pending.data.len();
            pending.data.extend_from_slice(segment_bytes);
            pending.display_set.segments.push(Segment {
                segment_type,
                page_id,
                range: offset..pending.data.len(),
            });

            if segment_type == SegmentType::EndOfDisplaySet {
                let set = self.pending.take().expect("Never fails");
                self.completed.push_back(set);
            }
        }
        if self.completed.len() > 1 {
            log::debug!("{} display sets are waiting to be handed out", self.completed.len());
        }
        Ok(self.take_completed())
    }
}
impl PendingSet {
    fn into_extracted(self) -> Extracted {
        Extracted {
            stream_id: self.stream_id,
            pts: self.pts,
            dts: self.dts,
            data: self.data,
            content: EsContent::Subtitle(self.display_set),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_util {
    /// Builds a subtitle segment.
    pub fn segment(segment_type: u8, page_id: u16, body: &[u8]) -> Vec<u8> {
        let mut buf = vec![0x0F, segment_type, (page_id >> 8) as u8, page_id as u8];
        buf.push((body.len() >> 8) as u8);
        buf.push(body.len() as u8);
        buf.extend_from_slice(body);
        buf
    }

    /// Page composition (time-out 5s, version 1, acquisition point) + end of display set.
    pub fn display_set_payload(page_id: u16) -> Vec<u8> {
        let mut buf = segment(0x10, page_id, &[5, 0x14, 0, 0, 0x01, 0x00, 0x00, 0x20]);
        buf.extend(segment(0x80, page_id, &[]));
        buf
    }
}

#[cfg(test)]
mod test {
    use super::test_util::*;
    use super::*;

    fn header(pts: u64) -> PesHeader {
        let mut header = PesHeader::new(StreamId::new(StreamId::PRIVATE_STREAM_1));
        header.pts = Some(track_try_unwrap!(Timestamp::new(pts)));
        header
    }

    fn display_set(extracted: Extracted) -> DisplaySet {
        match extracted.content {
            EsContent::Subtitle(x) => x,
            c => panic!("Unexpected content: {:?}", c),
        }
    }

    #[test]
    fn complete_display_set() {
        let mut payload = vec![0x20, 0x00];
        payload.extend(display_set_payload(1));
        payload.push(0xFF);

        let mut parser = SubtitleParser::new();
        let extracted = track_try_unwrap!(parser.parse_payload(&header(3600), &payload)).unwrap();
        assert_eq!(extracted.pts.map(|t| t.as_u64()), Some(3600));
        assert_eq!(extracted.data, display_set_payload(1));

        let set = display_set(extracted);
        assert_eq!(set.segments.len(), 2);
        assert_eq!(set.segments[0].segment_type, SegmentType::PageComposition);
        assert_eq!(set.segments[0].range, 0..14);
        assert_eq!(set.segments[1].segment_type, SegmentType::EndOfDisplaySet);
        assert_eq!(set.segments[1].range, 14..20);

        let page = set.page.unwrap();
        assert_eq!(page.time_out, 5);
        assert_eq!(page.version, 1);
        assert_eq!(page.state, PageState::AcquisitionPoint);
        assert_eq!(
            page.regions,
            vec![RegionPlacement {
                region_id: 0,
                x: 0x100,
                y: 0x20
            }]
        );
    }

    #[test]
    fn display_set_spanning_units() {
        let mut parser = SubtitleParser::new();
        let first = segment(0x10, 1, &[5, 0x14]);
        let object = segment(0x13, 1, &[0, 1, 0, 0, 0, 0, 0]);
        assert!(track_try_unwrap!(parser.parse_payload(&header(100), &first)).is_none());

        let mut second = object.clone();
        second.extend(segment(0x80, 1, &[]));
        let extracted = track_try_unwrap!(parser.parse_payload(&header(200), &second)).unwrap();
        assert_eq!(extracted.pts.map(|t| t.as_u64()), Some(100));
        assert_eq!(display_set(extracted).segments.len(), 3);
    }

    #[test]
    fn stuffing_segments_are_skipped() {
        let mut payload = segment(0xFF, 1, &[0xFF; 4]);
        payload.extend(display_set_payload(1));
        let mut parser = SubtitleParser::new();
        let extracted = track_try_unwrap!(parser.parse_payload(&header(0), &payload)).unwrap();
        assert_eq!(display_set(extracted).segments.len(), 2);
    }

    #[test]
    fn malformed_segment_drops_pending_set() {
        let mut parser = SubtitleParser::new();
        let first = segment(0x10, 1, &[5, 0x14]);
        assert!(track_try_unwrap!(parser.parse_payload(&header(100), &first)).is_none());

        let e = parser
            .parse_payload(&header(200), &[0x0E, 0x80, 0, 1, 0, 0])
            .err()
            .unwrap();
        assert_eq!(*e.kind(), ErrorKind::MalformedSegment);

        // The next set starts from scratch.
        let extracted = track_try_unwrap!(parser.parse_payload(&header(300), &display_set_payload(1))).unwrap();
        assert_eq!(extracted.pts.map(|t| t.as_u64()), Some(300));
        assert_eq!(display_set(extracted).segments.len(), 2);
    }

    #[test]
    fn segment_overrun() {
        let mut payload = segment(0x13, 1, &[0; 8]);
        payload.truncate(10);
        let mut parser = SubtitleParser::new();
        let e = parser.parse_payload(&header(0), &payload).err().unwrap();
        assert_eq!(*e.kind(), ErrorKind::MalformedSegment);

        let e = parser.parse_payload(&header(0), &[0x0F, 0x10, 0]).err().unwrap();
        assert_eq!(*e.kind(), ErrorKind::MalformedSegment);
    }

    #[test]
    fn unit_completion() {
        let payload = display_set_payload(1);
        assert!(SubtitleParser::unit_complete(&payload));
        for len in 0..payload.len() {
            assert!(!SubtitleParser::unit_complete(&payload[..len]), "len={}", len);
        }

        let mut with_marker = vec![0x20, 0x00];
        with_marker.extend(segment(0x10, 1, &[5, 0x14]));
        assert!(!SubtitleParser::unit_complete(&with_marker));
        with_marker.push(0xFF);
        assert!(SubtitleParser::unit_complete(&with_marker));

        assert!(SubtitleParser::unit_complete(&[0x0E, 0x10]));

        // A split inside the data identifier is not mistaken for a broken segment.
        assert!(!SubtitleParser::unit_complete(&[0x20]));
        assert!(!SubtitleParser::unit_complete(&[0x20, 0x00]));
    }

    #[test]
    fn display_sets_ending_in_one_unit_are_queued() {
        let mut payload = display_set_payload(1);
        payload.extend(display_set_payload(2));
        let mut parser = SubtitleParser::new();
        let first = track_try_unwrap!(parser.parse_payload(&header(0), &payload)).unwrap();
        assert_eq!(display_set(first).page.map(|p| p.page_id), Some(1));

        let second = parser.take_completed().unwrap();
        assert_eq!(second.pts.map(|t| t.as_u64()), Some(0));
        assert_eq!(second.data, display_set_payload(2));
        assert_eq!(display_set(second).page.map(|p| p.page_id), Some(2));
        assert!(parser.take_completed().is_none());
    }

    #[test]
    fn broken_page_composition() {
        let payload = segment(0x10, 1, &[5, 0x14, 0]);
        let mut parser = SubtitleParser::new();
        let e = parser.parse_payload(&header(0), &payload).err().unwrap();
        assert_eq!(*e.kind(), ErrorKind::MalformedSegment);
    }
}
