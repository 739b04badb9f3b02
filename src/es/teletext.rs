//! EBU teletext carried in PES (ETSI EN 300 472).
use std::ops::Range;

use crate::es::packet::{EsContent, Extracted};
use crate::pes::PesHeader;
use crate::{ErrorKind, Result};

const STUFFING_DATA_UNIT_ID: u8 = 0xFF;

/// Teletext data unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeletextUnit {
    /// Data unit identifier (`0x02` non-subtitle, `0x03` subtitle data).
    pub data_unit_id: u8,

    /// Position of the data field (header excluded) in the packet data.
    pub range: Range<usize>,
}
impl TeletextUnit {
    /// Returns `true` if the unit carries teletext subtitle data.
    pub fn is_subtitle(&self) -> bool {
        self.data_unit_id == 0x03
    }
}

pub(crate) fn parse_payload(header: &PesHeader, payload: &[u8]) -> Result<Option<Extracted>> {
    let data_identifier = match payload.first() {
        None => return Ok(None),
        Some(&b) => b,
    };
    track_assert!(
        0x10 <= data_identifier && data_identifier <= 0x1F,
        ErrorKind::MalformedSegment,
        "Not an EBU data identifier: {:#x}",
        data_identifier
    );

    let mut units = Vec::new();
    let mut pos = 1;
    while pos < payload.len() {
        track_assert!(
            payload.len() - pos >= 2,
            ErrorKind::MalformedSegment,
            "Truncated data unit header at offset {}",
            pos
        );
        let data_unit_id = payload[pos];
        let end = pos + 2 + payload[pos + 1] as usize;
        track_assert!(
            end <= payload.len(),
            ErrorKind::MalformedSegment,
            "Data unit overruns payload: end={}, payload_len={}",
            end,
            payload.len()
        );
        if data_unit_id != STUFFING_DATA_UNIT_ID {
            units.push(TeletextUnit {
                data_unit_id,
                range: pos + 2..end,
            });
        }
        pos = end;
    }
    if units.is_empty() {
        return Ok(None);
    }

    Ok(Some(Extracted {
        stream_id: header.stream_id,
        pts: header.pts,
        dts: header.dts,
        data: payload.to_vec(),
        content: EsContent::Teletext(units),
    }))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::es::StreamId;

    fn header() -> PesHeader {
        PesHeader::new(StreamId::new(StreamId::PRIVATE_STREAM_1))
    }

    #[test]
    fn data_units() {
        let mut payload = vec![0x10];
        payload.extend(&[0x03, 0x2C]);
        payload.extend(&[0xAA; 0x2C]);
        payload.extend(&[0xFF, 0x2C]);
        payload.extend(&[0xFF; 0x2C]);
        payload.extend(&[0x02, 0x01, 0x55]);

        let extracted = track_try_unwrap!(parse_payload(&header(), &payload)).unwrap();
        assert_eq!(extracted.data, payload);
        match extracted.content {
            EsContent::Teletext(units) => {
                assert_eq!(units.len(), 2);
                assert!(units[0].is_subtitle());
                assert_eq!(units[0].range, 3..47);
                assert_eq!(units[1].data_unit_id, 0x02);
                assert_eq!(&payload[units[1].range.clone()], &[0x55]);
            }
            c => panic!("Unexpected content: {:?}", c),
        }
    }

    #[test]
    fn only_stuffing() {
        let payload = [0x10, 0xFF, 0x01, 0xFF];
        assert!(track_try_unwrap!(parse_payload(&header(), &payload)).is_none());
        assert!(track_try_unwrap!(parse_payload(&header(), &[])).is_none());
    }

    #[test]
    fn malformed() {
        let e = parse_payload(&header(), &[0x20, 0x03, 0x00]).err().unwrap();
        assert_eq!(*e.kind(), ErrorKind::MalformedSegment);

        let e = parse_payload(&header(), &[0x10, 0x03, 0x2C, 0x00]).err().unwrap();
        assert_eq!(*e.kind(), ErrorKind::MalformedSegment);

        let e = parse_payload(&header(), &[0x10, 0x03]).err().unwrap();
        assert_eq!(*e.kind(), ErrorKind::MalformedSegment);
    }
}
