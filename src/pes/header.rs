use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::cmp;
use std::io::{Read, Write};

use crate::es::StreamId;
use crate::time::Timestamp;
use crate::{ErrorKind, Result};

const PACKET_START_CODE_PREFIX: [u8; 3] = [0x00, 0x00, 0x01];

/// Start code prefix, stream ID and packet length.
const FIXED_HEADER_LEN: usize = 6;

/// `FIXED_HEADER_LEN` plus the two flag bytes and the header data length byte.
const OPTIONAL_HEADER_START: usize = FIXED_HEADER_LEN + 3;

/// PES packet header.
///
/// Note that `PesHeader` contains the fields that belong to the optional PES header.
/// For streams without the optional header they keep their default values.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PesHeader {
    pub stream_id: StreamId,
    pub scrambling_control: u8,
    pub priority: bool,

    /// `true` indicates that the PES packet header is immediately followed by
    /// the video start code or audio syncword.
    pub data_alignment_indicator: bool,

    /// `true` implies copyrighted.
    pub copyright: bool,

    /// `true` implies original.
    pub original_or_copy: bool,

    pub pts: Option<Timestamp>,
    pub dts: Option<Timestamp>,
}
impl PesHeader {
    /// Makes a new `PesHeader` with no optional fields set.
    pub fn new(stream_id: StreamId) -> Self {
        PesHeader {
            stream_id,
            scrambling_control: 0,
            priority: false,
            data_alignment_indicator: false,
            copyright: false,
            original_or_copy: false,
            pts: None,
            dts: None,
        }
    }

    /// Inspects the head of `buf` for a complete PES header.
    ///
    /// Returns `PesHeaderStatus::Incomplete` while more bytes are needed to tell.
    ///
    /// # Errors
    ///
    /// If `buf` does not start with a valid PES header, it will return an
    /// `ErrorKind::MalformedHeader` error.
    pub fn parse(buf: &[u8]) -> Result<PesHeaderStatus> {
        let prefix_len = cmp::min(buf.len(), PACKET_START_CODE_PREFIX.len());
        track_assert_eq!(
            &buf[..prefix_len],
            &PACKET_START_CODE_PREFIX[..prefix_len],
            ErrorKind::MalformedHeader,
            "Invalid packet start code prefix"
        );
        if buf.len() < FIXED_HEADER_LEN {
            return Ok(PesHeaderStatus::Incomplete(FIXED_HEADER_LEN - buf.len()));
        }

        let header_len = if StreamId::new(buf[3]).has_optional_header() {
            if buf.len() < OPTIONAL_HEADER_START {
                return Ok(PesHeaderStatus::Incomplete(
                    OPTIONAL_HEADER_START - buf.len(),
                ));
            }
            OPTIONAL_HEADER_START + buf[OPTIONAL_HEADER_START - 1] as usize
        } else {
            FIXED_HEADER_LEN
        };
        if buf.len() < header_len {
            return Ok(PesHeaderStatus::Incomplete(header_len - buf.len()));
        }

        let (header, packet_len) = track!(Self::read_from(&buf[..header_len]))?;
        if packet_len != 0 {
            track_assert!(
                FIXED_HEADER_LEN + packet_len as usize >= header_len,
                ErrorKind::MalformedHeader,
                "packet_len={}, header_len={}",
                packet_len,
                header_len
            );
        }
        Ok(PesHeaderStatus::Complete(ParsedHeader {
            header,
            packet_len,
            header_len,
        }))
    }

    pub(crate) fn optional_header_len(&self) -> u16 {
        3 + self.pts.map_or(0, |_| 5) + self.dts.map_or(0, |_| 5)
    }

    fn read_from<R: Read>(mut reader: R) -> Result<(Self, u16)> {
        let packet_start_code_prefix = track_io!(reader.read_uint::<BigEndian>(3))?;
        track_assert_eq!(
            packet_start_code_prefix,
            0x00_0001,
            ErrorKind::MalformedHeader
        );

        let stream_id = StreamId::new(track_io!(reader.read_u8())?);
        let packet_len = track_io!(reader.read_u16::<BigEndian>())?;
        if !stream_id.has_optional_header() {
            return Ok((PesHeader::new(stream_id), packet_len));
        }

        let b = track_io!(reader.read_u8())?;
        track_assert_eq!(
            b & 0b1100_0000,
            0b1000_0000,
            ErrorKind::MalformedHeader,
            "Unexpected marker bits"
        );
        let scrambling_control = (b & 0b0011_0000) >> 4;
        let priority = (b & 0b0000_1000) != 0;
        let data_alignment_indicator = (b & 0b0000_0100) != 0;
        let copyright = (b & 0b0000_0010) != 0;
        let original_or_copy = (b & 0b0000_0001) != 0;

        let b = track_io!(reader.read_u8())?;
        let pts_flag = (b & 0b1000_0000) != 0;
        let dts_flag = (b & 0b0100_0000) != 0;
        track_assert_ne!(
            (pts_flag, dts_flag),
            (false, true),
            ErrorKind::MalformedHeader,
            "DTS without PTS"
        );

        let pes_header_len = track_io!(reader.read_u8())?;
        let timestamps_len = (pts_flag as u8 + dts_flag as u8) * Timestamp::SIZE as u8;
        track_assert!(
            pes_header_len >= timestamps_len,
            ErrorKind::MalformedHeader,
            "Too short PES header data: actual={}, expected={}",
            pes_header_len,
            timestamps_len
        );

        // The remaining optional fields (ESCR, ES rate, ...) and stuffing bytes are skipped.
        let mut reader = reader.take(u64::from(pes_header_len));
        let pts = if pts_flag {
            let check_bits = if dts_flag {
                Timestamp::PTS_WITH_DTS_CHECK_BITS
            } else {
                Timestamp::PTS_ONLY_CHECK_BITS
            };
            Some(track!(Timestamp::read_from(&mut reader, check_bits))?)
        } else {
            None
        };
        let dts = if dts_flag {
            Some(track!(Timestamp::read_from(
                &mut reader,
                Timestamp::DTS_CHECK_BITS
            ))?)
        } else {
            None
        };

        let header = PesHeader {
            stream_id,
            scrambling_control,
            priority,
            data_alignment_indicator,
            copyright,
            original_or_copy,
            pts,
            dts,
        };
        Ok((header, packet_len))
    }

    pub(crate) fn write_to<W: Write>(&self, mut writer: W, packet_len: u16) -> Result<()> {
        track_io!(writer.write_all(&PACKET_START_CODE_PREFIX))?;
        track_io!(writer.write_u8(self.stream_id.as_u8()))?;
        track_io!(writer.write_u16::<BigEndian>(packet_len))?;
        if !self.stream_id.has_optional_header() {
            return Ok(());
        }

        let n = 0b1000_0000
            | (self.scrambling_control << 4)
            | ((self.priority as u8) << 3)
            | ((self.data_alignment_indicator as u8) << 2)
            | ((self.copyright as u8) << 1)
            | self.original_or_copy as u8;
        track_io!(writer.write_u8(n))?;

        if self.dts.is_some() {
            track_assert!(self.pts.is_some(), ErrorKind::InvalidInput);
        }
        let n = ((self.pts.is_some() as u8) << 7) | ((self.dts.is_some() as u8) << 6);
        track_io!(writer.write_u8(n))?;

        let pes_header_len = self.optional_header_len() as u8 - 3;
        track_io!(writer.write_u8(pes_header_len))?;
        if let Some(x) = self.pts {
            let check_bits = if self.dts.is_some() {
                Timestamp::PTS_WITH_DTS_CHECK_BITS
            } else {
                Timestamp::PTS_ONLY_CHECK_BITS
            };
            track!(x.write_to(&mut writer, check_bits))?;
        }
        if let Some(x) = self.dts {
            track!(x.write_to(&mut writer, Timestamp::DTS_CHECK_BITS))?;
        }
        Ok(())
    }
}

/// Result of inspecting a buffer for a PES header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PesHeaderStatus {
    /// At least this many more bytes are needed.
    Incomplete(usize),

    /// The header is complete.
    Complete(ParsedHeader),
}

/// A complete PES header together with its framing information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedHeader {
    /// The decoded header fields.
    pub header: PesHeader,

    /// Value of the `PES_packet_length` field (`0` means unbounded).
    pub packet_len: u16,

    /// Number of bytes the header occupies, including optional fields and stuffing.
    pub header_len: usize,
}
impl ParsedHeader {
    /// Returns the size of the whole PES unit, or `None` if it is unbounded.
    pub fn unit_len(&self) -> Option<usize> {
        if self.packet_len == 0 {
            None
        } else {
            Some(FIXED_HEADER_LEN + self.packet_len as usize)
        }
    }
}
