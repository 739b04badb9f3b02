use byteorder::{BigEndian, ReadBytesExt};
use std::io::{Cursor, Read};

use crate::ts::{ContinuityCounter, Pid};
use crate::{ErrorKind, Result};

/// Transport stream packet, borrowing its payload from the packet bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TsPacket<'a> {
    /// Packet header.
    pub header: TsHeader,

    /// `true` if the adaptation field signals a discontinuity in the continuity counter
    /// or the system time base.
    pub discontinuity_indicator: bool,

    /// `true` if the payload starts a random access point.
    pub random_access_indicator: bool,

    /// Payload bytes, if any.
    pub payload: Option<&'a [u8]>,
}
impl<'a> TsPacket<'a> {
    /// Size of a packet in bytes.
    pub const SIZE: usize = 188;

    /// Synchronization byte.
    ///
    /// Each packet starts with this byte.
    pub const SYNC_BYTE: u8 = 0x47;

    /// Parses a 188-byte transport stream packet.
    ///
    /// # Errors
    ///
    /// If `bytes` is not a well-formed TS packet, it will return an `ErrorKind::InvalidInput` error.
    pub fn parse(bytes: &'a [u8]) -> Result<Self> {
        track_assert_eq!(
            bytes.len(),
            TsPacket::SIZE,
            ErrorKind::InvalidInput,
            "Unexpected packet size"
        );

        let mut reader = Cursor::new(bytes);
        let (header, adaptation_field_control) = track!(TsHeader::read_from(&mut reader))?;

        let mut discontinuity_indicator = false;
        let mut random_access_indicator = false;
        if adaptation_field_control.has_adaptation_field() {
            let adaptation_field_len = track_io!(reader.read_u8())? as u64;
            if adaptation_field_len > 0 {
                let flags = track_io!(reader.read_u8())?;
                discontinuity_indicator = (flags & 0b1000_0000) != 0;
                random_access_indicator = (flags & 0b0100_0000) != 0;
            }
            let payload_offset = 5 + adaptation_field_len;
            track_assert!(
                payload_offset <= TsPacket::SIZE as u64,
                ErrorKind::InvalidInput,
                "Too large adaptation field: {}",
                adaptation_field_len
            );
            reader.set_position(payload_offset);
        }

        let payload = if adaptation_field_control.has_payload() {
            let offset = reader.position() as usize;
            Some(&bytes[offset..])
        } else {
            None
        };
        Ok(TsPacket {
            header,
            discontinuity_indicator,
            random_access_indicator,
            payload,
        })
    }
}

/// TS packet header.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TsHeader {
    pub transport_error_indicator: bool,
    pub payload_unit_start_indicator: bool,
    pub transport_priority: bool,
    pub pid: Pid,
    pub transport_scrambling_control: u8,
    pub continuity_counter: ContinuityCounter,
}
impl TsHeader {
    fn read_from<R: Read>(mut reader: R) -> Result<(Self, AdaptationFieldControl)> {
        let sync_byte = track_io!(reader.read_u8())?;
        track_assert_eq!(sync_byte, TsPacket::SYNC_BYTE, ErrorKind::InvalidInput);

        let n = track_io!(reader.read_u16::<BigEndian>())?;
        let transport_error_indicator = (n & 0b1000_0000_0000_0000) != 0;
        let payload_unit_start_indicator = (n & 0b0100_0000_0000_0000) != 0;
        let transport_priority = (n & 0b0010_0000_0000_0000) != 0;
        let pid = track!(Pid::new(n & 0b0001_1111_1111_1111))?;

        let n = track_io!(reader.read_u8())?;
        let transport_scrambling_control = n >> 6;
        let adaptation_field_control = track!(AdaptationFieldControl::from_u8((n >> 4) & 0b11))?;
        let continuity_counter = track!(ContinuityCounter::from_u8(n & 0b1111))?;

        let header = TsHeader {
            transport_error_indicator,
            payload_unit_start_indicator,
            transport_priority,
            pid,
            transport_scrambling_control,
            continuity_counter,
        };
        Ok((header, adaptation_field_control))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AdaptationFieldControl {
    PayloadOnly = 0b01,
    AdaptationFieldOnly = 0b10,
    AdaptationFieldAndPayload = 0b11,
}
impl AdaptationFieldControl {
    fn has_adaptation_field(self) -> bool {
        self != AdaptationFieldControl::PayloadOnly
    }

    fn has_payload(self) -> bool {
        self != AdaptationFieldControl::AdaptationFieldOnly
    }

    fn from_u8(n: u8) -> Result<Self> {
        Ok(match n {
            0b01 => AdaptationFieldControl::PayloadOnly,
            0b10 => AdaptationFieldControl::AdaptationFieldOnly,
            0b11 => AdaptationFieldControl::AdaptationFieldAndPayload,
            0b00 => track_panic!(ErrorKind::InvalidInput, "Reserved for future use"),
            _ => track_panic!(ErrorKind::InvalidInput, "Unexpected value: {}", n),
        })
    }
}
