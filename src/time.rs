//! Presentation/decoding timestamps.
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

use crate::{ErrorKind, Result};

/// Timestamp for PTS/DTS.
///
/// The value is a 33-bit tick count of the 90 kHz system clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Timestamp(u64);
impl Timestamp {
    /// 90 kHz.
    pub const RESOLUTION: u64 = 90_000;

    /// Maximum timestamp value.
    pub const MAX: u64 = (1 << 33) - 1;

    /// Size of an encoded timestamp in bytes.
    pub const SIZE: usize = 5;

    /// Check bits of a PTS that is not followed by a DTS.
    pub const PTS_ONLY_CHECK_BITS: u8 = 0b0010;

    /// Check bits of a PTS that is followed by a DTS.
    pub const PTS_WITH_DTS_CHECK_BITS: u8 = 0b0011;

    /// Check bits of a DTS.
    pub const DTS_CHECK_BITS: u8 = 0b0001;

    /// Makes a new `Timestamp` instance.
    ///
    /// # Errors
    ///
    /// If `n` exceeds `Timestamp::MAX`, it will return an `ErrorKind::InvalidInput` error.
    pub fn new(n: u64) -> Result<Self> {
        track_assert!(
            n <= Self::MAX,
            ErrorKind::InvalidInput,
            "Too large value: {}",
            n
        );
        Ok(Timestamp(n))
    }

    /// Returns the value of the timestamp.
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// Returns the timestamp in seconds.
    pub fn as_secs_f64(&self) -> f64 {
        self.0 as f64 / Self::RESOLUTION as f64
    }

    /// Decodes a timestamp from its 5-byte marker-interleaved representation.
    ///
    /// # Errors
    ///
    /// If the check bits or a marker bit do not match, it will return an
    /// `ErrorKind::MalformedHeader` error.
    pub fn decode(bytes: [u8; 5], check_bits: u8) -> Result<Self> {
        track!(Self::read_from(&bytes[..], check_bits))
    }

    /// Encodes the timestamp into its 5-byte marker-interleaved representation.
    pub fn encode(&self, check_bits: u8) -> [u8; 5] {
        let mut buf = [0; 5];
        let n0 = (check_bits << 4) | (((self.0 >> 30) as u8 & 0b111) << 1) | 1;
        let n1 = ((((self.0 >> 15) & 0x7FFF) as u16) << 1) | 1;
        let n2 = (((self.0 & 0x7FFF) as u16) << 1) | 1;
        buf[0] = n0;
        buf[1..3].copy_from_slice(&n1.to_be_bytes());
        buf[3..5].copy_from_slice(&n2.to_be_bytes());
        buf
    }

    pub(crate) fn read_from<R: Read>(mut reader: R, check_bits: u8) -> Result<Self> {
        let n0 = track_io!(reader.read_u8())?;
        let n1 = track_io!(reader.read_u16::<BigEndian>())?;
        let n2 = track_io!(reader.read_u16::<BigEndian>())?;

        track_assert_eq!(
            n0 >> 4,
            check_bits,
            ErrorKind::MalformedHeader,
            "Unexpected check bits: actual={}, expected={}",
            n0 >> 4,
            check_bits
        );
        track_assert_eq!(n0 & 1, 1, ErrorKind::MalformedHeader, "Unexpected marker bit");
        track_assert_eq!(n1 & 1, 1, ErrorKind::MalformedHeader, "Unexpected marker bit");
        track_assert_eq!(n2 & 1, 1, ErrorKind::MalformedHeader, "Unexpected marker bit");

        let t = (u64::from(n0 & 0b0000_1110) << 29)
            | (u64::from(n1 >> 1) << 15)
            | u64::from(n2 >> 1);
        Ok(Timestamp(t))
    }

    pub(crate) fn write_to<W: Write>(&self, mut writer: W, check_bits: u8) -> Result<()> {
        track_io!(writer.write_all(&self.encode(check_bits)))?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn pts_round_trip() {
        for &n in &[0, 1, 0x7FFF, 0x8000, 0x1_2345_6789 & Timestamp::MAX, Timestamp::MAX] {
            let ts = track_try_unwrap!(Timestamp::new(n));
            let bytes = ts.encode(Timestamp::PTS_ONLY_CHECK_BITS);
            let decoded = track_try_unwrap!(Timestamp::decode(bytes, Timestamp::PTS_ONLY_CHECK_BITS));
            assert_eq!(decoded, ts);
        }
    }

    #[test]
    fn known_encoding() {
        // 900000 ticks (10 seconds) as commonly muxed.
        let ts = track_try_unwrap!(Timestamp::new(900_000));
        assert_eq!(ts.encode(Timestamp::PTS_ONLY_CHECK_BITS), [0x21, 0x00, 0x37, 0x77, 0x41]);
        assert_eq!(ts.as_secs_f64(), 10.0);
    }

    #[test]
    fn write_to_matches_encode() {
        let ts = track_try_unwrap!(Timestamp::new(123_456_789));
        let mut buf = Vec::new();
        track_try_unwrap!(ts.write_to(&mut buf, Timestamp::DTS_CHECK_BITS));
        assert_eq!(&buf[..], &ts.encode(Timestamp::DTS_CHECK_BITS)[..]);
    }

    #[test]
    fn rejects_bad_marker_bits() {
        let ts = track_try_unwrap!(Timestamp::new(3003));
        let mut bytes = ts.encode(Timestamp::PTS_ONLY_CHECK_BITS);
        bytes[2] &= 0xFE;
        let e = Timestamp::decode(bytes, Timestamp::PTS_ONLY_CHECK_BITS).err().unwrap();
        assert_eq!(*e.kind(), ErrorKind::MalformedHeader);
    }

    #[test]
    fn rejects_bad_check_bits() {
        let ts = track_try_unwrap!(Timestamp::new(3003));
        let bytes = ts.encode(Timestamp::PTS_WITH_DTS_CHECK_BITS);
        assert!(Timestamp::decode(bytes, Timestamp::PTS_ONLY_CHECK_BITS).is_err());
    }

    #[test]
    fn too_large() {
        assert!(Timestamp::new(Timestamp::MAX + 1).is_err());
    }
}
