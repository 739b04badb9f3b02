//! Transport stream packet headers.
//!
//! Only the parts needed to route payloads to elementary streams are parsed.
//!
//! # References
//!
//! - [MPEG transport stream](https://en.wikipedia.org/wiki/MPEG_transport_stream)
pub use self::packet::{TsHeader, TsPacket};
pub use self::types::{ContinuityCounter, Pid};

mod packet;
mod types;

#[cfg(test)]
pub(crate) mod test_util {
    use super::TsPacket;

    /// Builds a 188-byte packet carrying `payload`, padded with an adaptation field.
    pub fn ts_packet_bytes(pid: u16, pusi: bool, cc: u8, payload: &[u8]) -> Vec<u8> {
        assert!(payload.len() <= TsPacket::SIZE - 4);
        let mut buf = vec![
            TsPacket::SYNC_BYTE,
            ((pusi as u8) << 6) | (pid >> 8) as u8,
            pid as u8,
            0,
        ];
        let free = TsPacket::SIZE - 4 - payload.len();
        if free == 0 {
            buf[3] = 0b0001_0000 | cc;
        } else {
            buf[3] = 0b0011_0000 | cc;
            buf.push((free - 1) as u8);
            if free > 1 {
                buf.push(0);
                buf.extend(std::iter::repeat(0xFF).take(free - 2));
            }
        }
        buf.extend_from_slice(payload);
        buf
    }
}
