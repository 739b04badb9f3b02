//! Packetized elementary stream.
//!
//! # References
//!
//! - [Packetized elementary stream](https://en.wikipedia.org/wiki/Packetized_elementary_stream)
pub use self::buffer::PacketBuffer;
pub use self::header::{ParsedHeader, PesHeader, PesHeaderStatus};

mod buffer;
mod header;

#[cfg(test)]
pub(crate) mod test_util {
    use super::PesHeader;
    use crate::es::StreamId;
    use crate::time::Timestamp;

    /// Builds a PES unit. A bounded unit carries its real length, otherwise `0`.
    pub fn pes_unit_bytes(
        stream_id: u8,
        pts: Option<u64>,
        dts: Option<u64>,
        payload: &[u8],
        bounded: bool,
    ) -> Vec<u8> {
        let mut header = PesHeader::new(StreamId::new(stream_id));
        header.data_alignment_indicator = true;
        header.pts = pts.map(|n| Timestamp::new(n).unwrap());
        header.dts = dts.map(|n| Timestamp::new(n).unwrap());

        let packet_len = if bounded {
            header.optional_header_len() as usize + payload.len()
        } else {
            0
        };
        let mut buf = Vec::new();
        track_try_unwrap!(header.write_to(&mut buf, packet_len as u16));
        buf.extend_from_slice(payload);
        buf
    }
}
