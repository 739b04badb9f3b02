use std::collections::VecDeque;
use std::io::Read;

use crate::demux::Demuxer;
use crate::es::EsPacket;
use crate::ts::TsPacket;
use crate::{ErrorKind, Result};

/// The `ReadEsPacket` trait allows for reading elementary stream packets from a source.
pub trait ReadEsPacket {
    /// Reads an elementary stream packet.
    ///
    /// If the end of the stream is reached, it will return `Ok(None)`.
    fn read_es_packet(&mut self) -> Result<Option<EsPacket>>;
}

/// Elementary stream packet reader.
///
/// It reads transport stream packets from `R` and feeds them to a `Demuxer`.
/// Malformed units are logged and skipped.
#[derive(Debug)]
pub struct EsPacketReader<R> {
    stream: R,
    demuxer: Demuxer,
    flushed: VecDeque<EsPacket>,
    eos: bool,
}
impl<R: Read> EsPacketReader<R> {
    /// Makes a new `EsPacketReader` instance.
    pub fn new(stream: R, demuxer: Demuxer) -> Self {
        EsPacketReader {
            stream,
            demuxer,
            flushed: VecDeque::new(),
            eos: false,
        }
    }

    /// Returns a reference to the demultiplexer.
    pub fn demuxer(&self) -> &Demuxer {
        &self.demuxer
    }

    /// Returns a mutable reference to the demultiplexer.
    pub fn demuxer_mut(&mut self) -> &mut Demuxer {
        &mut self.demuxer
    }

    /// Converts `EsPacketReader` into the underlaying byte stream `R`.
    pub fn into_stream(self) -> R {
        self.stream
    }

    /// Fills `buf` with the next TS packet. Returns `false` at the end of the stream.
    fn read_ts_packet(&mut self, buf: &mut [u8]) -> Result<bool> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = track_io!(self.stream.read(&mut buf[filled..]))?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        track_assert!(
            filled == 0 || filled == buf.len(),
            ErrorKind::InvalidInput,
            "Truncated TS packet: {} bytes",
            filled
        );
        Ok(filled != 0)
    }
}
impl<R: Read> ReadEsPacket for EsPacketReader<R> {
    fn read_es_packet(&mut self) -> Result<Option<EsPacket>> {
        let mut buf = [0; TsPacket::SIZE];
        loop {
            if let Some(packet) = self.flushed.pop_front() {
                return Ok(Some(packet));
            }
            if self.eos {
                return Ok(None);
            }
            if !track!(self.read_ts_packet(&mut buf))? {
                self.eos = true;
                self.flushed.extend(track!(self.demuxer.flush())?);
                continue;
            }
            match self.demuxer.push_ts_packet(&buf) {
                Ok(Some(packet)) => return Ok(Some(packet)),
                Ok(None) => {}
                Err(e) => {
                    if !e.kind().is_recoverable() {
                        return Err(track!(e));
                    }
                    log::warn!("Skipped a malformed unit: {}", e);
                }
            }
        }
    }
}
