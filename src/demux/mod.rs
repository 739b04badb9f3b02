//! Routing of transport stream payloads to elementary streams.
use std::collections::HashMap;

use crate::es::{ElementaryStream, EsOptions, EsPacket, Fragment, StreamType};
use crate::ts::{ContinuityCounter, Pid, TsPacket};
use crate::Result;

pub use self::reader::{EsPacketReader, ReadEsPacket};

mod reader;

#[derive(Debug)]
struct Entry {
    stream: ElementaryStream,
    last_counter: Option<ContinuityCounter>,
}

/// Elementary stream demultiplexer.
///
/// It owns one `ElementaryStream` per registered PID. Payloads of other PIDs are ignored.
#[derive(Debug, Default)]
pub struct Demuxer {
    options: EsOptions,
    entries: HashMap<Pid, Entry>,
}
impl Demuxer {
    /// Makes a new `Demuxer` instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes a new `Demuxer` instance that creates streams with the given options.
    pub fn with_options(options: EsOptions) -> Self {
        Demuxer {
            options,
            entries: HashMap::new(),
        }
    }

    /// Registers a stream, replacing any stream previously registered for `pid`.
    pub fn add_stream(&mut self, pid: Pid, stream_type: StreamType) -> &mut ElementaryStream {
        let stream = ElementaryStream::with_options(pid, stream_type, self.options.clone());
        let entry = Entry {
            stream,
            last_counter: None,
        };
        if self.entries.insert(pid, entry).is_some() {
            log::debug!("PID {:#x}: replaced the registered stream", pid.as_u16());
        }
        &mut self.entries.get_mut(&pid).expect("Never fails").stream
    }

    /// Unregisters the stream of `pid`, discarding its buffered data.
    pub fn remove_stream(&mut self, pid: Pid) -> Option<ElementaryStream> {
        self.entries.remove(&pid).map(|e| e.stream)
    }

    /// Returns the stream registered for `pid`.
    pub fn stream(&self, pid: Pid) -> Option<&ElementaryStream> {
        self.entries.get(&pid).map(|e| &e.stream)
    }

    /// Returns a mutable reference to the stream registered for `pid`.
    pub fn stream_mut(&mut self, pid: Pid) -> Option<&mut ElementaryStream> {
        self.entries.get_mut(&pid).map(|e| &mut e.stream)
    }

    /// Routes a fragment to the stream of its PID.
    pub fn push_fragment(&mut self, fragment: &Fragment) -> Result<Option<EsPacket>> {
        match self.entries.get_mut(&fragment.pid) {
            None => Ok(None),
            Some(entry) => track!(entry.stream.parse(fragment)),
        }
    }

    /// Parses a 188-byte transport stream packet and routes its payload.
    ///
    /// A gap in the continuity counter that is not announced by the discontinuity
    /// indicator is reported to the stream as a discontinuity. Duplicate packets are ignored.
    pub fn push_ts_packet(&mut self, bytes: &[u8]) -> Result<Option<EsPacket>> {
        let packet = track!(TsPacket::parse(bytes))?;
        let header = &packet.header;
        let entry = match self.entries.get_mut(&header.pid) {
            None => return Ok(None),
            Some(entry) => entry,
        };
        let payload = match packet.payload {
            None => return Ok(None),
            Some(payload) => payload,
        };

        let mut discontinuity = false;
        if header.transport_error_indicator {
            log::warn!(
                "PID {:#x}: dropped a packet with the transport error indicator set",
                header.pid.as_u16()
            );
            entry.last_counter = None;
            entry.stream.reset();
            return Ok(None);
        }
        if let Some(prev) = entry.last_counter {
            if header.continuity_counter == prev {
                log::debug!("PID {:#x}: ignored a duplicate packet", header.pid.as_u16());
                return Ok(None);
            }
            if !header.continuity_counter.follows(prev) && !packet.discontinuity_indicator {
                log::warn!(
                    "PID {:#x}: continuity counter jumped from {} to {}",
                    header.pid.as_u16(),
                    prev.as_u8(),
                    header.continuity_counter.as_u8()
                );
                discontinuity = true;
            }
        }
        entry.last_counter = Some(header.continuity_counter);

        let fragment = Fragment::new(header.pid, payload, header.payload_unit_start_indicator)
            .discontinuity(discontinuity);
        track!(entry.stream.parse(&fragment))
    }

    /// Flushes every stream, in PID order.
    ///
    /// Every packet a stream still holds is returned. Units that turn out to be
    /// malformed are logged and skipped.
    pub fn flush(&mut self) -> Result<Vec<EsPacket>> {
        let mut pids = self.entries.keys().cloned().collect::<Vec<_>>();
        pids.sort();

        let mut packets = Vec::new();
        for pid in pids {
            let entry = self.entries.get_mut(&pid).expect("Never fails");
            entry.last_counter = None;
            loop {
                match entry.stream.flush() {
                    Ok(Some(packet)) => packets.push(packet),
                    Ok(None) => break,
                    Err(e) => {
                        if !e.kind().is_recoverable() {
                            return Err(track!(e));
                        }
                        log::warn!("PID {:#x}: dropped a unit on flush: {}", pid.as_u16(), e);
                    }
                }
            }
        }
        Ok(packets)
    }
}
