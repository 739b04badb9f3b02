use std::mem;

use crate::es::audio::AudioParser;
use crate::es::packet::{EsPacket, Extracted, StreamInfo};
use crate::es::subtitle::SubtitleParser;
use crate::es::video::VideoParser;
use crate::es::{teletext, EsOptions, StreamType};
use crate::pes::{PacketBuffer, ParsedHeader, PesHeader, PesHeaderStatus};
use crate::ts::Pid;
use crate::{ErrorKind, Result};

/// A transport stream payload fragment routed to an elementary stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fragment<'a> {
    /// PID of the transport stream packet that carried the fragment.
    pub pid: Pid,

    /// Payload bytes.
    pub data: &'a [u8],

    /// `true` if the fragment starts a new PES unit.
    pub payload_unit_start: bool,

    /// `true` if data was lost before this fragment (e.g., a continuity counter gap).
    pub discontinuity: bool,
}
impl<'a> Fragment<'a> {
    /// Makes a new `Fragment` instance.
    pub fn new(pid: Pid, data: &'a [u8], payload_unit_start: bool) -> Self {
        Fragment {
            pid,
            data,
            payload_unit_start,
            discontinuity: false,
        }
    }

    /// Sets the discontinuity flag.
    pub fn discontinuity(mut self, discontinuity: bool) -> Self {
        self.discontinuity = discontinuity;
        self
    }
}

#[derive(Debug)]
enum PayloadParser {
    Subtitle(SubtitleParser),
    Teletext,
    Audio(AudioParser),
    Video(VideoParser),
}
impl PayloadParser {
    fn new(stream_type: StreamType) -> Self {
        match stream_type {
            StreamType::DvbSubtitle => PayloadParser::Subtitle(SubtitleParser::new()),
            StreamType::Teletext => PayloadParser::Teletext,
            t if t.is_audio() => PayloadParser::Audio(AudioParser::new(t)),
            t => PayloadParser::Video(VideoParser::new(t)),
        }
    }

    fn parse_payload(
        &mut self,
        header: &PesHeader,
        payload: &[u8],
        info: &mut StreamInfo,
    ) -> Result<Option<Extracted>> {
        match *self {
            PayloadParser::Subtitle(ref mut p) => track!(p.parse_payload(header, payload)),
            PayloadParser::Teletext => track!(teletext::parse_payload(header, payload)),
            PayloadParser::Audio(ref mut p) => track!(p.parse_payload(header, payload, info)),
            PayloadParser::Video(ref mut p) => track!(p.parse_payload(header, payload, info)),
        }
    }

    fn unit_complete(&self, payload: &[u8]) -> bool {
        match *self {
            PayloadParser::Subtitle(_) => SubtitleParser::unit_complete(payload),
            _ => false,
        }
    }

    fn take_completed(&mut self) -> Option<Extracted> {
        match *self {
            PayloadParser::Subtitle(ref mut p) => p.take_completed(),
            _ => None,
        }
    }

    fn reset(&mut self) {
        if let PayloadParser::Subtitle(ref mut p) = *self {
            p.reset();
        }
    }
}

/// Elementary stream.
///
/// It accumulates the transport stream payload fragments of a single PID and
/// turns each completed PES unit into an `EsPacket`.
#[derive(Debug)]
pub struct ElementaryStream {
    pid: Pid,
    stream_type: StreamType,
    options: EsOptions,
    buf: PacketBuffer,
    synced: bool,
    parser: PayloadParser,
    info: StreamInfo,
    info_changed: bool,
}
impl ElementaryStream {
    /// Makes a new `ElementaryStream` instance.
    pub fn new(pid: Pid, stream_type: StreamType) -> Self {
        Self::with_options(pid, stream_type, EsOptions::default())
    }

    /// Makes a new `ElementaryStream` instance with the given options.
    pub fn with_options(pid: Pid, stream_type: StreamType, options: EsOptions) -> Self {
        ElementaryStream {
            pid,
            stream_type,
            options,
            buf: PacketBuffer::new(),
            synced: false,
            parser: PayloadParser::new(stream_type),
            info: StreamInfo::default(),
            info_changed: false,
        }
    }

    /// Returns the PID of the stream.
    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// Returns the content type of the stream.
    pub fn stream_type(&self) -> StreamType {
        self.stream_type
    }

    /// Returns what is known about the stream so far.
    pub fn info(&self) -> &StreamInfo {
        &self.info
    }

    /// Returns the number of bytes of the unit being assembled.
    pub fn buffered_len(&self) -> usize {
        self.buf.len()
    }

    /// Sets the language of the stream (an ISO 639 code).
    pub fn set_language(&mut self, language: &str) {
        if self.info.language.as_ref().map(|s| s.as_str()) != Some(language) {
            self.info.language = Some(language.to_owned());
            self.info_changed = true;
        }
    }

    /// Sets the composition and ancillary page IDs of a subtitle stream.
    pub fn set_subtitle_pages(&mut self, composition_page_id: u16, ancillary_page_id: u16) {
        let composition = Some(composition_page_id);
        let ancillary = Some(ancillary_page_id);
        if self.info.composition_page_id != composition || self.info.ancillary_page_id != ancillary {
            self.info.composition_page_id = composition;
            self.info.ancillary_page_id = ancillary;
            self.info_changed = true;
        }
    }

    /// Feeds a fragment.
    ///
    /// Returns `Ok(None)` until a unit is complete. At most one packet is returned per call.
    /// When a single unit completes several packets (e.g., two subtitle display sets), the
    /// rest is returned by the following calls, which may carry empty fragments.
    ///
    /// # Errors
    ///
    /// `ErrorKind::MalformedHeader` and `ErrorKind::MalformedSegment` are reported after the
    /// offending unit has been discarded, so the stream can keep being fed.
    ///
    /// A fragment of another PID is a caller bug: it panics if debug assertions are enabled,
    /// and is otherwise ignored with an `ErrorKind::InvariantViolation` error.
    pub fn parse(&mut self, fragment: &Fragment) -> Result<Option<EsPacket>> {
        if fragment.pid != self.pid {
            if cfg!(debug_assertions) {
                panic!(
                    "Fragment of PID {:#x} routed to the stream of PID {:#x}",
                    fragment.pid.as_u16(),
                    self.pid.as_u16()
                );
            }
            log::error!(
                "Fragment of PID {:#x} routed to the stream of PID {:#x}",
                fragment.pid.as_u16(),
                self.pid.as_u16()
            );
            track_panic!(
                ErrorKind::InvariantViolation,
                "Unexpected PID: actual={:#x}, expected={:#x}",
                fragment.pid.as_u16(),
                self.pid.as_u16()
            );
        }
        let packet = track!(self.feed_fragment(fragment))?;
        Ok(packet.or_else(|| self.take_completed()))
    }

    fn feed_fragment(&mut self, fragment: &Fragment) -> Result<Option<EsPacket>> {
        if fragment.data.is_empty() {
            return Ok(None);
        }

        if fragment.discontinuity {
            if !self.buf.is_empty() {
                log::warn!(
                    "PID {:#x}: dropped {} bytes on discontinuity",
                    self.pid.as_u16(),
                    self.buf.len()
                );
            }
            self.reset();
        }

        if fragment.payload_unit_start {
            let finished = self.finish_unit();
            self.buf.clear();
            self.buf.append(fragment.data);
            self.synced = true;
            match finished {
                Ok(None) => track!(self.poll_unit()),
                finished => {
                    // The new unit is completed by the next call (or `flush`).
                    if let Err(e) = PesHeader::parse(self.buf.as_slice()) {
                        log::warn!("PID {:#x}: dropped a unit: {}", self.pid.as_u16(), e);
                        self.drop_unit();
                    }
                    finished
                }
            }
        } else if self.synced {
            self.buf.append(fragment.data);
            track!(self.poll_unit())
        } else {
            log::debug!(
                "PID {:#x}: ignored {} bytes while waiting for a unit start",
                self.pid.as_u16(),
                fragment.data.len()
            );
            Ok(None)
        }
    }

    /// Finishes the unit being assembled, if it can be finished without more data.
    ///
    /// This is meant to be called at the end of the input, repeatedly until it returns `Ok(None)`.
    pub fn flush(&mut self) -> Result<Option<EsPacket>> {
        let result = self.finish_unit();
        self.drop_unit();
        match result {
            Ok(None) => Ok(self.take_completed()),
            result => result,
        }
    }

    /// Discards the unit being assembled and any state carried between units.
    pub fn reset(&mut self) {
        self.drop_unit();
        self.parser.reset();
    }

    fn drop_unit(&mut self) {
        self.buf.clear();
        self.synced = false;
    }

    /// Checks whether the buffered unit is complete and extracts it if so.
    fn poll_unit(&mut self) -> Result<Option<EsPacket>> {
        let parsed = match PesHeader::parse(self.buf.as_slice()) {
            Err(e) => {
                self.drop_unit();
                return Err(track!(e));
            }
            Ok(PesHeaderStatus::Incomplete(_)) => return Ok(None),
            Ok(PesHeaderStatus::Complete(parsed)) => parsed,
        };

        let unit_len = match self.unit_len(&parsed) {
            Some(n) if self.buf.len() >= n => n,
            Some(_) => 0,
            None if self
                .parser
                .unit_complete(&self.buf.as_slice()[parsed.header_len..]) =>
            {
                self.buf.len()
            }
            None => 0,
        };
        if unit_len == 0 {
            if self.buf.len() > self.options.max_buffer_size {
                let len = self.buf.len();
                self.drop_unit();
                track_panic!(
                    ErrorKind::MalformedHeader,
                    "Too large PES unit: {} bytes (limit={})",
                    len,
                    self.options.max_buffer_size
                );
            }
            return Ok(None);
        }

        let result = self.extract(&parsed, unit_len);
        self.buf.consume(unit_len);
        if !self.buf.is_empty() {
            log::trace!(
                "PID {:#x}: dropped {} bytes after the end of a PES unit",
                self.pid.as_u16(),
                self.buf.len()
            );
        }
        self.drop_unit();
        result
    }

    /// Extracts the buffered unit at a unit boundary (next unit start or end of input).
    fn finish_unit(&mut self) -> Result<Option<EsPacket>> {
        if self.buf.is_empty() {
            return Ok(None);
        }
        let parsed = match track!(PesHeader::parse(self.buf.as_slice()))? {
            PesHeaderStatus::Complete(parsed) => parsed,
            PesHeaderStatus::Incomplete(n) => {
                log::warn!(
                    "PID {:#x}: dropped a truncated PES header ({} bytes, {} more needed)",
                    self.pid.as_u16(),
                    self.buf.len(),
                    n
                );
                return Ok(None);
            }
        };
        match self.unit_len(&parsed) {
            None => track!(self.extract(&parsed, self.buf.len())),
            Some(n) if self.buf.len() >= n => track!(self.extract(&parsed, n)),
            Some(n) => {
                log::warn!(
                    "PID {:#x}: dropped a truncated PES unit ({} of {} bytes)",
                    self.pid.as_u16(),
                    self.buf.len(),
                    n
                );
                Ok(None)
            }
        }
    }

    fn unit_len(&self, parsed: &ParsedHeader) -> Option<usize> {
        if self.options.ignore_packet_length {
            None
        } else {
            parsed.unit_len()
        }
    }

    fn extract(&mut self, parsed: &ParsedHeader, unit_len: usize) -> Result<Option<EsPacket>> {
        let before = self.info.clone();
        let payload = &self.buf.as_slice()[parsed.header_len..unit_len];
        let extracted = self
            .parser
            .parse_payload(&parsed.header, payload, &mut self.info);
        if self.info != before {
            self.info_changed = true;
        }

        let extracted = track!(extracted)?;
        Ok(extracted.map(|x| self.make_packet(x)))
    }

    fn take_completed(&mut self) -> Option<EsPacket> {
        let extracted = self.parser.take_completed()?;
        Some(self.make_packet(extracted))
    }

    fn make_packet(&mut self, extracted: Extracted) -> EsPacket {
        EsPacket {
            pid: self.pid,
            stream_type: self.stream_type,
            stream_id: extracted.stream_id,
            pts: extracted.pts,
            dts: extracted.dts,
            data: extracted.data,
            content: extracted.content,
            stream_change: mem::replace(&mut self.info_changed, false),
        }
    }
}
