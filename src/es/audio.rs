//! Audio frame boundaries.
use crate::es::packet::{EsContent, Extracted, StreamInfo};
use crate::es::StreamType;
use crate::pes::PesHeader;
use crate::util::BitReader;
use crate::Result;

/// Position of a complete audio frame in the packet data.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AudioFrame {
    pub offset: usize,
    pub len: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FrameHeader {
    frame_len: usize,
    sample_rate: u32,
    channels: u8,
    bit_rate: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Framing {
    Mpeg,
    Adts,
    Ac3,
}

const ADTS_SAMPLE_RATES: [u32; 13] = [
    96000, 88200, 64000, 48000, 44100, 32000, 24000, 22050, 16000, 12000, 11025, 8000, 7350,
];

const MPEG_SAMPLE_RATES: [[u32; 3]; 3] = [
    [44100, 48000, 32000], // MPEG-1
    [22050, 24000, 16000], // MPEG-2
    [11025, 12000, 8000],  // MPEG-2.5
];

/// Kbit/s, indexed by `bitrate_index - 1`.
const MPEG_BIT_RATES: [[u32; 14]; 5] = [
    [32, 64, 96, 128, 160, 192, 224, 256, 288, 320, 352, 384, 416, 448], // V1 L1
    [32, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 384],    // V1 L2
    [32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320],     // V1 L3
    [32, 48, 56, 64, 80, 96, 112, 128, 144, 160, 176, 192, 224, 256],    // V2 L1
    [8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160],         // V2 L2/L3
];

/// Kbit/s, indexed by `frmsizecod / 2`.
const AC3_BIT_RATES: [u32; 19] = [
    32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 384, 448, 512, 576, 640,
];

const AC3_SAMPLE_RATES: [u32; 3] = [48000, 44100, 32000];
const EAC3_REDUCED_SAMPLE_RATES: [u32; 3] = [24000, 22050, 16000];

/// Full-bandwidth channels per `acmod`.
const AC3_CHANNELS: [u8; 8] = [2, 1, 2, 3, 3, 4, 4, 5];

/// Locates audio frames in the payload of each PES unit.
#[derive(Debug)]
pub(crate) struct AudioParser {
    framing: Framing,
}
impl AudioParser {
    pub fn new(stream_type: StreamType) -> Self {
        let framing = match stream_type {
            StreamType::Aac => Framing::Adts,
            StreamType::Ac3 | StreamType::Eac3 => Framing::Ac3,
            _ => Framing::Mpeg,
        };
        AudioParser { framing }
    }

    pub fn parse_payload(
        &mut self,
        header: &PesHeader,
        payload: &[u8],
        info: &mut StreamInfo,
    ) -> Result<Option<Extracted>> {
        if payload.is_empty() {
            return Ok(None);
        }

        let mut frames = Vec::new();
        let mut skipped = 0;
        let mut pos = 0;
        while pos < payload.len() {
            let frame_header = match self.read_frame_header(&payload[pos..]) {
                Some(h) => h,
                None => {
                    pos += 1;
                    skipped += 1;
                    continue;
                }
            };
            if pos + frame_header.frame_len > payload.len() {
                log::debug!(
                    "Truncated audio frame at offset {}: frame_len={}, remaining={}",
                    pos,
                    frame_header.frame_len,
                    payload.len() - pos
                );
                break;
            }
            if frames.is_empty() {
                info.sample_rate = Some(frame_header.sample_rate);
                info.channels = Some(frame_header.channels);
                if frame_header.bit_rate.is_some() {
                    info.bit_rate = frame_header.bit_rate;
                }
            }
            frames.push(AudioFrame {
                offset: pos,
                len: frame_header.frame_len,
            });
            pos += frame_header.frame_len;
        }
        if skipped > 0 {
            log::debug!("Skipped {} bytes without audio sync", skipped);
        }

        Ok(Some(Extracted {
            stream_id: header.stream_id,
            pts: header.pts,
            dts: header.dts,
            data: payload.to_vec(),
            content: EsContent::Audio(frames),
        }))
    }

    fn read_frame_header(&self, data: &[u8]) -> Option<FrameHeader> {
        match self.framing {
            Framing::Mpeg => read_mpeg_header(data),
            Framing::Adts => read_adts_header(data),
            Framing::Ac3 => read_ac3_header(data),
        }
    }
}

fn read_mpeg_header(data: &[u8]) -> Option<FrameHeader> {
    if data.len() < 4 {
        return None;
    }
    let mut reader = BitReader::new(data);
    if reader.read_bits(11).ok()? != 0x7FF {
        return None;
    }
    let version = match reader.read_bits(2).ok()? {
        0b11 => 0, // MPEG-1
        0b10 => 1, // MPEG-2
        0b00 => 2, // MPEG-2.5
        _ => return None,
    };
    let layer = match reader.read_bits(2).ok()? {
        0b11 => 1,
        0b10 => 2,
        0b01 => 3,
        _ => return None,
    };
    let _protection_absent = reader.read_bit().ok()?;
    let bit_rate_index = reader.read_bits(4).ok()? as usize;
    let sample_rate_index = reader.read_bits(2).ok()? as usize;
    if bit_rate_index == 0 || bit_rate_index == 15 || sample_rate_index == 3 {
        return None;
    }
    let padding = reader.read_bit().ok()? as u32;
    let _private = reader.read_bit().ok()?;
    let channel_mode = reader.read_bits(2).ok()?;

    let table = match (version, layer) {
        (0, 1) => 0,
        (0, 2) => 1,
        (0, _) => 2,
        (_, 1) => 3,
        _ => 4,
    };
    let bit_rate = MPEG_BIT_RATES[table][bit_rate_index - 1] * 1000;
    let sample_rate = MPEG_SAMPLE_RATES[version][sample_rate_index];
    let frame_len = match (version, layer) {
        (_, 1) => (12 * bit_rate / sample_rate + padding) * 4,
        (0, _) | (_, 2) => 144 * bit_rate / sample_rate + padding,
        _ => 72 * bit_rate / sample_rate + padding,
    };
    Some(FrameHeader {
        frame_len: frame_len as usize,
        sample_rate,
        channels: if channel_mode == 0b11 { 1 } else { 2 },
        bit_rate: Some(bit_rate),
    })
}

fn read_adts_header(data: &[u8]) -> Option<FrameHeader> {
    if data.len() < 7 {
        return None;
    }
    let mut reader = BitReader::new(data);
    if reader.read_bits(12).ok()? != 0xFFF {
        return None;
    }
    let _id = reader.read_bit().ok()?;
    if reader.read_bits(2).ok()? != 0 {
        return None;
    }
    let protection_absent = reader.read_bit().ok()?;
    let _profile = reader.read_bits(2).ok()?;
    let sample_rate = *ADTS_SAMPLE_RATES.get(reader.read_bits(4).ok()? as usize)?;
    let _private = reader.read_bit().ok()?;
    let channel_configuration = reader.read_bits(3).ok()? as u8;
    reader.skip_bits(4).ok()?;
    let frame_len = reader.read_bits(13).ok()? as usize;
    let header_len = if protection_absent { 7 } else { 9 };
    if frame_len < header_len {
        return None;
    }
    Some(FrameHeader {
        frame_len,
        sample_rate,
        channels: if channel_configuration == 7 {
            8
        } else {
            channel_configuration
        },
        bit_rate: None,
    })
}

fn read_ac3_header(data: &[u8]) -> Option<FrameHeader> {
    if data.len() < 7 {
        return None;
    }
    if data[0] != 0x0B || data[1] != 0x77 {
        return None;
    }
    let bsid = data[5] >> 3;
    if bsid <= 10 {
        read_ac3_bsi(&data[2..])
    } else if bsid <= 16 {
        read_eac3_bsi(&data[2..])
    } else {
        None
    }
}

fn read_ac3_bsi(data: &[u8]) -> Option<FrameHeader> {
    let mut reader = BitReader::new(data);
    let _crc1 = reader.read_bits(16).ok()?;
    let fscod = reader.read_bits(2).ok()? as usize;
    let frmsizecod = reader.read_bits(6).ok()? as usize;
    let sample_rate = *AC3_SAMPLE_RATES.get(fscod)?;
    let bit_rate_kbps = *AC3_BIT_RATES.get(frmsizecod / 2)?;
    let words = match fscod {
        0 => bit_rate_kbps * 2,
        1 => bit_rate_kbps * 960 / 441 + (frmsizecod as u32 & 1),
        _ => bit_rate_kbps * 3,
    };

    let _bsid = reader.read_bits(5).ok()?;
    let _bsmod = reader.read_bits(3).ok()?;
    let acmod = reader.read_bits(3).ok()?;
    if (acmod & 0b001) != 0 && acmod != 1 {
        reader.skip_bits(2).ok()?; // cmixlev
    }
    if (acmod & 0b100) != 0 {
        reader.skip_bits(2).ok()?; // surmixlev
    }
    if acmod == 0b010 {
        reader.skip_bits(2).ok()?; // dsurmod
    }
    let lfeon = reader.read_bit().ok()? as u8;
    Some(FrameHeader {
        frame_len: words as usize * 2,
        sample_rate,
        channels: AC3_CHANNELS[acmod as usize] + lfeon,
        bit_rate: Some(bit_rate_kbps * 1000),
    })
}

fn read_eac3_bsi(data: &[u8]) -> Option<FrameHeader> {
    let mut reader = BitReader::new(data);
    let _strmtyp = reader.read_bits(2).ok()?;
    let _substreamid = reader.read_bits(3).ok()?;
    let frmsiz = reader.read_bits(11).ok()?;
    let fscod = reader.read_bits(2).ok()? as usize;
    let sample_rate = if fscod == 3 {
        *EAC3_REDUCED_SAMPLE_RATES.get(reader.read_bits(2).ok()? as usize)?
    } else {
        let _numblkscod = reader.read_bits(2).ok()?;
        AC3_SAMPLE_RATES[fscod]
    };
    let acmod = reader.read_bits(3).ok()?;
    let lfeon = reader.read_bit().ok()? as u8;
    Some(FrameHeader {
        frame_len: (frmsiz as usize + 1) * 2,
        sample_rate,
        channels: AC3_CHANNELS[acmod as usize] + lfeon,
        bit_rate: None,
    })
}

#[cfg(test)]
pub(crate) mod test_util {
    /// ADTS frame: AAC-LC, 48 kHz, stereo.
    pub fn adts_frame(payload_len: usize) -> Vec<u8> {
        let frame_len = 7 + payload_len;
        let mut buf = vec![
            0xFF,
            0xF1,
            0x4C,
            0x80 | ((frame_len >> 11) as u8 & 0b11),
            (frame_len >> 3) as u8,
            ((frame_len as u8 & 0b111) << 5) | 0x1F,
            0xFC,
        ];
        buf.extend(std::iter::repeat(0x21).take(payload_len));
        buf
    }
}

#[cfg(test)]
mod test {
    use super::test_util::adts_frame;
    use super::*;
    use crate::es::StreamId;

    fn frames(extracted: &Extracted) -> Vec<AudioFrame> {
        match extracted.content {
            EsContent::Audio(ref x) => x.clone(),
            ref c => panic!("Unexpected content: {:?}", c),
        }
    }

    fn header() -> PesHeader {
        PesHeader::new(StreamId::new(0xC0))
    }

    #[test]
    fn adts_frames() {
        let mut payload = adts_frame(100);
        payload.extend(adts_frame(50));
        let mut info = StreamInfo::default();
        let mut parser = AudioParser::new(StreamType::Aac);
        let extracted = track_try_unwrap!(parser.parse_payload(&header(), &payload, &mut info)).unwrap();
        assert_eq!(extracted.data, payload);
        assert_eq!(
            frames(&extracted),
            vec![
                AudioFrame { offset: 0, len: 107 },
                AudioFrame { offset: 107, len: 57 }
            ]
        );
        assert_eq!(info.sample_rate, Some(48000));
        assert_eq!(info.channels, Some(2));
    }

    #[test]
    fn adts_resync_and_truncated_tail() {
        let mut payload = vec![0x00, 0x12];
        payload.extend(adts_frame(20));
        payload.extend(&adts_frame(20)[..10]);
        let mut info = StreamInfo::default();
        let mut parser = AudioParser::new(StreamType::Aac);
        let extracted = track_try_unwrap!(parser.parse_payload(&header(), &payload, &mut info)).unwrap();
        assert_eq!(frames(&extracted), vec![AudioFrame { offset: 2, len: 27 }]);
    }

    #[test]
    fn mpeg_audio_layer2() {
        // MPEG-1 layer II, 192 kbit/s, 48 kHz, stereo: 576 bytes per frame.
        let mut frame = vec![0xFF, 0xFD, 0xA4, 0x00];
        frame.resize(576, 0x55);
        let mut payload = frame.clone();
        payload.extend(&frame);

        let mut info = StreamInfo::default();
        let mut parser = AudioParser::new(StreamType::Mpeg2Audio);
        let extracted = track_try_unwrap!(parser.parse_payload(&header(), &payload, &mut info)).unwrap();
        assert_eq!(frames(&extracted).len(), 2);
        assert_eq!(frames(&extracted)[1], AudioFrame { offset: 576, len: 576 });
        assert_eq!(info.sample_rate, Some(48000));
        assert_eq!(info.bit_rate, Some(192_000));
        assert_eq!(info.channels, Some(2));
    }

    #[test]
    fn ac3_frame() {
        // 48 kHz, 192 kbit/s (frmsizecod=20), bsid=8, acmod=7 (3/2), lfeon=1: 768 bytes.
        let mut frame = vec![0x0B, 0x77, 0x00, 0x00, 0x14, 0x40, 0xE1, 0x40];
        frame.resize(768, 0);
        let mut info = StreamInfo::default();
        let mut parser = AudioParser::new(StreamType::Ac3);
        let extracted = track_try_unwrap!(parser.parse_payload(&header(), &frame, &mut info)).unwrap();
        assert_eq!(frames(&extracted), vec![AudioFrame { offset: 0, len: 768 }]);
        assert_eq!(info.sample_rate, Some(48000));
        assert_eq!(info.channels, Some(6));
        assert_eq!(info.bit_rate, Some(192_000));
    }

    #[test]
    fn ac3_44100() {
        // 44.1 kHz, 32 kbit/s odd code (frmsizecod=1): 70 words.
        let header_bytes = [0x0B, 0x77, 0x00, 0x00, 0x41, 0x40, 0x40, 0x00];
        let frame = read_ac3_header(&header_bytes).unwrap();
        assert_eq!(frame.frame_len, 140);
        assert_eq!(frame.sample_rate, 44100);
        assert_eq!(frame.channels, 2);
    }

    #[test]
    fn eac3_frame() {
        // frmsiz=511 (1024 bytes), fscod=0, numblkscod=3, acmod=2, lfeon=0, bsid=16.
        let mut frame = vec![0x0B, 0x77, 0x01, 0xFF, 0x34, 0x80];
        frame.resize(1024, 0);
        let mut info = StreamInfo::default();
        let mut parser = AudioParser::new(StreamType::Eac3);
        let extracted = track_try_unwrap!(parser.parse_payload(&header(), &frame, &mut info)).unwrap();
        assert_eq!(frames(&extracted), vec![AudioFrame { offset: 0, len: 1024 }]);
        assert_eq!(info.sample_rate, Some(48000));
        assert_eq!(info.channels, Some(2));
    }

    #[test]
    fn empty_payload() {
        let mut parser = AudioParser::new(StreamType::Aac);
        let mut info = StreamInfo::default();
        assert!(track_try_unwrap!(parser.parse_payload(&header(), &[], &mut info)).is_none());
    }
}
