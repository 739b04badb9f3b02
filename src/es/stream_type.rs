/// Content type of an elementary stream.
///
/// It selects how the payload of each PES unit is interpreted.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamType {
    Mpeg1Video,
    Mpeg2Video,
    H264,
    Hevc,
    Mpeg1Audio,
    Mpeg2Audio,

    /// AAC in ADTS framing.
    Aac,
    Ac3,
    Eac3,
    DvbSubtitle,
    Teletext,
}
impl StreamType {
    /// Maps a `stream_type` code of a program map table entry.
    ///
    /// Subtitle and teletext streams are carried as private data (`0x06`) and
    /// can only be told apart by their descriptors, so they are not returned here.
    pub fn from_stream_type_code(code: u8) -> Option<Self> {
        Some(match code {
            0x01 => StreamType::Mpeg1Video,
            0x02 => StreamType::Mpeg2Video,
            0x03 => StreamType::Mpeg1Audio,
            0x04 => StreamType::Mpeg2Audio,
            0x0F => StreamType::Aac,
            0x1B => StreamType::H264,
            0x24 => StreamType::Hevc,
            0x81 => StreamType::Ac3,
            0x87 => StreamType::Eac3,
            _ => return None,
        })
    }

    /// Returns the codec name of the stream.
    pub fn codec_name(&self) -> &'static str {
        match *self {
            StreamType::Mpeg1Video => "mpeg1video",
            StreamType::Mpeg2Video => "mpeg2video",
            StreamType::H264 => "h264",
            StreamType::Hevc => "hevc",
            StreamType::Mpeg1Audio => "mp1",
            StreamType::Mpeg2Audio => "mp2",
            StreamType::Aac => "aac",
            StreamType::Ac3 => "ac3",
            StreamType::Eac3 => "eac3",
            StreamType::DvbSubtitle => "dvbsub",
            StreamType::Teletext => "teletext",
        }
    }

    /// Returns `true` if it is an audio stream type, otherwise `false`.
    pub fn is_audio(&self) -> bool {
        match *self {
            StreamType::Mpeg1Audio
            | StreamType::Mpeg2Audio
            | StreamType::Aac
            | StreamType::Ac3
            | StreamType::Eac3 => true,
            _ => false,
        }
    }

    /// Returns `true` if it is a video stream type, otherwise `false`.
    pub fn is_video(&self) -> bool {
        match *self {
            StreamType::Mpeg1Video
            | StreamType::Mpeg2Video
            | StreamType::H264
            | StreamType::Hevc => true,
            _ => false,
        }
    }
}
impl std::str::FromStr for StreamType {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        Ok(match s {
            "mpeg1video" => StreamType::Mpeg1Video,
            "mpeg2video" => StreamType::Mpeg2Video,
            "h264" => StreamType::H264,
            "hevc" => StreamType::Hevc,
            "mp1" => StreamType::Mpeg1Audio,
            "mp2" => StreamType::Mpeg2Audio,
            "aac" => StreamType::Aac,
            "ac3" => StreamType::Ac3,
            "eac3" => StreamType::Eac3,
            "dvbsub" => StreamType::DvbSubtitle,
            "teletext" => StreamType::Teletext,
            _ => track_panic!(crate::ErrorKind::InvalidInput, "Unknown stream type: {:?}", s),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn stream_type_codes() {
        assert_eq!(StreamType::from_stream_type_code(0x1B), Some(StreamType::H264));
        assert_eq!(StreamType::from_stream_type_code(0x06), None);
        assert!(StreamType::Ac3.is_audio());
        assert!(!StreamType::DvbSubtitle.is_video());
    }

    #[test]
    fn names_round_trip() {
        for t in &[StreamType::Hevc, StreamType::DvbSubtitle, StreamType::Mpeg2Audio] {
            let parsed: StreamType = track_try_unwrap!(t.codec_name().parse());
            assert_eq!(parsed, *t);
        }
        assert!("vorbis".parse::<StreamType>().is_err());
    }
}
