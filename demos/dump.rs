extern crate clap;
extern crate mpeg2ts_es;
#[macro_use]
extern crate trackable;

use clap::{App, Arg};
use mpeg2ts_es::demux::{Demuxer, EsPacketReader, ReadEsPacket};
use mpeg2ts_es::es::{EsContent, EsOptions, StreamType};
use mpeg2ts_es::ts::Pid;
use trackable::error::Failure;

fn parse_stream(s: &str) -> (Pid, StreamType) {
    let mut tokens = s.splitn(2, ':');
    let pid = tokens.next().unwrap_or("");
    let pid = if pid.starts_with("0x") {
        track_try_unwrap!(u16::from_str_radix(&pid[2..], 16).map_err(Failure::from_error))
    } else {
        track_try_unwrap!(pid.parse::<u16>().map_err(Failure::from_error))
    };
    let pid = track_try_unwrap!(Pid::new(pid));
    let stream_type = track_try_unwrap!(tokens.next().unwrap_or("").parse());
    (pid, stream_type)
}

fn main() {
    let matches = App::new("dump")
        .about("Prints the elementary stream packets of a transport stream read from stdin")
        .arg(
            Arg::with_name("STREAM")
                .long("stream")
                .help("PID and stream type (e.g., `0x100:h264`, `0x101:dvbsub`)")
                .takes_value(true)
                .multiple(true)
                .required(true),
        )
        .arg(
            Arg::with_name("LANGUAGE")
                .long("language")
                .takes_value(true),
        )
        .get_matches();

    let mut demuxer = Demuxer::with_options(EsOptions::from_env());
    for s in matches.values_of("STREAM").into_iter().flatten() {
        let (pid, stream_type) = parse_stream(s);
        let stream = demuxer.add_stream(pid, stream_type);
        if let Some(language) = matches.value_of("LANGUAGE") {
            stream.set_language(language);
        }
    }

    let stdin = std::io::stdin();
    let mut reader = EsPacketReader::new(stdin.lock(), demuxer);
    while let Some(packet) = track_try_unwrap!(reader.read_es_packet()) {
        let content = match packet.content {
            EsContent::Subtitle(ref x) => format!("{} segments", x.segments.len()),
            EsContent::Teletext(ref x) => format!("{} data units", x.len()),
            EsContent::Audio(ref x) => format!("{} frames", x.len()),
            EsContent::Video(ref x) => format!("{} units, keyframe={}", x.units.len(), x.keyframe),
        };
        println!(
            "pid={:#x} codec={} pts={:?} dts={:?} {} bytes ({}){}",
            packet.pid.as_u16(),
            packet.stream_type.codec_name(),
            packet.pts.map(|t| t.as_u64()),
            packet.dts.map(|t| t.as_u64()),
            packet.data.len(),
            content,
            if packet.stream_change { " [stream change]" } else { "" }
        );
        if packet.stream_change {
            if let Some(stream) = reader.demuxer().stream(packet.pid) {
                println!("  {:?}", stream.info());
            }
        }
    }
}
