//! Elementary stream demultiplexer for MPEG2-TS.
//!
//! Transport stream payload fragments are reassembled into PES units per PID,
//! and each completed unit is turned into a typed [`EsPacket`](es/struct.EsPacket.html)
//! (subtitle display sets, teletext data units, audio frames, video access units).
//!
//! # Examples
//!
//! ```
//! use mpeg2ts_es::es::{ElementaryStream, Fragment, StreamType};
//! use mpeg2ts_es::ts::Pid;
//!
//! let pid = Pid::new(0x100).unwrap();
//! let mut stream = ElementaryStream::new(pid, StreamType::DvbSubtitle);
//! let packet = stream.parse(&Fragment::new(pid, &[], true)).unwrap();
//! assert!(packet.is_none());
//! ```
#![warn(missing_docs)]
extern crate byteorder;
extern crate log;
#[macro_use]
extern crate trackable;

pub use crate::error::{Error, ErrorKind};

macro_rules! track_io {
    ($expr:expr) => {
        $expr.map_err(|e: ::std::io::Error| {
            use trackable::error::ErrorKindExt;
            track!(crate::Error::from(crate::ErrorKind::Other.cause(e)))
        })
    };
}

pub mod demux;
pub mod es;
pub mod pes;
pub mod time;
pub mod ts;

mod error;
mod util;

/// This crate specific `Result` type.
pub type Result<T> = std::result::Result<T, Error>;
