use std::env;

/// Environment variable that makes every PES unit be treated as unbounded.
pub const TS_IGNORE_HEADER_LENGTH: &str = "TS_IGNORE_HEADER_LENGTH";

/// Options of an elementary stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EsOptions {
    /// If `true`, the `PES_packet_length` field is ignored and units end at the next unit start.
    ///
    /// Some muxers write bogus lengths for video streams.
    pub ignore_packet_length: bool,

    /// Maximum number of bytes a single unit may occupy in the packet buffer.
    pub max_buffer_size: usize,
}
impl EsOptions {
    /// Default value of `max_buffer_size`.
    pub const DEFAULT_MAX_BUFFER_SIZE: usize = 4 * 1024 * 1024;

    /// Makes an `EsOptions` from the environment.
    ///
    /// `TS_IGNORE_HEADER_LENGTH=true` enables `ignore_packet_length`.
    pub fn from_env() -> Self {
        let ignore_packet_length = env::var(TS_IGNORE_HEADER_LENGTH)
            .unwrap_or_else(|_| "false".into())
            .to_lowercase()
            == "true";
        EsOptions {
            ignore_packet_length,
            ..EsOptions::default()
        }
    }
}
impl Default for EsOptions {
    fn default() -> Self {
        EsOptions {
            ignore_packet_length: false,
            max_buffer_size: Self::DEFAULT_MAX_BUFFER_SIZE,
        }
    }
}
