use trackable::error::{ErrorKind as TrackableErrorKind, TrackableError};

/// This crate specific `Error` type.
#[derive(Debug, Clone, trackable::TrackableError)]
pub struct Error(TrackableError<ErrorKind>);
impl Error {
    /// Returns the kind of this error.
    pub fn kind(&self) -> &ErrorKind {
        self.0.kind()
    }
}

/// Possible error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The buffered data does not start with a valid PES header.
    MalformedHeader,

    /// A payload segment (subtitle segment, teletext data unit) is broken.
    MalformedSegment,

    /// The caller broke a contract (e.g., routed a fragment to the wrong stream).
    InvariantViolation,

    /// Invalid argument or unsynchronized transport stream input.
    InvalidInput,

    /// Other errors (e.g., I/O failures).
    Other,
}
impl ErrorKind {
    /// Returns `true` if the stream that reported this kind of error can keep being fed.
    ///
    /// The offending unit has already been discarded in that case.
    pub fn is_recoverable(&self) -> bool {
        match *self {
            ErrorKind::MalformedHeader | ErrorKind::MalformedSegment => true,
            _ => false,
        }
    }
}
impl TrackableErrorKind for ErrorKind {}
