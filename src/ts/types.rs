use crate::{ErrorKind, Result};

/// Packet identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pid(u16);
impl Pid {
    /// Maximum PID value.
    pub const MAX: u16 = (1 << 13) - 1;

    /// PID of the Program Association Table (PAT) packet.
    pub const PAT: u16 = 0;

    /// PID of the null packet.
    pub const NULL: u16 = 0x1FFF;

    /// Makes a new `Pid` instance.
    ///
    /// # Errors
    ///
    /// If `pid` exceeds `Pid::MAX`, it will return an `ErrorKind::InvalidInput` error.
    pub fn new(pid: u16) -> Result<Self> {
        track_assert!(
            pid <= Self::MAX,
            ErrorKind::InvalidInput,
            "Too large PID: {}",
            pid
        );
        Ok(Pid(pid))
    }

    /// Returns the value of the `Pid`.
    pub fn as_u16(&self) -> u16 {
        self.0
    }
}
impl From<u8> for Pid {
    fn from(f: u8) -> Self {
        Pid(u16::from(f))
    }
}

/// Continuity counter.
///
/// It is incremented by one (modulo 16) for every packet of a PID that carries a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContinuityCounter(u8);
impl ContinuityCounter {
    /// Maximum counter value.
    pub const MAX: u8 = 0b1111;

    /// Makes a new `ContinuityCounter` instance.
    ///
    /// # Errors
    ///
    /// If `n` exceeds `ContinuityCounter::MAX`, it will return an `ErrorKind::InvalidInput` error.
    pub fn from_u8(n: u8) -> Result<Self> {
        track_assert!(
            n <= Self::MAX,
            ErrorKind::InvalidInput,
            "Too large counter: {}",
            n
        );
        Ok(ContinuityCounter(n))
    }

    /// Returns the value of the counter.
    pub fn as_u8(&self) -> u8 {
        self.0
    }

    /// Returns `true` if this counter is the successor of `prev`.
    pub fn follows(&self, prev: ContinuityCounter) -> bool {
        (prev.0 + 1) & Self::MAX == self.0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn pid_range() {
        assert_eq!(track_try_unwrap!(Pid::new(0x1FFF)).as_u16(), Pid::NULL);
        assert!(Pid::new(0x2000).is_err());
    }

    #[test]
    fn continuity_wraps() {
        let c15 = track_try_unwrap!(ContinuityCounter::from_u8(15));
        let c0 = track_try_unwrap!(ContinuityCounter::from_u8(0));
        let c1 = track_try_unwrap!(ContinuityCounter::from_u8(1));
        assert!(c0.follows(c15));
        assert!(c1.follows(c0));
        assert!(!c1.follows(c15));
        assert!(ContinuityCounter::from_u8(16).is_err());
    }
}
