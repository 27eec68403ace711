//! Operation and readiness flags.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Flags for send and receive calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Flags(u8);

impl Flags {
    /// Default: may wait according to the socket's timeout option.
    pub const NONE: Flags = Flags(0);
    /// Return `WouldBlock` immediately instead of waiting.
    pub const DONTWAIT: Flags = Flags(0x01);

    /// True if every bit of `other` is set.
    #[inline]
    pub const fn contains(self, other: Flags) -> bool {
        self.0 & other.0 == other.0
    }
}

/// Flags accepted by receive calls.
pub type RecvFlags = Flags;

/// Flags accepted by send calls.
pub type SendFlags = Flags;

impl BitOr for Flags {
    type Output = Flags;

    fn bitor(self, rhs: Flags) -> Flags {
        Flags(self.0 | rhs.0)
    }
}

/// Readiness interest / result for the poller.
#[derive(Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct PollFlags(u8);

impl PollFlags {
    /// No readiness.
    pub const EMPTY: PollFlags = PollFlags(0);
    /// At least one complete message can be received now.
    pub const POLLIN: PollFlags = PollFlags(0x01);
    /// A send would not block now.
    pub const POLLOUT: PollFlags = PollFlags(0x02);

    /// True if every bit of `other` is set.
    #[inline]
    pub const fn contains(self, other: PollFlags) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Bits present in both.
    #[inline]
    #[must_use]
    pub const fn intersection(self, other: PollFlags) -> PollFlags {
        PollFlags(self.0 & other.0)
    }

    #[inline]
    pub const fn is_readable(self) -> bool {
        self.contains(Self::POLLIN)
    }

    #[inline]
    pub const fn is_writable(self) -> bool {
        self.contains(Self::POLLOUT)
    }
}

impl BitOr for PollFlags {
    type Output = PollFlags;

    fn bitor(self, rhs: PollFlags) -> PollFlags {
        PollFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for PollFlags {
    fn bitor_assign(&mut self, rhs: PollFlags) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for PollFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.is_readable(), self.is_writable()) {
            (true, true) => f.write_str("POLLIN | POLLOUT"),
            (true, false) => f.write_str("POLLIN"),
            (false, true) => f.write_str("POLLOUT"),
            (false, false) => f.write_str("EMPTY"),
        }
    }
}
