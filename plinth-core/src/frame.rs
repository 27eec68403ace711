//! Single frame of a multipart message.

use bytes::Bytes;

/// One binary payload plus its continuation flag.
///
/// `more == true` means another frame of the same logical message follows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Frame body
    pub payload: Bytes,
    /// Continuation flag ("more frames follow")
    pub more: bool,
}

impl Frame {
    /// A frame that is followed by at least one more frame.
    #[must_use]
    pub fn more(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
            more: true,
        }
    }

    /// The final frame of a message.
    #[must_use]
    pub fn last(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
            more: false,
        }
    }

    /// Payload length in bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// True when the payload is empty (e.g. an envelope delimiter).
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_flag() {
        assert!(Frame::more("a").more);
        assert!(!Frame::last("a").more);
        assert!(Frame::last(Bytes::new()).is_empty());
        assert_eq!(Frame::more("abc").len(), 3);
    }
}
