//! Multipart messages and their receive-side assembly.
//!
//! A [`Message`] is the atomic unit of send and receive: a non-empty, ordered
//! sequence of frames. The send path builds one from application buffers; the
//! receive path builds one frame-by-frame through a [`MessageAssembler`],
//! which never hands out a message until its final frame has arrived.

use crate::error::{PlinthError, Result};
use crate::frame::Frame;
use bytes::Bytes;
use smallvec::SmallVec;

/// Inline capacity for message parts. Most messages carry 1-4 frames.
type Parts = SmallVec<[Bytes; 4]>;

/// A complete multipart message (at least one frame).
///
/// # Examples
///
/// ```
/// use plinth_core::message::Message;
///
/// let msg = Message::builder()
///     .push_str("topic")
///     .push(&b"data"[..])
///     .build()
///     .unwrap();
/// assert_eq!(msg.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    parts: Parts,
}

#[allow(clippy::len_without_is_empty)] // never empty by construction
impl Message {
    /// A message made of a single frame.
    #[must_use]
    pub fn single(part: impl Into<Bytes>) -> Self {
        let mut parts = Parts::new();
        parts.push(part.into());
        Self { parts }
    }

    /// Build a message from application buffers.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `parts` is empty.
    pub fn from_parts<I, B>(parts: I) -> Result<Self>
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        let parts: Parts = parts.into_iter().map(Into::into).collect();
        if parts.is_empty() {
            return Err(PlinthError::invalid("a message needs at least one frame"));
        }
        Ok(Self { parts })
    }

    /// Start a fluent builder.
    #[must_use]
    pub fn builder() -> MessageBuilder {
        MessageBuilder::default()
    }

    /// Number of frames.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Total payload bytes across all frames.
    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.parts.iter().map(Bytes::len).sum()
    }

    /// Frame payloads in order.
    #[inline]
    #[must_use]
    pub fn parts(&self) -> &[Bytes] {
        &self.parts
    }

    /// The leading frame (topic for PUB/SUB, identity for ROUTER).
    #[inline]
    #[must_use]
    pub fn first(&self) -> &Bytes {
        &self.parts[0]
    }

    /// Frames with their continuation flags.
    ///
    /// Every frame but the last carries `more = true`.
    pub fn frames(&self) -> impl ExactSizeIterator<Item = Frame> + '_ {
        let last = self.parts.len() - 1;
        self.parts.iter().enumerate().map(move |(i, p)| Frame {
            payload: p.clone(),
            more: i != last,
        })
    }

    /// Consume the message and return its payloads.
    #[must_use]
    pub fn into_parts(self) -> Vec<Bytes> {
        self.parts.into_vec()
    }

    /// Prepend envelope frames.
    pub fn prepend<I>(&mut self, envelope: I)
    where
        I: IntoIterator<Item = Bytes>,
    {
        let mut parts: Parts = envelope.into_iter().collect();
        parts.extend(self.parts.drain(..));
        self.parts = parts;
    }

    /// Split off the leading frame.
    ///
    /// Returns `None` for the rest when the message had a single frame.
    #[must_use]
    pub fn split_first(mut self) -> (Bytes, Option<Message>) {
        let head = self.parts.remove(0);
        if self.parts.is_empty() {
            (head, None)
        } else {
            (head, Some(self))
        }
    }

    /// Split at the first empty delimiter frame.
    ///
    /// The envelope keeps every frame up to and including the delimiter.
    /// Returns `None` if there is no delimiter or nothing follows it.
    #[must_use]
    pub fn split_envelope(self) -> Option<(Vec<Bytes>, Message)> {
        let idx = self.parts.iter().position(Bytes::is_empty)?;
        if idx + 1 >= self.parts.len() {
            return None;
        }
        let mut parts = self.parts;
        let body: Parts = parts.drain(idx + 1..).collect();
        Some((parts.into_vec(), Message { parts: body }))
    }

    /// Try to parse a frame as a UTF-8 string.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame doesn't exist or isn't valid UTF-8.
    pub fn parse_frame_str(&self, index: usize) -> Result<&str> {
        let frame = self
            .parts
            .get(index)
            .ok_or_else(|| PlinthError::invalid("frame index out of bounds"))?;
        std::str::from_utf8(frame).map_err(|e| PlinthError::invalid(e.to_string()))
    }
}

impl From<Bytes> for Message {
    fn from(part: Bytes) -> Self {
        Self::single(part)
    }
}

impl From<&'static str> for Message {
    fn from(part: &'static str) -> Self {
        Self::single(Bytes::from_static(part.as_bytes()))
    }
}

impl From<Message> for Vec<Bytes> {
    fn from(msg: Message) -> Self {
        msg.into_parts()
    }
}

/// Fluent builder for [`Message`].
///
/// ```
/// use plinth_core::message::Message;
///
/// // ROUTER envelope: [identity] [empty] [data]
/// let msg = Message::builder()
///     .push(&b"client-id"[..])
///     .push_empty()
///     .push_str("request")
///     .build()
///     .unwrap();
/// assert_eq!(msg.len(), 3);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MessageBuilder {
    parts: Parts,
}

impl MessageBuilder {
    /// Add a frame from any type that can be converted to `Bytes`.
    #[must_use]
    pub fn push(mut self, frame: impl Into<Bytes>) -> Self {
        self.parts.push(frame.into());
        self
    }

    /// Add a string frame (UTF-8 encoded).
    #[must_use]
    pub fn push_str(mut self, s: &str) -> Self {
        self.parts.push(Bytes::copy_from_slice(s.as_bytes()));
        self
    }

    /// Add an empty frame (envelope delimiter).
    #[must_use]
    pub fn push_empty(mut self) -> Self {
        self.parts.push(Bytes::new());
        self
    }

    /// Finish the message.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if no frame was pushed.
    pub fn build(self) -> Result<Message> {
        if self.parts.is_empty() {
            return Err(PlinthError::invalid("a message needs at least one frame"));
        }
        Ok(Message { parts: self.parts })
    }
}

/// Collects frames until a complete multipart message is formed.
///
/// Invariants:
/// - Frames are appended in-order
/// - A message completes when `more == false`
/// - Limits are enforced eagerly; a violation discards the partial message
/// - A partial message is never observable from outside
///
/// Not thread-safe; owned by whichever side is reading one peer's stream.
#[derive(Debug)]
pub struct MessageAssembler {
    parts: Parts,
    byte_count: usize,
    complete: bool,

    max_frames: usize,
    max_bytes: usize,
}

impl Default for MessageAssembler {
    fn default() -> Self {
        Self::new(usize::MAX, usize::MAX)
    }
}

impl MessageAssembler {
    /// Create an assembler with limits.
    ///
    /// Example safe defaults:
    /// - `max_frames` = 128
    /// - `max_bytes`  = 8 * 1024 * 1024 (8 MiB)
    #[must_use]
    pub fn new(max_frames: usize, max_bytes: usize) -> Self {
        Self {
            parts: Parts::new(),
            byte_count: 0,
            complete: false,
            max_frames,
            max_bytes,
        }
    }

    /// Append the next frame of the in-progress message.
    ///
    /// # Errors
    ///
    /// - `ProtocolViolation` if the message is already complete and has not
    ///   been taken yet
    /// - `InvalidArgument` if a frame or byte limit is exceeded; the partial
    ///   message is discarded
    pub fn append(&mut self, frame: Frame) -> Result<()> {
        if self.complete {
            return Err(PlinthError::protocol(
                "frame appended to a completed message",
            ));
        }

        if self.parts.len() + 1 > self.max_frames {
            self.reset();
            return Err(PlinthError::invalid("message exceeds frame limit"));
        }

        self.byte_count += frame.payload.len();
        if self.byte_count > self.max_bytes {
            let size = self.byte_count;
            self.reset();
            return Err(PlinthError::invalid(format!(
                "message of {size} bytes exceeds limit of {}",
                self.max_bytes
            )));
        }

        self.parts.push(frame.payload);
        self.complete = !frame.more;
        Ok(())
    }

    /// True once a frame with `more == false` has been appended.
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// True when no partial message is buffered.
    #[inline]
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.parts.is_empty()
    }

    /// Hand out the assembled message, if complete.
    pub fn take(&mut self) -> Option<Message> {
        if !self.complete {
            return None;
        }
        let parts = std::mem::take(&mut self.parts);
        self.reset();
        Some(Message { parts })
    }

    /// Append a frame and return the message if it completed it.
    ///
    /// # Errors
    ///
    /// Same as [`MessageAssembler::append`].
    pub fn push_frame(&mut self, frame: Frame) -> Result<Option<Message>> {
        self.append(frame)?;
        Ok(self.take())
    }

    /// Drop any partial message.
    #[inline]
    pub fn reset(&mut self) {
        self.parts.clear();
        self.byte_count = 0;
        self.complete = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_parts_rejects_empty() {
        assert!(Message::from_parts(Vec::<Bytes>::new()).is_err());
        assert!(Message::builder().build().is_err());
    }

    #[test]
    fn frames_carry_more_flags() {
        let msg = Message::from_parts(["a", "b", "c"]).unwrap();
        let flags: Vec<bool> = msg.frames().map(|f| f.more).collect();
        assert_eq!(flags, vec![true, true, false]);
    }

    #[test]
    fn assemble_disassemble_preserves_frames() {
        let original = Message::from_parts(["one", "", "three", "four"]).unwrap();
        let mut asm = MessageAssembler::default();

        let mut out = None;
        for frame in original.frames() {
            assert!(out.is_none());
            out = asm.push_frame(frame).unwrap();
        }

        assert_eq!(out.unwrap(), original);
        assert!(asm.is_idle());
    }

    #[test]
    fn partial_message_is_not_observable() {
        let mut asm = MessageAssembler::default();
        asm.append(Frame::more("a")).unwrap();
        asm.append(Frame::more("b")).unwrap();

        assert!(!asm.is_complete());
        assert!(asm.take().is_none());

        asm.append(Frame::last("c")).unwrap();
        assert!(asm.is_complete());
        assert_eq!(asm.take().unwrap().len(), 3);
    }

    #[test]
    fn append_after_complete_is_rejected() {
        let mut asm = MessageAssembler::default();
        asm.append(Frame::last("done")).unwrap();

        let err = asm.append(Frame::last("late")).unwrap_err();
        assert!(matches!(err, PlinthError::ProtocolViolation(_)));
        assert_eq!(asm.take().unwrap().parts(), &[Bytes::from("done")]);
    }

    #[test]
    fn frame_limit_discards_partial() {
        let mut asm = MessageAssembler::new(2, 1024);
        asm.append(Frame::more("a")).unwrap();
        asm.append(Frame::more("b")).unwrap();

        assert!(asm.append(Frame::last("c")).is_err());
        assert!(asm.is_idle());
    }

    #[test]
    fn byte_limit_discards_partial() {
        let mut asm = MessageAssembler::new(16, 4);
        asm.append(Frame::more("abc")).unwrap();
        assert!(asm.append(Frame::last("de")).is_err());
        assert!(asm.is_idle());
    }

    #[test]
    fn split_envelope_at_delimiter() {
        let msg = Message::builder()
            .push_str("peer")
            .push_empty()
            .push_str("body")
            .build()
            .unwrap();

        let (envelope, body) = msg.split_envelope().unwrap();
        assert_eq!(envelope.len(), 2);
        assert_eq!(body.parts(), &[Bytes::from("body")]);
    }

    #[test]
    fn split_envelope_requires_body() {
        let no_delim = Message::from_parts(["a", "b"]).unwrap();
        assert!(no_delim.split_envelope().is_none());

        let nothing_after = Message::builder().push_str("a").push_empty().build().unwrap();
        assert!(nothing_after.split_envelope().is_none());
    }

    #[test]
    fn prepend_and_split_first() {
        let mut msg = Message::single("body");
        msg.prepend([Bytes::from("id")]);
        assert_eq!(msg.len(), 2);

        let (head, rest) = msg.split_first();
        assert_eq!(head, Bytes::from("id"));
        assert_eq!(rest.unwrap().parts(), &[Bytes::from("body")]);

        let (_, rest) = Message::single("only").split_first();
        assert!(rest.is_none());
    }

    #[test]
    fn parse_frame_str() {
        let msg = Message::from_parts(["topic", "data"]).unwrap();
        assert_eq!(msg.parse_frame_str(0).unwrap(), "topic");
        assert!(msg.parse_frame_str(2).is_err());
    }
}
