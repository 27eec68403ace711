//! Socket configuration options
//!
//! Typed counterparts of the classic `setsockopt` knobs. Values are validated
//! when applied to a socket; this module only carries them.

use bytes::Bytes;
use std::time::Duration;

/// What a publisher does when a subscriber's receive queue is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Discard the message being delivered (default)
    #[default]
    DropNewest,
    /// Evict the oldest queued message to make room
    DropOldest,
}

/// Socket configuration options.
///
/// # Examples
///
/// ```
/// use plinth_core::options::SocketOptions;
/// use std::time::Duration;
///
/// let opts = SocketOptions::default()
///     .with_recv_timeout(Some(Duration::from_secs(5)))
///     .with_recv_hwm(10);
/// assert_eq!(opts.recv_hwm, 10);
/// ```
#[derive(Debug, Clone)]
pub struct SocketOptions {
    /// Receive timeout for blocking receives (ZMQ_RCVTIMEO)
    ///
    /// - `None`: Block indefinitely (default)
    /// - `Some(Duration::ZERO)`: Behave as non-blocking
    /// - `Some(duration)`: Wait up to duration before reporting `WouldBlock`
    pub recv_timeout: Option<Duration>,

    /// Send timeout for blocking sends (ZMQ_SNDTIMEO), same convention
    pub send_timeout: Option<Duration>,

    /// High water mark for receiving (ZMQ_RCVHWM)
    ///
    /// Maximum number of complete messages queued inbound. 0 = unbounded.
    /// - Default: 1000 messages
    pub recv_hwm: usize,

    /// High water mark for sending (ZMQ_SNDHWM)
    ///
    /// Maximum number of messages held while no peer can take them. 0 = unbounded.
    /// - Default: 1000 messages
    pub send_hwm: usize,

    /// Socket identity / routing ID (ZMQ_ROUTING_ID)
    ///
    /// Identity a ROUTER peer will see for this socket. If None, the ROUTER
    /// generates one.
    pub routing_id: Option<Bytes>,

    /// ROUTER mandatory mode (ZMQ_ROUTER_MANDATORY)
    ///
    /// - `false` (default): Silently drop messages to unknown peers
    /// - `true`: Return `HostUnreachable` when sending to unknown peer
    pub router_mandatory: bool,

    /// REQ relaxed mode (ZMQ_REQ_RELAXED)
    ///
    /// - `false` (default): Strict send/recv alternation
    /// - `true`: A new request may be sent while awaiting a reply; the
    ///   outstanding request is abandoned
    pub req_relaxed: bool,

    /// Publisher behavior on a full subscriber queue
    pub overflow: OverflowPolicy,

    /// Maximum message size in bytes (ZMQ_MAXMSGSIZE). `None` = no limit.
    pub max_msg_size: Option<usize>,

    /// Maximum frames per inbound message
    pub max_frames: usize,
}

impl Default for SocketOptions {
    fn default() -> Self {
        Self {
            recv_timeout: None,
            send_timeout: None,
            recv_hwm: 1000,
            send_hwm: 1000,
            routing_id: None,
            router_mandatory: false,
            req_relaxed: false,
            overflow: OverflowPolicy::DropNewest,
            max_msg_size: None,
            max_frames: 1024,
        }
    }
}

impl SocketOptions {
    /// Create default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set receive timeout.
    pub fn with_recv_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.recv_timeout = timeout;
        self
    }

    /// Set send timeout.
    pub fn with_send_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.send_timeout = timeout;
        self
    }

    /// Set receive high water mark.
    pub fn with_recv_hwm(mut self, hwm: usize) -> Self {
        self.recv_hwm = hwm;
        self
    }

    /// Set send high water mark.
    pub fn with_send_hwm(mut self, hwm: usize) -> Self {
        self.send_hwm = hwm;
        self
    }

    /// Set routing identity.
    pub fn with_routing_id(mut self, id: impl Into<Bytes>) -> Self {
        self.routing_id = Some(id.into());
        self
    }

    /// Enable or disable ROUTER mandatory mode.
    pub fn with_router_mandatory(mut self, mandatory: bool) -> Self {
        self.router_mandatory = mandatory;
        self
    }

    /// Enable or disable REQ relaxed mode.
    pub fn with_req_relaxed(mut self, relaxed: bool) -> Self {
        self.req_relaxed = relaxed;
        self
    }

    /// Set publisher overflow policy.
    pub fn with_overflow(mut self, policy: OverflowPolicy) -> Self {
        self.overflow = policy;
        self
    }

    /// Set maximum message size.
    pub fn with_max_msg_size(mut self, size: Option<usize>) -> Self {
        self.max_msg_size = size;
        self
    }

    /// Set the frame limit for inbound messages.
    pub fn with_max_frames(mut self, frames: usize) -> Self {
        self.max_frames = frames;
        self
    }

    /// True if a queue holding `len` messages is at the receive HWM.
    #[inline]
    pub fn recv_full(&self, len: usize) -> bool {
        self.recv_hwm != 0 && len >= self.recv_hwm
    }

    /// True if a queue holding `len` messages is at the send HWM.
    #[inline]
    pub fn send_full(&self, len: usize) -> bool {
        self.send_hwm != 0 && len >= self.send_hwm
    }
}

/// A single option change, as accepted by `setsockopt`.
///
/// Role-specific options (`Subscribe`, `RouterMandatory`, `ReqRelaxed`) are
/// rejected with `InvalidArgument` on sockets of other roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketOption {
    /// Add a prefix filter on a SUB socket. Empty prefix = everything.
    Subscribe(Bytes),
    /// Remove one reference to a prefix filter on a SUB socket.
    Unsubscribe(Bytes),
    /// Identity presented to ROUTER peers on subsequent connections.
    RoutingId(Bytes),
    RecvHwm(usize),
    SendHwm(usize),
    RecvTimeout(Option<Duration>),
    SendTimeout(Option<Duration>),
    RouterMandatory(bool),
    ReqRelaxed(bool),
    Overflow(OverflowPolicy),
    MaxMsgSize(Option<usize>),
    MaxFrames(usize),
}

impl SocketOption {
    /// Conventional option name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Subscribe(_) => "SUBSCRIBE",
            Self::Unsubscribe(_) => "UNSUBSCRIBE",
            Self::RoutingId(_) => "ROUTING_ID",
            Self::RecvHwm(_) => "RCVHWM",
            Self::SendHwm(_) => "SNDHWM",
            Self::RecvTimeout(_) => "RCVTIMEO",
            Self::SendTimeout(_) => "SNDTIMEO",
            Self::RouterMandatory(_) => "ROUTER_MANDATORY",
            Self::ReqRelaxed(_) => "REQ_RELAXED",
            Self::Overflow(_) => "OVERFLOW",
            Self::MaxMsgSize(_) => "MAXMSGSIZE",
            Self::MaxFrames(_) => "MAXFRAMES",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = SocketOptions::default();
        assert_eq!(opts.recv_timeout, None);
        assert_eq!(opts.recv_hwm, 1000);
        assert_eq!(opts.send_hwm, 1000);
        assert_eq!(opts.overflow, OverflowPolicy::DropNewest);
        assert!(!opts.router_mandatory);
        assert!(!opts.req_relaxed);
    }

    #[test]
    fn test_builder() {
        let opts = SocketOptions::new()
            .with_send_timeout(Some(Duration::ZERO))
            .with_routing_id("worker-1")
            .with_overflow(OverflowPolicy::DropOldest)
            .with_max_msg_size(Some(64))
            .with_max_frames(8);

        assert_eq!(opts.send_timeout, Some(Duration::ZERO));
        assert_eq!(opts.routing_id, Some(Bytes::from("worker-1")));
        assert_eq!(opts.overflow, OverflowPolicy::DropOldest);
        assert_eq!(opts.max_msg_size, Some(64));
        assert_eq!(opts.max_frames, 8);
    }

    #[test]
    fn test_zero_hwm_is_unbounded() {
        let opts = SocketOptions::new().with_recv_hwm(0).with_send_hwm(2);
        assert!(!opts.recv_full(1_000_000));
        assert!(!opts.send_full(1));
        assert!(opts.send_full(2));
    }
}
