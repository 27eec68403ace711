//! Transport seam.
//!
//! The engine never touches the wire. A [`Transport`] owns endpoint
//! management for one scheme and, once two sockets are joined, hands each
//! side a [`PeerLink`] for the other. Inbound data reaches a socket through
//! [`SocketCore::push_frame`] / [`SocketCore::push_message`]; outbound data
//! leaves through [`PeerLink::deliver`].
//!
//! Implementations must not call back into the socket that is delivering
//! while it is mid-operation; the engine never holds a socket lock across a
//! call into a `PeerLink`.

use crate::core::SocketCore;
use plinth_core::endpoint::Endpoint;
use plinth_core::error::Result;
use plinth_core::message::Message;
use std::fmt;
use std::sync::Arc;

/// Identifies one connection (pipe) as seen from a socket.
pub type PeerKey = u64;

/// Outcome of offering a message or frame to a socket's inbound side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Enqueued as a complete message.
    Queued,
    /// Frame buffered; the message is not complete yet.
    Pending,
    /// Rejected by a SUB subscription filter.
    Filtered,
    /// Discarded: overflow policy, correlation mismatch, or size limit.
    Dropped,
    /// Receiver is at its high water mark; nothing was enqueued.
    Full,
    /// The receiving side is gone.
    Disconnected,
}

impl Delivery {
    /// The receiver took ownership of the message (possibly to discard it).
    #[inline]
    pub const fn is_consumed(self) -> bool {
        matches!(self, Self::Queued | Self::Filtered | Self::Dropped)
    }
}

/// Sending half of one connection.
pub trait PeerLink: Send + Sync + fmt::Debug {
    /// Hand a complete message to the peer.
    ///
    /// # Errors
    ///
    /// `TransportFailure` for link-level errors. Back-pressure and filtering
    /// are reported through [`Delivery`], not as errors.
    fn deliver(&self, msg: &Message) -> Result<Delivery>;

    /// Whether the peer could take a message right now.
    fn has_room(&self) -> bool;

    /// Tear the connection down from this side.
    fn close(&self);
}

/// Endpoint management for one scheme.
pub trait Transport: Send + Sync {
    /// Scheme handled, e.g. `"inproc"`.
    fn scheme(&self) -> &'static str;

    /// Make `socket` reachable at `endpoint`.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if the address is taken, `TransportFailure` for
    /// transport-specific failures.
    fn bind(&self, endpoint: &Endpoint, socket: &Arc<SocketCore>) -> Result<()>;

    /// Join `socket` to whatever is bound at `endpoint`.
    ///
    /// # Errors
    ///
    /// `TransportFailure` if nothing is reachable there, `InvalidArgument` if
    /// the two roles cannot talk to each other.
    fn connect(&self, endpoint: &Endpoint, socket: &Arc<SocketCore>) -> Result<()>;

    /// Release `endpoint` if `socket` holds it.
    fn unbind(&self, endpoint: &Endpoint, socket: &SocketCore);
}

/// How a peer came to be attached, for monitor events.
#[derive(Debug, Clone)]
pub enum PeerOrigin {
    /// We connected out to a bound socket.
    Connected(Endpoint),
    /// A peer connected in to one of our endpoints.
    Accepted(Endpoint),
}
