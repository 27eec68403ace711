//! Pattern state machine.
//!
//! One closed enum over every socket role. Each variant decides
//! - whether a send or receive is legal right now,
//! - where an outgoing message goes ([`Route`]),
//! - which inbound messages are admitted at all, and
//! - how inbound messages are unwrapped before the application sees them.
//!
//! # REQ / REP
//!
//! ```text
//! REQ: Idle --send--> AwaitingReply --recv--> Idle
//! REP: AwaitingRequest --recv--> ReadyToReply --send--> AwaitingRequest
//! ```
//!
//! REQ wraps each request in a correlation envelope `[request-id, ""]`. REP
//! keeps everything up to and including the empty delimiter and puts it back
//! in front of the reply, so the reply carries the same envelope home. REQ
//! admits only the reply matching its outstanding request from the peer it
//! asked; anything else is discarded.

use bytes::Bytes;
use plinth_core::error::{PlinthError, Result};
use plinth_core::message::Message;
use plinth_core::socket_type::SocketType;

use crate::transport::PeerKey;

/// REQ socket state for enforcing strict request-reply pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReqState {
    /// Ready to send a request
    Idle,
    /// Waiting for a reply after sending request.
    ///
    /// `peer` is `None` while the request is still queued for lack of a peer.
    AwaitingReply {
        peer: Option<PeerKey>,
        request_id: u32,
    },
}

/// REP socket state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepState {
    /// Awaiting a request from the client
    AwaitingRequest,
    /// Received a request, ready to send reply
    ReadyToReply { peer: PeerKey, envelope: Vec<Bytes> },
}

/// Which inbound queues a receive may draw from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecvSource {
    /// Fair-queue across all peers.
    Any,
    /// Only this peer.
    Peer(PeerKey),
    /// Nothing is receivable yet.
    Nothing,
}

/// Where an outgoing message goes.
#[derive(Debug)]
pub enum Route {
    /// Every peer (subscription filtering happens at the receiver).
    FanOut(Message),
    /// Next peer in round-robin order that has room.
    RoundRobin(Message),
    /// The peer a REP request came from.
    Reply(PeerKey, Message),
    /// The peer whose routing identity matches.
    Identity(Bytes, Message),
}

/// Per-socket pattern state.
#[derive(Debug)]
pub enum Pattern {
    Pub,
    Sub,
    Req { state: ReqState, next_request_id: u32 },
    Rep { state: RepState },
    Push,
    Pull,
    Router,
    Dealer,
    XReq,
    XRep,
}

#[inline]
fn request_id_frame(id: u32) -> Bytes {
    Bytes::copy_from_slice(&id.to_be_bytes())
}

impl Pattern {
    pub fn new(socket_type: SocketType) -> Self {
        match socket_type {
            SocketType::Pub => Self::Pub,
            SocketType::Sub => Self::Sub,
            SocketType::Req => Self::Req {
                state: ReqState::Idle,
                next_request_id: 1,
            },
            SocketType::Rep => Self::Rep {
                state: RepState::AwaitingRequest,
            },
            SocketType::Push => Self::Push,
            SocketType::Pull => Self::Pull,
            SocketType::Router => Self::Router,
            SocketType::Dealer => Self::Dealer,
            SocketType::XReq => Self::XReq,
            SocketType::XRep => Self::XRep,
        }
    }

    pub fn socket_type(&self) -> SocketType {
        match self {
            Self::Pub => SocketType::Pub,
            Self::Sub => SocketType::Sub,
            Self::Req { .. } => SocketType::Req,
            Self::Rep { .. } => SocketType::Rep,
            Self::Push => SocketType::Push,
            Self::Pull => SocketType::Pull,
            Self::Router => SocketType::Router,
            Self::Dealer => SocketType::Dealer,
            Self::XReq => SocketType::XReq,
            Self::XRep => SocketType::XRep,
        }
    }

    /// Is a send legal right now?
    ///
    /// # Errors
    ///
    /// `ProtocolViolation` describing the broken rule.
    pub fn check_send(&self, req_relaxed: bool) -> Result<()> {
        if !self.socket_type().can_send() {
            return Err(PlinthError::protocol(format!(
                "{} sockets cannot send",
                self.socket_type()
            )));
        }
        match self {
            Self::Req {
                state: ReqState::AwaitingReply { .. },
                ..
            } if !req_relaxed => Err(PlinthError::protocol(
                "REQ must recv the reply before sending again (state: AwaitingReply)",
            )),
            Self::Rep {
                state: RepState::AwaitingRequest,
            } => Err(PlinthError::protocol(
                "REP must recv a request before sending (state: AwaitingRequest)",
            )),
            _ => Ok(()),
        }
    }

    /// Is a receive legal right now?
    ///
    /// # Errors
    ///
    /// `ProtocolViolation` describing the broken rule.
    pub fn check_recv(&self) -> Result<()> {
        if !self.socket_type().can_recv() {
            return Err(PlinthError::protocol(format!(
                "{} sockets cannot recv",
                self.socket_type()
            )));
        }
        match self {
            Self::Req {
                state: ReqState::Idle,
                ..
            } => Err(PlinthError::protocol(
                "REQ must send a request before recv (state: Idle)",
            )),
            Self::Rep {
                state: RepState::ReadyToReply { .. },
            } => Err(PlinthError::protocol(
                "REP must send the reply before recv again (state: ReadyToReply)",
            )),
            _ => Ok(()),
        }
    }

    /// Queues a receive may draw from.
    pub fn recv_source(&self) -> RecvSource {
        match self {
            Self::Req {
                state: ReqState::AwaitingReply { peer: Some(peer), .. },
                ..
            } => RecvSource::Peer(*peer),
            Self::Req { .. } => RecvSource::Nothing,
            _ if self.check_recv().is_err() => RecvSource::Nothing,
            _ => RecvSource::Any,
        }
    }

    /// Should an inbound message from `peer` be queued at all?
    ///
    /// Checked at enqueue time, so stale or malformed traffic never makes the
    /// socket look readable.
    pub fn admit(&self, peer: PeerKey, msg: &Message) -> bool {
        if !self.socket_type().can_recv() {
            return false;
        }
        match self {
            Self::Req {
                state:
                    ReqState::AwaitingReply {
                        peer: Some(expected),
                        request_id,
                    },
                ..
            } => {
                let parts = msg.parts();
                *expected == peer
                    && parts.len() >= 3
                    && parts[0] == request_id_frame(*request_id)
                    && parts[1].is_empty()
            }
            Self::Req { .. } => false,
            // A request must carry a delimiter with a body after it.
            Self::Rep { .. } => msg
                .parts()
                .iter()
                .position(Bytes::is_empty)
                .is_some_and(|idx| idx + 1 < msg.len()),
            _ => true,
        }
    }

    /// Decide where `msg` goes. Does not change state; call
    /// [`Pattern::commit_send`] once the message is actually handed off.
    ///
    /// # Errors
    ///
    /// `ProtocolViolation` if sending is illegal now, `InvalidArgument` for a
    /// ROUTER message without a body after the identity frame.
    pub fn route(&self, mut msg: Message, req_relaxed: bool) -> Result<Route> {
        self.check_send(req_relaxed)?;
        let policy = self.socket_type().envelope_policy();

        if policy.identity_frames > 0 {
            return match msg.split_first() {
                (identity, Some(body)) => Ok(Route::Identity(identity, body)),
                (_, None) => Err(PlinthError::invalid(format!(
                    "{} message needs an identity frame followed by a body",
                    self.socket_type()
                ))),
            };
        }
        if policy.delimited {
            msg.prepend(self.outgoing_envelope());
        }

        match self {
            Self::Pub => Ok(Route::FanOut(msg)),
            Self::Rep {
                state: RepState::ReadyToReply { peer, .. },
            } => Ok(Route::Reply(*peer, msg)),
            _ => Ok(Route::RoundRobin(msg)),
        }
    }

    /// Routing frames a delimited role puts in front of an outgoing message.
    fn outgoing_envelope(&self) -> Vec<Bytes> {
        match self {
            Self::Req {
                next_request_id, ..
            } => vec![request_id_frame(*next_request_id), Bytes::new()],
            Self::Rep {
                state: RepState::ReadyToReply { envelope, .. },
            } => envelope.clone(),
            _ => Vec::new(),
        }
    }

    /// Record that a routed message left (or was queued for) `peer`.
    pub fn commit_send(&mut self, peer: Option<PeerKey>) {
        match self {
            Self::Req {
                state,
                next_request_id,
            } => {
                *state = ReqState::AwaitingReply {
                    peer,
                    request_id: *next_request_id,
                };
                *next_request_id = next_request_id.wrapping_add(1);
            }
            Self::Rep { state } => *state = RepState::AwaitingRequest,
            _ => {}
        }
    }

    /// A request queued without a peer was just handed to `peer`.
    ///
    /// Only the outstanding request binds the reply peer.
    pub fn on_flushed(&mut self, peer: PeerKey, msg: &Message) {
        if let Self::Req {
            state:
                ReqState::AwaitingReply {
                    peer: slot @ None,
                    request_id,
                },
            ..
        } = self
        {
            if msg.first() == &request_id_frame(*request_id) {
                *slot = Some(peer);
            }
        }
    }

    /// Unwrap an inbound message for the application and advance state.
    ///
    /// Returns `None` when the message must be discarded instead.
    pub fn on_recv(&mut self, peer: PeerKey, routing_id: &Bytes, msg: Message) -> Option<Message> {
        if !self.admit(peer, &msg) {
            return None;
        }
        let policy = self.socket_type().envelope_policy();

        let (envelope, mut body) = if policy.delimited {
            msg.split_envelope()?
        } else {
            (Vec::new(), msg)
        };
        let payload_frames = body.len();
        if policy.identity_frames > 0 {
            body.prepend([routing_id.clone()]);
        }
        debug_assert_eq!(policy.visible_frames(payload_frames), body.len());

        match self {
            Self::Req { state, .. } => *state = ReqState::Idle,
            Self::Rep { state } => *state = RepState::ReadyToReply { peer, envelope },
            _ => {}
        }
        Some(body)
    }
}
