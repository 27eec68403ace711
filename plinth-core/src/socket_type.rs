//! Socket type enumeration (pattern roles).
//!
//! `XReq` and `XRep` are the raw counterparts of `Req` and `Rep`. They behave
//! like `Dealer` and `Router` and are kept as distinct variants so a socket
//! reports the role it was created with.

use crate::envelope::EnvelopePolicy;
use std::fmt;

/// Messaging pattern roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SocketType {
    /// PUB socket for publishing messages to subscribers
    Pub,

    /// SUB socket for subscribing to published messages
    Sub,

    /// REQ socket for synchronous request-reply client
    Req,

    /// REP socket for synchronous request-reply server
    Rep,

    /// DEALER socket for asynchronous request-reply patterns
    Dealer,

    /// ROUTER socket for routing messages by identity
    Router,

    /// PULL socket for receiving messages from pushers
    Pull,

    /// PUSH socket for sending messages to pullers
    Push,

    /// Raw request socket (no enforced alternation)
    XReq,

    /// Raw reply socket (no enforced alternation)
    XRep,
}

impl SocketType {
    /// All roles, in declaration order.
    pub const ALL: [SocketType; 10] = [
        Self::Pub,
        Self::Sub,
        Self::Req,
        Self::Rep,
        Self::Dealer,
        Self::Router,
        Self::Pull,
        Self::Push,
        Self::XReq,
        Self::XRep,
    ];

    /// Get the socket type as a string name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pub => "PUB",
            Self::Sub => "SUB",
            Self::Req => "REQ",
            Self::Rep => "REP",
            Self::Dealer => "DEALER",
            Self::Router => "ROUTER",
            Self::Pull => "PULL",
            Self::Push => "PUSH",
            Self::XReq => "XREQ",
            Self::XRep => "XREP",
        }
    }

    /// Map raw aliases onto the role they behave like.
    #[must_use]
    pub const fn canonical(self) -> Self {
        match self {
            Self::XReq => Self::Dealer,
            Self::XRep => Self::Router,
            other => other,
        }
    }

    /// Whether the role may send at all.
    #[must_use]
    pub const fn can_send(self) -> bool {
        !matches!(self, Self::Sub | Self::Pull)
    }

    /// Whether the role may receive at all.
    #[must_use]
    pub const fn can_recv(self) -> bool {
        !matches!(self, Self::Pub | Self::Push)
    }

    /// Envelope handling for this role.
    #[must_use]
    pub const fn envelope_policy(self) -> EnvelopePolicy {
        EnvelopePolicy::for_type(self)
    }

    /// Check if this socket type is compatible with the given peer type.
    pub fn is_compatible(&self, peer: SocketType) -> bool {
        matches!(
            (self.canonical(), peer.canonical()),
            (Self::Pub, Self::Sub)
                | (Self::Sub, Self::Pub)
                | (Self::Req, Self::Rep)
                | (Self::Rep, Self::Req)
                | (Self::Req, Self::Router)
                | (Self::Router, Self::Req)
                | (Self::Dealer, Self::Rep)
                | (Self::Rep, Self::Dealer)
                | (Self::Dealer, Self::Router)
                | (Self::Router, Self::Dealer)
                | (Self::Dealer, Self::Dealer)
                | (Self::Router, Self::Router)
                | (Self::Push, Self::Pull)
                | (Self::Pull, Self::Push)
        )
    }
}

impl fmt::Display for SocketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_type_display() {
        assert_eq!(SocketType::Dealer.to_string(), "DEALER");
        assert_eq!(SocketType::Router.to_string(), "ROUTER");
        assert_eq!(SocketType::XRep.to_string(), "XREP");
    }

    #[test]
    fn test_socket_compatibility() {
        assert!(SocketType::Req.is_compatible(SocketType::Rep));
        assert!(SocketType::Dealer.is_compatible(SocketType::Router));
        assert!(SocketType::Push.is_compatible(SocketType::Pull));
        assert!(SocketType::Pub.is_compatible(SocketType::Sub));
        assert!(SocketType::XReq.is_compatible(SocketType::XRep));
        assert!(SocketType::XReq.is_compatible(SocketType::Rep));
        assert!(SocketType::Req.is_compatible(SocketType::XRep));

        // Incompatible pairs
        assert!(!SocketType::Req.is_compatible(SocketType::Dealer));
        assert!(!SocketType::Pub.is_compatible(SocketType::Pull));
        assert!(!SocketType::Sub.is_compatible(SocketType::Sub));
    }

    #[test]
    fn test_direction_legality() {
        assert!(!SocketType::Pub.can_recv());
        assert!(!SocketType::Push.can_recv());
        assert!(!SocketType::Sub.can_send());
        assert!(!SocketType::Pull.can_send());
        for ty in [SocketType::Req, SocketType::Rep, SocketType::Router, SocketType::XReq] {
            assert!(ty.can_send() && ty.can_recv(), "{ty}");
        }
    }
}
