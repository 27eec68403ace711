//! Envelope policy: which routing frames the application gets to see.
//!
//! Derived from the socket role, never stored. Hidden-envelope roles consume
//! routing frames internally (REQ/REP keep an empty-delimited correlation
//! envelope on the wire but strip it before delivery). Exposed-envelope roles
//! hand the full frame sequence to the application, with ROUTER-like roles
//! prepending the originating peer's identity on receive.

use crate::socket_type::SocketType;

/// Envelope handling for one role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvelopePolicy {
    /// Routing frames are consumed by the socket and never delivered.
    pub hides_envelope: bool,
    /// Identity frames prepended on receive (ROUTER/XREP: 1).
    pub identity_frames: usize,
    /// The role wraps outgoing messages in an empty-delimited envelope.
    pub delimited: bool,
}

impl EnvelopePolicy {
    /// Policy for a role.
    #[must_use]
    pub const fn for_type(socket_type: SocketType) -> Self {
        match socket_type {
            SocketType::Pub | SocketType::Sub | SocketType::Push | SocketType::Pull => Self {
                hides_envelope: true,
                identity_frames: 0,
                delimited: false,
            },
            SocketType::Req | SocketType::Rep => Self {
                hides_envelope: true,
                identity_frames: 0,
                delimited: true,
            },
            SocketType::Router | SocketType::XRep => Self {
                hides_envelope: false,
                identity_frames: 1,
                delimited: false,
            },
            SocketType::Dealer | SocketType::XReq => Self {
                hides_envelope: false,
                identity_frames: 0,
                delimited: false,
            },
        }
    }

    /// Frames the application sees for a message with `payload_frames` body frames.
    #[must_use]
    pub const fn visible_frames(&self, payload_frames: usize) -> usize {
        if self.hides_envelope {
            payload_frames
        } else {
            payload_frames + self.identity_frames
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_roles() {
        for ty in [
            SocketType::Pub,
            SocketType::Sub,
            SocketType::Req,
            SocketType::Rep,
            SocketType::Push,
            SocketType::Pull,
        ] {
            let policy = EnvelopePolicy::for_type(ty);
            assert!(policy.hides_envelope, "{ty}");
            assert_eq!(policy.visible_frames(10), 10);
        }
    }

    #[test]
    fn exposed_roles() {
        for ty in [SocketType::Router, SocketType::XRep] {
            let policy = ty.envelope_policy();
            assert!(!policy.hides_envelope);
            assert_eq!(policy.visible_frames(1), 2);
            assert_eq!(policy.visible_frames(10), 11);
        }
        for ty in [SocketType::Dealer, SocketType::XReq] {
            assert!(!ty.envelope_policy().hides_envelope);
        }
    }

    #[test]
    fn only_req_rep_are_delimited() {
        let delimited: Vec<_> = SocketType::ALL
            .into_iter()
            .filter(|t| t.envelope_policy().delimited)
            .collect();
        assert_eq!(delimited, vec![SocketType::Req, SocketType::Rep]);
    }
}
