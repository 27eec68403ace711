//! Socket event monitoring.
//!
//! A socket can hand out a channel of lifecycle events: endpoints bound and
//! released, peers attached and detached, and the socket closing.

use crate::endpoint::Endpoint;
use bytes::Bytes;
use std::fmt;

/// Socket lifecycle events.
#[derive(Debug, Clone)]
pub enum SocketEvent {
    /// Socket bound to an endpoint.
    Bound(Endpoint),

    /// Socket released an endpoint.
    Unbound(Endpoint),

    /// Socket connected out to a bound peer.
    Connected(Endpoint),

    /// A peer connected in to one of this socket's endpoints.
    Accepted {
        endpoint: Endpoint,
        routing_id: Bytes,
    },

    /// A peer went away.
    Disconnected { routing_id: Bytes },

    /// Socket was closed.
    Closed,
}

impl fmt::Display for SocketEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bound(ep) => write!(f, "Bound to {ep}"),
            Self::Unbound(ep) => write!(f, "Unbound from {ep}"),
            Self::Connected(ep) => write!(f, "Connected to {ep}"),
            Self::Accepted { endpoint, routing_id } => {
                write!(f, "Accepted peer {routing_id:?} on {endpoint}")
            }
            Self::Disconnected { routing_id } => write!(f, "Peer {routing_id:?} disconnected"),
            Self::Closed => write!(f, "Closed"),
        }
    }
}

/// Handle for receiving socket events.
pub type SocketMonitor = flume::Receiver<SocketEvent>;

/// Sending half held by the socket.
pub type SocketEventSender = flume::Sender<SocketEvent>;

/// Creates a new monitoring channel pair.
#[must_use]
pub fn create_monitor() -> (SocketEventSender, SocketMonitor) {
    flume::unbounded()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_event_display() {
        let event = SocketEvent::Bound(Endpoint::Inproc("jobs".into()));
        assert_eq!(event.to_string(), "Bound to inproc://jobs");
        assert_eq!(SocketEvent::Closed.to_string(), "Closed");
    }

    #[test]
    fn test_monitor_channel() {
        let (sender, receiver) = create_monitor();
        sender
            .send(SocketEvent::Disconnected {
                routing_id: Bytes::from_static(b"peer"),
            })
            .unwrap();

        let event = receiver.recv().unwrap();
        assert!(matches!(event, SocketEvent::Disconnected { .. }));
    }
}
