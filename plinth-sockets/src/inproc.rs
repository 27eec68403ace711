//! In-process transport.
//!
//! Sockets in the same context talk through direct links: delivering a
//! message pushes it straight into the peer's inbound queue, so payloads are
//! shared `Bytes` and never copied.
//!
//! The endpoint registry belongs to the context that created the transport.
//! Two contexts can bind the same `inproc://` name without seeing each
//! other. An endpoint must be bound before anything connects to it.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use plinth_core::endpoint::Endpoint;
use plinth_core::error::{PlinthError, Result};
use plinth_core::message::Message;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::debug;

use crate::core::SocketCore;
use crate::transport::{Delivery, PeerKey, PeerLink, PeerOrigin, Transport};

/// Registry of bound inproc endpoints.
#[derive(Debug, Default)]
pub struct InprocTransport {
    endpoints: DashMap<String, Weak<SocketCore>>,
    next_pipe: AtomicU64,
}

fn inproc_name(endpoint: &Endpoint) -> Result<&str> {
    match endpoint {
        Endpoint::Inproc(name) => Ok(name),
        other => Err(PlinthError::invalid(format!(
            "'{other}' is not an inproc endpoint"
        ))),
    }
}

fn live(socket: &Weak<SocketCore>) -> Option<Arc<SocketCore>> {
    socket.upgrade().filter(|core| !core.is_closed())
}

impl InprocTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names currently bound, without the `inproc://` prefix.
    pub fn list_endpoints(&self) -> Vec<String> {
        self.endpoints
            .iter()
            .filter(|entry| live(entry.value()).is_some())
            .map(|entry| entry.key().clone())
            .collect()
    }
}

impl Transport for InprocTransport {
    fn scheme(&self) -> &'static str {
        "inproc"
    }

    fn bind(&self, endpoint: &Endpoint, socket: &Arc<SocketCore>) -> Result<()> {
        let name = inproc_name(endpoint)?;
        match self.endpoints.entry(name.to_owned()) {
            Entry::Occupied(mut entry) => {
                if live(entry.get()).is_some() {
                    return Err(PlinthError::invalid(format!(
                        "inproc endpoint '{name}' is already bound"
                    )));
                }
                entry.insert(Arc::downgrade(socket));
            }
            Entry::Vacant(entry) => {
                entry.insert(Arc::downgrade(socket));
            }
        }
        debug!(socket = socket.id(), "[{}] bound inproc://{}", socket.socket_type(), name);
        Ok(())
    }

    fn connect(&self, endpoint: &Endpoint, socket: &Arc<SocketCore>) -> Result<()> {
        let name = inproc_name(endpoint)?;
        let bound = self
            .endpoints
            .get(name)
            .and_then(|entry| live(entry.value()))
            .ok_or_else(|| {
                PlinthError::transport(format!("inproc endpoint '{name}' is not bound"))
            })?;

        if Arc::ptr_eq(&bound, socket) {
            return Err(PlinthError::invalid("a socket cannot connect to itself"));
        }
        if !socket.socket_type().is_compatible(bound.socket_type()) {
            return Err(PlinthError::invalid(format!(
                "{} cannot connect to {}",
                socket.socket_type(),
                bound.socket_type()
            )));
        }

        let key = self.next_pipe.fetch_add(1, Ordering::Relaxed);
        let to_bound = Arc::new(InprocLink {
            target: Arc::downgrade(&bound),
            key,
        });
        let to_connecting = Arc::new(InprocLink {
            target: Arc::downgrade(socket),
            key,
        });

        socket.attach_peer(
            key,
            bound.routing_id_hint(),
            to_bound,
            PeerOrigin::Connected(endpoint.clone()),
        )?;
        if let Err(e) = bound.attach_peer(
            key,
            socket.routing_id_hint(),
            to_connecting,
            PeerOrigin::Accepted(endpoint.clone()),
        ) {
            socket.detach_peer(key);
            return Err(e);
        }

        debug!(
            socket = socket.id(),
            peer = bound.id(),
            pipe = key,
            "[{}] connected to inproc://{}",
            socket.socket_type(),
            name
        );

        // Either side may have queued messages while it had no peer.
        socket.flush_outbound()?;
        bound.flush_outbound()?;
        Ok(())
    }

    fn unbind(&self, endpoint: &Endpoint, socket: &SocketCore) {
        let Ok(name) = inproc_name(endpoint) else {
            return;
        };
        let removed = self
            .endpoints
            .remove_if(name, |_, bound| std::ptr::eq(bound.as_ptr(), socket));
        if removed.is_some() {
            debug!(socket = socket.id(), "[{}] unbound inproc://{}", socket.socket_type(), name);
        }
    }
}

/// One direction of an inproc pipe.
#[derive(Debug)]
struct InprocLink {
    target: Weak<SocketCore>,
    key: PeerKey,
}

impl PeerLink for InprocLink {
    fn deliver(&self, msg: &Message) -> Result<Delivery> {
        Ok(self
            .target
            .upgrade()
            .map_or(Delivery::Disconnected, |target| target.push_message(self.key, msg)))
    }

    fn has_room(&self) -> bool {
        self.target
            .upgrade()
            .is_some_and(|target| target.has_room(self.key))
    }

    fn close(&self) {
        if let Some(target) = self.target.upgrade() {
            target.detach_peer(self.key);
        }
    }
}
