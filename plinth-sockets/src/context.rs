//! Messaging context.
//!
//! A `Context` owns everything sockets share: the transport table (and with
//! it the inproc endpoint namespace), the readiness signal pollers wait on,
//! and a registry of live sockets so [`Context::terminate`] can reach them.
//! It is cheap to clone; clones refer to the same context. There is no
//! process-wide default context.

use dashmap::DashMap;
use hashbrown::HashMap;
use parking_lot::RwLock;
use plinth_core::endpoint::Endpoint;
use plinth_core::error::{PlinthError, Result};
use plinth_core::options::SocketOptions;
use plinth_core::socket_type::SocketType;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::debug;

use crate::core::{SocketCore, SocketId};
use crate::inproc::InprocTransport;
use crate::signal::ReadySignal;
use crate::socket::Socket;
use crate::transport::Transport;

struct ContextInner {
    signal: Arc<ReadySignal>,
    transports: RwLock<HashMap<&'static str, Arc<dyn Transport>>>,
    sockets: DashMap<SocketId, Weak<SocketCore>>,
    next_socket_id: AtomicU64,
    terminated: AtomicBool,
}

/// Shared state for a group of sockets.
#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("sockets", &self.inner.sockets.len())
            .field("terminated", &self.is_terminated())
            .finish()
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    /// Create a context with the inproc transport registered.
    pub fn new() -> Self {
        let mut transports: HashMap<&'static str, Arc<dyn Transport>> = HashMap::new();
        let inproc: Arc<dyn Transport> = Arc::new(InprocTransport::new());
        transports.insert(inproc.scheme(), inproc);

        Self {
            inner: Arc::new(ContextInner {
                signal: Arc::new(ReadySignal::new()),
                transports: RwLock::new(transports),
                sockets: DashMap::new(),
                next_socket_id: AtomicU64::new(1),
                terminated: AtomicBool::new(false),
            }),
        }
    }

    /// Create a socket with default options.
    ///
    /// # Errors
    ///
    /// `ClosedResource` if the context was terminated.
    pub fn socket(&self, socket_type: SocketType) -> Result<Socket> {
        self.socket_with_options(socket_type, SocketOptions::default())
    }

    /// Create a socket with explicit options.
    ///
    /// # Errors
    ///
    /// `ClosedResource` if the context was terminated.
    pub fn socket_with_options(
        &self,
        socket_type: SocketType,
        options: SocketOptions,
    ) -> Result<Socket> {
        if self.is_terminated() {
            return Err(PlinthError::ClosedResource);
        }

        let id = self.inner.next_socket_id.fetch_add(1, Ordering::Relaxed);
        let core = SocketCore::new(id, socket_type, options, Arc::clone(&self.inner.signal));
        self.inner.sockets.retain(|_, socket| socket.strong_count() > 0);
        self.inner.sockets.insert(id, Arc::downgrade(&core));

        debug!(socket = id, "[{}] socket created", socket_type);
        Ok(Socket::new(core, self.clone()))
    }

    /// Install a transport for its scheme, replacing any previous one.
    pub fn register_transport(&self, transport: Arc<dyn Transport>) {
        let scheme = transport.scheme();
        self.inner.transports.write().insert(scheme, transport);
        debug!("transport registered for {}://", scheme);
    }

    /// Transport for `endpoint`'s scheme.
    ///
    /// # Errors
    ///
    /// `TransportFailure` if no transport handles the scheme.
    pub fn transport_for(&self, endpoint: &Endpoint) -> Result<Arc<dyn Transport>> {
        let scheme = endpoint.scheme();
        self.inner
            .transports
            .read()
            .get(scheme)
            .cloned()
            .ok_or_else(|| {
                PlinthError::transport(format!("no transport registered for {scheme}://"))
            })
    }

    /// Close every socket of this context and refuse new ones.
    ///
    /// Blocked sends, receives and polls wake up with `ClosedResource`.
    pub fn terminate(&self) {
        if self.inner.terminated.swap(true, Ordering::AcqRel) {
            return;
        }

        let cores: Vec<Arc<SocketCore>> = self
            .inner
            .sockets
            .iter()
            .filter_map(|entry| entry.value().upgrade())
            .collect();
        self.inner.sockets.clear();

        for core in &cores {
            core.close();
        }
        self.inner.signal.notify();
        debug!(sockets = cores.len(), "context terminated");
    }

    pub fn is_terminated(&self) -> bool {
        self.inner.terminated.load(Ordering::Acquire)
    }

    pub(crate) fn signal(&self) -> &Arc<ReadySignal> {
        &self.inner.signal
    }

    pub(crate) fn same_context(&self, other: &Context) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contexts_do_not_share_inproc_names() {
        let a = Context::new();
        let b = Context::new();

        let mut pull_a = a.socket(SocketType::Pull).unwrap();
        let mut pull_b = b.socket(SocketType::Pull).unwrap();
        pull_a.bind("inproc://shared").unwrap();
        pull_b.bind("inproc://shared").unwrap();
    }

    #[test]
    fn unknown_scheme_is_a_transport_failure() {
        let ctx = Context::new();
        let endpoint = Endpoint::parse("tcp://127.0.0.1:5555").unwrap();
        let err = ctx.transport_for(&endpoint).err().expect("expected transport lookup to fail");
        assert!(matches!(err, PlinthError::TransportFailure(_)));
    }

    #[test]
    fn terminate_closes_sockets_and_refuses_new_ones() {
        let ctx = Context::new();
        let socket = ctx.socket(SocketType::Pull).unwrap();

        ctx.terminate();
        assert!(socket.is_closed());
        assert!(matches!(
            ctx.socket(SocketType::Push),
            Err(PlinthError::ClosedResource)
        ));
    }

    #[test]
    fn clones_share_state() {
        let ctx = Context::new();
        let clone = ctx.clone();
        assert!(ctx.same_context(&clone));
        assert!(!ctx.same_context(&Context::new()));
    }
}
