//! Readiness poller.
//!
//! Blocks the calling thread until at least one registered socket reaches a
//! readiness state it asked for, or the timeout passes.
//!
//! ```text
//! loop:
//!   g = signal.generation()      // read BEFORE checking
//!   ready = check every socket
//!   if ready non-empty or timeout 0: return ready
//!   wait until generation != g or deadline
//! ```
//!
//! Reading the generation before the check means a change that lands while
//! sockets are being inspected makes the wait return at once.

use hashbrown::HashMap;
use plinth_core::error::{PlinthError, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::trace;

use crate::context::Context;
use crate::core::{SocketCore, SocketId};
use crate::flags::PollFlags;
use crate::socket::Socket;

/// One ready socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollEvent {
    pub socket: SocketId,
    /// Requested flags that are currently true.
    pub readiness: PollFlags,
}

/// A set of sockets to wait on.
pub struct Poller {
    ctx: Context,
    items: HashMap<SocketId, (Arc<SocketCore>, PollFlags)>,
}

impl std::fmt::Debug for Poller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Poller")
            .field("sockets", &self.items.len())
            .finish()
    }
}

impl Poller {
    pub fn new(ctx: &Context) -> Self {
        Self {
            ctx: ctx.clone(),
            items: HashMap::new(),
        }
    }

    /// Watch `socket` for `interest`. Registering again replaces the interest.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if the socket belongs to another context.
    pub fn register(&mut self, socket: &Socket, interest: PollFlags) -> Result<()> {
        if !self.ctx.same_context(socket.context()) {
            return Err(PlinthError::invalid(
                "socket belongs to a different context",
            ));
        }
        self.items
            .insert(socket.id(), (Arc::clone(socket.core()), interest));
        Ok(())
    }

    /// Stop watching `socket`. Returns whether it was registered.
    pub fn deregister(&mut self, socket: &Socket) -> bool {
        self.items.remove(&socket.id()).is_some()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn collect_ready(&self) -> Vec<PollEvent> {
        self.items
            .iter()
            .filter_map(|(&socket, (core, interest))| {
                let readiness = core.readiness().intersection(*interest);
                (!readiness.is_empty()).then_some(PollEvent { socket, readiness })
            })
            .collect()
    }

    /// Wait for readiness. `None` waits forever; `Some(Duration::ZERO)`
    /// checks once and returns.
    ///
    /// Returns the ready sockets, empty on timeout.
    ///
    /// # Errors
    ///
    /// `ClosedResource` if the context is terminated.
    pub fn poll(&mut self, timeout: Option<Duration>) -> Result<Vec<PollEvent>> {
        let deadline = timeout.map(|t| Instant::now() + t);
        let signal = Arc::clone(self.ctx.signal());

        loop {
            if self.ctx.is_terminated() {
                return Err(PlinthError::ClosedResource);
            }

            let seen = signal.generation();
            let ready = self.collect_ready();
            if !ready.is_empty() {
                trace!(ready = ready.len(), "poll");
                return Ok(ready);
            }
            if timeout == Some(Duration::ZERO) {
                return Ok(ready);
            }
            if !signal.wait(seen, deadline) {
                return Ok(Vec::new());
            }
        }
    }
}
