//! Socket handle.
//!
//! A [`Socket`] is the owning handle applications use. It is `Send` but not
//! `Sync`: a socket may move to another thread, but it must not be used from
//! several threads at once. Peers reach the socket through its shared
//! [`SocketCore`], never through the handle.
//!
//! Send and receive run one algorithm each, parameterized by [`Suspend`]:
//! attempt the operation, and if it cannot proceed either report
//! `WouldBlock` straight away or wait on a [`Poller`] for the matching
//! readiness and try again.

use bytes::Bytes;
use plinth_core::endpoint::Endpoint;
use plinth_core::error::{PlinthError, Result};
use plinth_core::message::Message;
use plinth_core::monitor::{SocketEvent, SocketMonitor};
use plinth_core::options::{SocketOption, SocketOptions};
use plinth_core::socket_type::SocketType;
use std::cell::Cell;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::context::Context;
use crate::core::{SocketCore, SocketId};
use crate::flags::{Flags, PollFlags, RecvFlags, SendFlags};
use crate::poller::Poller;

/// What an operation does when it cannot proceed immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suspend {
    /// Report `WouldBlock` without waiting.
    Immediate,
    /// Wait for readiness, up to the timeout (`None` waits forever).
    Wait(Option<Duration>),
}

impl Suspend {
    /// `DONTWAIT` wins over any configured timeout.
    pub fn from_flags(flags: Flags, timeout: Option<Duration>) -> Self {
        if flags.contains(Flags::DONTWAIT) {
            Self::Immediate
        } else {
            Self::Wait(timeout)
        }
    }
}

/// A messaging socket.
pub struct Socket {
    core: Arc<SocketCore>,
    ctx: Context,
    bound: Vec<Endpoint>,
    _not_sync: PhantomData<Cell<()>>,
}

impl fmt::Debug for Socket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Socket")
            .field("id", &self.core.id())
            .field("socket_type", &self.core.socket_type())
            .field("bound", &self.bound)
            .finish()
    }
}

impl Socket {
    pub(crate) fn new(core: Arc<SocketCore>, ctx: Context) -> Self {
        Self {
            core,
            ctx,
            bound: Vec::new(),
            _not_sync: PhantomData,
        }
    }

    pub(crate) fn core(&self) -> &Arc<SocketCore> {
        &self.core
    }

    pub(crate) fn context(&self) -> &Context {
        &self.ctx
    }

    #[inline]
    pub fn id(&self) -> SocketId {
        self.core.id()
    }

    #[inline]
    pub fn socket_type(&self) -> SocketType {
        self.core.socket_type()
    }

    pub fn is_closed(&self) -> bool {
        self.core.is_closed()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.core.is_closed() {
            Err(PlinthError::ClosedResource)
        } else {
            Ok(())
        }
    }

    /// Make this socket reachable at `endpoint`.
    ///
    /// # Errors
    ///
    /// `Endpoint` for a malformed address, `TransportFailure` for an
    /// unsupported scheme, `InvalidArgument` if the address is taken.
    pub fn bind(&mut self, endpoint: &str) -> Result<()> {
        self.ensure_open()?;
        let endpoint = Endpoint::parse(endpoint)?;
        let transport = self.ctx.transport_for(&endpoint)?;
        transport.bind(&endpoint, &self.core)?;

        self.core.emit(SocketEvent::Bound(endpoint.clone()));
        self.bound.push(endpoint);
        Ok(())
    }

    /// Connect to a bound endpoint.
    ///
    /// # Errors
    ///
    /// `TransportFailure` if nothing is bound there, `InvalidArgument` if the
    /// socket types cannot talk to each other.
    pub fn connect(&mut self, endpoint: &str) -> Result<()> {
        self.ensure_open()?;
        let endpoint = Endpoint::parse(endpoint)?;
        let transport = self.ctx.transport_for(&endpoint)?;
        transport.connect(&endpoint, &self.core)
    }

    /// Release an endpoint this socket bound. Existing connections stay up.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if this socket is not bound there.
    pub fn unbind(&mut self, endpoint: &str) -> Result<()> {
        self.ensure_open()?;
        let endpoint = Endpoint::parse(endpoint)?;
        let idx = self
            .bound
            .iter()
            .position(|bound| bound == &endpoint)
            .ok_or_else(|| PlinthError::invalid(format!("not bound to {endpoint}")))?;

        let endpoint = self.bound.swap_remove(idx);
        self.ctx.transport_for(&endpoint)?.unbind(&endpoint, &self.core);
        self.core.emit(SocketEvent::Unbound(endpoint));
        Ok(())
    }

    /// Change one option.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if the option does not apply to this socket type.
    pub fn set_option(&mut self, option: SocketOption) -> Result<()> {
        self.core.set_option(option)
    }

    /// Shorthand for `set_option(SocketOption::Subscribe(prefix))`.
    pub fn subscribe(&mut self, prefix: impl Into<Bytes>) -> Result<()> {
        self.set_option(SocketOption::Subscribe(prefix.into()))
    }

    /// Snapshot of the current options.
    pub fn options(&self) -> SocketOptions {
        self.core.options()
    }

    /// Current readiness of this socket alone.
    pub fn readiness(&self) -> PollFlags {
        self.core.readiness()
    }

    /// Start receiving lifecycle events. Replaces any earlier monitor.
    pub fn monitor(&mut self) -> SocketMonitor {
        self.core.monitor()
    }

    /// Send a multipart message. Returns the number of frames sent.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an empty frame list, `WouldBlock` if the send
    /// cannot proceed (immediately with `DONTWAIT`, otherwise after
    /// `send_timeout`), `ProtocolViolation` if the pattern forbids sending now.
    pub fn send_multipart(&mut self, frames: Vec<Bytes>, flags: SendFlags) -> Result<usize> {
        let msg = Message::from_parts(frames)?;
        let frames = msg.len();
        self.send(msg, flags)?;
        Ok(frames)
    }

    /// Send one message.
    ///
    /// # Errors
    ///
    /// As [`Socket::send_multipart`].
    pub fn send(&mut self, msg: impl Into<Message>, flags: SendFlags) -> Result<()> {
        let msg = msg.into();
        let suspend = Suspend::from_flags(flags, self.core.options().send_timeout);
        self.run(PollFlags::POLLOUT, suspend, |core| {
            match core.send(msg.clone()) {
                Ok(()) => Ok(Some(())),
                Err(PlinthError::WouldBlock) => Ok(None),
                Err(e) => Err(e),
            }
        })
    }

    /// Send a single-frame string message.
    pub fn send_string(&mut self, s: &str, flags: SendFlags) -> Result<usize> {
        self.send_multipart(vec![Bytes::copy_from_slice(s.as_bytes())], flags)
    }

    /// Send each string as one frame of a single message.
    pub fn send_strings(&mut self, parts: &[&str], flags: SendFlags) -> Result<usize> {
        let frames = parts
            .iter()
            .map(|s| Bytes::copy_from_slice(s.as_bytes()))
            .collect();
        self.send_multipart(frames, flags)
    }

    /// Receive one complete message, appending its frames to `out`.
    ///
    /// Returns the number of frames appended. On any error `out` is left as
    /// it was.
    ///
    /// # Errors
    ///
    /// `WouldBlock` if no message is ready (immediately with `DONTWAIT`,
    /// otherwise after `recv_timeout`), `ProtocolViolation` if the pattern
    /// forbids receiving now, `ClosedResource` after close.
    pub fn recv_multipart(&mut self, out: &mut Vec<Bytes>, flags: RecvFlags) -> Result<usize> {
        let msg = self.recv(flags)?;
        let frames = msg.len();
        out.extend(msg.into_parts());
        Ok(frames)
    }

    /// Receive one complete message.
    ///
    /// # Errors
    ///
    /// As [`Socket::recv_multipart`].
    pub fn recv(&mut self, flags: RecvFlags) -> Result<Message> {
        let suspend = Suspend::from_flags(flags, self.core.options().recv_timeout);
        self.run(PollFlags::POLLIN, suspend, SocketCore::try_recv)
    }

    /// Attempt `op`; when it cannot proceed, suspend according to `suspend`
    /// and retry.
    fn run<T>(
        &self,
        interest: PollFlags,
        suspend: Suspend,
        mut op: impl FnMut(&SocketCore) -> Result<Option<T>>,
    ) -> Result<T> {
        let deadline = match suspend {
            Suspend::Immediate => return op(&self.core)?.ok_or(PlinthError::WouldBlock),
            Suspend::Wait(timeout) => timeout.map(|t| Instant::now() + t),
        };

        let mut poller: Option<Poller> = None;
        loop {
            if let Some(value) = op(&self.core)? {
                return Ok(value);
            }

            let remaining = match deadline {
                None => None,
                Some(deadline) => match deadline.checked_duration_since(Instant::now()) {
                    Some(left) if !left.is_zero() => Some(left),
                    _ => return Err(PlinthError::WouldBlock),
                },
            };

            let mut active = match poller.take() {
                Some(active) => active,
                None => {
                    let mut fresh = Poller::new(&self.ctx);
                    fresh.register(self, interest)?;
                    fresh
                }
            };
            if active.poll(remaining)?.is_empty() {
                return Err(PlinthError::WouldBlock);
            }
            poller = Some(active);
        }
    }

    /// Close the socket. Further operations return `ClosedResource`.
    ///
    /// Unsent queued messages are discarded. Calling it again is a no-op.
    pub fn close(&mut self) {
        for endpoint in self.bound.drain(..) {
            if let Ok(transport) = self.ctx.transport_for(&endpoint) {
                transport.unbind(&endpoint, &self.core);
            }
        }
        if !self.core.is_closed() {
            debug!(socket = self.core.id(), "[{}] closing", self.core.socket_type());
        }
        self.core.close();
    }
}

impl Drop for Socket {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dontwait_overrides_timeout() {
        assert_eq!(
            Suspend::from_flags(Flags::DONTWAIT, None),
            Suspend::Immediate
        );
        assert_eq!(
            Suspend::from_flags(Flags::NONE, Some(Duration::from_millis(5))),
            Suspend::Wait(Some(Duration::from_millis(5)))
        );
    }

    #[test]
    fn recv_times_out_with_would_block() {
        let ctx = Context::new();
        let mut pull = ctx
            .socket_with_options(
                SocketType::Pull,
                SocketOptions::new().with_recv_timeout(Some(Duration::from_millis(20))),
            )
            .unwrap();
        pull.bind("inproc://timeout").unwrap();

        let mut out = Vec::new();
        let err = pull.recv_multipart(&mut out, Flags::NONE).unwrap_err();
        assert!(err.is_would_block());
        assert!(out.is_empty());
    }

    #[test]
    fn close_is_idempotent_and_releases_endpoint() {
        let ctx = Context::new();
        let mut pull = ctx.socket(SocketType::Pull).unwrap();
        pull.bind("inproc://closing").unwrap();

        pull.close();
        pull.close();
        assert!(matches!(
            pull.send_string("x", Flags::DONTWAIT),
            Err(PlinthError::ClosedResource) | Err(PlinthError::ProtocolViolation(_))
        ));
        assert!(matches!(
            pull.recv(Flags::DONTWAIT),
            Err(PlinthError::ClosedResource)
        ));

        let mut again = ctx.socket(SocketType::Pull).unwrap();
        again.bind("inproc://closing").unwrap();
    }

    #[test]
    fn unbind_unknown_endpoint_is_invalid() {
        let ctx = Context::new();
        let mut pull = ctx.socket(SocketType::Pull).unwrap();
        assert!(matches!(
            pull.unbind("inproc://never"),
            Err(PlinthError::InvalidArgument(_))
        ));
    }

    #[test]
    fn empty_multipart_is_rejected() {
        let ctx = Context::new();
        let mut push = ctx.socket(SocketType::Push).unwrap();
        assert!(matches!(
            push.send_multipart(Vec::new(), Flags::DONTWAIT),
            Err(PlinthError::InvalidArgument(_))
        ));
    }

    #[test]
    fn monitor_reports_lifecycle() {
        let ctx = Context::new();
        let mut pull = ctx.socket(SocketType::Pull).unwrap();
        let events = pull.monitor();
        pull.bind("inproc://watched").unwrap();

        let mut push = ctx.socket(SocketType::Push).unwrap();
        push.connect("inproc://watched").unwrap();
        pull.close();

        let seen: Vec<SocketEvent> = events.try_iter().collect();
        assert!(matches!(seen[0], SocketEvent::Bound(_)));
        assert!(matches!(seen[1], SocketEvent::Accepted { .. }));
        assert!(matches!(seen.last(), Some(SocketEvent::Closed)));
    }
}
