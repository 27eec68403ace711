//! Result-code API.
//!
//! Thin wrappers for callers that branch on integer return codes rather than
//! `Result`. A non-negative return is success (the frame count for message
//! calls, the number of ready sockets for `poll`, `0` otherwise). `-1` means
//! failure; the error code is then available from [`errno`] on the same
//! thread until the next failing call.
//!
//! ```rust
//! use plinth_sockets::api;
//! use plinth_sockets::prelude::*;
//!
//! let ctx = Context::new();
//! let mut pull = ctx.socket(SocketType::Pull).unwrap();
//! pull.bind("inproc://codes").unwrap();
//!
//! let mut frames = Vec::new();
//! let rc = api::recv_multipart(&mut pull, &mut frames, Flags::DONTWAIT);
//! assert!(!api::resultcode_ok(rc));
//! assert_eq!(api::errno(), Some(ErrorCode::WouldBlock));
//! assert!(frames.is_empty());
//! ```

use bytes::Bytes;
use plinth_core::error::{ErrorCode, PlinthError, Result};
use plinth_core::options::SocketOption;
use std::cell::Cell;
use std::time::Duration;
use tracing::debug;

use crate::flags::{RecvFlags, SendFlags};
use crate::poller::Poller;
use crate::socket::Socket;

thread_local! {
    static LAST_ERROR: Cell<Option<ErrorCode>> = const { Cell::new(None) };
}

fn record(op: &'static str, result: Result<usize>) -> i32 {
    match result {
        Ok(n) => i32::try_from(n).unwrap_or(i32::MAX),
        Err(e) => {
            if !e.is_would_block() {
                debug!("{} failed: {}", op, e);
            }
            set_errno(&e);
            -1
        }
    }
}

fn set_errno(e: &PlinthError) {
    LAST_ERROR.with(|last| last.set(Some(e.code())));
}

/// Code of the last failure on this thread.
pub fn errno() -> Option<ErrorCode> {
    LAST_ERROR.with(Cell::get)
}

/// Did a call succeed?
#[inline]
pub const fn resultcode_ok(rc: i32) -> bool {
    rc >= 0
}

/// [`Socket::recv_multipart`] returning the frame count or `-1`.
pub fn recv_multipart(socket: &mut Socket, out: &mut Vec<Bytes>, flags: RecvFlags) -> i32 {
    record("recv_multipart", socket.recv_multipart(out, flags))
}

/// [`Socket::send_multipart`] returning the frame count or `-1`.
pub fn send_multipart(socket: &mut Socket, frames: Vec<Bytes>, flags: SendFlags) -> i32 {
    record("send_multipart", socket.send_multipart(frames, flags))
}

/// [`Socket::send_string`] returning `1` or `-1`.
pub fn send_string(socket: &mut Socket, s: &str, flags: SendFlags) -> i32 {
    record("send_string", socket.send_string(s, flags))
}

/// [`Socket::send_strings`] returning the frame count or `-1`.
pub fn send_strings(socket: &mut Socket, parts: &[&str], flags: SendFlags) -> i32 {
    record("send_strings", socket.send_strings(parts, flags))
}

/// [`Socket::set_option`] returning `0` or `-1`.
pub fn setsockopt(socket: &mut Socket, option: SocketOption) -> i32 {
    record("setsockopt", socket.set_option(option).map(|()| 0))
}

/// [`Poller::poll`] returning the number of ready sockets or `-1`.
pub fn poll(poller: &mut Poller, timeout: Option<Duration>) -> i32 {
    record("poll", poller.poll(timeout).map(|events| events.len()))
}
