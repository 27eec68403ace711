//! # Plinth Sockets
//!
//! The socket pattern engine behind `plinth`.
//!
//! ## Overview
//!
//! A [`Context`] creates [`Socket`]s of any role (PUB, SUB, REQ, REP, PUSH,
//! PULL, ROUTER, DEALER, XREQ, XREP). Each socket runs its role's state
//! machine over per-peer queues of complete multipart messages:
//! - **Atomic delivery**: a receiver sees a whole message or nothing
//! - **Envelopes**: REQ/REP hide routing frames, ROUTER/DEALER expose them
//! - **Non-blocking receive**: `DONTWAIT` failures are a distinct `WouldBlock`
//! - **Poller**: wait on readiness of many sockets without busy-looping
//!
//! ## Quick Start
//!
//! ```rust
//! use plinth_sockets::prelude::*;
//!
//! let ctx = Context::new();
//! let mut pull = ctx.socket(SocketType::Pull).unwrap();
//! let mut push = ctx.socket(SocketType::Push).unwrap();
//! pull.bind("inproc://work").unwrap();
//! push.connect("inproc://work").unwrap();
//!
//! push.send_strings(&["job", "42"], Flags::DONTWAIT).unwrap();
//!
//! let mut frames = Vec::new();
//! assert_eq!(pull.recv_multipart(&mut frames, Flags::DONTWAIT).unwrap(), 2);
//! ```
//!
//! Transports plug in through [`transport::Transport`]; `inproc://` is built
//! in.

// Allow some pedantic lints
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::match_same_arms)]
#![deny(unsafe_code)]

pub mod api;
pub mod context;
pub mod core;
pub mod flags;
pub mod inproc;
pub mod pattern;
pub mod poller;
mod signal;
pub mod socket;
pub mod transport;

pub use context::Context;
pub use core::{SocketCore, SocketId};
pub use flags::{Flags, PollFlags, RecvFlags, SendFlags};
pub use poller::{PollEvent, Poller};
pub use socket::{Socket, Suspend};

/// Prelude module for convenient imports
///
/// ```rust
/// use plinth_sockets::prelude::*;
/// ```
pub mod prelude {
    pub use super::{Context, Flags, PollEvent, PollFlags, Poller, Socket};
    pub use bytes::Bytes;
    pub use plinth_core::error::{ErrorCode, PlinthError, Result};
    pub use plinth_core::message::Message;
    pub use plinth_core::options::{OverflowPolicy, SocketOption, SocketOptions};
    pub use plinth_core::socket_type::SocketType;
}
