//! # Plinth
//!
//! Pattern-based multipart messaging in the ZeroMQ style, with atomic
//! multipart delivery, a non-blocking receive whose failure is
//! distinguishable from real errors, and a readiness poller.
//!
//! ## Architecture
//!
//! - **`plinth-core`**: messages, frames, envelope policy, socket roles,
//!   options, errors
//! - **`plinth-sockets`**: the pattern engine, context, poller and the
//!   in-process transport
//! - **`plinth`**: public API surface (this crate)
//!
//! ## Quick Start
//!
//! ```rust
//! # #[cfg(feature = "sockets")]
//! # fn main() -> plinth::Result<()> {
//! use plinth::prelude::*;
//!
//! let ctx = Context::new();
//! let mut publisher = ctx.socket(SocketType::Pub)?;
//! let mut subscriber = ctx.socket(SocketType::Sub)?;
//!
//! publisher.bind("inproc://events")?;
//! subscriber.connect("inproc://events")?;
//! subscriber.subscribe("weather")?;
//!
//! publisher.send_strings(&["weather", "sunny"], Flags::DONTWAIT)?;
//! publisher.send_strings(&["traffic", "jammed"], Flags::DONTWAIT)?;
//!
//! let mut frames = Vec::new();
//! assert_eq!(subscriber.recv_multipart(&mut frames, Flags::DONTWAIT)?, 2);
//! assert_eq!(&frames[1][..], b"sunny");
//!
//! // Nothing else matched the subscription.
//! let err = subscriber.recv_multipart(&mut frames, Flags::DONTWAIT).unwrap_err();
//! assert!(err.is_would_block());
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "sockets"))]
//! # fn main() {}
//! ```
//!
//! ## Waiting without busy-polling
//!
//! ```rust
//! # #[cfg(feature = "sockets")]
//! # fn main() -> plinth::Result<()> {
//! use plinth::prelude::*;
//! use std::time::Duration;
//!
//! let ctx = Context::new();
//! let mut pull = ctx.socket(SocketType::Pull)?;
//! pull.bind("inproc://jobs")?;
//!
//! let mut poller = Poller::new(&ctx);
//! poller.register(&pull, PollFlags::POLLIN)?;
//! let ready = poller.poll(Some(Duration::from_millis(10)))?;
//! assert!(ready.is_empty());
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "sockets"))]
//! # fn main() {}
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod dev_tracing;

// Re-export core types
pub use bytes::Bytes;
pub use plinth_core::endpoint::{Endpoint, EndpointError};
pub use plinth_core::envelope::EnvelopePolicy;
pub use plinth_core::error::{ErrorCode, PlinthError, Result};
pub use plinth_core::frame::Frame;
pub use plinth_core::message::{Message, MessageAssembler, MessageBuilder};
pub use plinth_core::monitor::{SocketEvent, SocketMonitor};
pub use plinth_core::options::{OverflowPolicy, SocketOption, SocketOptions};
pub use plinth_core::socket_type::SocketType;

#[cfg(feature = "sockets")]
pub use plinth_sockets::{
    api, transport, Context, Flags, PollEvent, PollFlags, Poller, RecvFlags, SendFlags, Socket,
    SocketId, Suspend,
};

/// Prelude module for convenient imports
///
/// ```rust
/// use plinth::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{Bytes, ErrorCode, Message, PlinthError, Result, SocketOption, SocketType};
    pub use crate::{OverflowPolicy, SocketOptions};

    #[cfg(feature = "sockets")]
    pub use crate::{Context, Flags, PollEvent, PollFlags, Poller, Socket};
}
