//! Plinth Core
//!
//! This crate contains the protocol-agnostic building blocks:
//! - Frames and multipart messages, with receive-side assembly (`frame`, `message`)
//! - Socket roles and their envelope policies (`socket_type`, `envelope`)
//! - SUB prefix subscriptions (`subscription`)
//! - Socket options (`options`)
//! - Endpoint addresses (`endpoint`)
//! - Lifecycle events (`monitor`)
//! - Error types (`error`)

#![deny(unsafe_code)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]

pub mod endpoint;
pub mod envelope;
pub mod error;
pub mod frame;
pub mod message;
pub mod monitor;
pub mod options;
pub mod socket_type;
pub mod subscription;

// Keep it minimal to avoid API lock-in.
pub mod prelude {
    pub use crate::endpoint::Endpoint;
    pub use crate::envelope::EnvelopePolicy;
    pub use crate::error::{ErrorCode, PlinthError, Result};
    pub use crate::frame::Frame;
    pub use crate::message::{Message, MessageAssembler};
    pub use crate::monitor::{SocketEvent, SocketMonitor};
    pub use crate::options::{OverflowPolicy, SocketOption, SocketOptions};
    pub use crate::socket_type::SocketType;
}
