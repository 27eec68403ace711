/// Plinth Error Types
///
/// One taxonomy for every socket operation. `WouldBlock` is the only transient
/// member; everything else is fatal to the operation that produced it.

use crate::endpoint::EndpointError;
use std::fmt;
use thiserror::Error;

/// Main error type for Plinth operations
#[derive(Error, Debug)]
pub enum PlinthError {
    /// No message (or no room) right now; retry later
    #[error("Resource temporarily unavailable")]
    WouldBlock,

    /// Operation is not legal in the socket's current pattern state
    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    /// Socket or context has been closed
    #[error("Resource closed")]
    ClosedResource,

    /// Opaque failure reported by a transport
    #[error("Transport failure: {0}")]
    TransportFailure(String),

    /// Bad option value, unknown socket, or incompatible peer
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// ROUTER in mandatory mode was asked to route to an unknown identity
    #[error("Host unreachable")]
    HostUnreachable,

    /// Endpoint could not be parsed
    #[error(transparent)]
    Endpoint(#[from] EndpointError),
}

/// Result type alias for Plinth operations
pub type Result<T> = std::result::Result<T, PlinthError>;

impl PlinthError {
    /// Create a protocol violation error with a message
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::ProtocolViolation(msg.into())
    }

    /// Create a transport failure with a message
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::TransportFailure(msg.into())
    }

    /// Create an invalid argument error with a message
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// True for the transient "no data / no room now" outcome.
    #[must_use]
    pub const fn is_would_block(&self) -> bool {
        matches!(self, Self::WouldBlock)
    }

    /// Symbolic code for the last-error side channel.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::WouldBlock => ErrorCode::WouldBlock,
            Self::ProtocolViolation(_) => ErrorCode::ProtocolViolation,
            Self::ClosedResource => ErrorCode::ClosedResource,
            Self::TransportFailure(_) => ErrorCode::TransportFailure,
            Self::InvalidArgument(_) | Self::Endpoint(_) => ErrorCode::InvalidArgument,
            Self::HostUnreachable => ErrorCode::HostUnreachable,
        }
    }
}

/// Symbolic error codes, errno-style.
///
/// The integer values follow the POSIX / libzmq numbering where one exists so
/// callers porting result-code loops can compare against familiar constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ErrorCode {
    /// `EAGAIN`
    WouldBlock = 11,
    /// `EINVAL`
    InvalidArgument = 22,
    /// `EHOSTUNREACH`
    HostUnreachable = 113,
    /// `EFSM`: operation cannot be accomplished in the current state
    ProtocolViolation = 156_384_763,
    /// `ETERM`: context or socket was terminated
    ClosedResource = 156_384_765,
    /// Opaque transport error
    TransportFailure = 156_384_800,
}

impl ErrorCode {
    /// Conventional symbol for the code.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::WouldBlock => "EAGAIN",
            Self::InvalidArgument => "EINVAL",
            Self::HostUnreachable => "EHOSTUNREACH",
            Self::ProtocolViolation => "EFSM",
            Self::ClosedResource => "ETERM",
            Self::TransportFailure => "ETRANSPORT",
        }
    }

    /// Raw errno-style value.
    pub const fn as_raw(&self) -> i32 {
        *self as i32
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
