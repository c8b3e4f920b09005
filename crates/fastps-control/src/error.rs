//! Error types for packet encoding and delivery
use std::net::SocketAddr;

use thiserror::Error;

/// Errors raised while building or inspecting a Fast Interface packet
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    /// A packet must carry at least one device entry
    #[error("packet has no device entries")]
    Empty,

    /// The entries do not fit into a single UDP datagram
    #[error("{count} device entries exceed the datagram limit of {max}")]
    TooManyEntries { count: usize, max: usize },

    /// Bytes that do not follow the Fast Interface layout
    #[error("malformed packet: {0}")]
    Malformed(String),
}

/// Errors raised while opening, configuring or writing to a UDP socket
#[derive(Error, Debug)]
pub enum TransportError {
    /// Socket creation or bind failed
    #[error("failed to open UDP socket: {0}")]
    Socket(#[source] std::io::Error),

    /// A socket option was rejected by the OS
    #[error("failed to set {option}: {source}")]
    SocketOption {
        option: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// The datagram could not be handed to the network stack
    #[error("failed to send to {destination}: {source}")]
    Send {
        destination: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Target address unusable for the selected delivery mode
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

impl TransportError {
    /// The OS-level cause, when there is one
    pub fn io_error(&self) -> Option<&std::io::Error> {
        match self {
            Self::Socket(e) => Some(e),
            Self::SocketOption { source, .. } | Self::Send { source, .. } => Some(source),
            Self::InvalidAddress(_) => None,
        }
    }
}

/// Umbrella error for the control crate
#[derive(Error, Debug)]
pub enum FastError {
    /// Encoding error
    #[error("encoding error: {0}")]
    Encoding(#[from] EncodingError),

    /// Transport error
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Result type for control operations
pub type Result<T> = std::result::Result<T, FastError>;
