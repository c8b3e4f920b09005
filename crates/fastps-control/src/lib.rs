//! FastPS Control - Fast Interface setpoint delivery
//!
//! This crate drives FAST-PS power supplies over their UDP "Fast Interface":
//! - **Protocol**: bit-exact packet encoding with per-packet nonces
//! - **Transport**: broadcast, multicast and per-host unicast delivery
//! - **Sender**: one encoder shared by every transport, grouped unicast
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fastps_control::{Command, DeviceEntry, FastSender, MulticastTransport};
//!
//! # fn main() -> fastps_control::Result<()> {
//! let transport = MulticastTransport::new(
//!     "224.0.2.22:30721".parse().unwrap(),
//!     "172.16.144.4".parse().unwrap(),
//! )?;
//!
//! let sender = FastSender::new();
//! sender.send(
//!     &transport,
//!     Command::SETPOINT,
//!     &[DeviceEntry::new(1001, 2.5), DeviceEntry::new(1002, -1.25)],
//! )?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`protocol`] - Packet layout, encoder and nonce sources
//! - [`transport`] - UDP delivery modes
//! - [`sender`] - Encode-and-send front end
//! - [`error`] - Error types

/// Error types
pub mod error;
/// Fast Interface wire format
pub mod protocol;
/// Encode-and-send front end
pub mod sender;
/// UDP delivery modes
pub mod transport;

// Re-exports
pub use error::{EncodingError, FastError, Result, TransportError};
pub use protocol::{
    ClockNonce, Command, DeviceEntry, FastPacket, NonceSource, PacketEncoder, ProtocolConfig,
    SequenceNonce, DEFAULT_PORT, FAST_PROTOCOL_ID,
};
pub use sender::{DeliveryReport, FastSender};
pub use transport::{
    group_by_destination, BroadcastTransport, MulticastTransport, Route, Transport,
    TransportTarget, UnicastTransport,
};
