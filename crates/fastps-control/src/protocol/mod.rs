//! Fast Interface wire format
//!
//! The Fast Interface is a one-way UDP protocol that carries current setpoints
//! for one or more FAST-PS power supplies in a single datagram.
//!
//! ## Packet layout
//!
//! All fields are big-endian with no padding:
//!
//! ```text
//! ┌──────────────┬──────────┬──────────────┬─────────────────────────────┐
//! │ protocol id  │ command  │ nonce        │ k × (fast address, setpoint)│
//! │ u16 (0x7631) │ u16      │ u64          │ u16 + f32 (IEEE-754)        │
//! └──────────────┴──────────┴──────────────┴─────────────────────────────┘
//!   offset 0       2          4              12
//! ```
//!
//! Total length is `12 + 6 × k`. The nonce is unique per packet so receivers
//! can discard duplicates and replays.
//!
//! ## Example Usage
//!
//! ```rust
//! use fastps_control::protocol::{Command, DeviceEntry, FastPacket, PacketEncoder};
//!
//! # fn main() -> Result<(), fastps_control::EncodingError> {
//! let encoder = PacketEncoder::new();
//! let entries = [DeviceEntry::new(1001, 2.5), DeviceEntry::new(1002, -1.25)];
//!
//! let bytes = encoder.encode(Command::SETPOINT, &entries)?;
//! assert_eq!(bytes.len(), 24);
//!
//! let packet = FastPacket::parse(&bytes)?;
//! assert_eq!(packet.entries, entries);
//! # Ok(())
//! # }
//! ```

pub mod encoder;
pub mod nonce;
pub mod packet;

pub use encoder::{PacketEncoder, ProtocolConfig};
pub use nonce::{ClockNonce, NonceSource, SequenceNonce};
pub use packet::{Command, DeviceEntry, FastPacket};

/// Protocol identifier at the start of every packet
pub const FAST_PROTOCOL_ID: u16 = 0x7631;

/// Default Fast Interface UDP port on FAST-PS units
pub const DEFAULT_PORT: u16 = 30721;

/// Protocol id + command + nonce
pub const HEADER_LEN: usize = 12;

/// Fast address + setpoint
pub const ENTRY_LEN: usize = 6;

/// Largest UDP payload over IPv4
pub const MAX_UDP_PAYLOAD: usize = 65507;

/// Most device entries that fit into one datagram
pub const MAX_ENTRIES: usize = (MAX_UDP_PAYLOAD - HEADER_LEN) / ENTRY_LEN;
