//! Packet data model

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{ENTRY_LEN, FAST_PROTOCOL_ID, HEADER_LEN};
use crate::error::EncodingError;

/// 16-bit command field
///
/// Only [`Command::SETPOINT`] is defined; every other value is reserved by the
/// protocol and is written to the wire unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Command(pub u16);

impl Command {
    /// Apply the setpoints carried in the packet
    pub const SETPOINT: Command = Command(0x0000);

    pub fn code(self) -> u16 {
        self.0
    }
}

impl From<u16> for Command {
    fn from(code: u16) -> Self {
        Self(code)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04X}", self.0)
    }
}

/// One power supply and the current it should drive
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeviceEntry {
    /// Fast Address of the unit, unique within one packet
    pub fast_address: u16,
    /// Setpoint in amperes
    pub setpoint: f32,
}

impl DeviceEntry {
    pub fn new(fast_address: u16, setpoint: f32) -> Self {
        Self {
            fast_address,
            setpoint,
        }
    }
}

impl fmt::Display for DeviceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} A", self.fast_address, self.setpoint)
    }
}

/// A decoded Fast Interface packet
#[derive(Debug, Clone, PartialEq)]
pub struct FastPacket {
    pub protocol_id: u16,
    pub command: Command,
    pub nonce: u64,
    pub entries: Vec<DeviceEntry>,
}

impl FastPacket {
    /// Decode a datagram produced by [`PacketEncoder`](super::PacketEncoder)
    pub fn parse(bytes: &[u8]) -> Result<Self, EncodingError> {
        if bytes.len() < HEADER_LEN {
            return Err(EncodingError::Malformed(format!(
                "{} bytes is shorter than the {}-byte header",
                bytes.len(),
                HEADER_LEN
            )));
        }

        let protocol_id = u16::from_be_bytes([bytes[0], bytes[1]]);
        if protocol_id != FAST_PROTOCOL_ID {
            return Err(EncodingError::Malformed(format!(
                "unexpected protocol id 0x{:04X}",
                protocol_id
            )));
        }

        let command = Command(u16::from_be_bytes([bytes[2], bytes[3]]));

        let mut nonce = [0u8; 8];
        nonce.copy_from_slice(&bytes[4..HEADER_LEN]);
        let nonce = u64::from_be_bytes(nonce);

        let body = &bytes[HEADER_LEN..];
        if body.len() % ENTRY_LEN != 0 {
            return Err(EncodingError::Malformed(format!(
                "body of {} bytes is not a whole number of entries",
                body.len()
            )));
        }

        let entries = body
            .chunks_exact(ENTRY_LEN)
            .map(|chunk| DeviceEntry {
                fast_address: u16::from_be_bytes([chunk[0], chunk[1]]),
                setpoint: f32::from_be_bytes([chunk[2], chunk[3], chunk[4], chunk[5]]),
            })
            .collect();

        Ok(Self {
            protocol_id,
            command,
            nonce,
            entries,
        })
    }

    /// Fast addresses in packet order
    pub fn addresses(&self) -> Vec<u16> {
        self.entries.iter().map(|e| e.fast_address).collect()
    }
}
