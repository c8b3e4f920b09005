//! Packet encoder

use super::nonce::{ClockNonce, NonceSource};
use super::packet::{Command, DeviceEntry};
use super::{ENTRY_LEN, FAST_PROTOCOL_ID, HEADER_LEN, MAX_UDP_PAYLOAD};
use crate::error::EncodingError;

/// Protocol constants the encoder stamps into every packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolConfig {
    pub protocol_id: u16,
    /// Largest datagram the encoder may produce
    pub max_payload: usize,
}

impl ProtocolConfig {
    /// Number of device entries that fit into `max_payload`
    pub fn max_entries(&self) -> usize {
        self.max_payload.saturating_sub(HEADER_LEN) / ENTRY_LEN
    }
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            protocol_id: FAST_PROTOCOL_ID,
            max_payload: MAX_UDP_PAYLOAD,
        }
    }
}

/// Turns device entries into Fast Interface datagrams
#[derive(Debug, Default)]
pub struct PacketEncoder<N = ClockNonce> {
    config: ProtocolConfig,
    nonces: N,
}

impl PacketEncoder<ClockNonce> {
    /// Encoder with the standard protocol constants and clock-derived nonces
    pub fn new() -> Self {
        Self::with_nonce_source(ClockNonce::new())
    }
}

impl<N: NonceSource> PacketEncoder<N> {
    pub fn with_nonce_source(nonces: N) -> Self {
        Self::with_config(ProtocolConfig::default(), nonces)
    }

    pub fn with_config(config: ProtocolConfig, nonces: N) -> Self {
        Self { config, nonces }
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    /// Encode one packet.
    ///
    /// Entries are written in the order given. A fresh nonce is drawn for
    /// every call, including calls that carry identical entries.
    pub fn encode(
        &self,
        command: Command,
        entries: &[DeviceEntry],
    ) -> Result<Vec<u8>, EncodingError> {
        if entries.is_empty() {
            return Err(EncodingError::Empty);
        }

        let max = self.config.max_entries();
        if entries.len() > max {
            return Err(EncodingError::TooManyEntries {
                count: entries.len(),
                max,
            });
        }

        let nonce = self.nonces.next_nonce();
        let mut buffer = Vec::with_capacity(HEADER_LEN + entries.len() * ENTRY_LEN);

        // Header
        buffer.extend_from_slice(&self.config.protocol_id.to_be_bytes());
        buffer.extend_from_slice(&command.code().to_be_bytes());
        buffer.extend_from_slice(&nonce.to_be_bytes());

        for entry in entries {
            buffer.extend_from_slice(&entry.fast_address.to_be_bytes());
            buffer.extend_from_slice(&entry.setpoint.to_be_bytes());
        }

        tracing::trace!(
            "Encoded packet: command {} nonce {} with {} entries",
            command,
            nonce,
            entries.len()
        );

        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{FastPacket, SequenceNonce, MAX_ENTRIES};

    fn seeded(seed: u64) -> PacketEncoder<SequenceNonce> {
        PacketEncoder::with_nonce_source(SequenceNonce::new(seed))
    }

    #[test]
    fn test_reference_packet_bytes() {
        let encoder = seeded(0x1122_3344_5566_7788);
        let entries = [DeviceEntry::new(1001, 2.5), DeviceEntry::new(1002, -1.25)];

        let packet = encoder.encode(Command::SETPOINT, &entries).unwrap();

        assert_eq!(packet.len(), 24);
        assert_eq!(&packet[0..2], &[0x76, 0x31]);
        assert_eq!(&packet[2..4], &[0x00, 0x00]);
        assert_eq!(
            &packet[4..12],
            &[0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88]
        );
        assert_eq!(&packet[12..14], &[0x03, 0xE9]);
        assert_eq!(&packet[14..18], &[0x40, 0x20, 0x00, 0x00]);
        assert_eq!(&packet[18..20], &[0x03, 0xEA]);
        assert_eq!(&packet[20..24], &[0xBF, 0xA0, 0x00, 0x00]);
    }

    #[test]
    fn test_command_passed_through() {
        let encoder = seeded(0);
        let packet = encoder
            .encode(Command(0xA5C3), &[DeviceEntry::new(1, 0.0)])
            .unwrap();
        assert_eq!(&packet[2..4], &[0xA5, 0xC3]);
    }

    #[test]
    fn test_empty_entries_rejected() {
        let encoder = seeded(0);
        assert_eq!(
            encoder.encode(Command::SETPOINT, &[]),
            Err(EncodingError::Empty)
        );
        // A rejected call does not consume a nonce
        assert_eq!(encoder.nonces.peek(), 0);
    }

    #[test]
    fn test_entry_limit() {
        let encoder = seeded(0);

        let full = vec![DeviceEntry::new(7, 1.0); MAX_ENTRIES];
        let packet = encoder.encode(Command::SETPOINT, &full).unwrap();
        assert_eq!(packet.len(), 12 + 6 * MAX_ENTRIES);
        assert!(packet.len() <= MAX_UDP_PAYLOAD);

        let over = vec![DeviceEntry::new(7, 1.0); 10916];
        assert_eq!(
            encoder.encode(Command::SETPOINT, &over),
            Err(EncodingError::TooManyEntries {
                count: 10916,
                max: 10915
            })
        );
    }

    #[test]
    fn test_custom_config() {
        let config = ProtocolConfig {
            protocol_id: 0xABCD,
            max_payload: HEADER_LEN + 2 * ENTRY_LEN,
        };
        let encoder = PacketEncoder::with_config(config, SequenceNonce::new(0));
        assert_eq!(encoder.config().max_entries(), 2);

        let packet = encoder
            .encode(Command::SETPOINT, &[DeviceEntry::new(1, 1.0)])
            .unwrap();
        assert_eq!(&packet[0..2], &[0xAB, 0xCD]);

        let three = [DeviceEntry::new(1, 1.0); 3];
        assert!(encoder.encode(Command::SETPOINT, &three).is_err());
    }

    #[test]
    fn test_nonce_differs_between_calls() {
        let encoder = PacketEncoder::new();
        let entries = [DeviceEntry::new(1001, 1.0)];

        let first = FastPacket::parse(&encoder.encode(Command::SETPOINT, &entries).unwrap())
            .unwrap();
        let second = FastPacket::parse(&encoder.encode(Command::SETPOINT, &entries).unwrap())
            .unwrap();

        assert_ne!(first.nonce, second.nonce);
        assert_eq!(first.entries, second.entries);
    }

    #[test]
    fn test_special_float_values_bit_exact() {
        let encoder = seeded(0);
        let values = [0.0f32, -0.0, f32::MIN_POSITIVE, f32::MAX, f32::INFINITY];
        let entries: Vec<_> = values
            .iter()
            .enumerate()
            .map(|(i, v)| DeviceEntry::new(i as u16, *v))
            .collect();

        let packet = encoder.encode(Command::SETPOINT, &entries).unwrap();
        let decoded = FastPacket::parse(&packet).unwrap();

        for (original, decoded) in entries.iter().zip(&decoded.entries) {
            assert_eq!(original.setpoint.to_bits(), decoded.setpoint.to_bits());
        }
    }
}
