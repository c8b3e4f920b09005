//! Subnet broadcast delivery

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};

use super::{option_error, send_datagram, Transport, TransportTarget};
use crate::error::TransportError;

/// Sends each packet to a broadcast address with `SO_BROADCAST` set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastTransport {
    destination: SocketAddrV4,
}

impl BroadcastTransport {
    /// Create a broadcast transport
    ///
    /// # Arguments
    /// * `destination` - Broadcast address and port (typically "255.255.255.255:30721"
    ///   or the subnet's all-ones address)
    pub fn new(destination: SocketAddrV4) -> Self {
        Self { destination }
    }

    /// Parse an `ip:port` broadcast destination
    pub fn parse(destination: &str) -> Result<Self, TransportError> {
        let destination: SocketAddrV4 = destination.parse().map_err(|e| {
            TransportError::InvalidAddress(format!(
                "invalid broadcast target {}: {}",
                destination, e
            ))
        })?;
        Ok(Self::new(destination))
    }

    pub fn broadcast_addr(&self) -> SocketAddrV4 {
        self.destination
    }

    /// Open an unconnected socket with broadcast enabled
    pub fn open_socket(&self) -> Result<UdpSocket, TransportError> {
        let socket =
            UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).map_err(TransportError::Socket)?;
        socket
            .set_broadcast(true)
            .map_err(option_error("SO_BROADCAST"))?;
        Ok(socket)
    }
}

impl Transport for BroadcastTransport {
    fn send(&self, packet: &[u8]) -> Result<usize, TransportError> {
        let socket = self.open_socket()?;
        let sent = send_datagram(&socket, packet, SocketAddr::V4(self.destination))?;
        tracing::debug!("Broadcast {} bytes to {}", sent, self.destination);
        Ok(sent)
    }

    fn target(&self) -> TransportTarget {
        TransportTarget::Broadcast {
            destination: self.destination,
        }
    }
}
