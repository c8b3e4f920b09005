//! Multicast group delivery

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};

use socket2::{Domain, Protocol, Socket, Type};

use super::{
    option_error, send_datagram, Transport, TransportTarget, DEFAULT_MULTICAST_LOOP,
    DEFAULT_MULTICAST_TTL,
};
use crate::error::TransportError;

/// Sends each packet to a multicast group through a chosen local interface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MulticastTransport {
    group: SocketAddrV4,
    interface: Ipv4Addr,
    ttl: u32,
    loopback: bool,
}

impl MulticastTransport {
    /// Create a multicast transport
    ///
    /// # Arguments
    /// * `group` - Multicast group and port (e.g. "224.0.2.22:30721")
    /// * `interface` - Address of the local NIC the packet leaves on;
    ///   `0.0.0.0` lets the OS pick
    pub fn new(group: SocketAddrV4, interface: Ipv4Addr) -> Result<Self, TransportError> {
        if !group.ip().is_multicast() {
            return Err(TransportError::InvalidAddress(format!(
                "{} is not a multicast group",
                group.ip()
            )));
        }

        Ok(Self {
            group,
            interface,
            ttl: DEFAULT_MULTICAST_TTL,
            loopback: DEFAULT_MULTICAST_LOOP,
        })
    }

    /// Hop limit for outgoing packets (default 1)
    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }

    /// Deliver to listeners on the sending host too (default on)
    pub fn with_loopback(mut self, loopback: bool) -> Self {
        self.loopback = loopback;
        self
    }

    pub fn group(&self) -> SocketAddrV4 {
        self.group
    }

    pub fn interface(&self) -> Ipv4Addr {
        self.interface
    }

    pub fn ttl(&self) -> u32 {
        self.ttl
    }

    pub fn loopback(&self) -> bool {
        self.loopback
    }

    /// Open an unconnected socket with egress interface, TTL and loopback set
    pub fn open_socket(&self) -> Result<UdpSocket, TransportError> {
        let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))
            .map_err(TransportError::Socket)?;

        socket
            .set_multicast_if_v4(&self.interface)
            .map_err(option_error("IP_MULTICAST_IF"))?;
        socket
            .set_multicast_ttl_v4(self.ttl)
            .map_err(option_error("IP_MULTICAST_TTL"))?;
        socket
            .set_multicast_loop_v4(self.loopback)
            .map_err(option_error("IP_MULTICAST_LOOP"))?;

        Ok(socket.into())
    }
}

impl Transport for MulticastTransport {
    fn send(&self, packet: &[u8]) -> Result<usize, TransportError> {
        let socket = self.open_socket()?;
        let sent = send_datagram(&socket, packet, SocketAddr::V4(self.group))?;
        tracing::debug!(
            "Multicast {} bytes to {} via {} (ttl {}, loopback {})",
            sent,
            self.group,
            self.interface,
            self.ttl,
            self.loopback
        );
        Ok(sent)
    }

    fn target(&self) -> TransportTarget {
        TransportTarget::Multicast {
            group: self.group,
            interface: self.interface,
            ttl: self.ttl,
            loopback: self.loopback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group() -> SocketAddrV4 {
        "224.0.2.22:30721".parse().unwrap()
    }

    #[test]
    fn test_defaults() {
        let transport = MulticastTransport::new(group(), Ipv4Addr::UNSPECIFIED).unwrap();
        assert_eq!(transport.ttl(), 1);
        assert!(transport.loopback());
        assert_eq!(transport.group(), group());
        assert_eq!(transport.interface(), Ipv4Addr::UNSPECIFIED);
    }

    #[test]
    fn test_socket_options_applied_before_send() {
        let transport = MulticastTransport::new(group(), Ipv4Addr::UNSPECIFIED).unwrap();
        let socket = transport.open_socket().unwrap();

        assert_eq!(socket.multicast_ttl_v4().unwrap(), 1);
        assert!(socket.multicast_loop_v4().unwrap());
    }

    #[test]
    fn test_custom_ttl_and_loopback() {
        let transport = MulticastTransport::new(group(), Ipv4Addr::UNSPECIFIED)
            .unwrap()
            .with_ttl(4)
            .with_loopback(false);
        let socket = transport.open_socket().unwrap();

        assert_eq!(socket.multicast_ttl_v4().unwrap(), 4);
        assert!(!socket.multicast_loop_v4().unwrap());
    }

    #[test]
    fn test_out_of_range_ttl_surfaces_os_error() {
        let transport = MulticastTransport::new(group(), Ipv4Addr::UNSPECIFIED)
            .unwrap()
            .with_ttl(1000);

        match transport.open_socket() {
            Err(TransportError::SocketOption { option, .. }) => {
                assert_eq!(option, "IP_MULTICAST_TTL")
            }
            other => panic!("expected TTL option failure, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_non_multicast_group() {
        let result = MulticastTransport::new(
            "172.16.144.111:30721".parse().unwrap(),
            Ipv4Addr::UNSPECIFIED,
        );
        assert!(matches!(result, Err(TransportError::InvalidAddress(_))));
    }

    #[test]
    fn test_target_description() {
        let interface: Ipv4Addr = "172.16.144.4".parse().unwrap();
        let transport = MulticastTransport::new(group(), interface)
            .unwrap()
            .with_ttl(2);
        assert_eq!(
            transport.target(),
            TransportTarget::Multicast {
                group: group(),
                interface,
                ttl: 2,
                loopback: true,
            }
        );
    }
}
