//! Per-device unicast delivery

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};

use serde::{Deserialize, Serialize};

use super::{send_datagram, Transport, TransportTarget};
use crate::error::TransportError;
use crate::protocol::DeviceEntry;

/// Sends each packet straight to one host, no socket options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnicastTransport {
    destination: SocketAddr,
}

impl UnicastTransport {
    pub fn new(destination: SocketAddr) -> Result<Self, TransportError> {
        if destination.ip().is_unspecified() {
            return Err(TransportError::InvalidAddress(format!(
                "{} is not a host address",
                destination
            )));
        }
        Ok(Self { destination })
    }

    pub fn open_socket(&self) -> Result<UdpSocket, TransportError> {
        let local = match self.destination {
            SocketAddr::V4(_) => SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
            SocketAddr::V6(_) => SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0),
        };
        UdpSocket::bind(local).map_err(TransportError::Socket)
    }
}

impl Transport for UnicastTransport {
    fn send(&self, packet: &[u8]) -> Result<usize, TransportError> {
        let socket = self.open_socket()?;
        let sent = send_datagram(&socket, packet, self.destination)?;
        tracing::debug!("Unicast {} bytes to {}", sent, self.destination);
        Ok(sent)
    }

    fn target(&self) -> TransportTarget {
        TransportTarget::Unicast {
            destination: self.destination,
        }
    }
}

/// A device reachable at a specific host
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub destination: IpAddr,
    pub entry: DeviceEntry,
}

impl Route {
    pub fn new(destination: IpAddr, entry: DeviceEntry) -> Self {
        Self { destination, entry }
    }
}

/// Group routed entries into one batch per destination host.
///
/// Hosts appear in the order they are first seen; entries keep their
/// relative order within a host.
pub fn group_by_destination(routes: &[Route]) -> Vec<(IpAddr, Vec<DeviceEntry>)> {
    let mut groups: Vec<(IpAddr, Vec<DeviceEntry>)> = Vec::new();

    for route in routes {
        match groups.iter_mut().find(|(ip, _)| *ip == route.destination) {
            Some((_, entries)) => entries.push(route.entry),
            None => groups.push((route.destination, vec![route.entry])),
        }
    }

    groups
}
