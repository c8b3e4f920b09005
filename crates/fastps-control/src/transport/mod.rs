//! UDP delivery of encoded packets
//!
//! Three delivery modes share the [`Transport`] contract:
//!
//! - **Broadcast**: one datagram to the subnet broadcast address
//!   (e.g. `255.255.255.255:30721`), `SO_BROADCAST` enabled
//! - **Multicast**: one datagram to a group (e.g. `224.0.2.22:30721`) leaving
//!   through a chosen local interface, TTL 1 and loopback on by default
//! - **Unicast**: one datagram per destination IP, entries grouped by IP
//!
//! Every send opens a fresh socket, configures it, writes once and drops it.
//! Nothing is retried and nothing waits for a reply.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use fastps_control::transport::{BroadcastTransport, Transport};
//! use fastps_control::protocol::{Command, DeviceEntry, PacketEncoder};
//!
//! # fn main() -> fastps_control::Result<()> {
//! let transport = BroadcastTransport::parse("192.168.0.255:30721")?;
//! let packet = PacketEncoder::new().encode(Command::SETPOINT, &[DeviceEntry::new(1001, 2.5)])?;
//! transport.send(&packet)?;
//! # Ok(())
//! # }
//! ```

pub mod broadcast;
pub mod multicast;
pub mod unicast;

pub use broadcast::BroadcastTransport;
pub use multicast::MulticastTransport;
pub use unicast::{group_by_destination, Route, UnicastTransport};

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};

use serde::{Deserialize, Serialize};

use crate::error::TransportError;

/// Default multicast hop limit: stay on the local subnet
pub const DEFAULT_MULTICAST_TTL: u32 = 1;

/// Default multicast loopback: the sending host sees its own packets
pub const DEFAULT_MULTICAST_LOOP: bool = true;

/// A configured way of putting a datagram on the wire
pub trait Transport {
    /// Send one datagram, returning the number of bytes handed to the OS
    fn send(&self, packet: &[u8]) -> Result<usize, TransportError>;

    /// Where this transport delivers to
    fn target(&self) -> TransportTarget;

    fn destination(&self) -> SocketAddr {
        self.target().destination()
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&self, packet: &[u8]) -> Result<usize, TransportError> {
        (**self).send(packet)
    }

    fn target(&self) -> TransportTarget {
        (**self).target()
    }
}

/// Delivery mode and addressing for one transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum TransportTarget {
    Broadcast {
        destination: SocketAddrV4,
    },
    Multicast {
        group: SocketAddrV4,
        interface: Ipv4Addr,
        #[serde(default = "default_ttl")]
        ttl: u32,
        #[serde(default = "default_loopback")]
        loopback: bool,
    },
    Unicast {
        destination: SocketAddr,
    },
}

fn default_ttl() -> u32 {
    DEFAULT_MULTICAST_TTL
}

fn default_loopback() -> bool {
    DEFAULT_MULTICAST_LOOP
}

impl TransportTarget {
    pub fn destination(&self) -> SocketAddr {
        match self {
            Self::Broadcast { destination } => SocketAddr::V4(*destination),
            Self::Multicast { group, .. } => SocketAddr::V4(*group),
            Self::Unicast { destination } => *destination,
        }
    }

    /// Short mode name for logs
    pub fn mode(&self) -> &'static str {
        match self {
            Self::Broadcast { .. } => "broadcast",
            Self::Multicast { .. } => "multicast",
            Self::Unicast { .. } => "unicast",
        }
    }

    /// Build the transport for this target
    pub fn into_transport(self) -> Result<Box<dyn Transport>, TransportError> {
        let transport: Box<dyn Transport> = match self {
            Self::Broadcast { destination } => Box::new(BroadcastTransport::new(destination)),
            Self::Multicast {
                group,
                interface,
                ttl,
                loopback,
            } => Box::new(
                MulticastTransport::new(group, interface)?
                    .with_ttl(ttl)
                    .with_loopback(loopback),
            ),
            Self::Unicast { destination } => Box::new(UnicastTransport::new(destination)?),
        };
        Ok(transport)
    }
}

/// Write one datagram on an already configured socket
pub(crate) fn send_datagram(
    socket: &UdpSocket,
    packet: &[u8],
    destination: SocketAddr,
) -> Result<usize, TransportError> {
    let sent = socket
        .send_to(packet, destination)
        .map_err(|source| TransportError::Send {
            destination,
            source,
        })?;

    tracing::trace!("Sent {} byte datagram to {}", sent, destination);

    Ok(sent)
}

pub(crate) fn option_error(option: &'static str) -> impl FnOnce(std::io::Error) -> TransportError {
    move |source| TransportError::SocketOption { option, source }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_destination_and_mode() {
        let broadcast = TransportTarget::Broadcast {
            destination: "255.255.255.255:30721".parse().unwrap(),
        };
        assert_eq!(broadcast.mode(), "broadcast");
        assert_eq!(
            broadcast.destination(),
            "255.255.255.255:30721".parse::<SocketAddr>().unwrap()
        );

        let multicast = TransportTarget::Multicast {
            group: "224.0.2.22:30721".parse().unwrap(),
            interface: Ipv4Addr::UNSPECIFIED,
            ttl: 1,
            loopback: true,
        };
        assert_eq!(multicast.mode(), "multicast");
        assert_eq!(multicast.destination().port(), 30721);
    }

    #[test]
    fn test_target_deserialize_defaults() {
        let target: TransportTarget = serde_json::from_str(
            r#"{"mode":"multicast","group":"224.0.2.22:30721","interface":"172.16.144.4"}"#,
        )
        .unwrap();

        assert_eq!(
            target,
            TransportTarget::Multicast {
                group: "224.0.2.22:30721".parse().unwrap(),
                interface: "172.16.144.4".parse().unwrap(),
                ttl: 1,
                loopback: true,
            }
        );
    }

    #[test]
    fn test_into_transport_round_trips_target() {
        let target = TransportTarget::Unicast {
            destination: "172.16.144.111:30721".parse().unwrap(),
        };
        let transport = target.clone().into_transport().unwrap();
        assert_eq!(transport.target(), target);
        assert_eq!(transport.destination(), target.destination());
    }

    #[test]
    fn test_into_transport_rejects_unicast_group() {
        let target = TransportTarget::Multicast {
            group: "192.168.0.10:30721".parse().unwrap(),
            interface: Ipv4Addr::UNSPECIFIED,
            ttl: 1,
            loopback: true,
        };
        assert!(matches!(
            target.into_transport(),
            Err(TransportError::InvalidAddress(_))
        ));
    }
}
