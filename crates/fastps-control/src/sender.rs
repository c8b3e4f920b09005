//! Encode-and-send front end
//!
//! [`FastSender`] keeps the wire format in one place: whatever transport is
//! chosen, packets come from the same [`PacketEncoder`].

use std::net::SocketAddr;

use crate::protocol::{ClockNonce, Command, DeviceEntry, NonceSource, PacketEncoder};
use crate::transport::{group_by_destination, Route, Transport, UnicastTransport};
use crate::Result;

/// Outcome of one packet in a multi-destination send
#[derive(Debug)]
pub struct DeliveryReport {
    pub destination: SocketAddr,
    pub entries: Vec<DeviceEntry>,
    /// Bytes sent, or why the packet was not sent
    pub outcome: Result<usize>,
}

impl DeliveryReport {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Encodes setpoints and hands them to a transport
#[derive(Debug, Default)]
pub struct FastSender<N = ClockNonce> {
    encoder: PacketEncoder<N>,
}

impl FastSender<ClockNonce> {
    pub fn new() -> Self {
        Self::with_encoder(PacketEncoder::new())
    }
}

impl<N: NonceSource> FastSender<N> {
    pub fn with_encoder(encoder: PacketEncoder<N>) -> Self {
        Self { encoder }
    }

    pub fn encoder(&self) -> &PacketEncoder<N> {
        &self.encoder
    }

    /// Encode `entries` into one packet and send it
    pub fn send<T: Transport + ?Sized>(
        &self,
        transport: &T,
        command: Command,
        entries: &[DeviceEntry],
    ) -> Result<usize> {
        let packet = self.encoder.encode(command, entries)?;
        let sent = transport.send(&packet)?;

        tracing::info!(
            "Sent {} setpoint(s) via {} to {}",
            entries.len(),
            transport.target().mode(),
            transport.destination()
        );

        Ok(sent)
    }

    /// Send one independently encoded packet per batch.
    ///
    /// Every batch is attempted; a failure is recorded in its report and the
    /// remaining batches still go out.
    pub fn send_batches<T, I>(&self, batches: I, command: Command) -> Vec<DeliveryReport>
    where
        T: Transport,
        I: IntoIterator<Item = (T, Vec<DeviceEntry>)>,
    {
        batches
            .into_iter()
            .map(|(transport, entries)| {
                let destination = transport.destination();
                self.deliver(Ok(transport), destination, entries, command)
            })
            .collect()
    }

    /// Group routes by host and send one unicast packet per host
    pub fn send_unicast(
        &self,
        routes: &[Route],
        port: u16,
        command: Command,
    ) -> Vec<DeliveryReport> {
        group_by_destination(routes)
            .into_iter()
            .map(|(ip, entries)| {
                let destination = SocketAddr::new(ip, port);
                let transport = UnicastTransport::new(destination).map_err(Into::into);
                self.deliver(transport, destination, entries, command)
            })
            .collect()
    }

    fn deliver<T: Transport>(
        &self,
        transport: Result<T>,
        destination: SocketAddr,
        entries: Vec<DeviceEntry>,
        command: Command,
    ) -> DeliveryReport {
        let outcome = transport.and_then(|t| self.send(&t, command, &entries));
        if let Err(e) = &outcome {
            tracing::warn!("Delivery to {} failed: {}", destination, e);
        }
        DeliveryReport {
            destination,
            entries,
            outcome,
        }
    }
}
