//! Interactive prompt-and-send loops

use std::future::Future;
use std::io::{self, BufRead, Write};

use anyhow::{bail, Context, Result};
use fastps_control::{
    BroadcastTransport, Command, DeviceEntry, FastSender, MulticastTransport, NonceSource,
    Transport,
};
use tracing::error;

use crate::config::UnicastDevice;
use crate::prompt::{prompt_entries, prompt_routes};

/// How the setpoints of one round leave the host
pub enum Session {
    Broadcast {
        transport: BroadcastTransport,
        devices: Vec<u16>,
    },
    Multicast {
        transport: MulticastTransport,
        devices: Vec<u16>,
    },
    Unicast {
        devices: Vec<UnicastDevice>,
        port: u16,
    },
}

impl Session {
    fn banner(&self) -> &'static str {
        match self {
            Self::Broadcast { .. } => "Broadcast FAST-PS Control",
            Self::Multicast { .. } => "Multicast FAST-PS Control",
            Self::Unicast { .. } => "FAST-PS Unicast Control to Multiple IPs",
        }
    }

    fn check(&self) -> Result<()> {
        let empty = match self {
            Self::Broadcast { devices, .. } | Self::Multicast { devices, .. } => devices.is_empty(),
            Self::Unicast { devices, .. } => devices.is_empty(),
        };
        if empty {
            bail!("no devices configured");
        }
        Ok(())
    }
}

/// Prompt for every device, send, repeat until the user quits
pub fn run<R, W, N>(
    session: &Session,
    sender: &FastSender<N>,
    command: Command,
    input: &mut R,
    output: &mut W,
) -> Result<()>
where
    R: BufRead,
    W: Write,
    N: NonceSource,
{
    session.check()?;
    writeln!(output, "{} - type 'q' to quit.\n", session.banner())?;

    loop {
        let done = match session {
            Session::Broadcast { transport, devices } => {
                round(sender, transport, command, devices, input, output, "Broadcast sent")?
            }
            Session::Multicast { transport, devices } => {
                round(sender, transport, command, devices, input, output, "Multicast sent")?
            }
            Session::Unicast { devices, port } => {
                match prompt_routes(input, output, devices)? {
                    Some(routes) => {
                        for report in sender.send_unicast(&routes, *port, command) {
                            match &report.outcome {
                                Ok(_) => writeln!(
                                    output,
                                    "Sent to {}: {}",
                                    report.destination.ip(),
                                    describe(&report.entries)
                                )?,
                                Err(e) => writeln!(
                                    output,
                                    "Failed to send to {}: {}",
                                    report.destination.ip(),
                                    e
                                )?,
                            }
                        }
                        writeln!(output)?;
                        false
                    }
                    None => true,
                }
            }
        };

        if done {
            writeln!(output, "Exiting.")?;
            return Ok(());
        }
    }
}

/// How an interactive session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ending {
    /// The user quit at the prompt or input ran out
    Finished,
    /// The interrupt fired while the session was still running
    Interrupted,
}

/// Run a blocking session until it returns or `interrupt` fires.
///
/// The session runs on tokio's blocking pool so a pending terminal read does
/// not hold up the interrupt. An interrupted session is abandoned; the caller
/// must shut the runtime down without waiting for it.
pub async fn until_interrupted<F, I>(session: F, interrupt: I) -> Result<Ending>
where
    F: FnOnce() -> Result<()> + Send + 'static,
    I: Future<Output = io::Result<()>>,
{
    let task = tokio::task::spawn_blocking(session);

    tokio::select! {
        joined = task => {
            joined.context("Interactive session panicked")??;
            Ok(Ending::Finished)
        }
        signal = interrupt => {
            signal.context("Failed to listen for Ctrl-C")?;
            Ok(Ending::Interrupted)
        }
    }
}

/// One prompt-and-send round for a single-destination transport.
/// Returns true when the user quit.
fn round<T, N, R, W>(
    sender: &FastSender<N>,
    transport: &T,
    command: Command,
    devices: &[u16],
    input: &mut R,
    output: &mut W,
    verb: &str,
) -> Result<bool>
where
    T: Transport,
    N: NonceSource,
    R: BufRead,
    W: Write,
{
    let Some(entries) = prompt_entries(input, output, devices)? else {
        return Ok(true);
    };

    match sender.send(transport, command, &entries) {
        Ok(_) => writeln!(output, "{} to devices: {}\n", verb, describe(&entries))?,
        Err(e) => {
            error!("Send to {} failed: {}", transport.destination(), e);
            writeln!(output, "Send failed: {}\n", e)?;
        }
    }
    Ok(false)
}

fn describe(entries: &[DeviceEntry]) -> String {
    let parts: Vec<String> = entries.iter().map(ToString::to_string).collect();
    format!("[{}]", parts.join(", "))
}
