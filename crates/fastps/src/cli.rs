//! Command-line arguments

use std::net::Ipv4Addr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{FastConfig, MulticastConfig, UnicastDevice};

/// Send current setpoints to FAST-PS power supplies over the Fast Interface
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "fastps.toml")]
    pub config: PathBuf,

    /// Fast Interface UDP port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Command code, decimal or 0x-prefixed hex
    #[arg(long, value_parser = parse_command)]
    pub command: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub mode: Mode,
}

#[derive(Subcommand, Debug)]
pub enum Mode {
    /// Prompt for setpoints and broadcast them to the subnet
    Broadcast {
        /// Broadcast address
        #[arg(long)]
        address: Option<Ipv4Addr>,

        /// Fast address of a device (repeatable)
        #[arg(short, long = "device")]
        devices: Vec<u16>,
    },

    /// Prompt for setpoints and send them to a multicast group
    Multicast(MulticastArgs),

    /// Prompt for setpoints and send one packet per device host
    Unicast {
        /// Device route as IP=FAST_ADDRESS (repeatable)
        #[arg(short, long = "route", value_parser = parse_route)]
        routes: Vec<UnicastDevice>,
    },

    /// Sweep all devices through a triangle wave over multicast
    Sweep {
        #[command(flatten)]
        multicast: MulticastArgs,

        /// Lower bound in amperes
        #[arg(long, allow_negative_numbers = true)]
        min: Option<f32>,

        /// Upper bound in amperes
        #[arg(long, allow_negative_numbers = true)]
        max: Option<f32>,

        /// Step in amperes
        #[arg(long)]
        step: Option<f32>,

        /// Milliseconds between packets
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Stop after this many packets
        #[arg(long)]
        count: Option<u64>,
    },

    /// Write the effective settings to the configuration file
    WriteConfig,
}

#[derive(Args, Debug, Default)]
pub struct MulticastArgs {
    /// Multicast group address
    #[arg(long)]
    pub group: Option<Ipv4Addr>,

    /// Local interface address to send from
    #[arg(long)]
    pub interface: Option<Ipv4Addr>,

    /// Multicast TTL
    #[arg(long)]
    pub ttl: Option<u32>,

    /// Do not loop packets back to this host
    #[arg(long)]
    pub no_loopback: bool,

    /// Fast address of a device (repeatable)
    #[arg(short, long = "device")]
    pub devices: Vec<u16>,
}

impl MulticastArgs {
    fn apply(&self, multicast: &mut MulticastConfig, devices: &mut Vec<u16>) {
        if let Some(group) = self.group {
            multicast.group = group;
        }
        if let Some(interface) = self.interface {
            multicast.interface = interface;
        }
        if let Some(ttl) = self.ttl {
            multicast.ttl = ttl;
        }
        if self.no_loopback {
            multicast.loopback = false;
        }
        if !self.devices.is_empty() {
            *devices = self.devices.clone();
        }
    }
}

impl Cli {
    /// Override file settings with what was given on the command line
    pub fn apply(&self, config: &mut FastConfig) {
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(command) = self.command {
            config.command = command;
        }
        if let Some(level) = &self.log_level {
            config.log.level = level.clone();
        }

        match &self.mode {
            Mode::Broadcast { address, devices } => {
                if let Some(address) = address {
                    config.broadcast.address = *address;
                }
                if !devices.is_empty() {
                    config.devices = devices.clone();
                }
            }
            Mode::Multicast(args) => args.apply(&mut config.multicast, &mut config.devices),
            Mode::Unicast { routes } => {
                if !routes.is_empty() {
                    config.unicast = routes.clone();
                }
            }
            Mode::Sweep {
                multicast,
                min,
                max,
                step,
                interval_ms,
                ..
            } => {
                multicast.apply(&mut config.multicast, &mut config.devices);
                if let Some(min) = min {
                    config.sweep.min = *min;
                }
                if let Some(max) = max {
                    config.sweep.max = *max;
                }
                if let Some(step) = step {
                    config.sweep.step = *step;
                }
                if let Some(interval_ms) = interval_ms {
                    config.sweep.interval_ms = *interval_ms;
                }
            }
            Mode::WriteConfig => {}
        }
    }
}

fn parse_command(s: &str) -> Result<u16, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse::<u16>(),
    };
    parsed.map_err(|e| format!("invalid command code {}: {}", s, e))
}

fn parse_route(s: &str) -> Result<UnicastDevice, String> {
    let (ip, address) = s
        .split_once('=')
        .ok_or_else(|| format!("expected IP=FAST_ADDRESS, got {}", s))?;
    Ok(UnicastDevice {
        ip: ip
            .trim()
            .parse()
            .map_err(|e| format!("invalid IP {}: {}", ip, e))?,
        address: address
            .trim()
            .parse()
            .map_err(|e| format!("invalid fast address {}: {}", address, e))?,
    })
}
