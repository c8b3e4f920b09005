//! Tool configuration
//!
//! Settings are read from a TOML file. Every field is optional; anything not
//! given falls back to the FAST-PS defaults below.

use std::fs;
use std::net::{IpAddr, Ipv4Addr, SocketAddrV4};
use std::path::Path;

use anyhow::{bail, Context, Result};
use fastps_control::{DeviceEntry, MulticastTransport, Route, DEFAULT_PORT};
use serde::{Deserialize, Serialize};

use crate::sweep::Sweep;

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FastConfig {
    /// Fast Interface UDP port
    pub port: u16,
    /// Command code written into every packet
    pub command: u16,
    /// Fast addresses targeted by broadcast, multicast and sweep
    pub devices: Vec<u16>,
    pub broadcast: BroadcastConfig,
    pub multicast: MulticastConfig,
    /// Per-host devices for unicast mode
    pub unicast: Vec<UnicastDevice>,
    pub sweep: SweepConfig,
    pub log: LogConfig,
}

impl Default for FastConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            command: 0x0000,
            devices: vec![1001, 1002],
            broadcast: BroadcastConfig::default(),
            multicast: MulticastConfig::default(),
            unicast: Vec::new(),
            sweep: SweepConfig::default(),
            log: LogConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BroadcastConfig {
    /// Broadcast address, e.g. the subnet's all-ones address
    pub address: Ipv4Addr,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            address: Ipv4Addr::BROADCAST,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MulticastConfig {
    pub group: Ipv4Addr,
    /// Local NIC address the packets leave on
    pub interface: Ipv4Addr,
    pub ttl: u32,
    pub loopback: bool,
}

impl Default for MulticastConfig {
    fn default() -> Self {
        Self {
            group: Ipv4Addr::new(224, 0, 2, 22),
            interface: Ipv4Addr::UNSPECIFIED,
            ttl: 1,
            loopback: true,
        }
    }
}

impl MulticastConfig {
    pub fn transport(&self, port: u16) -> Result<MulticastTransport> {
        let group = SocketAddrV4::new(self.group, port);
        let transport = MulticastTransport::new(group, self.interface)?
            .with_ttl(self.ttl)
            .with_loopback(self.loopback);
        Ok(transport)
    }
}

/// One power supply reached by unicast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnicastDevice {
    pub ip: IpAddr,
    pub address: u16,
}

impl UnicastDevice {
    pub fn route(&self, setpoint: f32) -> Route {
        Route::new(self.ip, DeviceEntry::new(self.address, setpoint))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Lower bound in amperes
    pub min: f32,
    /// Upper bound in amperes
    pub max: f32,
    pub step: f32,
    pub interval_ms: u64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            min: -5.0,
            max: 5.0,
            step: 1.0,
            interval_ms: 500,
        }
    }
}

/// Largest sweep bound or step accepted, in amperes
pub const MAX_SWEEP_MAGNITUDE: f32 = 1.0e6;

impl SweepConfig {
    pub fn build(&self) -> Result<Sweep> {
        for (name, value) in [("min", self.min), ("max", self.max), ("step", self.step)] {
            if !value.is_finite() || value.abs() > MAX_SWEEP_MAGNITUDE {
                bail!(
                    "sweep {} must be a finite value within +/-{}, got {}",
                    name,
                    MAX_SWEEP_MAGNITUDE,
                    value
                );
            }
        }
        if !(self.min < self.max) {
            bail!("sweep min {} must be below max {}", self.min, self.max);
        }
        if !(self.step > 0.0) {
            bail!("sweep step must be positive, got {}", self.step);
        }
        if self.interval_ms == 0 {
            bail!("sweep interval must be at least 1 ms");
        }
        Ok(Sweep::new(self.min, self.max, self.step))
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// trace, debug, info, warn or error
    pub level: String,
    pub console_output: bool,
    pub file_output: bool,
    /// Log file used when `file_output` is set
    pub file: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            console_output: true,
            file_output: false,
            file: "fastps.log".to_string(),
        }
    }
}

impl LogConfig {
    /// Configured level, INFO if unparseable
    pub fn parse_level(&self) -> tracing::Level {
        self.level.parse().unwrap_or(tracing::Level::INFO)
    }
}

impl FastConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid configuration")
    }

    /// Load configuration from `path`, or defaults if the file does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_toml_str(&content).with_context(|| format!("In config file {:?}", path))
    }

    /// Write configuration to `path`
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content).with_context(|| format!("Failed to write {:?}", path))?;
        Ok(())
    }
}
