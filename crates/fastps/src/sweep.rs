//! Continuous triangle-wave setpoint sweep

use std::time::Duration;

use anyhow::Result;
use fastps_control::{Command, DeviceEntry, FastSender, NonceSource, Transport};
use tracing::{info, warn};

/// Triangle wave between `min` and `max`, starting at zero
#[derive(Debug, Clone, PartialEq)]
pub struct Sweep {
    min: f32,
    max: f32,
    step: f32,
    value: f32,
    direction: f32,
}

impl Sweep {
    pub fn new(min: f32, max: f32, step: f32) -> Self {
        Self {
            min,
            max,
            step,
            value: 0.0_f32.clamp(min, max),
            direction: 1.0,
        }
    }
}

impl Iterator for Sweep {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        let current = round4(self.value);

        if self.direction > 0.0 && self.value >= self.max {
            self.direction = -1.0;
        } else if self.direction < 0.0 && self.value <= self.min {
            self.direction = 1.0;
        }

        // Clamp absorbs floating-point overshoot at the bounds
        self.value = (self.value + self.direction * self.step).clamp(self.min, self.max);

        Some(current)
    }
}

/// Round to 4 decimals, leaving values too large to scale untouched
fn round4(value: f32) -> f32 {
    let rounded = ((f64::from(value) * 10_000.0).round() / 10_000.0) as f32;
    if rounded.is_finite() {
        rounded
    } else {
        value
    }
}

/// Send one sweep step every `interval` until Ctrl-C or `limit` packets
///
/// Returns the number of steps taken. A failed send is logged and the sweep
/// carries on with the next step.
pub async fn run<T, N>(
    sender: &FastSender<N>,
    transport: &T,
    command: Command,
    devices: &[u16],
    sweep: Sweep,
    interval: Duration,
    limit: Option<u64>,
) -> Result<u64>
where
    T: Transport + ?Sized,
    N: NonceSource,
{
    let mut ticker = tokio::time::interval(interval);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    info!(
        "Starting sweep to {} every {:?}",
        transport.destination(),
        interval
    );

    let mut steps = 0;
    for setpoint in sweep {
        if limit.is_some_and(|limit| steps >= limit) {
            break;
        }

        tokio::select! {
            _ = ticker.tick() => {}
            _ = &mut ctrl_c => {
                println!("\nStopped by user.");
                break;
            }
        }

        let entries: Vec<DeviceEntry> = devices
            .iter()
            .map(|&address| DeviceEntry::new(address, setpoint))
            .collect();

        match sender.send(transport, command, &entries) {
            Ok(_) => println!(
                "Sent setpoint {:.2} A to devices: {:?}",
                setpoint, devices
            ),
            Err(e) => warn!("Sweep step {:.2} A not sent: {}", setpoint, e),
        }
        steps += 1;
    }

    Ok(steps)
}
