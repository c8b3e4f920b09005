//! Interactive setpoint entry

use std::io::{self, BufRead, Write};

use fastps_control::{DeviceEntry, Route};

use crate::config::UnicastDevice;

/// Parse a user-entered setpoint in amperes
pub fn parse_setpoint(input: &str) -> Option<f32> {
    input.trim().parse::<f32>().ok().filter(|v| v.is_finite())
}

/// Ask for one setpoint until a number or `q` is entered.
///
/// Returns `None` on `q` or end of input.
pub fn read_setpoint<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    label: &str,
) -> io::Result<Option<f32>> {
    loop {
        write!(output, "Setpoint for {} (A): ", label)?;
        output.flush()?;

        // Undecodable bytes become U+FFFD and fall through to the invalid input path
        let mut raw = Vec::new();
        if input.read_until(b'\n', &mut raw)? == 0 {
            return Ok(None);
        }

        let line = String::from_utf8_lossy(&raw);
        let line = line.trim();
        if line.eq_ignore_ascii_case("q") {
            return Ok(None);
        }

        match parse_setpoint(line) {
            Some(value) => return Ok(Some(value)),
            None => writeln!(output, "Invalid input. Enter a number or 'q' to quit.")?,
        }
    }
}

/// Collect one setpoint per fast address
pub fn prompt_entries<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    devices: &[u16],
) -> io::Result<Option<Vec<DeviceEntry>>> {
    let mut entries = Vec::with_capacity(devices.len());
    for &address in devices {
        match read_setpoint(input, output, &format!("device {}", address))? {
            Some(setpoint) => entries.push(DeviceEntry::new(address, setpoint)),
            None => return Ok(None),
        }
    }
    Ok(Some(entries))
}

/// Collect one setpoint per unicast device
pub fn prompt_routes<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    devices: &[UnicastDevice],
) -> io::Result<Option<Vec<Route>>> {
    let mut routes = Vec::with_capacity(devices.len());
    for device in devices {
        let label = format!("device {} at {}", device.address, device.ip);
        match read_setpoint(input, output, &label)? {
            Some(setpoint) => routes.push(device.route(setpoint)),
            None => return Ok(None),
        }
    }
    Ok(Some(routes))
}
