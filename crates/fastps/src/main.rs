//! FastPS - command-line setpoint control for FAST-PS power supplies
//!
//! Prompts for per-device current setpoints and delivers them over the Fast
//! Interface by broadcast, multicast or per-host unicast, or runs a
//! continuous multicast sweep.

#![warn(missing_docs)]

mod cli;
mod config;
mod logging_setup;
mod prompt;
mod session;
mod sweep;

use std::io;
use std::net::SocketAddrV4;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use fastps_control::{BroadcastTransport, Command, FastSender};
use tracing::info;

use crate::cli::{Cli, Mode};
use crate::config::FastConfig;
use crate::session::{Ending, Session};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = FastConfig::load(&cli.config)?;
    cli.apply(&mut config);

    let _log_guard = logging_setup::init(&config.log)?;
    info!("Using Fast Interface port {}", config.port);

    let sender = FastSender::new();
    let command = Command(config.command);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let session = match &cli.mode {
        Mode::Broadcast { .. } => Session::Broadcast {
            transport: BroadcastTransport::new(SocketAddrV4::new(
                config.broadcast.address,
                config.port,
            )),
            devices: config.devices.clone(),
        },
        Mode::Multicast(_) => Session::Multicast {
            transport: config.multicast.transport(config.port)?,
            devices: config.devices.clone(),
        },
        Mode::Unicast { .. } => Session::Unicast {
            devices: config.unicast.clone(),
            port: config.port,
        },
        Mode::Sweep { count, .. } => {
            if config.devices.is_empty() {
                bail!("no devices configured for the sweep");
            }
            let transport = config.multicast.transport(config.port)?;
            let sweep = config.sweep.build()?;
            let interval = Duration::from_millis(config.sweep.interval_ms);

            println!("Starting continuous FAST-PS setpoint control...\n");
            let steps = runtime.block_on(sweep::run(
                &sender,
                &transport,
                command,
                &config.devices,
                sweep,
                interval,
                *count,
            ))?;
            info!("Sweep finished after {} packets", steps);
            return Ok(());
        }
        Mode::WriteConfig => {
            config.save(&cli.config)?;
            println!("Wrote {}", cli.config.display());
            return Ok(());
        }
    };

    let interactive = move || {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        let mut output = io::stdout();
        session::run(&session, &sender, command, &mut input, &mut output)
    };

    let ending = runtime.block_on(session::until_interrupted(
        interactive,
        tokio::signal::ctrl_c(),
    ))?;
    if ending == Ending::Interrupted {
        println!("\nInterrupted by user.");
        // The blocking prompt thread is still waiting on stdin
        runtime.shutdown_background();
    }
    Ok(())
}
