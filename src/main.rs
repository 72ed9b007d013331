//! Greenhouse controller — main entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  stdin ── console::parse_command ──▶ CommandIntake           │
//! │                                          │                   │
//! │  SerialTransport ◀──▶ LinkWorker (thread) ◀── ThreadTimer    │
//! │                           │                                  │
//! │                      Broadcaster ──▶ LogSubscriber (thread)  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The process exits when the link fails; there is no reconnect.

use std::io::BufRead;
use std::thread;

use anyhow::{Context, Result};
use log::{error, info, warn};
use tracing_subscriber::EnvFilter;

use greenhouse::adapters::console::parse_command;
use greenhouse::adapters::log_sink::LogSubscriber;
use greenhouse::adapters::serial::SerialTransport;
use greenhouse::app::ports::EventSink;
use greenhouse::config::ControllerConfig;
use greenhouse::link;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ControllerConfig::from_env();
    config.validate().context("invalid configuration")?;
    info!(
        "greenhouse controller starting: {} @ {} baud, {:?} framing, threshold {}, pump limit {:?}",
        config.device_path,
        config.baud_rate,
        config.framing,
        config.humidity_threshold,
        config.pump_runtime_limit()
    );

    let transport = SerialTransport::open(&config).context("opening device link")?;
    let controller = link::spawn(&config, transport).context("spawning link worker")?;

    // ── Log subscriber ────────────────────────────────────────
    let subscription = controller.broadcaster.subscribe();
    thread::Builder::new()
        .name("log-subscriber".into())
        .spawn(move || {
            let mut sink = LogSubscriber::new();
            loop {
                sink.emit(&subscription.recv());
            }
        })
        .context("spawning log subscriber")?;

    // ── Console commands ──────────────────────────────────────
    let intake = controller.intake.clone();
    let status = controller.status.clone();
    thread::Builder::new()
        .name("console".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if line.eq_ignore_ascii_case("status") {
                    match serde_json::to_string(&status.snapshot()) {
                        Ok(json) => info!("STATUS | {}", json),
                        Err(e) => warn!("status encoding failed: {}", e),
                    }
                    continue;
                }
                match parse_command(line) {
                    Ok(cmd) => intake.submit(cmd),
                    Err(reason) => warn!("ignoring '{}': {}", line, reason),
                }
            }
        })
        .context("spawning console reader")?;

    match controller.worker.join() {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => {
            error!("device link lost: {}", e);
            Err(e).context("link worker stopped")
        }
        Err(_) => anyhow::bail!("link worker panicked"),
    }
}
