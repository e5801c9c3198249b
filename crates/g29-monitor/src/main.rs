//! Console monitor for a Logitech G29.
//!
//! Opens the wheel, optionally resets it and applies force-feedback settings,
//! then prints the axes and first-pressed button once per cadence interval
//! until Ctrl-C or the requested duration ends.

#![deny(static_mut_refs)]

use std::io::Write;
use std::path::PathBuf;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use clap::Parser;
use g29_hid_common::hidapi_transport::{HidApiTransport, list_devices};
use racing_wheel_g29_device::{
    Button, G29Config, G29Wheel, PollLoop, PollOutcome, WheelSnapshot,
};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "g29-monitor",
    about = "Print live Logitech G29 axes and buttons, optionally driving force feedback"
)]
struct Cli {
    /// Vendor ID (hex with 0x prefix, or decimal). Overrides the config file.
    #[arg(long, value_name = "ID", value_parser = parse_id)]
    vid: Option<u16>,

    /// Product ID (hex with 0x prefix, or decimal). Overrides the config file.
    #[arg(long, value_name = "ID", value_parser = parse_id)]
    pid: Option<u16>,

    /// YAML or JSON device config
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// List HID interfaces under the vendor ID and exit
    #[arg(long)]
    list: bool,

    /// Stop after N seconds (default: run until Ctrl-C)
    #[arg(long, value_name = "N")]
    duration_secs: Option<u64>,

    /// Poll cadence in milliseconds
    #[arg(long, default_value_t = 100, value_name = "MS")]
    cadence_ms: u64,

    /// Reset the wheel before monitoring
    #[arg(long)]
    reset: bool,

    /// Autocenter spring, both values in [0, 1]
    #[arg(long, num_args = 2, value_names = ["STRENGTH", "RATE"], allow_negative_numbers = true)]
    autocenter: Option<Vec<f32>>,

    /// Constant force in [0, 1]
    #[arg(long, value_name = "V", allow_negative_numbers = true)]
    constant_force: Option<f32>,

    /// Print held buttons on each cycle
    #[arg(long)]
    held: bool,

    /// One JSON object per cycle instead of text
    #[arg(long)]
    json: bool,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Parse a VID/PID as `0x`-prefixed hex or plain decimal.
fn parse_id(raw: &str) -> Result<u16, String> {
    let raw = raw.trim();
    let parsed = match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => raw.parse::<u16>(),
    };
    parsed.map_err(|e| format!("invalid ID '{raw}' ({e}), expected hex (0x046D) or decimal"))
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("g29_monitor={level},racing_wheel_g29_device={level},g29_hid_common={level}")
                    .into()
            }),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn load_config(cli: &Cli) -> Result<G29Config> {
    let mut config = match &cli.config {
        Some(path) => G29Config::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => G29Config::default(),
    };
    if let Some(vid) = cli.vid {
        config.vendor_id = vid;
    }
    if let Some(pid) = cli.pid {
        config.product_id = pid;
    }
    config.validate()?;
    Ok(config)
}

#[derive(Serialize)]
struct MonitorLine<'a> {
    outcome: PollOutcome,
    #[serde(flatten)]
    snapshot: &'a WheelSnapshot,
}

fn render_text(snapshot: &WheelSnapshot, held: bool) -> String {
    let label = snapshot.first_pressed().map(Button::name).unwrap_or("");
    let mut text = format!("Current state: {}\n{label}", snapshot.state());
    if held {
        let names: Vec<&str> = snapshot.buttons().pressed().map(Button::name).collect();
        text.push_str("\nHeld: ");
        text.push_str(&names.join(" "));
    }
    text
}

fn render_json(snapshot: &WheelSnapshot, outcome: PollOutcome) -> serde_json::Result<String> {
    serde_json::to_string(&MonitorLine { outcome, snapshot })
}

fn run_list(vendor_id: u16, json: bool) -> Result<()> {
    let devices = list_devices(vendor_id).context("failed to enumerate HID devices")?;
    let mut out = std::io::stdout().lock();
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&devices)?)?;
        return Ok(());
    }
    if devices.is_empty() {
        writeln!(out, "No HID devices found for vendor 0x{vendor_id:04X}")?;
    }
    for device in &devices {
        writeln!(out, "{}  {}  {}", device.usb_id(), device.display_name(), device.path)?;
    }
    Ok(())
}

fn apply_effects(wheel: &G29Wheel<HidApiTransport>, cli: &Cli) -> Result<bool> {
    let autocenter = match cli.autocenter.as_deref() {
        Some(&[strength, rate]) => Some((strength, rate)),
        Some(other) => bail!("--autocenter takes 2 values, got {}", other.len()),
        None => None,
    };
    if autocenter.is_none() && cli.constant_force.is_none() {
        return Ok(false);
    }

    wheel.wait_for_settle();
    if let Some((strength, rate)) = autocenter {
        wheel
            .autocenter(strength, rate)
            .context("failed to set autocenter")?;
    }
    if let Some(value) = cli.constant_force {
        wheel
            .constant_force(value)
            .context("failed to set constant force")?;
    }
    Ok(true)
}

fn run_monitor(cli: &Cli, config: G29Config) -> Result<()> {
    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop_clone = Arc::clone(&stop);
        ctrlc::set_handler(move || {
            stop_clone.store(true, Ordering::Release);
        })
        .context("failed to install Ctrl-C handler")?;
    }

    let transport = HidApiTransport::open(config.vendor_id, config.product_id)
        .with_context(|| {
            format!(
                "failed to open G29 {:04x}:{:04x}",
                config.vendor_id, config.product_id
            )
        })?;
    let wheel = G29Wheel::new(transport, config);

    wheel.connect().context("failed to connect")?;
    if cli.reset {
        wheel.reset().context("failed to reset wheel")?;
    }
    eprintln!("G29 connected successfully.");
    let effects_applied = apply_effects(&wheel, cli)?;

    eprintln!("Starting main loop. Press Ctrl+C to exit.");
    let deadline = cli
        .duration_secs
        .and_then(|secs| Instant::now().checked_add(Duration::from_secs(secs)));
    let mut out = std::io::stdout().lock();
    let result = PollLoop::new(&wheel, Duration::from_millis(cli.cadence_ms)).run_until(
        &stop,
        deadline,
        |snapshot, outcome| {
            let line = if cli.json {
                render_json(snapshot, outcome).map_err(std::io::Error::from)
            } else {
                Ok(render_text(snapshot, cli.held))
            };
            if let Err(e) = line.and_then(|line| writeln!(out, "{line}")) {
                warn!(error = %e, "Failed to write monitor line");
            }
        },
    );

    if effects_applied && let Err(e) = wheel.force_off() {
        warn!(error = %e, "Failed to stop forces on exit");
    }
    if let Err(e) = wheel.close() {
        warn!(error = %e, "Failed to close device");
    }

    let stats = result.context("polling stopped")?;
    info!(
        cycles = stats.cycles,
        updates = stats.updates,
        timeouts = stats.timeouts,
        rejected = stats.rejected,
        "Monitor finished"
    );
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(&cli)?;
    if cli.list {
        return run_list(config.vendor_id, cli.json);
    }
    run_monitor(&cli, config)
}
