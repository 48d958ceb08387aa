//! loco — active packet-train bandwidth capacity estimator.
//!
//! Parses CLI arguments, validates them into an [`EngineConfig`], and
//! dispatches to either a live measurement [`Session`] against a remote
//! daemon or an offline replay of a prior CSV capture. Mirrors
//! `original_source/loco.c`'s `main()` shape (parse -> connect -> run the
//! FSM -> print the result) without its shared mutable `struct config_s`.

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use loco::cli::Args;
use loco::config::{EngineConfig, Mode};
use loco::format::{FormatContext, Formatter};
use loco::progress::ProgressSlot;
use loco::session::Session;
use loco::{csv_store, decision};

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = EngineConfig::try_from(&args).context("invalid configuration")?;
    loco::logging::init(config.verbose);

    let line = match &config.mode {
        Mode::Online { .. } => run_online(&config)?,
        Mode::Offline { .. } => run_offline(&config)?,
    };

    println!("{line}");
    Ok(())
}

fn run_online(config: &EngineConfig) -> anyhow::Result<String> {
    let Mode::Online {
        host,
        port,
        interface,
    } = &config.mode
    else {
        unreachable!("run_online called with a non-Online mode")
    };

    let progress = ProgressSlot::new();
    if let Err(e) = progress.spawn_watchdog() {
        warn!("progress watchdog unavailable, SIGUSR1 status will not be reported: {e}");
    }

    info!(host = %host, port = %port, "connecting to daemon");
    let mut session = Session::connect(host, *port, interface.as_deref(), progress)
        .context("failed to establish session with daemon")?;

    let estimate = session
        .run(config.quick)
        .context("measurement session failed")?;

    if let Err(e) = csv_store::write(&config.write_path, session.p1_samples(), session.p2_samples())
    {
        warn!("failed to write capture to {:?}: {e}", config.write_path);
    }

    let ctx = FormatContext {
        prelim_bw_mean: session.prelim_bw_mean(),
        prelim_bw_std: session.prelim_bw_std(),
        bin_width: session.bin_width(),
        packet_dispersion_delta_min: session.calibration().packet_dispersion_delta_min,
        latency_udp_kernel_user_average: session.calibration().latency_udp_kernel_user_average,
        rtt_tcp_socket_average: session.calibration().rtt_tcp_socket_average,
    };

    let formatter = Formatter::new(&config.format).context("invalid output format")?;
    Ok(formatter.render(&estimate, &ctx))
}

/// Offline replay has no calibration run to draw `prelim_bw_mean` from, so
/// it's held at zero; `decision::decide`'s unimodal-ADR refinement is gated
/// on `prelim_bw_mean != 0.0` and simply never fires for a replayed capture.
/// `phase1_completed` is assumed `true` since a completed capture is what
/// got written to disk in the first place.
fn run_offline(config: &EngineConfig) -> anyhow::Result<String> {
    let Mode::Offline {
        read_path,
        bin_width,
    } = &config.mode
    else {
        unreachable!("run_offline called with a non-Offline mode")
    };

    let (p1, p2) = csv_store::read(read_path)
        .with_context(|| format!("failed to read capture from {read_path:?}"))?;

    let estimate = decision::decide(p1.samples(), p2.samples(), 0.0, *bin_width, true);

    let ctx = FormatContext {
        prelim_bw_mean: 0.0,
        prelim_bw_std: 0.0,
        bin_width: *bin_width,
        packet_dispersion_delta_min: 0.0,
        latency_udp_kernel_user_average: 0.0,
        rtt_tcp_socket_average: 0.0,
    };

    let formatter = Formatter::new(&config.format).context("invalid output format")?;
    Ok(formatter.render(&estimate, &ctx))
}
