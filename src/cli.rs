//! Command-line interface (§4.11 AMBIENT).
//!
//! Mirrors spec.md §6's CLI surface exactly: `-p -h -I -q -r -w -b -f` plus
//! `-?/--help` and `-V/--version`. Grounded on the teacher's `cli.rs`
//! (`Args` via `clap::Parser`, styled help) and on
//! `original_source/loco.c`'s `parse_cmdline` getopt table
//! (`"?b:f:h:p:qr:w:I:V"`) for the exact flag semantics — `-h` is bound to
//! `--host`, not help, so clap's default help flag is disabled and rebound
//! to `-?` to match.

use std::path::PathBuf;

use clap::builder::styling::{AnsiColor, Styles};
use clap::{ArgAction, Parser};

use crate::defaults;

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Yellow.on_default())
        .usage(AnsiColor::Yellow.on_default())
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// loco — active packet-train bandwidth capacity estimator
///
/// Estimates the bottleneck capacity of an IPv4 path using packet-pair/
/// packet-train UDP dispersion measurements coordinated over a TCP control
/// channel with a cooperating remote daemon, or replays a prior offline
/// capture.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None, styles = styles(), disable_help_flag = true)]
pub struct Args {
    /// Show this help message
    #[arg(short = '?', long = "help", action = ArgAction::Help)]
    help: Option<bool>,

    /// Control channel TCP port on the remote daemon
    #[arg(short = 'p', default_value_t = defaults::DEFAULT_CONTROL_PORT)]
    pub port: u16,

    /// Remote daemon hostname or address — enables online (network) mode
    #[arg(short = 'h', long = "host")]
    pub host: Option<String>,

    /// Local interface (name or IPv4 address) to bind the client sockets to
    #[arg(short = 'I', long = "interface")]
    pub interface: Option<String>,

    /// Accept the PRELIM result immediately if its covariance is already low
    #[arg(short = 'q', long = "quick")]
    pub quick: bool,

    /// Offline mode: read a prior CSV capture instead of measuring live
    #[arg(short = 'r')]
    pub read: Option<PathBuf>,

    /// Output path for a CSV capture of this run's samples
    #[arg(short = 'w', default_value = defaults::DEFAULT_CSV_PATH)]
    pub write: PathBuf,

    /// Histogram bin width in Mbps, required for offline mode
    #[arg(short = 'b')]
    pub bin_width: Option<f64>,

    /// Output format string (tokens: %be %am %AM %bl %bu %bw %pd %ul %pm %ps %lt)
    #[arg(short = 'f', long = "format")]
    pub format: Option<String>,

    /// Increase diagnostic log verbosity on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, hide = true)]
    pub verbose: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        let mut full = vec!["loco"];
        full.extend_from_slice(args);
        Args::parse_from(full)
    }

    #[test]
    fn parses_online_mode_flags() {
        let args = parse(&["-h", "daemon.example.com", "-p", "9000", "-q"]);
        assert_eq!(args.host.as_deref(), Some("daemon.example.com"));
        assert_eq!(args.port, 9000);
        assert!(args.quick);
        assert!(args.read.is_none());
    }

    #[test]
    fn parses_offline_mode_flags() {
        let args = parse(&["-r", "capture.csv", "-b", "0.5"]);
        assert_eq!(args.read, Some(PathBuf::from("capture.csv")));
        assert_eq!(args.bin_width, Some(0.5));
        assert!(args.host.is_none());
    }

    #[test]
    fn write_defaults_to_tmp_loco_csv() {
        let args = parse(&["-h", "daemon"]);
        assert_eq!(args.write, PathBuf::from(defaults::DEFAULT_CSV_PATH));
    }

    #[test]
    fn format_flag_accepts_long_form() {
        let args = parse(&["-h", "daemon", "--format", "%be %bl %bu"]);
        assert_eq!(args.format.as_deref(), Some("%be %bl %bu"));
    }
}
