//! Internal, validated configuration (§4.11 AMBIENT).
//!
//! `EngineConfig` is the validated form of `cli::Args`, distinct from the
//! wire-level "session configuration" of spec.md §3, which it carries as
//! fields. Grounded on the teacher's `BenchmarkConfiguration` +
//! `TryFrom<&Args>` conversion pattern in `cli.rs`.

use std::path::PathBuf;

use crate::cli::Args;
use crate::defaults;
use crate::error::EngineError;

#[derive(Debug, Clone)]
pub enum Mode {
    /// Measure live against a remote daemon.
    Online {
        host: String,
        port: u16,
        interface: Option<String>,
    },
    /// Replay a prior CSV capture.
    Offline { read_path: PathBuf, bin_width: f64 },
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub mode: Mode,
    pub quick: bool,
    pub write_path: PathBuf,
    pub format: String,
    pub verbose: u8,
}

impl TryFrom<&Args> for EngineConfig {
    type Error = EngineError;

    fn try_from(args: &Args) -> Result<Self, Self::Error> {
        let mode = match (&args.host, &args.read) {
            (Some(_), Some(_)) => {
                return Err(EngineError::Configuration(
                    "online mode (-h) and offline mode (-r) are mutually exclusive".into(),
                ))
            }
            (None, None) => {
                return Err(EngineError::Configuration(
                    "specify either -h (online mode) or -r (offline mode)".into(),
                ))
            }
            (Some(host), None) => Mode::Online {
                host: host.clone(),
                port: args.port,
                interface: args.interface.clone(),
            },
            (None, Some(read_path)) => {
                let bin_width = args.bin_width.ok_or_else(|| {
                    EngineError::Configuration(
                        "offline mode (-r) requires a bin width (-b)".into(),
                    )
                })?;
                if bin_width <= 0.0 {
                    return Err(EngineError::Configuration(
                        "bin width (-b) must be positive".into(),
                    ));
                }
                Mode::Offline {
                    read_path: read_path.clone(),
                    bin_width,
                }
            }
        };

        let format = args
            .format
            .clone()
            .unwrap_or_else(|| defaults::DEFAULT_FORMAT.to_string());
        crate::format::Formatter::new(&format)?;

        Ok(Self {
            mode,
            quick: args.quick,
            write_path: args.write.clone(),
            format,
            verbose: args.verbose,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(args: &[&str]) -> Args {
        let mut full = vec!["loco"];
        full.extend_from_slice(args);
        Args::parse_from(full)
    }

    #[test]
    fn rejects_mixing_online_and_offline() {
        let args = parse(&["-h", "daemon", "-r", "capture.csv"]);
        assert!(EngineConfig::try_from(&args).is_err());
    }

    #[test]
    fn rejects_neither_mode() {
        let args = parse(&[]);
        assert!(EngineConfig::try_from(&args).is_err());
    }

    #[test]
    fn offline_requires_bin_width() {
        let args = parse(&["-r", "capture.csv"]);
        assert!(EngineConfig::try_from(&args).is_err());
    }

    #[test]
    fn accepts_valid_online_config() {
        let args = parse(&["-h", "daemon.example.com"]);
        let config = EngineConfig::try_from(&args).unwrap();
        assert!(matches!(config.mode, Mode::Online { .. }));
    }
}
