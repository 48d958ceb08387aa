//! loco — active packet-train/packet-pair bandwidth capacity estimator.
//!
//! Coordinates a TCP control channel and a UDP measurement channel against a
//! cooperating remote daemon to estimate the bottleneck capacity of an IPv4
//! path, or replays a prior CSV capture offline. See `DESIGN.md` for the
//! module-by-module grounding in the original C implementation.

pub mod cli;
pub mod config;
pub mod control;
pub mod csv_store;
pub mod decision;
pub mod defaults;
pub mod error;
pub mod format;
pub mod logging;
pub mod modal;
pub mod progress;
pub mod receiver;
pub mod session;
pub mod stats;
pub mod types;

pub use cli::Args;
pub use config::{EngineConfig, Mode};
pub use error::EngineError;
pub use session::Session;
pub use types::{Assessment, Estimate, Sample, SampleSet};

/// The current version of the engine.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
