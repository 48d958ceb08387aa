//! Compiled protocol constants.
//!
//! These mirror the `#define`s loco.c reads from its stripped `common.h`
//! (not part of the retrieval pack). Values are chosen to satisfy the
//! behaviors documented in the end-to-end scenarios; see `DESIGN.md` for
//! the rationale behind each one.

/// Smallest train length (packets) the engine will ever probe.
pub const TRAIN_LENGTH_MIN: u32 = 4;

/// Largest train length (packets) the engine will probe.
pub const TRAIN_LENGTH_MAX: u32 = 128;

/// Smallest UDP payload size (bytes) used for a train packet.
pub const TRAIN_PACKET_LENGTH_MIN: u32 = 200;

/// Largest UDP payload size (bytes), clamped to avoid IPv4 fragmentation
/// on a standard 1500-byte-MTU path.
pub const TRAIN_PACKET_LENGTH_MAX: u32 = 1472;

/// Ceiling on RTT_SYNC iterations before calibration fails.
pub const RTT_COUNT_MAX: u32 = 50;

/// Number of valid RTT samples required to stop calibration.
pub const RTT_VALID_COUNT: u32 = 10;

/// Ceiling on kernel/user UDP latency echo iterations.
pub const LATENCY_COUNT_MAX: u32 = 100;

/// Number of valid latency samples required to stop calibration.
pub const LATENCY_VALID_COUNT: u32 = 20;

/// Valid samples required per train length in the preliminary sampler.
pub const PRELIM_VALID_COUNT: u32 = 10;

/// Attempt ceiling per train length in the preliminary sampler.
pub const PRELIM_COUNT_MAX: u32 = 30;

/// Number of packet-length sweep steps in phase 1.
pub const TRAIN_PACKET_LENGTH_SIZES: u32 = 10;

/// Target valid samples across all of phase 1.
pub const PHASE1_TARGET_TOTAL: u32 = 1000;

/// Extra discard budget per packet-length size in phase 1.
pub const P1_TRAIN_DISCARD_COUNT_MAX: u32 = 20;

/// Target valid samples for phase 2.
pub const PHASE2_TARGET_TOTAL: u32 = 500;

/// Coefficient-of-variation threshold below which a distribution is
/// considered unimodal enough to short-circuit (PRELIM's `QUICK` exit,
/// P2's unimodal-ADR branch).
pub const BW_COVAR_THRESHOLD: f64 = 0.1;

/// Threshold for the ADR / preliminary-mean ratio in the unimodal P2 branch.
pub const ADR_THRESHOLD: f64 = 0.9;

/// Bell-growth tolerance multiplier in the modal analyzer.
pub const BIN_COUNT_TOLERANCE: f64 = 0.2;

/// Central-bin count at or below which a mode is rejected as noise.
pub const BIN_COUNT_NOISE_THRESHOLD: u32 = 3;

/// Discovery early-exit: fraction of attempts that must succeed, below
/// which a gigabit-class link is inferred.
pub const DISCOVERY_VALID_FRACTION_MIN: f64 = 0.40;

/// Bandwidth (Mbps) reported when a gigabit-class link is inferred.
pub const GIGABIT_INFERENCE_BANDWIDTH: f64 = 1000.0;

/// Per-train-length failure count above which discovery declares
/// path overload and stops probing further.
pub const TRAIN_LENGTH_FAIL_OVERLOAD: u32 = 4;

/// Per-train-length failure count above which discovery backs off one
/// train length and retries.
pub const TRAIN_LENGTH_FAIL_BACKOFF: u32 = 1;

/// Failure count below which a length counts as "usable" in the
/// post-discovery upward scan for `train_length_max`.
pub const TRAIN_LENGTH_USABLE_FAIL_CEILING: u32 = 3;

/// Upper bound on samples retained per sample set; pushes past this are
/// rejected rather than silently dropped oldest-first.
pub const SAMPLE_SET_CAP: usize = 4096;

/// Default TCP control port.
pub const DEFAULT_CONTROL_PORT: u16 = 7913;

/// Default UDP client port (0 lets the OS pick an ephemeral port).
pub const DEFAULT_UDP_CLIENT_PORT: u16 = 0;

/// Default offline-mode CSV output path.
pub const DEFAULT_CSV_PATH: &str = "/tmp/loco.csv";

/// Default result format string.
pub const DEFAULT_FORMAT: &str = "%be %bl %bu";

/// Readiness timeout for a single train reception attempt.
pub const TRAIN_RECEIVE_TIMEOUT_MS: u64 = 2000;

/// Readiness timeout used for single-socket calibration exchanges
/// (RTT_SYNC iterations, UDP latency echoes).
pub const CALIBRATION_RECEIVE_TIMEOUT_MS: u64 = 2000;
