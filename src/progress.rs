//! Progress reporting (§4.14, REDESIGN).
//!
//! Per spec.md §9 DESIGN NOTES, the original's signal-handler-writes-global
//! progress mechanism is replaced with a cooperative slot: the engine
//! writes `(percent, state, estimated_bandwidth)` after every phase
//! transition and sampling attempt, and a background watchdog thread reads
//! it and formats the `SIGUSR1` reply line from ordinary (non-handler)
//! context. `SIGINT`/`SIGTERM` set a flag the main loop polls between train
//! attempts rather than unwinding out of signal context.
//!
//! Grounded on `original_source/loco.c`'s `signal_handler`/`progress_set`/
//! `progress_get` for the line format and trigger points; uses
//! `signal-hook` in place of the teacher's `tokio::signal`, since this
//! engine deliberately doesn't run an async runtime (see `DESIGN.md`).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use signal_hook::consts::{SIGINT, SIGTERM, SIGUSR1};
use signal_hook::iterator::Signals;

#[derive(Debug, Clone)]
struct ProgressState {
    percent: u8,
    state: String,
    estimated_bandwidth: f64,
}

impl Default for ProgressState {
    fn default() -> Self {
        Self {
            percent: 0,
            state: "INIT".to_string(),
            estimated_bandwidth: -1.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProgressSlot {
    state: Arc<Mutex<ProgressState>>,
    shutdown_requested: Arc<AtomicBool>,
}

impl ProgressSlot {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ProgressState::default())),
            shutdown_requested: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn update(&self, percent: u8, state: &str, estimated_bandwidth: f64) {
        let mut guard = self.state.lock().expect("progress slot poisoned");
        guard.percent = percent;
        guard.state = state.to_string();
        guard.estimated_bandwidth = estimated_bandwidth;
    }

    pub fn shutdown_requested(&self) -> bool {
        self.shutdown_requested.load(Ordering::Relaxed)
    }

    /// Spawns the watchdog thread. Only meaningful in network mode; offline
    /// replay has nothing to signal.
    pub fn spawn_watchdog(&self) -> std::io::Result<JoinHandle<()>> {
        let mut signals = Signals::new([SIGUSR1, SIGINT, SIGTERM])?;
        let state = self.state.clone();
        let shutdown_requested = self.shutdown_requested.clone();
        Ok(thread::spawn(move || {
            for signal in signals.forever() {
                match signal {
                    SIGUSR1 => {
                        let guard = state.lock().expect("progress slot poisoned");
                        eprintln!(
                            "{}%,{},{:.4}",
                            guard.percent, guard.state, guard.estimated_bandwidth
                        );
                    }
                    SIGINT | SIGTERM => {
                        shutdown_requested.store(true, Ordering::SeqCst);
                    }
                    _ => {}
                }
            }
        }))
    }
}

impl Default for ProgressSlot {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_is_visible_without_a_watchdog_thread() {
        let slot = ProgressSlot::new();
        slot.update(42, "P1", 48.5);
        let guard = slot.state.lock().unwrap();
        assert_eq!(guard.percent, 42);
        assert_eq!(guard.state, "P1");
        assert!((guard.estimated_bandwidth - 48.5).abs() < 1e-9);
    }

    #[test]
    fn shutdown_flag_defaults_false() {
        let slot = ProgressSlot::new();
        assert!(!slot.shutdown_requested());
    }
}
