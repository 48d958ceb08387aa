//! Smoke test: drive the real `Session` handshake, calibration, and
//! train-length discovery against a synthetic daemon speaking the actual
//! wire protocol. Loopback is a poor stand-in for a real network path for
//! an active dispersion estimator — trains arrive effectively all at once —
//! so this checks that the plumbing works end-to-end rather than pinning
//! down a specific bandwidth figure; the numeric decision logic itself is
//! covered by `decision.rs`/`modal.rs`'s unit tests against synthetic
//! sample sets.

mod support;

use loco::defaults;
use loco::progress::ProgressSlot;
use loco::session::Session;
use loco::Assessment;
use support::Daemon;

#[test]
fn session_connects_and_calibrates_against_synthetic_daemon() {
    let daemon = Daemon::spawn();
    let progress = ProgressSlot::new();

    let mut session = Session::connect("127.0.0.1", daemon.port, None, progress)
        .expect("session should connect to the synthetic daemon");

    session.calibrate().expect("calibration should complete");
    let calibration = session.calibration();
    assert!(calibration.rtt_tcp_socket_average >= 0.0);
    assert!(calibration.train_packet_length_max > 0);
    assert!(calibration.train_packet_length_max <= defaults::TRAIN_PACKET_LENGTH_MAX);
    assert!(calibration.packet_dispersion_delta_min >= 0.0);

    let outcome = session
        .discover_train_length()
        .expect("discovery should not error against an always-succeeding daemon");

    match outcome {
        Some(estimate) => {
            assert!(matches!(
                estimate.assessment,
                Assessment::Indeterminate | Assessment::Gigabit
            ));
        }
        None => {
            assert!(session.train_length_max() >= defaults::TRAIN_LENGTH_MIN);
        }
    }

    session.end().expect("session end should send cleanly");
}
