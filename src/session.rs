//! Session state machine (C4-C8): calibration, train-length discovery, and
//! the three sampling phases.
//!
//! Grounded on `original_source/loco.c`'s `session_connect`/`session_rtt_sync`/
//! `session_train_length` (folded into discovery below)/`session_prelim`/
//! `session_p1`/`session_p2`, and on spec.md §4.1/§4.4-§4.8 for the exact
//! transition and sampling rules. The teacher's async `ipc::tcp_socket`
//! connect/bind dance is replaced wholesale since the wire protocol and
//! socket model are unrelated; what's kept is the teacher's shape of a
//! config-holding struct driving phase methods that return `Result`.

use std::io;
use std::net::{IpAddr, SocketAddr, ToSocketAddrs};
use std::os::fd::AsRawFd;
use std::time::Duration;

use mio::net::{TcpStream as MioTcpStream, UdpSocket as MioUdpSocket};
use mio::{Events, Interest, Poll, Token};
use tracing::info;

use crate::control::{self, ControlCode, Message, MessageReader};
use crate::defaults::*;
use crate::error::EngineError;
use crate::progress::ProgressSlot;
use crate::receiver;
use crate::types::{Sample, SampleSet};

const TCP_TOKEN: Token = Token(0);
const UDP_TOKEN: Token = Token(1);

/// Mirrors spec.md §4.1's FSM. `Close`/`End` are reached via the normal
/// return path of `run`, not stored as a field transition target, so there's
/// no `Session::state` field to keep in sync by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Init,
    RttSync,
    Prelim,
    P1,
    P1Calc,
    P2,
    P2Calc,
    Calc,
}

/// Derived calibration outputs (C4), published once and read by every later
/// phase. Grouped separately from `Session`'s sockets/bookkeeping because
/// `format::FormatContext` borrows a subset of these fields verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct Calibration {
    pub rtt_tcp_socket_average: f64,
    pub train_spacing_min: f64,
    pub train_spacing_max: f64,
    pub train_packet_length_max: u32,
    pub packet_dispersion_delta_min: f64,
    pub latency_udp_kernel_user_average: f64,
}

pub struct Session {
    tcp: MioTcpStream,
    udp: MioUdpSocket,
    poll: Poll,
    events: Events,
    reader: MessageReader,
    progress: ProgressSlot,

    state: SessionState,
    train_id: u32,
    calibration: Calibration,
    train_length_max: u32,
    prelim_bw_mean: f64,
    prelim_bw_std: f64,
    bin_width: f64,

    p1_samples: SampleSet,
    p2_samples: SampleSet,
    phase1_completed: bool,
}

impl Session {
    /// Opens the control and measurement sockets, binds them (optionally to
    /// a named interface or local address), connects the control channel,
    /// and runs the `SESSION_INIT`/`CLIENT_UDP_PORT_SET` handshake.
    ///
    /// Sockets are made non-blocking via `socket2::Socket::set_nonblocking`
    /// (a real `F_SETFL`, unlike loco.c's `F_GETFL`-only call flagged in
    /// spec.md §9) before being handed to `mio`, which requires non-blocking
    /// mode to register successfully at all.
    pub fn connect(
        host: &str,
        port: u16,
        interface: Option<&str>,
        progress: ProgressSlot,
    ) -> Result<Self, EngineError> {
        let server_addr = resolve(host, port)?;

        let tcp_socket = socket2::Socket::new(
            socket2::Domain::IPV4,
            socket2::Type::STREAM,
            Some(socket2::Protocol::TCP),
        )
        .map_err(|e| EngineError::SocketSetup(format!("tcp socket(): {e}")))?;
        let udp_socket = socket2::Socket::new(
            socket2::Domain::IPV4,
            socket2::Type::DGRAM,
            Some(socket2::Protocol::UDP),
        )
        .map_err(|e| EngineError::SocketSetup(format!("udp socket(): {e}")))?;

        if let Some(iface) = interface {
            bind_interface(&tcp_socket, iface)?;
        }

        let udp_any: SocketAddr = (IpAddr::from([0, 0, 0, 0]), DEFAULT_UDP_CLIENT_PORT).into();
        udp_socket
            .bind(&udp_any.into())
            .map_err(|e| EngineError::SocketSetup(format!("udp bind(): {e}")))?;
        let client_udp_port = udp_socket
            .local_addr()
            .ok()
            .and_then(|a| a.as_socket())
            .map(|a| a.port())
            .unwrap_or(0);

        tcp_socket
            .connect(&server_addr.into())
            .map_err(|e| EngineError::SocketSetup(format!("tcp connect(): {e}")))?;
        // The measurement channel also targets the daemon's UDP endpoint so
        // `calibrate_latency` can use connected `send`/`recv` instead of
        // tracking a peer address by hand; train packets still arrive via
        // `recv_from` in `receiver.rs` since the daemon sends them from the
        // same address this connects to.
        udp_socket
            .connect(&server_addr.into())
            .map_err(|e| EngineError::SocketSetup(format!("udp connect(): {e}")))?;

        tcp_socket
            .set_nonblocking(true)
            .map_err(|e| EngineError::SocketSetup(format!("tcp set_nonblocking(): {e}")))?;
        udp_socket
            .set_nonblocking(true)
            .map_err(|e| EngineError::SocketSetup(format!("udp set_nonblocking(): {e}")))?;

        let mut tcp = MioTcpStream::from_std(tcp_socket.into());
        let mut udp = MioUdpSocket::from_std(udp_socket.into());

        let poll = Poll::new().map_err(EngineError::Io)?;
        poll.registry()
            .register(&mut tcp, TCP_TOKEN, Interest::READABLE)
            .map_err(EngineError::Io)?;
        poll.registry()
            .register(&mut udp, UDP_TOKEN, Interest::READABLE)
            .map_err(EngineError::Io)?;

        control::send_message(&mut tcp, Message::new(ControlCode::SessionInit, 0))
            .map_err(EngineError::Io)?;
        control::send_message(
            &mut tcp,
            Message::new(ControlCode::ClientUdpPortSet, client_udp_port as u32),
        )
        .map_err(EngineError::Io)?;

        Ok(Self {
            tcp,
            udp,
            poll,
            events: Events::with_capacity(8),
            reader: MessageReader::new(),
            progress,
            state: SessionState::Init,
            train_id: 1,
            calibration: Calibration::default(),
            train_length_max: 0,
            prelim_bw_mean: 0.0,
            prelim_bw_std: 0.0,
            bin_width: 0.0,
            p1_samples: SampleSet::new(),
            p2_samples: SampleSet::new(),
            phase1_completed: false,
        })
    }

    pub fn calibration(&self) -> Calibration {
        self.calibration
    }

    pub fn bin_width(&self) -> f64 {
        self.bin_width
    }

    pub fn prelim_bw_mean(&self) -> f64 {
        self.prelim_bw_mean
    }

    pub fn prelim_bw_std(&self) -> f64 {
        self.prelim_bw_std
    }

    pub fn train_length_max(&self) -> u32 {
        self.train_length_max
    }

    pub fn p1_samples(&self) -> &SampleSet {
        &self.p1_samples
    }

    pub fn p2_samples(&self) -> &SampleSet {
        &self.p2_samples
    }

    pub fn phase1_completed(&self) -> bool {
        self.phase1_completed
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    fn shutdown_requested(&self) -> bool {
        self.progress.shutdown_requested()
    }

    fn report(&self, percent: u8, state: &str, estimated_bandwidth: f64) {
        self.progress.update(percent, state, estimated_bandwidth);
    }

    fn send(&mut self, code: ControlCode, value: u32) -> Result<(), EngineError> {
        control::send_message(&mut self.tcp, Message::new(code, value)).map_err(EngineError::Io)
    }

    /// One control-channel request/response exchange, timed for the RTT
    /// calibration loop. Sends `(code, value)` then waits up to
    /// `CALIBRATION_RECEIVE_TIMEOUT_MS` for a reply.
    fn exchange(&mut self, code: ControlCode, value: u32) -> Result<(f64, Message), EngineError> {
        let started = std::time::Instant::now();
        self.send(code, value)?;
        let timeout = Duration::from_millis(CALIBRATION_RECEIVE_TIMEOUT_MS);
        loop {
            let readable = control::wait_readable(
                &mut self.poll,
                &mut self.events,
                &mut self.tcp,
                TCP_TOKEN,
                timeout,
            )
            .map_err(EngineError::Io)?;
            if !readable {
                return Err(EngineError::CalibrationExhausted(
                    "control channel did not respond".into(),
                ));
            }
            if let Some(msg) = self.reader.try_read(&mut self.tcp).map_err(EngineError::Io)? {
                return Ok((started.elapsed().as_micros() as f64, msg));
            }
        }
    }

    /// RTT synchronization and UDP kernel/user latency calibration (C4).
    pub fn calibrate(&mut self) -> Result<(), EngineError> {
        self.state = SessionState::RttSync;
        self.report(5, "RTT_SYNC", -1.0);

        let mut valid_count = 0u32;
        let mut count = 0u32;
        let mut rtt_total = 0.0f64;

        while valid_count < RTT_VALID_COUNT && count < RTT_COUNT_MAX {
            let (elapsed_us, reply) = self.exchange(ControlCode::RttSync, count)?;
            if count > 0 && reply.value == 0xffffff_u32.wrapping_sub(count) {
                rtt_total += elapsed_us;
                valid_count += 1;
            }
            count += 1;
        }
        if count == RTT_COUNT_MAX {
            return Err(EngineError::CalibrationExhausted(
                "RTT sync did not converge".into(),
            ));
        }
        let rtt = rtt_total / RTT_VALID_COUNT as f64;
        info!(rtt_us = rtt, "round trip time calibrated");

        let mut train_spacing_min = 0.0f64;
        if train_spacing_min < rtt * 1.25 {
            train_spacing_min = rtt * 1.25;
        }
        self.send(
            ControlCode::TrainSpacingMinSet,
            train_spacing_min.round() as u32,
        )?;
        let train_spacing_max = train_spacing_min * 2.0;
        self.send(
            ControlCode::TrainSpacingMaxSet,
            train_spacing_max.round() as u32,
        )?;

        let mss = query_tcp_mss(&self.tcp)?;
        let train_packet_length_max = mss.min(TRAIN_PACKET_LENGTH_MAX);

        self.calibration = Calibration {
            rtt_tcp_socket_average: rtt,
            train_spacing_min,
            train_spacing_max,
            train_packet_length_max,
            packet_dispersion_delta_min: 0.0,
            latency_udp_kernel_user_average: 0.0,
        };

        self.calibrate_latency()?;
        Ok(())
    }

    /// UDP kernel/userspace latency measurement, grounded on loco.c's
    /// `sendto`/`recvfrom` round-trip probe immediately following RTT_SYNC:
    /// a fixed-size packet is bounced off the daemon's UDP echo and the
    /// half round-trip time informs the minimum acceptable dispersion.
    fn calibrate_latency(&mut self) -> Result<(), EngineError> {
        let packet_length = self.calibration.train_packet_length_max as usize;
        let probe = vec![0u8; packet_length];
        let mut buf = vec![0u8; packet_length];

        let mut deltas: Vec<f64> = Vec::with_capacity(LATENCY_VALID_COUNT as usize);
        let mut total = 0.0f64;
        let mut count = 0u32;
        let mut valid_count = 0u32;

        let timeout = Duration::from_millis(CALIBRATION_RECEIVE_TIMEOUT_MS);
        while valid_count < LATENCY_VALID_COUNT && count < LATENCY_COUNT_MAX {
            let started = std::time::Instant::now();
            self.udp.send(&probe).map_err(EngineError::Io)?;
            let readable = control::wait_readable(
                &mut self.poll,
                &mut self.events,
                &mut self.udp,
                UDP_TOKEN,
                timeout,
            )
            .map_err(EngineError::Io)?;
            let n = if readable {
                self.udp.recv(&mut buf).unwrap_or(0)
            } else {
                0
            };
            let elapsed_us = started.elapsed().as_micros() as f64;

            if count > 0 && n == packet_length {
                deltas.push(elapsed_us);
                total += elapsed_us;
                valid_count += 1;
            }
            count += 1;
        }

        let sorted = crate::stats::sorted(&deltas);
        let median = crate::stats::median(&sorted);
        self.calibration.packet_dispersion_delta_min = median * 0.5;
        self.calibration.latency_udp_kernel_user_average =
            total / LATENCY_VALID_COUNT as f64 / 2.0;

        info!(
            packet_dispersion_delta_min = self.calibration.packet_dispersion_delta_min,
            "minimum acceptable packet dispersion interval"
        );
        Ok(())
    }

    fn set_train(&mut self, train_id: u32, length: u32, packet_length: u32) -> Result<(), EngineError> {
        self.send(ControlCode::TrainIdSet, train_id)?;
        self.send(ControlCode::TrainLengthSet, length)?;
        self.send(ControlCode::TrainPacketLengthSet, packet_length)?;
        Ok(())
    }

    /// Computes `(delta, bandwidth)` from a successful train's per-packet
    /// arrival timestamps, per spec.md §3's normalization: the numerator
    /// uses the session's maximum packet length, never the current train's.
    fn dispersion(&self, timestamps: &[u64], length: u32) -> (f64, f64) {
        let first = timestamps[0] as f64;
        let last = timestamps[(length - 1) as usize] as f64;
        let delta = last - first;
        let bandwidth =
            (self.calibration.train_packet_length_max as f64 * 8.0 * length as f64) / delta;
        (delta, bandwidth)
    }

    fn attempt_train(&mut self, length: u32, packet_length: u32) -> Result<(f64, f64), crate::error::TrainFailure> {
        let timestamps = receiver::receive_train(
            &mut self.poll,
            &mut self.events,
            &mut self.tcp,
            &mut self.udp,
            TCP_TOKEN,
            UDP_TOKEN,
            &mut self.reader,
            self.train_id,
            length,
            packet_length as usize,
        )?;
        Ok(self.dispersion(&timestamps, length))
    }

    /// Train-length discovery (C5). Returns `Some(estimate)` when an
    /// early-exit heuristic (indeterminate or gigabit inference) fires,
    /// meaning the caller should skip straight to `CLOSE`.
    pub fn discover_train_length(&mut self) -> Result<Option<crate::types::Estimate>, EngineError> {
        self.state = SessionState::RttSync;
        self.report(7, "DISCOVERY", -1.0);

        let packet_length = self.calibration.train_packet_length_max;
        let mut train_length = TRAIN_LENGTH_MIN;
        self.set_train(self.train_id, train_length, packet_length)?;

        let mut fails = vec![0u32; (TRAIN_LENGTH_MAX + 1) as usize];
        let mut attempts = 0u32;

        while train_length <= TRAIN_LENGTH_MAX {
            if self.shutdown_requested() {
                return Err(EngineError::CalibrationExhausted("interrupted".into()));
            }
            match self.attempt_train(train_length, packet_length) {
                Ok((delta, bandwidth)) => {
                    attempts += 1;
                    if delta > self.calibration.packet_dispersion_delta_min {
                        let _ = self.p1_samples.push(Sample { bandwidth, delta });
                    } else {
                        self.p1_samples.discard();
                    }
                    self.train_id += 1;
                    train_length += 1;
                    self.send(ControlCode::TrainIdSet, self.train_id)?;
                    self.send(ControlCode::TrainLengthSet, train_length)?;
                }
                Err(_failure) => {
                    attempts += 1;
                    let idx = train_length as usize;
                    fails[idx] += 1;
                    if fails[idx] > TRAIN_LENGTH_FAIL_OVERLOAD {
                        break;
                    } else if fails[idx] > TRAIN_LENGTH_FAIL_BACKOFF {
                        if train_length - 1 >= TRAIN_LENGTH_MIN {
                            train_length -= 1;
                        }
                        self.send(ControlCode::TrainLengthSet, train_length)?;
                    }
                }
            }
        }

        let mut scan = TRAIN_LENGTH_MIN + 1;
        while scan <= TRAIN_LENGTH_MAX && fails[scan as usize] < TRAIN_LENGTH_USABLE_FAIL_CEILING {
            scan += 1;
        }
        self.train_length_max = scan - 1;
        info!(train_length_max = self.train_length_max, "discovery complete");

        if self.p1_samples.is_empty() {
            return Ok(Some(crate::types::Estimate {
                bandwidth: -1.0,
                lo: -1.0,
                hi: -1.0,
                assessment: crate::types::Assessment::Indeterminate,
            }));
        }
        if (self.p1_samples.len() as f64) <= attempts as f64 * DISCOVERY_VALID_FRACTION_MIN {
            return Ok(Some(crate::types::Estimate {
                bandwidth: GIGABIT_INFERENCE_BANDWIDTH,
                lo: GIGABIT_INFERENCE_BANDWIDTH,
                hi: GIGABIT_INFERENCE_BANDWIDTH,
                assessment: crate::types::Assessment::Gigabit,
            }));
        }
        Ok(None)
    }

    /// Preliminary sampler (C6). Returns `Some(estimate)` when the QUICK
    /// early exit fires.
    pub fn prelim(&mut self, quick: bool) -> Result<Option<crate::types::Estimate>, EngineError> {
        self.state = SessionState::Prelim;
        self.report(15, "PRELIM", -1.0);

        let packet_length = self.calibration.train_packet_length_max;
        let mut train_length = TRAIN_LENGTH_MIN;
        self.set_train(self.train_id, train_length, packet_length)?;

        while train_length <= self.train_length_max {
            let mut valid = 0u32;
            let mut attempts = 0u32;
            while valid < PRELIM_VALID_COUNT && attempts < PRELIM_COUNT_MAX {
                attempts += 1;
                if let Ok((delta, bandwidth)) = self.attempt_train(train_length, packet_length)
                {
                    if delta > self.calibration.packet_dispersion_delta_min {
                        let _ = self.p1_samples.push(Sample { bandwidth, delta });
                        valid += 1;
                    } else {
                        self.p1_samples.discard();
                    }
                    self.train_id += 1;
                    self.send(ControlCode::TrainIdSet, self.train_id)?;
                }
            }
            train_length += 1;
            self.send(ControlCode::TrainLengthSet, train_length)?;
        }

        let sorted = self.p1_samples.bandwidths_sorted();
        self.prelim_bw_mean = crate::stats::interquartile_mean(&sorted);
        self.prelim_bw_std = crate::stats::population_std(
            &self
                .p1_samples
                .samples()
                .iter()
                .map(|s| s.bandwidth)
                .collect::<Vec<_>>(),
        );

        self.bin_width = if self.prelim_bw_mean < 1.0 {
            self.prelim_bw_mean * 0.25
        } else {
            self.prelim_bw_mean * 0.125
        };
        info!(bin_width = self.bin_width, "capacity resolution");

        if (self.prelim_bw_std / self.prelim_bw_mean) < BW_COVAR_THRESHOLD || quick {
            return Ok(Some(crate::types::Estimate {
                bandwidth: self.prelim_bw_mean,
                lo: self.prelim_bw_mean - self.prelim_bw_std,
                hi: self.prelim_bw_mean + self.prelim_bw_std,
                assessment: crate::types::Assessment::Quick,
            }));
        }
        Ok(None)
    }

    /// Phase-1 sampler (C7): sweeps packet sizes at the minimum train
    /// length, populating the shared `p1_samples` set alongside discovery
    /// and PRELIM's contributions.
    pub fn phase1(&mut self) -> Result<(), EngineError> {
        self.state = SessionState::P1;
        self.report(25, "P1", -1.0);

        let train_length = TRAIN_LENGTH_MIN;
        let packet_length_min = TRAIN_PACKET_LENGTH_MIN;
        let packet_length_max = self.calibration.train_packet_length_max;
        let step = ((packet_length_max - packet_length_min) as f64
            / TRAIN_PACKET_LENGTH_SIZES as f64) as u32;
        let step = step.max(1);

        let target_per_size =
            (PHASE1_TARGET_TOTAL as f64 / step as f64).floor().max(1.0) as u32;
        let target_ceiling = target_per_size + P1_TRAIN_DISCARD_COUNT_MAX;

        let mut packet_length = packet_length_min;
        self.phase1_completed = true;

        for i in 0..TRAIN_PACKET_LENGTH_SIZES {
            self.set_train(self.train_id, train_length, packet_length)?;
            self.report(
                25 + (25.0 * (i as f64 / TRAIN_PACKET_LENGTH_SIZES as f64)) as u8,
                "P1",
                -1.0,
            );

            let mut valid = 0u32;
            let mut attempts = 0u32;
            while valid < target_per_size && attempts < target_ceiling {
                attempts += 1;
                if let Ok((delta, bandwidth)) = self.attempt_train(train_length, packet_length)
                {
                    if delta > self.calibration.packet_dispersion_delta_min {
                        let _ = self.p1_samples.push(Sample { bandwidth, delta });
                        valid += 1;
                    } else {
                        self.p1_samples.discard();
                    }
                    self.train_id += 1;
                    self.send(ControlCode::TrainIdSet, self.train_id)?;
                }
            }

            if attempts - valid >= P1_TRAIN_DISCARD_COUNT_MAX {
                if train_length > self.train_length_max {
                    self.phase1_completed = false;
                    break;
                }
            } else {
                packet_length += step;
            }
            if packet_length > packet_length_max {
                packet_length = packet_length_max;
            }
        }
        Ok(())
    }

    /// Phase-2 sampler (C8): fixed at the maximum usable train length, no
    /// discard cap.
    pub fn phase2(&mut self) -> Result<(), EngineError> {
        self.state = SessionState::P2;
        self.report(60, "P2", -1.0);

        let train_length = self.train_length_max;
        let packet_length = self.calibration.train_packet_length_max;
        self.set_train(self.train_id, train_length, packet_length)?;

        let mut valid = 0u32;
        while valid < PHASE2_TARGET_TOTAL {
            if let Ok((delta, bandwidth)) = self.attempt_train(train_length, packet_length) {
                if delta > self.calibration.packet_dispersion_delta_min {
                    let _ = self.p2_samples.push(Sample { bandwidth, delta });
                    valid += 1;
                    self.report(
                        60 + (25.0 * (valid as f64 / PHASE2_TARGET_TOTAL as f64)) as u8,
                        "P2",
                        -1.0,
                    );
                } else {
                    self.p2_samples.discard();
                }
                self.train_id += 1;
                self.send(ControlCode::TrainIdSet, self.train_id)?;
            }
        }
        Ok(())
    }

    /// Drives the full FSM (C4-C8) and the C10 decision procedure, mirroring
    /// loco.c's `main()` chain of `if (session_X() != 0) session_end(1)`
    /// calls via `?`-propagation instead of a shared mutable return code.
    pub fn run(&mut self, quick: bool) -> Result<crate::types::Estimate, EngineError> {
        self.calibrate()?;

        if let Some(estimate) = self.discover_train_length()? {
            self.end()?;
            return Ok(estimate);
        }
        if let Some(estimate) = self.prelim(quick)? {
            self.end()?;
            return Ok(estimate);
        }
        self.phase1()?;
        self.state = SessionState::P1Calc;
        self.phase2()?;
        self.state = SessionState::P2Calc;

        self.state = SessionState::Calc;
        self.report(95, "CALC", -1.0);
        let estimate = crate::decision::decide(
            self.p1_samples.samples(),
            self.p2_samples.samples(),
            self.prelim_bw_mean,
            self.bin_width,
            self.phase1_completed,
        );
        self.end()?;
        Ok(estimate)
    }

    pub fn end(&mut self) -> Result<(), EngineError> {
        let _ = self.send(ControlCode::SessionEnd, 0);
        Ok(())
    }
}

fn resolve(host: &str, port: u16) -> Result<SocketAddr, EngineError> {
    (host, port)
        .to_socket_addrs()
        .map_err(|e| EngineError::SocketSetup(format!("no such host as {host}: {e}")))?
        .find(|addr| addr.is_ipv4())
        .ok_or_else(|| EngineError::SocketSetup(format!("no IPv4 address for host {host}")))
}

/// Binds `socket` to a local interface given by name (resolved via
/// `SO_BINDTODEVICE`) or a literal IPv4 address, matching loco.c's
/// `getifaddrs`-then-`getaddrinfo` fallback in `session_connect`.
fn bind_interface(socket: &socket2::Socket, interface: &str) -> Result<(), EngineError> {
    if let Ok(addr) = interface.parse::<IpAddr>() {
        let bind_addr: SocketAddr = (addr, 0).into();
        return socket
            .bind(&bind_addr.into())
            .map_err(|e| EngineError::SocketSetup(format!("bind to {interface}: {e}")));
    }

    let cstr = std::ffi::CString::new(interface)
        .map_err(|_| EngineError::SocketSetup("interface name contains a NUL byte".into()))?;
    let ret = unsafe {
        libc::setsockopt(
            socket.as_raw_fd(),
            libc::SOL_SOCKET,
            libc::SO_BINDTODEVICE,
            cstr.as_ptr() as *const libc::c_void,
            cstr.as_bytes_with_nul().len() as libc::socklen_t,
        )
    };
    if ret != 0 {
        return Err(EngineError::SocketSetup(format!(
            "can't bind on specified interface/hostname: {}",
            io::Error::last_os_error()
        )));
    }
    Ok(())
}

/// Queries the connected TCP socket's MSS, clamped to the compiled maximum,
/// matching loco.c's `getsockopt(IPPROTO_TCP, TCP_MAXSEG, ...)` call.
fn query_tcp_mss(tcp: &MioTcpStream) -> Result<u32, EngineError> {
    let mut mss: libc::c_int = TRAIN_PACKET_LENGTH_MAX as libc::c_int;
    let mut len = std::mem::size_of::<libc::c_int>() as libc::socklen_t;
    let ret = unsafe {
        libc::getsockopt(
            tcp.as_raw_fd(),
            libc::IPPROTO_TCP,
            libc::TCP_MAXSEG,
            &mut mss as *mut _ as *mut libc::c_void,
            &mut len,
        )
    };
    if ret != 0 {
        return Ok(TRAIN_PACKET_LENGTH_MAX);
    }
    Ok((mss as u32).min(TRAIN_PACKET_LENGTH_MAX))
}

