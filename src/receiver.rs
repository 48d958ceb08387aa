//! Dual-socket train receiver (C3).
//!
//! One train reception attempt: drain stale data, arm the daemon via
//! `TRAIN_SEND`, then correlate UDP packet arrivals against the TCP
//! `TRAIN_SENT` signal within a combined 2-second inactivity timeout.
//! Grounded on spec.md §4.3 and `original_source/loco.c`'s
//! `receive_train` (full body retrieved in `original_source/loco.c`).

use std::io;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use mio::net::{TcpStream, UdpSocket};
use mio::{Events, Poll, Token};
use tracing::debug;

use crate::control::{self, ControlCode, Message, MessageReader};
use crate::defaults::TRAIN_RECEIVE_TIMEOUT_MS;
use crate::error::TrainFailure;

fn now_micros() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_micros() as u64
}

/// Drains any data already pending on either socket before a train attempt
/// starts, so leftover bytes from a prior (failed/stale) attempt don't
/// corrupt this one. A single zero-timeout poll pass, then read-to-`WouldBlock`
/// on whichever sources are ready, per spec.md §4.3's "drain both sockets of
/// pending data with a zero-timeout readiness check".
pub fn drain(
    poll: &mut Poll,
    events: &mut Events,
    tcp: &mut TcpStream,
    udp: &mut UdpSocket,
    tcp_token: Token,
    udp_token: Token,
    udp_buf: &mut [u8],
    reader: &mut MessageReader,
) -> io::Result<()> {
    poll.poll(events, Some(Duration::ZERO))?;
    let (tcp_ready, udp_ready) = {
        let mut tcp_ready = false;
        let mut udp_ready = false;
        for event in events.iter() {
            if event.token() == tcp_token {
                tcp_ready = true;
            }
            if event.token() == udp_token {
                udp_ready = true;
            }
        }
        (tcp_ready, udp_ready)
    };
    if udp_ready {
        loop {
            match udp.recv_from(udp_buf) {
                Ok(_) => continue,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => return Err(e),
            }
        }
    }
    if tcp_ready {
        while reader.try_read(tcp)?.is_some() {}
    }
    Ok(())
}

/// One train reception attempt per spec.md §4.3's contract.
#[allow(clippy::too_many_arguments)]
pub fn receive_train(
    poll: &mut Poll,
    events: &mut Events,
    tcp: &mut TcpStream,
    udp: &mut UdpSocket,
    tcp_token: Token,
    udp_token: Token,
    reader: &mut MessageReader,
    train_id: u32,
    length: u32,
    packet_length: usize,
) -> Result<Vec<u64>, TrainFailure> {
    let mut udp_buf = vec![0u8; packet_length.max(8)];

    drain(poll, events, tcp, udp, tcp_token, udp_token, &mut udp_buf, reader)?;

    control::send_message(tcp, Message::new(ControlCode::TrainSend, train_id))?;

    let mut timestamps = vec![0u64; length as usize];
    let mut expected: u32 = 0;
    let mut train_sent = false;
    let mut stale_latched = false;

    let timeout = Duration::from_millis(TRAIN_RECEIVE_TIMEOUT_MS);
    loop {
        poll.poll(events, Some(timeout))?;
        if events.is_empty() {
            break;
        }

        let mut udp_ready = false;
        let mut tcp_ready = false;
        for event in events.iter() {
            if event.token() == udp_token && event.is_readable() {
                udp_ready = true;
            }
            if event.token() == tcp_token && event.is_readable() {
                tcp_ready = true;
            }
        }

        if udp_ready {
            loop {
                match udp.recv_from(&mut udp_buf) {
                    Ok((n, _)) if n >= 8 => {
                        let received_train_id = u32::from_be_bytes(udp_buf[0..4].try_into().unwrap());
                        let received_packet_id = u32::from_be_bytes(udp_buf[4..8].try_into().unwrap());
                        if received_train_id != train_id {
                            debug!(received_train_id, train_id, "stale train packet");
                            stale_latched = true;
                        } else if received_packet_id == expected {
                            timestamps[expected as usize] = now_micros();
                            expected += 1;
                        }
                    }
                    Ok(_) => {}
                    Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                    Err(e) => return Err(e.into()),
                }
            }
        }

        if tcp_ready {
            loop {
                match reader.try_read(tcp) {
                    Ok(Some(msg)) if msg.matches(ControlCode::TrainSent) => train_sent = true,
                    Ok(Some(_)) => {}
                    Ok(None) => break,
                    Err(e) => return Err(e.into()),
                }
            }
        }

        if train_sent && expected == length {
            break;
        }
    }

    if expected == length {
        control::send_message(tcp, Message::new(ControlCode::TrainReceiveAck, 0))?;
        Ok(timestamps)
    } else {
        control::send_message(tcp, Message::new(ControlCode::TrainReceiveFail, 0))?;
        if stale_latched {
            Err(TrainFailure::StaleTrain)
        } else {
            Err(TrainFailure::Incomplete)
        }
    }
}
