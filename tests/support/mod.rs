//! A minimal synthetic daemon implementing the control-channel contract
//! (`control.rs`) and the train-emission contract (`receiver.rs`), so
//! integration tests can exercise the real client engine end-to-end against
//! a genuine peer instead of mocking `Session`'s internals.
//!
//! Wire codes are duplicated here rather than imported from
//! `loco::control::ControlCode`: a synthetic peer speaks the protocol, the
//! same way a non-Rust daemon implementation would, not the client's
//! internal types.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream, UdpSocket};
use std::sync::Arc;
use std::thread;

mod wire {
    pub const SESSION_INIT: u32 = 1;
    pub const SESSION_END: u32 = 2;
    pub const CLIENT_UDP_PORT_SET: u32 = 3;
    pub const RTT_SYNC: u32 = 4;
    pub const TRAIN_SPACING_MIN_SET: u32 = 5;
    pub const TRAIN_SPACING_MAX_SET: u32 = 6;
    pub const TRAIN_ID_SET: u32 = 7;
    pub const TRAIN_LENGTH_SET: u32 = 8;
    pub const TRAIN_PACKET_LENGTH_SET: u32 = 9;
    pub const TRAIN_SEND: u32 = 10;
    pub const TRAIN_SENT: u32 = 11;
    pub const TRAIN_RECEIVE_ACK: u32 = 12;
    pub const TRAIN_RECEIVE_FAIL: u32 = 13;
}

fn read_message(stream: &mut TcpStream) -> std::io::Result<(u32, u32)> {
    let mut buf = [0u8; 8];
    stream.read_exact(&mut buf)?;
    Ok((
        u32::from_be_bytes(buf[0..4].try_into().unwrap()),
        u32::from_be_bytes(buf[4..8].try_into().unwrap()),
    ))
}

fn write_message(stream: &mut TcpStream, code: u32, value: u32) -> std::io::Result<()> {
    let mut buf = [0u8; 8];
    buf[0..4].copy_from_slice(&code.to_be_bytes());
    buf[4..8].copy_from_slice(&value.to_be_bytes());
    stream.write_all(&buf)
}

fn send_train(udp: &UdpSocket, to: SocketAddr, train_id: u32, length: u32, packet_length: u32) {
    let mut buf = vec![0u8; (packet_length as usize).max(8)];
    for packet_id in 0..length {
        buf[0..4].copy_from_slice(&train_id.to_be_bytes());
        buf[4..8].copy_from_slice(&packet_id.to_be_bytes());
        let _ = udp.send_to(&buf, to);
    }
}

/// A daemon that accepts one control connection, echoes RTT_SYNC and UDP
/// latency probes, and emits a fully-formed train on every TRAIN_SEND. It
/// never fails a train — tests exercising failure/backoff paths drive the
/// lower-level modules directly instead of a full synthetic network.
pub struct Daemon {
    pub port: u16,
}

impl Daemon {
    pub fn spawn() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind control listener");
        let port = listener.local_addr().expect("local_addr").port();
        // The client connects its UDP socket to the same (host, port) it
        // uses for the control channel; the daemon's UDP endpoint mirrors
        // that by binding to the identical port.
        let udp = UdpSocket::bind(("127.0.0.1", port)).expect("bind udp endpoint");

        thread::spawn(move || serve(listener, udp));

        Daemon { port }
    }
}

fn serve(listener: TcpListener, udp: UdpSocket) {
    let (mut stream, peer) = match listener.accept() {
        Ok(pair) => pair,
        Err(_) => return,
    };
    let udp = Arc::new(udp);

    let echo_udp = Arc::clone(&udp);
    thread::spawn(move || {
        let mut buf = [0u8; 2048];
        loop {
            match echo_udp.recv_from(&mut buf) {
                Ok((n, from)) => {
                    let _ = echo_udp.send_to(&buf[..n], from);
                }
                Err(_) => break,
            }
        }
    });

    let mut client_addr: Option<SocketAddr> = None;
    let mut train_id = 0u32;
    let mut train_length = 0u32;
    let mut packet_length = 0u32;

    loop {
        let (code, value) = match read_message(&mut stream) {
            Ok(m) => m,
            Err(_) => break,
        };
        match code {
            wire::SESSION_INIT => {}
            wire::CLIENT_UDP_PORT_SET => {
                client_addr = Some(SocketAddr::new(peer.ip(), value as u16));
            }
            wire::RTT_SYNC => {
                let reply = 0xffffff_u32.wrapping_sub(value);
                if write_message(&mut stream, wire::RTT_SYNC, reply).is_err() {
                    break;
                }
            }
            wire::TRAIN_SPACING_MIN_SET | wire::TRAIN_SPACING_MAX_SET => {}
            wire::TRAIN_ID_SET => train_id = value,
            wire::TRAIN_LENGTH_SET => train_length = value,
            wire::TRAIN_PACKET_LENGTH_SET => packet_length = value,
            wire::TRAIN_SEND => {
                if let Some(addr) = client_addr {
                    send_train(&udp, addr, train_id, train_length, packet_length);
                }
                if write_message(&mut stream, wire::TRAIN_SENT, 0).is_err() {
                    break;
                }
            }
            wire::TRAIN_RECEIVE_ACK | wire::TRAIN_RECEIVE_FAIL => {}
            wire::SESSION_END => break,
            _ => {}
        }
    }
}
