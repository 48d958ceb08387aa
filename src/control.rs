//! Control channel (C2).
//!
//! Fixed 8-byte `(code: u32 BE, value: u32 BE)` messages over TCP. Sends
//! are synchronous blocking writes; receives are non-blocking and driven
//! by the caller's own readiness multiplexing (see `receiver.rs` and
//! `session.rs`'s calibration loops). Grounded on spec.md §4.2/§6 (the wire
//! format is fully specified there) and adapted from the teacher's
//! length-prefixed framing in `ipc/tcp_socket.rs`, simplified because
//! loco's frame has no length prefix — it's fixed-length by construction.

use std::io::{self, Read, Write};
use std::time::Duration;

use mio::{Events, Interest, Poll, Token};

pub const MESSAGE_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ControlCode {
    SessionInit = 1,
    SessionEnd = 2,
    ClientUdpPortSet = 3,
    RttSync = 4,
    TrainSpacingMinSet = 5,
    TrainSpacingMaxSet = 6,
    TrainIdSet = 7,
    TrainLengthSet = 8,
    TrainPacketLengthSet = 9,
    TrainSend = 10,
    TrainSent = 11,
    TrainReceiveAck = 12,
    TrainReceiveFail = 13,
}

impl ControlCode {
    fn from_u32(v: u32) -> Option<Self> {
        use ControlCode::*;
        Some(match v {
            1 => SessionInit,
            2 => SessionEnd,
            3 => ClientUdpPortSet,
            4 => RttSync,
            5 => TrainSpacingMinSet,
            6 => TrainSpacingMaxSet,
            7 => TrainIdSet,
            8 => TrainLengthSet,
            9 => TrainPacketLengthSet,
            10 => TrainSend,
            11 => TrainSent,
            12 => TrainReceiveAck,
            13 => TrainReceiveFail,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Message {
    pub code: u32,
    pub value: u32,
}

impl Message {
    pub fn new(code: ControlCode, value: u32) -> Self {
        Self {
            code: code as u32,
            value,
        }
    }

    pub fn matches(&self, code: ControlCode) -> bool {
        ControlCode::from_u32(self.code) == Some(code)
    }

    fn encode(self) -> [u8; MESSAGE_LEN] {
        let mut buf = [0u8; MESSAGE_LEN];
        buf[0..4].copy_from_slice(&self.code.to_be_bytes());
        buf[4..8].copy_from_slice(&self.value.to_be_bytes());
        buf
    }

    fn decode(buf: &[u8; MESSAGE_LEN]) -> Self {
        let code = u32::from_be_bytes(buf[0..4].try_into().unwrap());
        let value = u32::from_be_bytes(buf[4..8].try_into().unwrap());
        Self { code, value }
    }
}

/// Blocking send of a fixed-length control message. `stream` may be in
/// non-blocking mode; a `WouldBlock` write is retried until it completes,
/// matching spec.md §4.2's "sends are synchronous".
pub fn send_message<S: Write>(stream: &mut S, message: Message) -> io::Result<()> {
    let buf = message.encode();
    let mut written = 0;
    while written < buf.len() {
        match stream.write(&buf[written..]) {
            Ok(0) => return Err(io::Error::from(io::ErrorKind::WriteZero)),
            Ok(n) => written += n,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => continue,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Accumulates partial reads of a non-blocking stream into whole 8-byte
/// control messages. A single `read()` on a non-blocking socket may return
/// fewer than 8 bytes; `read_exact` would discard that partial progress on
/// the next `WouldBlock`, so the in-progress bytes are kept here across
/// calls instead.
#[derive(Debug, Default)]
pub struct MessageReader {
    buf: [u8; MESSAGE_LEN],
    filled: usize,
}

impl MessageReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempts to complete one message from whatever `stream` has
    /// buffered right now. Returns `Ok(None)` on `WouldBlock` with no
    /// message yet assembled.
    pub fn try_read<S: Read>(&mut self, stream: &mut S) -> io::Result<Option<Message>> {
        loop {
            match stream.read(&mut self.buf[self.filled..]) {
                Ok(0) => return Err(io::Error::from(io::ErrorKind::ConnectionReset)),
                Ok(n) => {
                    self.filled += n;
                    if self.filled == MESSAGE_LEN {
                        let message = Message::decode(&self.buf);
                        self.filled = 0;
                        return Ok(Some(message));
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(None),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

/// Waits up to `timeout` for `source` to become readable. Returns `true`
/// if it did, `false` on timeout. Used by the single-socket calibration
/// loops (C4) where only one source is registered at a time.
pub fn wait_readable<S>(
    poll: &mut Poll,
    events: &mut Events,
    source: &mut S,
    token: Token,
    timeout: Duration,
) -> io::Result<bool>
where
    S: mio::event::Source,
{
    poll.registry()
        .reregister(source, token, Interest::READABLE)?;
    match poll.poll(events, Some(timeout)) {
        Ok(()) => Ok(events.iter().any(|e| e.token() == token && e.is_readable())),
        Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok(false),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_encode_decode() {
        let m = Message::new(ControlCode::RttSync, 42);
        let buf = m.encode();
        assert_eq!(Message::decode(&buf), m);
    }

    #[test]
    fn matches_checks_the_code() {
        let m = Message::new(ControlCode::TrainSent, 0);
        assert!(m.matches(ControlCode::TrainSent));
        assert!(!m.matches(ControlCode::TrainSend));
    }

    #[test]
    fn wire_layout_is_big_endian() {
        let m = Message::new(ControlCode::SessionInit, 0x0102_0304);
        let buf = m.encode();
        assert_eq!(&buf[4..8], &[0x01, 0x02, 0x03, 0x04]);
    }
}
