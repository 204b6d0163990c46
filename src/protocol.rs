//! Wire-level framing for the monochromator serial protocol.
//!
//! Outbound commands are wrapped between a left marker (`<`) and a right
//! marker (`>`) with no trailing newline. Inbound replies are ASCII text
//! terminated by `\r\n`; the terminator is stripped before the text is
//! handed back to the caller.
//!
//! The protocol is a strict half-duplex request/response exchange: one write
//! must be followed by exactly one read before the next write. There is no
//! pipelining and no sequence numbering, so concurrent callers must
//! serialize access externally or the framing bytes will interleave.
//!
//! Marker characters are not escaped. Command verbs and arguments must not
//! themselves contain `<` or `>`, matching the instrument firmware contract.

use crate::error::{MonoError, MonoResult};
use log::debug;
use std::io::{ErrorKind, Read};
use std::time::{Duration, Instant};

/// Marker prepended to every outbound command.
pub const LEFT_MARKER: char = '<';

/// Marker appended to every outbound command.
pub const RIGHT_MARKER: char = '>';

/// Terminator the instrument appends to every reply.
pub const REPLY_TERMINATOR: &[u8] = b"\r\n";

/// Wraps a raw command string in the outbound frame markers and encodes it
/// for transmission.
///
/// `command` is the verb plus any comma-separated arguments, e.g.
/// `set_direction,1`. It must not contain the marker characters.
pub fn frame(command: &str) -> Vec<u8> {
    format!("{LEFT_MARKER}{command}{RIGHT_MARKER}").into_bytes()
}

/// Strips the frame markers from an encoded command, returning the original
/// command text.
///
/// Returns `None` if the bytes are not a single well-formed frame.
pub fn unframe(framed: &[u8]) -> Option<&str> {
    let text = std::str::from_utf8(framed).ok()?;
    text.strip_prefix(LEFT_MARKER)?.strip_suffix(RIGHT_MARKER)
}

/// Reads one reply line from `reader`, blocking until the `\r\n` terminator
/// is observed or `timeout` elapses.
///
/// The terminator is stripped from the returned text. Bytes are consumed one
/// at a time so anything after the terminator stays queued for the next
/// exchange. Transport-level read timeouts (`TimedOut`/`WouldBlock`) are
/// treated as "no data yet" and retried until the overall deadline.
///
/// # Errors
///
/// - [`MonoError::Timeout`] if the deadline passes without a terminator; the
///   variant carries whatever partial text arrived, which callers polling a
///   busy instrument treat as "no answer yet".
/// - [`MonoError::Io`] on transport failure or unexpected end of stream.
pub fn read_reply<R: Read + ?Sized>(reader: &mut R, timeout: Duration) -> MonoResult<String> {
    let start = Instant::now();
    let mut received: Vec<u8> = Vec::new();
    let mut byte = [0u8; 1];

    loop {
        if received.ends_with(REPLY_TERMINATOR) {
            received.truncate(received.len() - REPLY_TERMINATOR.len());
            let reply = String::from_utf8_lossy(&received).into_owned();
            debug!("Received reply: {reply:?}");
            return Ok(reply);
        }

        if start.elapsed() > timeout {
            let partial = String::from_utf8_lossy(&received).into_owned();
            debug!("Reply timed out after {timeout:?} (partial: {partial:?})");
            return Err(MonoError::Timeout { partial });
        }

        match reader.read(&mut byte) {
            Ok(1) => received.push(byte[0]),
            Ok(0) => {
                // EOF - shouldn't happen with serial ports
                return Err(MonoError::Io(std::io::Error::new(
                    ErrorKind::UnexpectedEof,
                    "serial stream closed while waiting for reply",
                )));
            }
            Ok(_) => unreachable!("read into single-byte buffer returned >1"),
            Err(e) if e.kind() == ErrorKind::TimedOut || e.kind() == ErrorKind::WouldBlock => {
                // Transport poll timeout is shorter than our overall deadline
                continue;
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
}
