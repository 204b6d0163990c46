//! Byte-channel abstraction under the connection layer.
//!
//! [`Transport`] is the seam between the protocol logic and the physical
//! serial port: anything that can read and write bytes and discard stale
//! input qualifies. The real implementation is `serialport`'s boxed port;
//! [`MockTransport`] provides a scripted stand-in for tests and for callers
//! that want to exercise the full facade without hardware.

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex, MutexGuard};

/// A half-duplex byte channel to the instrument.
///
/// Supertraits supply blocking reads and writes; `drain_input` discards any
/// unread bytes queued on the receive side, used before polling so stale
/// bytes from a timed-out exchange never corrupt the next parse.
pub trait Transport: Read + Write + Send {
    /// Discards any unread bytes queued on the input side.
    fn drain_input(&mut self) -> io::Result<()>;
}

#[cfg(feature = "instrument_serial")]
impl Transport for Box<dyn serialport::SerialPort> {
    fn drain_input(&mut self) -> io::Result<()> {
        self.clear(serialport::ClearBuffer::Input)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
    }
}

#[derive(Default)]
struct MockState {
    /// Replies waiting to be read, oldest first. Raw bytes, terminator and all.
    replies: VecDeque<Vec<u8>>,
    /// Every byte written to the transport, in order.
    written: Vec<u8>,
}

/// Scripted in-memory transport.
///
/// Writes are captured for inspection; reads serve queued reply bytes one at
/// a time and report a read timeout once the script is exhausted, which is
/// exactly how a silent serial port behaves. Clones share state, so a test
/// can keep one handle while the connection owns the other.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// Creates an empty transport with no scripted replies.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        // A poisoned mock just means a test thread panicked mid-exchange;
        // the byte queues are still usable.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Queues raw reply bytes exactly as the device would send them.
    pub fn push_reply(&self, raw: &[u8]) {
        self.state().replies.push_back(raw.to_vec());
    }

    /// Queues a reply line, appending the `\r\n` terminator.
    pub fn push_line(&self, line: &str) {
        let mut raw = line.as_bytes().to_vec();
        raw.extend_from_slice(b"\r\n");
        self.state().replies.push_back(raw);
    }

    /// Returns a copy of every byte written so far.
    pub fn written(&self) -> Vec<u8> {
        self.state().written.clone()
    }

    /// Returns the bytes written so far and clears the capture buffer.
    pub fn take_written(&self) -> Vec<u8> {
        std::mem::take(&mut self.state().written)
    }

    /// Number of scripted replies not yet consumed.
    pub fn pending_replies(&self) -> usize {
        self.state().replies.len()
    }
}

impl Read for MockTransport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let mut state = self.state();
        while matches!(state.replies.front(), Some(chunk) if chunk.is_empty()) {
            state.replies.pop_front();
        }
        match state.replies.front_mut() {
            Some(chunk) => {
                let n = buf.len().min(chunk.len());
                buf[..n].copy_from_slice(&chunk[..n]);
                chunk.drain(..n);
                Ok(n)
            }
            None => Err(io::Error::new(
                io::ErrorKind::TimedOut,
                "no scripted reply available",
            )),
        }
    }
}

impl Write for MockTransport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.state().written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Transport for MockTransport {
    fn drain_input(&mut self) -> io::Result<()> {
        self.state().replies.clear();
        Ok(())
    }
}
