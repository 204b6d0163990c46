//! Connection lifecycle for the monochromator serial channel.
//!
//! A [`Connection`] owns the transport handle exclusively and moves through
//! the states `Disconnected -> Connecting -> {Simulation | Connected} ->
//! Disconnected`. `Connecting` is transient and only exists inside
//! [`Connection::open`]: it resolves to `Simulation` when the sentinel port
//! is selected or the physical open fails, and to `Connected` on success.
//!
//! Opening failures never propagate out of `open` - the instrument must stay
//! usable (in simulation) when hardware is missing - so the fallback is an
//! explicit success variant rather than a caught exception. The transport is
//! closed by dropping it; `disconnect` replaces the channel with an explicit
//! closed sentinel, which makes a second call a no-op.

use crate::config::{ConnectionSettings, SIMULATION_PORT};
use crate::error::{MonoError, MonoResult};
use crate::protocol;
use crate::transport::Transport;
use log::{debug, info, warn};
use std::time::Duration;

/// How long a single transport-level read may block before the overall reply
/// deadline is rechecked.
#[cfg(feature = "instrument_serial")]
const PORT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Observable lifecycle state of a [`Connection`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    /// No channel; every operation fails with `NotConnected`.
    Disconnected,
    /// Stubbed channel; writes are no-ops and reads return empty text.
    Simulation,
    /// Physical serial channel with the full protocol active.
    Connected,
}

enum Channel {
    /// Explicit closed sentinel, so a second disconnect never double-closes.
    Closed,
    Simulation,
    Open(Box<dyn Transport>),
}

/// An open (or simulated) serial channel to the monochromator.
///
/// The handle is owned exclusively and never aliased; it is released on
/// every exit path because dropping the boxed transport closes the port.
/// The protocol is strict request/reply, so callers sharing a `Connection`
/// across threads must serialize access externally.
pub struct Connection {
    channel: Channel,
    port_name: String,
    timeout: Duration,
}

impl Connection {
    /// Opens the channel described by `settings`.
    ///
    /// The sentinel port [`SIMULATION_PORT`] selects simulation mode without
    /// touching any hardware. A physical open that fails (device absent,
    /// permission denied, wrong baud) is logged and also lands in simulation
    /// mode. After a successful open the configured settle delay is awaited
    /// so the controller can finish its boot/setup loop.
    ///
    /// # Errors
    ///
    /// Only settings validation can fail here; see
    /// [`ConnectionSettings::validate`].
    pub fn open(settings: &ConnectionSettings) -> MonoResult<Self> {
        settings.validate()?;

        if settings.is_simulation() {
            info!("Simulation port selected; not opening any hardware");
            return Ok(Self {
                channel: Channel::Simulation,
                port_name: settings.port.clone(),
                timeout: settings.timeout,
            });
        }

        #[cfg(feature = "instrument_serial")]
        {
            let poll = settings.timeout.min(PORT_POLL_INTERVAL);
            match serialport::new(&settings.port, settings.baud_rate)
                .timeout(poll)
                .open()
            {
                Ok(port) => {
                    info!(
                        "Serial port '{}' opened at {} baud",
                        settings.port, settings.baud_rate
                    );
                    // Give the controller time to run its setup loop before
                    // the first command.
                    std::thread::sleep(settings.settle_delay);
                    Ok(Self {
                        channel: Channel::Open(Box::new(port)),
                        port_name: settings.port.clone(),
                        timeout: settings.timeout,
                    })
                }
                Err(e) => {
                    warn!(
                        "Could not open '{}' at {} baud: {}. Entering simulation mode.",
                        settings.port, settings.baud_rate, e
                    );
                    Ok(Self {
                        channel: Channel::Simulation,
                        port_name: settings.port.clone(),
                        timeout: settings.timeout,
                    })
                }
            }
        }

        #[cfg(not(feature = "instrument_serial"))]
        {
            warn!(
                "Serial support not enabled (feature `instrument_serial`); \
                 entering simulation mode for '{}'",
                settings.port
            );
            Ok(Self {
                channel: Channel::Simulation,
                port_name: settings.port.clone(),
                timeout: settings.timeout,
            })
        }
    }

    /// Creates a connection directly in simulation mode.
    pub fn simulation() -> Self {
        Self {
            channel: Channel::Simulation,
            port_name: SIMULATION_PORT.to_string(),
            timeout: ConnectionSettings::default().timeout,
        }
    }

    /// Creates a connected channel over an arbitrary transport.
    ///
    /// Used by tests and by callers bringing their own byte channel (e.g. a
    /// [`crate::transport::MockTransport`]).
    pub fn from_transport(transport: Box<dyn Transport>, timeout: Duration) -> Self {
        Self {
            channel: Channel::Open(transport),
            port_name: "custom".to_string(),
            timeout,
        }
    }

    /// The port this connection was opened against (or asked to open, when
    /// it fell back to simulation).
    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        match self.channel {
            Channel::Closed => ConnectionState::Disconnected,
            Channel::Simulation => ConnectionState::Simulation,
            Channel::Open(_) => ConnectionState::Connected,
        }
    }

    /// Whether the channel is stubbed rather than physical.
    pub fn is_simulation(&self) -> bool {
        self.state() == ConnectionState::Simulation
    }

    /// Frames `command` and writes it to the channel.
    ///
    /// A no-op in simulation mode.
    ///
    /// # Errors
    ///
    /// [`MonoError::NotConnected`] after `disconnect`, or [`MonoError::Io`]
    /// on a transport write failure.
    pub fn send(&mut self, command: &str) -> MonoResult<()> {
        match &mut self.channel {
            Channel::Closed => Err(MonoError::NotConnected),
            Channel::Simulation => Ok(()),
            Channel::Open(transport) => {
                transport.write_all(&protocol::frame(command))?;
                transport.flush()?;
                debug!("Sent command: {command}");
                Ok(())
            }
        }
    }

    /// Sends `command` and blocks for one reply line.
    ///
    /// In simulation mode the reply is deterministic empty text; typed
    /// placeholder values live in the facade above.
    ///
    /// # Errors
    ///
    /// As [`Connection::send`], plus [`MonoError::Timeout`] when no
    /// terminator arrives within the configured window.
    pub fn query(&mut self, command: &str) -> MonoResult<String> {
        self.send(command)?;
        match &mut self.channel {
            Channel::Closed => Err(MonoError::NotConnected),
            Channel::Simulation => Ok(String::new()),
            Channel::Open(transport) => protocol::read_reply(transport.as_mut(), self.timeout),
        }
    }

    /// Discards any unread bytes queued on the input side.
    ///
    /// Poll loops call this before a status query so stale bytes from an
    /// earlier timed-out exchange never corrupt the next parse.
    ///
    /// # Errors
    ///
    /// [`MonoError::NotConnected`] after `disconnect`, or [`MonoError::Io`]
    /// if the transport cannot clear its buffer.
    pub fn drain_input(&mut self) -> MonoResult<()> {
        match &mut self.channel {
            Channel::Closed => Err(MonoError::NotConnected),
            Channel::Simulation => Ok(()),
            Channel::Open(transport) => {
                transport.drain_input()?;
                Ok(())
            }
        }
    }

    /// Closes the channel and releases the transport handle.
    ///
    /// Safe to call repeatedly; once closed the connection stays in
    /// `Disconnected` and further operations fail with `NotConnected`.
    pub fn disconnect(&mut self) {
        if !matches!(self.channel, Channel::Closed) {
            debug!("Closing connection to '{}'", self.port_name);
        }
        // Dropping the previous channel closes the port exactly once.
        self.channel = Channel::Closed;
    }
}
