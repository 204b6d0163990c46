//! Atomic Spectra Monochromator command catalogue.
//!
//! Protocol overview:
//! - Format: ASCII command/response over RS-232
//! - Outbound frame: `<verb[,arg]>`; no trailing newline
//! - Inbound frame: one text line terminated by `\r\n`
//! - Commands: `home`, `set_control,MODE`, `set_direction,0|1`
//! - Queries: `get_calibration`, `get_control`, `get_direction`,
//!   `get_position`, `get_pmt`
//!
//! Every operation is one write followed by at most one blocking read. An
//! empty reply to a status query is the firmware's "still homing" signal and
//! is passed through as-is rather than being mapped to a distinct busy code.
//!
//! # Example
//!
//! ```no_run
//! use monochromator::{ConnectionSettings, ControlMode, Monochromator};
//!
//! fn main() -> anyhow::Result<()> {
//!     let settings = ConnectionSettings::new("/dev/ttyUSB0");
//!     let mut mono = Monochromator::connect(&settings)?;
//!
//!     mono.set_control(ControlMode::Computer)?;
//!     if mono.home()? {
//!         println!("homing started");
//!     }
//!     println!("position: {}", mono.get_position()?);
//!
//!     mono.disconnect();
//!     Ok(())
//! }
//! ```

use crate::config::ConnectionSettings;
use crate::connection::{Connection, ConnectionState};
use crate::error::{MonoError, MonoResult};
use crate::transport::Transport;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Reply the firmware sends when a `home` command is accepted.
const HOMING_REPLY: &str = "HOMING";

/// Calibration status placeholder reported in simulation mode.
const SIM_CALIBRATION: &str = "SIMULATION";

/// Who is allowed to drive the monochromator motor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlMode {
    /// The physical knobs on the instrument.
    FrontPanel,
    /// This computer interface.
    Computer,
}

impl ControlMode {
    /// The string sent over the wire for this mode.
    pub fn as_wire(self) -> &'static str {
        match self {
            ControlMode::FrontPanel => "FRONT_PANEL",
            ControlMode::Computer => "COMPUTER",
        }
    }
}

impl fmt::Display for ControlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

impl FromStr for ControlMode {
    type Err = MonoError;

    /// Parses the wire form. Anything outside the enumerated set is an
    /// [`MonoError::InvalidArgument`], reported before any I/O can happen.
    fn from_str(s: &str) -> MonoResult<Self> {
        match s {
            "FRONT_PANEL" => Ok(ControlMode::FrontPanel),
            "COMPUTER" => Ok(ControlMode::Computer),
            other => Err(MonoError::InvalidArgument(format!(
                "{other:?} is not a valid control mode (expected FRONT_PANEL or COMPUTER)"
            ))),
        }
    }
}

/// Deterministic stand-in device used while in simulation mode.
///
/// Settable state is stored and read back so a UI driven against the
/// simulation behaves coherently; the PMT reading follows a slow sine so
/// plots move without pulling in an RNG.
struct SimDevice {
    control: ControlMode,
    reverse: bool,
    position: i32,
    pmt_phase: f64,
}

impl SimDevice {
    fn new() -> Self {
        Self {
            control: ControlMode::FrontPanel,
            reverse: false,
            position: 0,
            pmt_phase: 0.0,
        }
    }

    /// Next digitized PMT value, midscale sine on a 12-bit range.
    fn next_pmt(&mut self) -> u32 {
        self.pmt_phase += 0.1;
        let normalized = (self.pmt_phase.sin() + 1.0) / 2.0;
        (normalized * 4095.0).round() as u32
    }
}

/// Commands-only handle for the Atomic Spectra Monochromator.
///
/// Each operation validates its arguments, performs one framed write (plus
/// one blocking read for queries), and converts the raw reply into a typed
/// value. In simulation mode arguments are still validated but no transport
/// I/O happens and stubbed values are returned instead.
pub struct Monochromator {
    conn: Connection,
    sim: SimDevice,
}

impl Monochromator {
    /// Connects using the given settings.
    ///
    /// Falls back to simulation mode when the sentinel port is selected or
    /// the physical open fails; check [`Monochromator::simulation_mode`] to
    /// adjust presentation.
    ///
    /// # Errors
    ///
    /// Only settings validation can fail; see
    /// [`ConnectionSettings::validate`].
    pub fn connect(settings: &ConnectionSettings) -> MonoResult<Self> {
        Ok(Self::from_connection(Connection::open(settings)?))
    }

    /// Creates a handle directly in simulation mode.
    pub fn simulation() -> Self {
        Self::from_connection(Connection::simulation())
    }

    /// Creates a handle over an arbitrary transport, e.g. a
    /// [`crate::transport::MockTransport`] scripted with device replies.
    pub fn with_transport(transport: Box<dyn Transport>, timeout: Duration) -> Self {
        Self::from_connection(Connection::from_transport(transport, timeout))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn,
            sim: SimDevice::new(),
        }
    }

    /// Whether operations are served by the simulation stub instead of
    /// hardware.
    pub fn simulation_mode(&self) -> bool {
        self.conn.is_simulation()
    }

    /// Current connection lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.conn.state()
    }

    /// Starts the homing routine.
    ///
    /// Returns `true` iff the firmware acknowledged with exactly `HOMING`;
    /// any other reply, including an empty or timed-out one, yields `false`.
    ///
    /// # Errors
    ///
    /// [`MonoError::NotConnected`] or [`MonoError::Io`].
    pub fn home(&mut self) -> MonoResult<bool> {
        if self.simulation_mode() {
            self.sim.position = 0;
            return Ok(true);
        }
        match self.conn.query("home") {
            Ok(reply) => Ok(reply == HOMING_REPLY),
            Err(MonoError::Timeout { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Reads the current calibration/operation status line.
    ///
    /// While the instrument is homing it does not answer, so a timed-out
    /// read returns the (possibly empty) partial text instead of failing;
    /// poll loops treat an empty status as "still busy".
    ///
    /// # Errors
    ///
    /// [`MonoError::NotConnected`] or [`MonoError::Io`].
    pub fn get_calibration(&mut self) -> MonoResult<String> {
        if self.simulation_mode() {
            return Ok(SIM_CALIBRATION.to_string());
        }
        self.lenient_query("get_calibration")
    }

    /// Reads the absolute motor position.
    ///
    /// # Errors
    ///
    /// [`MonoError::Parse`] if the reply is empty or non-numeric (never
    /// silently zero), [`MonoError::Timeout`] if no terminator arrived,
    /// plus the usual connection errors.
    pub fn get_position(&mut self) -> MonoResult<i32> {
        if self.simulation_mode() {
            return Ok(self.sim.position);
        }
        let reply = self.conn.query("get_position")?;
        parse_reply(&reply, "integer position")
    }

    /// Reads the digitized photomultiplier-tube voltage
    /// (`0..=2^bit_depth - 1`).
    ///
    /// # Errors
    ///
    /// As [`Monochromator::get_position`].
    pub fn get_pmt(&mut self) -> MonoResult<u32> {
        if self.simulation_mode() {
            return Ok(self.sim.next_pmt());
        }
        let reply = self.conn.query("get_pmt")?;
        parse_reply(&reply, "PMT reading")
    }

    /// Hands motor control to the front panel or to this computer.
    ///
    /// Fire-and-forget: one write, no reply expected. Invalid modes are
    /// unrepresentable here; parsing user input through
    /// [`ControlMode::from_str`] rejects them before this method can be
    /// reached, leaving the device mode unchanged.
    ///
    /// # Errors
    ///
    /// [`MonoError::NotConnected`] or [`MonoError::Io`].
    pub fn set_control(&mut self, mode: ControlMode) -> MonoResult<()> {
        if self.simulation_mode() {
            self.sim.control = mode;
            return Ok(());
        }
        self.conn.send(&format!("set_control,{mode}"))
    }

    /// Reads the current control mode as reported by the firmware.
    ///
    /// Returned raw (like [`Monochromator::get_calibration`]) because the
    /// firmware answers with a status-style line.
    ///
    /// # Errors
    ///
    /// [`MonoError::NotConnected`] or [`MonoError::Io`].
    pub fn get_control(&mut self) -> MonoResult<String> {
        if self.simulation_mode() {
            return Ok(self.sim.control.as_wire().to_string());
        }
        self.lenient_query("get_control")
    }

    /// Sets the motor direction. `false` is forward, `true` is backward.
    ///
    /// # Errors
    ///
    /// [`MonoError::NotConnected`] or [`MonoError::Io`].
    pub fn set_direction(&mut self, reverse: bool) -> MonoResult<()> {
        if self.simulation_mode() {
            self.sim.reverse = reverse;
            return Ok(());
        }
        self.conn.send(&format!("set_direction,{}", u8::from(reverse)))
    }

    /// Reads the motor direction. `false` is forward, `true` is backward.
    ///
    /// # Errors
    ///
    /// [`MonoError::Parse`] on a reply other than `0`/`1`, plus the usual
    /// connection errors.
    pub fn get_direction(&mut self) -> MonoResult<bool> {
        if self.simulation_mode() {
            return Ok(self.sim.reverse);
        }
        let reply = self.conn.query("get_direction")?;
        match reply.trim() {
            "0" => Ok(false),
            "1" => Ok(true),
            _ => Err(MonoError::Parse {
                reply,
                expected: "direction flag (0 or 1)",
            }),
        }
    }

    /// Discards stale bytes queued on the input side.
    ///
    /// Poll loops call this before [`Monochromator::get_calibration`] so a
    /// late reply from an earlier timed-out exchange cannot shift the
    /// framing of the next one.
    ///
    /// # Errors
    ///
    /// [`MonoError::NotConnected`] or [`MonoError::Io`].
    pub fn drain_input(&mut self) -> MonoResult<()> {
        self.conn.drain_input()
    }

    /// Closes the serial channel. Safe to call repeatedly.
    pub fn disconnect(&mut self) {
        self.conn.disconnect();
    }

    /// Status-style query: a timed-out read yields the partial (possibly
    /// empty) text rather than an error.
    fn lenient_query(&mut self, command: &str) -> MonoResult<String> {
        match self.conn.query(command) {
            Ok(reply) => Ok(reply),
            Err(MonoError::Timeout { partial }) => Ok(partial),
            Err(e) => Err(e),
        }
    }
}

/// Parses a reply into a number, refusing to coerce bad text to a default.
fn parse_reply<T: FromStr>(reply: &str, expected: &'static str) -> MonoResult<T> {
    reply.trim().parse().map_err(|_| MonoError::Parse {
        reply: reply.to_string(),
        expected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_mode_wire_forms() {
        assert_eq!(ControlMode::FrontPanel.to_string(), "FRONT_PANEL");
        assert_eq!(ControlMode::Computer.to_string(), "COMPUTER");
    }

    #[test]
    fn test_control_mode_parses_wire_forms() {
        assert_eq!(
            "FRONT_PANEL".parse::<ControlMode>().unwrap(),
            ControlMode::FrontPanel
        );
        assert_eq!(
            "COMPUTER".parse::<ControlMode>().unwrap(),
            ControlMode::Computer
        );
    }

    #[test]
    fn test_control_mode_rejects_unknown_strings() {
        for bad in ["computer", "BOTH", "", "FRONT PANEL"] {
            assert!(matches!(
                bad.parse::<ControlMode>(),
                Err(MonoError::InvalidArgument(_))
            ));
        }
    }

    #[test]
    fn test_parse_reply_rejects_garbage() {
        let err = parse_reply::<i32>("abc", "integer position").unwrap_err();
        assert!(matches!(err, MonoError::Parse { .. }));
    }

    #[test]
    fn test_parse_reply_rejects_empty() {
        assert!(parse_reply::<i32>("", "integer position").is_err());
    }

    #[test]
    fn test_parse_reply_accepts_surrounding_whitespace() {
        let value: i32 = parse_reply(" 42 ", "integer position").unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn test_sim_device_pmt_is_deterministic() {
        let mut a = SimDevice::new();
        let mut b = SimDevice::new();
        for _ in 0..10 {
            assert_eq!(a.next_pmt(), b.next_pmt());
        }
    }

    #[test]
    fn test_sim_device_pmt_stays_in_adc_range() {
        let mut sim = SimDevice::new();
        for _ in 0..100 {
            assert!(sim.next_pmt() <= 4095);
        }
    }
}
