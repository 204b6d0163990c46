//! Serial control library for the Atomic Spectra monochromator.
//!
//! The crate is split into a transport/protocol layer and a typed device
//! facade. [`Connection`] owns the serial channel (or its simulated
//! stand-in) and handles wire framing; [`Monochromator`] is the catalogue of
//! device operations (`home`, `get_position`, `set_control`, ...) that each
//! perform one framed write plus one blocking read.
//!
//! Connections that cannot be opened fall back to simulation mode so the
//! instrument stays usable without hardware; see
//! [`Monochromator::simulation_mode`]. Presentation (windows, styling,
//! refresh timers) is left to the caller, which is expected to drive the
//! facade from a single thread, one request at a time.

pub mod config;
pub mod connection;
pub mod device;
pub mod error;
pub mod ports;
pub mod protocol;
pub mod transport;

pub use config::{ConnectionSettings, SIMULATION_PORT, SUPPORTED_BAUD_RATES};
pub use connection::{Connection, ConnectionState};
pub use device::{ControlMode, Monochromator};
pub use error::{MonoError, MonoResult};
pub use ports::PortInfo;
pub use transport::{MockTransport, Transport};
