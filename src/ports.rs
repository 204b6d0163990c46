//! Serial port enumeration for an external port picker.
//!
//! The facade makes no selection decisions: this module only reports what
//! the system has, as `(device id, human-readable description)` pairs, and
//! the caller's UI decides (typically appending its own "Simulation" row).

use crate::error::MonoResult;

/// One system serial port, as shown in a picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    /// Device id to pass to [`crate::ConnectionSettings`] (e.g.
    /// "/dev/ttyUSB0", "COM4").
    pub name: String,
    /// Human-readable description for display.
    pub description: String,
}

/// Lists the serial ports available on this system.
///
/// With serial support compiled out the list is empty, matching the
/// original behavior when no serial library is installed.
///
/// # Errors
///
/// [`crate::MonoError::Io`] if the system enumeration fails.
#[cfg(feature = "instrument_serial")]
pub fn available_ports() -> MonoResult<Vec<PortInfo>> {
    let ports = serialport::available_ports()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    Ok(ports
        .into_iter()
        .map(|p| PortInfo {
            description: describe(&p.port_type),
            name: p.port_name,
        })
        .collect())
}

/// Lists the serial ports available on this system.
///
/// With serial support compiled out the list is empty, matching the
/// original behavior when no serial library is installed.
#[cfg(not(feature = "instrument_serial"))]
pub fn available_ports() -> MonoResult<Vec<PortInfo>> {
    Ok(Vec::new())
}

#[cfg(feature = "instrument_serial")]
fn describe(port_type: &serialport::SerialPortType) -> String {
    use serialport::SerialPortType;

    match port_type {
        SerialPortType::UsbPort(usb) => {
            match (usb.product.as_deref(), usb.manufacturer.as_deref()) {
                (Some(product), Some(manufacturer)) => format!("{product} ({manufacturer})"),
                (Some(product), None) => product.to_string(),
                (None, Some(manufacturer)) => format!("{manufacturer} USB serial device"),
                (None, None) => format!("USB serial device {:04x}:{:04x}", usb.vid, usb.pid),
            }
        }
        SerialPortType::PciPort => "PCI serial port".to_string(),
        SerialPortType::BluetoothPort => "Bluetooth serial port".to_string(),
        SerialPortType::Unknown => "Serial port".to_string(),
    }
}
