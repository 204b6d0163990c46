/*
 * Monochromator Discovery Tool
 *
 * Scans all available serial ports and probes each one for the Atomic
 * Spectra monochromator by sending a safe identification query.
 *
 * Do not run this scan while an experiment is driving the instrument: the
 * probe shares the port and its bytes would interleave with the live
 * request/reply exchange. Run it once at startup or from a manual
 * configuration step.
 */

use anyhow::Context;
use monochromator::{ports, protocol, ControlMode, SUPPORTED_BAUD_RATES};
use std::io::Write;
use std::time::Duration;

/// The probe is a plain `get_control` query: harmless to the motor, and
/// only the monochromator firmware answers it with a control-mode string.
const PROBE_COMMAND: &str = "get_control";

fn main() -> anyhow::Result<()> {
    env_logger::init();

    println!("Scanning serial ports for an Atomic Spectra monochromator...");

    let ports = ports::available_ports().context("Failed to enumerate serial ports")?;
    if ports.is_empty() {
        println!("No serial ports detected on this system.");
        return Ok(());
    }

    for port in ports {
        println!("Checking {} ({})", port.name, port.description);

        let mut identified = false;
        for &baud in &SUPPORTED_BAUD_RATES {
            if let Some(mode) = probe(&port.name, baud) {
                println!(
                    "  FOUND: monochromator on {} at {} baud (control mode: {})",
                    port.name, baud, mode
                );
                identified = true;
                break;
            }
        }

        if !identified {
            println!("  (unknown device or no response)");
        }
    }

    Ok(())
}

/// Probes one port at one baud rate.
///
/// Opens the port, discards stale buffer contents, sends the framed probe,
/// and accepts any reply that parses as a control mode. Every failure path
/// is a quiet `None` so the scan can move on.
fn probe(port_name: &str, baud_rate: u32) -> Option<ControlMode> {
    let mut port = serialport::new(port_name, baud_rate)
        .timeout(Duration::from_millis(100))
        .open()
        .ok()?;

    // Discard any stale data in the buffers
    port.clear(serialport::ClearBuffer::All).ok()?;

    port.write_all(&protocol::frame(PROBE_COMMAND)).ok()?;

    let reply = protocol::read_reply(&mut port, Duration::from_millis(750)).ok()?;
    reply.trim().parse::<ControlMode>().ok()
}
