//! # Serial port discovery
//!
//! Identifies which of the host's serial ports the robot microcontroller is
//! most likely attached to, using substring hints matched against the port
//! name and any USB descriptor strings the host exposes.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serialport::{SerialPortInfo, SerialPortType};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Substrings identifying common hobby-grade USB-serial bridges.
const PORT_HINTS: [&str; 9] = [
    "Arduino",
    "CH340",
    "CP210",
    "FTDI",
    "USB Serial",
    "ttyACM",
    "ttyUSB",
    "usbmodem",
    "usbserial",
];

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Return the names of all serial ports currently present on the host.
pub fn list_serial_ports() -> Vec<String> {
    match serialport::available_ports() {
        Ok(ports) => ports.into_iter().map(|p| p.port_name).collect(),
        Err(_) => Vec::new(),
    }
}

/// Find the port the robot is most likely attached to.
///
/// The first port whose name or USB descriptor strings match one of the
/// hints is returned. If no port matches but at least one port exists the
/// first port is returned as a fallback, so a bench setup with a single
/// unrecognised adapter still works. Returns `None` only when the host has
/// no serial ports at all.
pub fn find_robot_port() -> Option<String> {
    let ports = match serialport::available_ports() {
        Ok(ports) => ports,
        Err(_) => return None,
    };

    for port in &ports {
        if matches_hint(&describe_port(port)) {
            return Some(port.port_name.clone());
        }
    }

    ports.first().map(|p| p.port_name.clone())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Collect the searchable text for a port: its name plus, for USB devices,
/// the product and manufacturer strings.
fn describe_port(info: &SerialPortInfo) -> String {
    let mut text = info.port_name.clone();

    if let SerialPortType::UsbPort(usb) = &info.port_type {
        if let Some(product) = &usb.product {
            text.push(' ');
            text.push_str(product);
        }
        if let Some(manufacturer) = &usb.manufacturer {
            text.push(' ');
            text.push_str(manufacturer);
        }
    }

    text
}

fn matches_hint(haystack: &str) -> bool {
    PORT_HINTS.iter().any(|hint| haystack.contains(hint))
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_hint_matching() {
        assert!(matches_hint("/dev/ttyACM0"));
        assert!(matches_hint("/dev/ttyUSB1 USB2.0-Serial QinHeng CH340"));
        assert!(matches_hint("/dev/cu.usbmodem14101 Arduino Uno"));
        assert!(matches_hint("COM3 Silicon Labs CP210x UART Bridge"));

        // Hints are case sensitive and must not match unrelated devices
        assert!(!matches_hint("/dev/ttyS0"));
        assert!(!matches_hint("/dev/cu.Bluetooth-Incoming-Port"));
        assert!(!matches_hint("arduino lowercase is not a match"));
    }
}
