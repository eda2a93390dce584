//! Transport abstraction over the serial port.
//!
//! The link manager only ever talks to a [`Transport`], so link behaviour
//! can be tested against a scripted implementation without hardware.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::io::{Read, Write};
use std::time::Duration;

use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};
use thiserror::Error;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Byte-stream transport to the microcontroller.
pub trait Transport: Send {
    /// Number of bytes waiting to be read without blocking.
    fn bytes_to_read(&mut self) -> Result<usize, TransportError>;

    /// Read into `buf`, returning the number of bytes read. A read timeout
    /// is not a fault and is reported as `Ok(0)`.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError>;

    /// Write `data`, returning the number of bytes written.
    fn write(&mut self, data: &[u8]) -> Result<usize, TransportError>;

    /// Discard any bytes held in the host's input and output buffers.
    fn clear_buffers(&mut self) -> Result<(), TransportError>;
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Serial port error: {0}")]
    SerialError(#[from] serialport::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

/// [`Transport`] backed by a real serial port.
pub struct SerialPortTransport {
    port: Box<dyn SerialPort>,

    read_timeout: Duration,

    write_timeout: Duration,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SerialPortTransport {
    /// Open the named port in 8N1 mode with no flow control.
    pub fn open(
        port_name: &str,
        baud: u32,
        timeout_s: f64,
        write_timeout_s: f64,
    ) -> Result<Self, TransportError> {
        let read_timeout = Duration::from_secs_f64(timeout_s);

        let port = serialport::new(port_name, baud)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(read_timeout)
            .open()?;

        Ok(Self {
            port,
            read_timeout,
            write_timeout: Duration::from_secs_f64(write_timeout_s),
        })
    }
}

impl Transport for SerialPortTransport {
    fn bytes_to_read(&mut self) -> Result<usize, TransportError> {
        Ok(self.port.bytes_to_read()? as usize)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        // The port holds a single timeout, so it is set per operation to
        // honour the separate read and write timeout parameters.
        self.port.set_timeout(self.read_timeout)?;

        match self.port.read(buf) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, TransportError> {
        self.port.set_timeout(self.write_timeout)?;

        Ok(self.port.write(data)?)
    }

    fn clear_buffers(&mut self) -> Result<(), TransportError> {
        Ok(self.port.clear(ClearBuffer::All)?)
    }
}
