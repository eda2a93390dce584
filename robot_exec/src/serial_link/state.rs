//! Serial link state and tick logic.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use log::{debug, info, trace, warn};
use serde::Serialize;

use comms_if::{
    cmd::{DriveCommand, MechanismCommand},
    protocol,
    telemetry::{LinkState, LinkStats, Telemetry},
};

use crate::ports;

use super::params::Params;
use super::transport::{SerialPortTransport, Transport, TransportError};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Maximum number of bytes pulled off the transport in one read.
const READ_CHUNK_SIZE: usize = 512;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Manager for the serial connection to the robot microcontroller.
///
/// All state lives behind a mutex so the link can be shared between the main
/// loop and any status consumer.
pub struct SerialLink {
    inner: Mutex<LinkInner>,
}

/// Snapshot of link health for dashboard/debug display.
#[derive(Serialize, Debug, Clone)]
pub struct LinkStatusReport {
    pub state: LinkState,
    pub port: Option<String>,
    pub baud: Option<u32>,

    /// Age of the newest telemetry frame, if any has ever arrived.
    pub last_rx_age_s: Option<f64>,

    /// Smoothed rate estimates. `None` until two events have been seen.
    pub tick_hz: Option<f64>,
    pub rx_hz: Option<f64>,
    pub tx_hz: Option<f64>,

    pub tx_seq: u64,
    pub last_ack_seq: Option<i64>,
    pub bytes_tx: u64,
    pub bytes_rx: u64,

    pub rx_stale_s: f64,
    pub last_error: Option<String>,
}

/// The actual link state, manipulated through [`SerialLink`].
pub(crate) struct LinkInner {
    pub(crate) params: Params,

    /// The open transport, or `None` when disconnected.
    pub(crate) transport: Option<Box<dyn Transport>>,

    /// Newest decoded telemetry frame. Last write wins.
    pub(crate) latest_telemetry: Option<Telemetry>,

    pub(crate) stats: LinkStats,

    /// Bytes received but not yet terminated by a newline.
    pub(crate) line_buf: Vec<u8>,

    // Rate estimation state. Reset on close so a reconnected link does not
    // inherit rates measured across the gap.
    pub(crate) last_tick_time_s: Option<f64>,
    pub(crate) last_rx_event_time_s: Option<f64>,
    pub(crate) last_tx_event_time_s: Option<f64>,
    pub(crate) tick_hz_ema: Option<f64>,
    pub(crate) rx_hz_ema: Option<f64>,
    pub(crate) tx_hz_ema: Option<f64>,

    pub(crate) last_reconnect_attempt_s: Option<f64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SerialLink {
    /// Initialise the link. No port is opened until the first tick.
    pub fn new(params: Params) -> Self {
        Self {
            inner: Mutex::new(LinkInner::new(params)),
        }
    }

    /// Run one link tick: reconnect if needed, drain telemetry, and send the
    /// given commands as a single frame.
    ///
    /// Commands are only sent once at least one valid telemetry frame has
    /// been received on the current connection, so the firmware is known to
    /// be up before it is driven.
    pub fn tick(&self, drive: Option<&DriveCommand>, mech: Option<&MechanismCommand>) {
        self.lock().tick_at(util::time::monotonic_s(), drive, mech);
    }

    /// Close the port. Safe to call when already closed.
    pub fn close(&self) {
        self.lock().close();
    }

    pub fn is_connected(&self) -> bool {
        self.lock().stats.state == LinkState::Connected
    }

    /// Newest telemetry frame, if any has been received.
    pub fn latest_telemetry(&self) -> Option<Telemetry> {
        self.lock().latest_telemetry.clone()
    }

    pub fn status(&self) -> LinkStatusReport {
        self.lock().status_at(util::time::monotonic_s())
    }

    /// Acquire the inner state. A poisoned mutex still holds usable link
    /// state, so the poison is discarded rather than propagated.
    fn lock(&self) -> MutexGuard<LinkInner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl LinkInner {
    pub(crate) fn new(params: Params) -> Self {
        let mut stats = LinkStats::default();
        stats.baud = Some(params.baud);

        Self {
            params,
            transport: None,
            latest_telemetry: None,
            stats,
            line_buf: Vec::new(),
            last_tick_time_s: None,
            last_rx_event_time_s: None,
            last_tx_event_time_s: None,
            tick_hz_ema: None,
            rx_hz_ema: None,
            tx_hz_ema: None,
            last_reconnect_attempt_s: None,
        }
    }

    /// One full link tick at the given monotonic time.
    pub(crate) fn tick_at(
        &mut self,
        now_s: f64,
        drive: Option<&DriveCommand>,
        mech: Option<&MechanismCommand>,
    ) {
        // Tick cadence estimate, measured whether or not the link is up
        if let Some(inst_hz) = event_hz(self.last_tick_time_s, now_s) {
            self.tick_hz_ema = Some(ema_update(self.tick_hz_ema, inst_hz, self.params.hz_alpha));
        }
        self.last_tick_time_s = Some(now_s);

        if !self.params.comms_enabled {
            self.close();
            return;
        }

        if self.transport.is_none() {
            self.maybe_reconnect(now_s);
        }

        self.drain_reads(now_s);

        // Bootstrap gate: nothing is sent until telemetry proves the
        // firmware is alive on this connection
        if self.stats.last_rx_time_s.is_some() {
            if let (Some(drive), Some(mech)) = (drive, mech) {
                self.write_command(now_s, drive, mech);
            }
        }

        self.update_link_state(now_s);
    }

    /// Close the transport, resetting rate estimates and receive state but
    /// preserving lifetime counters (`bytes_*`, `tx_seq`).
    pub(crate) fn close(&mut self) {
        if self.transport.take().is_some() {
            info!("Serial port closed");
        }

        self.line_buf.clear();

        self.stats.state = LinkState::Disconnected;
        self.stats.last_tx_time_s = None;
        self.stats.last_rx_time_s = None;
        self.stats.last_ok_time_s = None;
        self.stats.last_error = None;

        self.last_tick_time_s = None;
        self.last_rx_event_time_s = None;
        self.last_tx_event_time_s = None;
        self.tick_hz_ema = None;
        self.rx_hz_ema = None;
        self.tx_hz_ema = None;
    }

    pub(crate) fn status_at(&self, now_s: f64) -> LinkStatusReport {
        LinkStatusReport {
            state: self.stats.state,
            port: self.stats.port.clone(),
            baud: self.stats.baud,
            last_rx_age_s: self.stats.last_rx_time_s.map(|t| now_s - t),
            tick_hz: self.tick_hz_ema,
            rx_hz: self.rx_hz_ema,
            tx_hz: self.tx_hz_ema,
            tx_seq: self.stats.tx_seq,
            last_ack_seq: self.stats.last_ack_seq,
            bytes_tx: self.stats.bytes_tx,
            bytes_rx: self.stats.bytes_rx,
            rx_stale_s: self.params.rx_stale_s,
            last_error: self.stats.last_error.clone(),
        }
    }

    /// Attempt to open the port, rate limited to one attempt per
    /// `reconnect_s`.
    fn maybe_reconnect(&mut self, now_s: f64) {
        if let Some(last_attempt_s) = self.last_reconnect_attempt_s {
            if now_s - last_attempt_s < self.params.reconnect_s {
                return;
            }
        }
        self.last_reconnect_attempt_s = Some(now_s);

        let port_name = match self.resolve_port() {
            Some(p) => p,
            None => {
                debug!("No serial port configured or discovered");
                self.stats.state = LinkState::Disconnected;
                return;
            }
        };

        self.stats.port = Some(port_name.clone());
        self.stats.baud = Some(self.params.baud);

        match SerialPortTransport::open(
            &port_name,
            self.params.baud,
            self.params.timeout_s,
            self.params.write_timeout_s,
        ) {
            Ok(mut transport) => {
                // Opening the port may reset the microcontroller. Drop any
                // boot noise so the first decoded line is a whole frame.
                if let Err(e) = transport.clear_buffers() {
                    warn!("Could not clear serial buffers: {}", e);
                }
                self.line_buf.clear();

                info!("Serial port {} open at {} baud", port_name, self.params.baud);

                self.transport = Some(Box::new(transport));
                self.stats.last_error = None;
                self.stats.state = LinkState::Connecting;
            }
            Err(e) => {
                warn!("Could not open serial port {}: {}", port_name, e);

                self.stats.last_error = Some(e.to_string());
                self.stats.state = LinkState::Error;
            }
        }
    }

    /// The configured port, or a discovered one if auto detection is on.
    fn resolve_port(&self) -> Option<String> {
        match &self.params.port {
            Some(port) => Some(port.clone()),
            None if self.params.auto_detect => ports::find_robot_port(),
            None => None,
        }
    }

    /// Read everything waiting on the transport and decode any complete
    /// telemetry lines.
    fn drain_reads(&mut self, now_s: f64) {
        loop {
            let chunk = match self.read_available() {
                Ok(Some(chunk)) if !chunk.is_empty() => chunk,
                Ok(_) => break,
                Err(e) => {
                    self.handle_transport_fault(&e);
                    return;
                }
            };

            self.stats.bytes_rx += chunk.len() as u64;
            self.line_buf.extend_from_slice(&chunk);
            self.process_lines(now_s);
        }
    }

    /// One read of up to `READ_CHUNK_SIZE` bytes, or `None` if nothing is
    /// waiting or no transport is open.
    fn read_available(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        let transport = match self.transport.as_mut() {
            Some(t) => t,
            None => return Ok(None),
        };

        let waiting = transport.bytes_to_read()?;
        if waiting == 0 {
            return Ok(None);
        }

        let mut buf = vec![0u8; waiting.min(READ_CHUNK_SIZE)];
        let num_read = transport.read(&mut buf)?;
        buf.truncate(num_read);

        Ok(Some(buf))
    }

    /// Decode every complete line in the buffer, keeping any trailing
    /// partial line for the next read.
    fn process_lines(&mut self, now_s: f64) {
        while let Some(newline_pos) = self.line_buf.iter().position(|&b| b == b'\n') {
            let raw_line: Vec<u8> = self.line_buf.drain(..=newline_pos).collect();
            let line = protocol::safe_decode_line(&raw_line);

            let mut telemetry = match protocol::decode_telemetry_line(&line) {
                Some(t) => t,
                None => {
                    if !line.trim().is_empty() {
                        trace!("Discarding undecodable line: {:?}", line.trim());
                    }
                    continue;
                }
            };

            telemetry.host_rx_time_s = now_s;
            telemetry.rx_age_s = Some(0.0);

            if let Some(inst_hz) = event_hz(self.last_rx_event_time_s, now_s) {
                self.rx_hz_ema = Some(ema_update(self.rx_hz_ema, inst_hz, self.params.hz_alpha));
            }
            self.last_rx_event_time_s = Some(now_s);

            self.stats.last_rx_time_s = Some(now_s);
            self.stats.last_ack_seq = Some(telemetry.ack_seq);
            self.latest_telemetry = Some(telemetry);
        }
    }

    /// Encode and send one command frame.
    fn write_command(&mut self, now_s: f64, drive: &DriveCommand, mech: &MechanismCommand) {
        if self.transport.is_none() {
            return;
        }

        // Sequence numbers count attempts: incremented even when the write
        // then fails
        self.stats.tx_seq += 1;

        let frame = protocol::encode_command_frame(
            self.stats.tx_seq,
            Utc::now().timestamp_millis(),
            drive,
            mech,
        );

        let result = match self.transport.as_mut() {
            Some(transport) => transport.write(&frame),
            None => return,
        };

        match result {
            Ok(num_written) => {
                self.stats.bytes_tx += num_written as u64;
                self.stats.last_tx_time_s = Some(now_s);

                if let Some(inst_hz) = event_hz(self.last_tx_event_time_s, now_s) {
                    self.tx_hz_ema =
                        Some(ema_update(self.tx_hz_ema, inst_hz, self.params.hz_alpha));
                }
                self.last_tx_event_time_s = Some(now_s);

                trace!("Sent command frame seq {}", self.stats.tx_seq);
            }
            Err(e) => self.handle_transport_fault(&e),
        }
    }

    /// Record a transport fault and drop the connection so a later tick can
    /// reconnect cleanly.
    fn handle_transport_fault(&mut self, error: &TransportError) {
        warn!("Serial transport fault: {}", error);

        self.transport = None;
        self.line_buf.clear();
        self.stats.last_error = Some(error.to_string());
        self.stats.state = LinkState::Error;
    }

    /// Rederive link health and refresh the age of the newest telemetry.
    fn update_link_state(&mut self, now_s: f64) {
        if let (Some(last_rx_s), Some(telemetry)) =
            (self.stats.last_rx_time_s, self.latest_telemetry.as_mut())
        {
            telemetry.rx_age_s = Some(now_s - last_rx_s);
        }

        self.stats.state = derive_link_state(
            self.transport.is_some(),
            self.stats.last_error.is_some(),
            self.stats.last_rx_time_s,
            now_s,
            self.params.rx_stale_s,
        );

        if self.stats.state == LinkState::Connected {
            self.stats.last_ok_time_s = Some(now_s);
        }
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Derive link health from connection facts alone.
fn derive_link_state(
    transport_open: bool,
    has_error: bool,
    last_rx_time_s: Option<f64>,
    now_s: f64,
    rx_stale_s: f64,
) -> LinkState {
    if !transport_open {
        return if has_error {
            LinkState::Error
        } else {
            LinkState::Disconnected
        };
    }

    match last_rx_time_s {
        None => LinkState::Connecting,
        Some(last_rx_s) => {
            if now_s - last_rx_s > rx_stale_s {
                LinkState::Stale
            } else {
                LinkState::Connected
            }
        }
    }
}

/// Exponential moving average update, seeding from the first sample.
fn ema_update(prev: Option<f64>, sample: f64, alpha: f64) -> f64 {
    match prev {
        Some(prev) => (1.0 - alpha) * prev + alpha * sample,
        None => sample,
    }
}

/// Instantaneous event rate from the previous event time, or `None` for the
/// first event or a degenerate interval.
fn event_hz(last_event_time_s: Option<f64>, now_s: f64) -> Option<f64> {
    let dt_s = now_s - last_event_time_s?;

    if dt_s <= 1e-6 {
        None
    } else {
        Some(1.0 / dt_s)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use std::sync::{Arc, Mutex};

    use super::*;

    // -----------------------------------------------------------------------
    // MOCK TRANSPORT
    // -----------------------------------------------------------------------

    #[derive(Default)]
    struct MockPort {
        /// Bytes the link has yet to read.
        rx: Vec<u8>,

        /// Bytes the link has written.
        tx: Vec<u8>,

        fail_writes: bool,
        fail_reads: bool,
    }

    #[derive(Clone, Default)]
    struct MockTransport(Arc<Mutex<MockPort>>);

    impl MockTransport {
        fn push_rx(&self, bytes: &[u8]) {
            self.0.lock().unwrap().rx.extend_from_slice(bytes);
        }

        fn tx_bytes(&self) -> Vec<u8> {
            self.0.lock().unwrap().tx.clone()
        }

        fn set_fail_writes(&self, fail: bool) {
            self.0.lock().unwrap().fail_writes = fail;
        }

        fn set_fail_reads(&self, fail: bool) {
            self.0.lock().unwrap().fail_reads = fail;
        }

        fn fault() -> TransportError {
            TransportError::IoError(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "device gone",
            ))
        }
    }

    impl Transport for MockTransport {
        fn bytes_to_read(&mut self) -> Result<usize, TransportError> {
            let port = self.0.lock().unwrap();
            if port.fail_reads {
                return Err(Self::fault());
            }
            Ok(port.rx.len())
        }

        fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
            let mut port = self.0.lock().unwrap();
            if port.fail_reads {
                return Err(Self::fault());
            }
            let n = buf.len().min(port.rx.len());
            buf[..n].copy_from_slice(&port.rx[..n]);
            port.rx.drain(..n);
            Ok(n)
        }

        fn write(&mut self, data: &[u8]) -> Result<usize, TransportError> {
            let mut port = self.0.lock().unwrap();
            if port.fail_writes {
                return Err(Self::fault());
            }
            port.tx.extend_from_slice(data);
            Ok(data.len())
        }

        fn clear_buffers(&mut self) -> Result<(), TransportError> {
            self.0.lock().unwrap().rx.clear();
            Ok(())
        }
    }

    // -----------------------------------------------------------------------
    // HELPERS
    // -----------------------------------------------------------------------

    fn test_params() -> Params {
        Params {
            // No real ports must ever be touched from tests
            auto_detect: false,
            ..Params::default()
        }
    }

    /// A link with a mock transport already attached, as if just opened.
    fn connected_link() -> (LinkInner, MockTransport) {
        let mock = MockTransport::default();
        let mut inner = LinkInner::new(test_params());
        inner.transport = Some(Box::new(mock.clone()));
        (inner, mock)
    }

    fn telemetry_line(ack_seq: i64) -> String {
        format!(
            "{{\"type\":\"telemetry\",\"arduino_time_ms\":100,\"ack_seq\":{}}}\n",
            ack_seq
        )
    }

    const DRIVE: DriveCommand = DriveCommand {
        linear: 0.5,
        angular: 0.0,
    };

    // -----------------------------------------------------------------------
    // TESTS
    // -----------------------------------------------------------------------

    #[test]
    fn test_bootstrap_gate() {
        let (mut inner, mock) = connected_link();
        let mech = comms_if::cmd::MECH_NOOP;

        // No telemetry yet, so nothing may be sent
        inner.tick_at(0.0, Some(&DRIVE), Some(&mech));
        assert!(mock.tx_bytes().is_empty());
        assert_eq!(inner.stats.tx_seq, 0);
        assert_eq!(inner.stats.state, LinkState::Connecting);

        // First telemetry frame opens the gate within the same tick
        mock.push_rx(telemetry_line(1).as_bytes());
        inner.tick_at(0.1, Some(&DRIVE), Some(&mech));
        assert!(!mock.tx_bytes().is_empty());
        assert_eq!(inner.stats.tx_seq, 1);
        assert_eq!(inner.stats.state, LinkState::Connected);
        assert_eq!(inner.stats.last_ack_seq, Some(1));
    }

    #[test]
    fn test_tx_seq_counts_failed_attempts() {
        let (mut inner, mock) = connected_link();
        let mech = comms_if::cmd::MECH_NOOP;

        mock.push_rx(telemetry_line(1).as_bytes());
        inner.tick_at(0.0, Some(&DRIVE), Some(&mech));
        assert_eq!(inner.stats.tx_seq, 1);

        mock.set_fail_writes(true);
        mock.push_rx(telemetry_line(2).as_bytes());
        inner.tick_at(0.1, Some(&DRIVE), Some(&mech));

        // The failed attempt still consumed a sequence number and dropped
        // the connection
        assert_eq!(inner.stats.tx_seq, 2);
        assert!(inner.transport.is_none());
        assert_eq!(inner.stats.state, LinkState::Error);
        assert!(inner.stats.last_error.is_some());
    }

    #[test]
    fn test_read_fault_drops_connection() {
        let (mut inner, mock) = connected_link();

        mock.set_fail_reads(true);
        inner.tick_at(0.0, None, None);

        assert!(inner.transport.is_none());
        assert_eq!(inner.stats.state, LinkState::Error);
    }

    #[test]
    fn test_last_write_wins() {
        let (mut inner, mock) = connected_link();

        let mut burst = telemetry_line(3);
        burst.push_str("this is not json\n");
        burst.push_str(&telemetry_line(7));
        mock.push_rx(burst.as_bytes());

        inner.tick_at(0.0, None, None);

        let telemetry = inner.latest_telemetry.expect("telemetry expected");
        assert_eq!(telemetry.ack_seq, 7);
        assert_eq!(inner.stats.last_ack_seq, Some(7));
        assert_eq!(inner.stats.bytes_rx, burst.len() as u64);
    }

    #[test]
    fn test_partial_line_buffered_across_ticks() {
        let (mut inner, mock) = connected_link();

        let line = telemetry_line(5);
        let (head, tail) = line.split_at(20);

        mock.push_rx(head.as_bytes());
        inner.tick_at(0.0, None, None);
        assert!(inner.latest_telemetry.is_none());

        mock.push_rx(tail.as_bytes());
        inner.tick_at(0.1, None, None);
        assert_eq!(inner.latest_telemetry.map(|t| t.ack_seq), Some(5));
    }

    #[test]
    fn test_close_resets_rates_not_counters() {
        let (mut inner, mock) = connected_link();

        mock.push_rx(telemetry_line(1).as_bytes());
        inner.tick_at(0.0, None, None);
        inner.tick_at(0.1, None, None);
        assert!(inner.tick_hz_ema.is_some());

        let bytes_rx = inner.stats.bytes_rx;
        assert!(bytes_rx > 0);

        inner.close();

        assert!(inner.transport.is_none());
        assert_eq!(inner.stats.state, LinkState::Disconnected);
        assert!(inner.tick_hz_ema.is_none());
        assert!(inner.rx_hz_ema.is_none());
        assert!(inner.stats.last_rx_time_s.is_none());
        // Lifetime counters survive
        assert_eq!(inner.stats.bytes_rx, bytes_rx);
    }

    #[test]
    fn test_disabled_link_closes_port() {
        let (mut inner, _mock) = connected_link();
        inner.params.comms_enabled = false;

        inner.tick_at(0.0, Some(&DRIVE), Some(&comms_if::cmd::MECH_NOOP));

        assert!(inner.transport.is_none());
        assert_eq!(inner.stats.state, LinkState::Disconnected);
    }

    #[test]
    fn test_stale_detection() {
        let (mut inner, mock) = connected_link();

        mock.push_rx(telemetry_line(1).as_bytes());
        inner.tick_at(0.0, None, None);
        assert_eq!(inner.stats.state, LinkState::Connected);

        // Just inside the stale window
        inner.tick_at(0.4, None, None);
        assert_eq!(inner.stats.state, LinkState::Connected);

        // Beyond it
        inner.tick_at(0.6, None, None);
        assert_eq!(inner.stats.state, LinkState::Stale);

        // Telemetry age tracks the tick clock
        let age = inner
            .latest_telemetry
            .as_ref()
            .and_then(|t| t.rx_age_s)
            .expect("age expected");
        assert!((age - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_reconnect_cooldown() {
        let mut inner = LinkInner::new(Params {
            port: Some("/dev/definitely-not-a-real-port".into()),
            ..test_params()
        });

        inner.tick_at(0.0, None, None);
        assert_eq!(inner.last_reconnect_attempt_s, Some(0.0));
        assert_eq!(inner.stats.state, LinkState::Error);

        // Within the cooldown no new attempt is made
        inner.tick_at(0.5, None, None);
        assert_eq!(inner.last_reconnect_attempt_s, Some(0.0));

        // After it another attempt fires
        inner.tick_at(1.5, None, None);
        assert_eq!(inner.last_reconnect_attempt_s, Some(1.5));
    }

    #[test]
    fn test_no_port_available() {
        // auto_detect off and no port configured, the link just idles
        let mut inner = LinkInner::new(test_params());

        inner.tick_at(0.0, Some(&DRIVE), Some(&comms_if::cmd::MECH_NOOP));

        assert!(inner.transport.is_none());
        assert_eq!(inner.stats.state, LinkState::Disconnected);
        assert!(inner.stats.last_error.is_none());
    }

    #[test]
    fn test_derive_link_state() {
        use LinkState::*;

        assert_eq!(derive_link_state(false, false, None, 0.0, 0.5), Disconnected);
        assert_eq!(derive_link_state(false, true, None, 0.0, 0.5), Error);
        assert_eq!(derive_link_state(true, false, None, 0.0, 0.5), Connecting);
        assert_eq!(derive_link_state(true, false, Some(0.0), 0.3, 0.5), Connected);
        assert_eq!(derive_link_state(true, false, Some(0.0), 0.7, 0.5), Stale);
    }

    #[test]
    fn test_rate_estimation() {
        // First event seeds the EMA, identical intervals hold it steady
        assert_eq!(event_hz(None, 0.0), None);
        assert_eq!(event_hz(Some(0.0), 0.0), None);
        assert_eq!(event_hz(Some(0.0), 0.1), Some(10.0));

        assert!((ema_update(None, 10.0, 0.2) - 10.0).abs() < 1e-9);
        assert!((ema_update(Some(10.0), 10.0, 0.2) - 10.0).abs() < 1e-9);
        assert!((ema_update(Some(10.0), 20.0, 0.2) - 12.0).abs() < 1e-9);
    }
}
