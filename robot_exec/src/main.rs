//! Main robot-side executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise all modules
//!     - Main loop:
//!         - Controller processing at the controller rate:
//!             - Mode state machine tick
//!             - Ultrasonic safety gating
//!         - Serial link processing at the comms rate:
//!             - Telemetry drain
//!             - Command frame transmission
//!             - Link health update
//!
//! Both rates are driven from one thread with non-blocking rate limiters,
//! so a wedged serial port can never stall controller processing.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::info;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

// Internal
use comms_if::vision::VisionObs;
use robot_lib::{
    ctrl::{self, Ctrl},
    params::ExecParams,
    serial_link::{self, SerialLink},
};
use util::{
    logger::{logger_init, LevelFilter},
    rate::Rate,
    session::Session,
    time,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Sleep between main loop polls, keeping the idle loop off the CPU.
const LOOP_SLEEP: Duration = Duration::from_millis(1);

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("robot_exec", "sessions")
        .wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Trace, &session)
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("PWC Robot Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let exec_params: ExecParams =
        util::params::load("exec.toml").wrap_err("Could not load exec params")?;
    let link_params: serial_link::Params =
        util::params::load("serial_link.toml").wrap_err("Could not load serial link params")?;
    let ctrl_params: ctrl::Params =
        util::params::load("ctrl.toml").wrap_err("Could not load ctrl params")?;

    info!("Exec parameters loaded");

    // ---- INITIALISE MODULES ----

    let link = SerialLink::new(link_params);
    let ctrl = Ctrl::new(ctrl_params);

    info!("Module initialisation complete\n");

    // ---- SHUTDOWN HANDLING ----

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = running.clone();
        ctrlc::set_handler(move || running.store(false, Ordering::SeqCst))
            .wrap_err("Failed to set the Ctrl-C handler")?;
    }

    // ---- MAIN LOOP ----

    let mut ctrl_rate =
        Rate::new(exec_params.ctrl_hz).wrap_err("Invalid controller rate")?;
    let mut comms_rate =
        Rate::new(exec_params.comms_hz).wrap_err("Invalid comms rate")?;

    // No perception source is attached in this executable, the controller
    // sees a neutral observation and collaborators drive the ctrl API.
    let vision_obs = VisionObs::default();

    let mut last_cmds = None;

    info!("Begining main loop\n");

    while running.load(Ordering::SeqCst) {
        let now_s = time::monotonic_s();

        if ctrl_rate.ready(now_s) {
            let telemetry = link.latest_telemetry();
            last_cmds = Some(ctrl.tick(&vision_obs, telemetry.as_ref()));
        }

        if comms_rate.ready(now_s) {
            match &last_cmds {
                Some((drive, mech)) => link.tick(Some(drive), Some(mech)),
                None => link.tick(None, None),
            }
        }

        thread::sleep(LOOP_SLEEP);
    }

    // ---- SHUTDOWN ----

    info!("Interrupt received, closing the serial link");
    link.close();

    info!("End of execution");

    Ok(())
}
