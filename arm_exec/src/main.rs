//! # Arm Executable
//!
//! This executable actuates the arm's joint servos from angle commands received over the network.
//!
//! # Architecture
//!
//! Two threads cooperate through a single slot mailbox:
//!
//!     - Command source: connects to the command server, decodes frames and publishes each
//!       command, overwriting any command not yet consumed.
//!     - Dispatcher (main thread): takes the freshest command and sweeps each joint to its target
//!       one degree at a time.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Result};
use log::info;
use std::time::Duration;

// Internal
use arm_lib::{
    arm_ctrl::{self, ArmCtrl},
    cmd_source::TcpCmdSource,
    dispatch::Dispatcher,
    mailbox::mailbox,
    params::{ArmExecParams, DriverKind},
    servo_ctrl::{sim::SimServoDriver, ActuatorDriver, ServoCtrl},
};
use comms_if::eqpt::arm::NUM_JOINTS;
use util::{
    host,
    logger::{logger_init, LevelFilter},
    session::Session,
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of channels on the simulated board, matches the PCA9685.
const SIM_NUM_CHANNELS: usize = 16;

/// Targets emitting a trace line per single degree write, held at debug unless `log_writes` is
/// set.
const WRITE_TRACE_TARGETS: [(&str, LevelFilter); 2] = [
    ("arm_lib::arm_ctrl", LevelFilter::Debug),
    ("arm_lib::servo_ctrl", LevelFilter::Debug),
];

// ------------------------------------------------------------------------------------------------
// MAIN
// ------------------------------------------------------------------------------------------------

fn main() -> Result<()> {
    color_eyre::install()?;

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new(
        "arm_exec",
        "sessions"
    ).wrap_err("Failed to create the session")?;

    // Exec parameters are needed before the logger to know which targets to silence
    let exec_params: ArmExecParams = util::params::load("arm_exec.toml")
        .wrap_err("Could not load exec params")?;

    // Initialise logger
    let target_levels: &[(&'static str, LevelFilter)] = if exec_params.log_writes {
        &[][..]
    } else {
        &WRITE_TRACE_TARGETS[..]
    };
    logger_init(LevelFilter::Trace, target_levels, &session)
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Arm Executable\n");
    info!(
        "Running on: {:#?}",
        host::get_uname().wrap_err("Failed to get host information")?
    );
    info!("Session directory: {:?}\n", session.session_root);

    info!("Initialising...");

    // ---- LOAD PARAMETERS ----

    let arm_ctrl_params: arm_ctrl::Params = util::params::load("arm_ctrl.toml")
        .wrap_err("Could not load ArmCtrl params")?;

    info!("Parameters loaded");

    // ---- INITIALISE MODULES ----

    let channels = arm_ctrl_params
        .channels()
        .wrap_err("Invalid ArmCtrl parameters")?;

    let driver = init_driver(&exec_params, channels)?;
    info!("{:?} servo driver initialised", exec_params.driver);

    let mut arm_ctrl = ArmCtrl::new(&arm_ctrl_params, driver)
        .wrap_err("Failed to initialise ArmCtrl")?;
    info!("ArmCtrl init complete");

    arm_ctrl.home();
    info!("Arm homed\n");

    // ---- COMMAND SOURCE ----

    let (publisher, receiver) = mailbox();

    TcpCmdSource::new(&exec_params, publisher)
        .spawn()
        .wrap_err("Failed to start the command source")?;
    info!(
        "Command source started, server at {} ({:?} frames)",
        exec_params.cmd_server_address, exec_params.wire_format
    );

    // ---- MAIN LOOP ----

    info!("Initialisation complete, entering main loop");

    Dispatcher::new(
        arm_ctrl,
        receiver,
        Duration::from_millis(exec_params.take_timeout_ms),
        exec_params.idle_report_cycles,
    ).run()
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Build the actuator selected in the parameters.
fn init_driver(
    params: &ArmExecParams,
    channels: [u8; NUM_JOINTS]
) -> Result<Box<dyn ActuatorDriver>> {
    match params.driver {
        DriverKind::Sim => Ok(Box::new(
            ServoCtrl::new(SimServoDriver::new(SIM_NUM_CHANNELS), channels)
                .wrap_err("Failed to initialise the simulated servo driver")?
        )),
        DriverKind::Pca9685 => init_pca9685_driver(params, channels),
    }
}

#[cfg(all(target_arch = "arm", target_os = "linux", target_env = "gnu"))]
fn init_pca9685_driver(
    params: &ArmExecParams,
    channels: [u8; NUM_JOINTS]
) -> Result<Box<dyn ActuatorDriver>> {
    use arm_lib::servo_ctrl::pca9685::init_pca9685;

    let i2c = rppal::i2c::I2c::new()
        .wrap_err("Failed to open the I2C bus")?;

    let board = init_pca9685(i2c, params.pca9685_address)
        .wrap_err("Failed to initialise the PCA9685")?;

    Ok(Box::new(
        ServoCtrl::new(board, channels)
            .wrap_err("Failed to initialise the PCA9685 servo driver")?
    ))
}

#[cfg(not(all(target_arch = "arm", target_os = "linux", target_env = "gnu")))]
fn init_pca9685_driver(
    _params: &ArmExecParams,
    _channels: [u8; NUM_JOINTS]
) -> Result<Box<dyn ActuatorDriver>> {
    Err(color_eyre::eyre::eyre!(
        "The PCA9685 driver is only available on the Raspberry Pi"
    ))
}
